//! [`Context`]-related definitions.

use axum::{async_trait, extract::FromRequestParts, RequestPartsExt as _};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use common::DateTime;
use service::{
    command::{self, Command as _},
    domain::{
        user::{self, session},
        User,
    },
};
use tokio::sync::OnceCell;

use crate::{define_error, AsError, Error, Service};

/// Request context.
#[derive(Debug)]
pub struct Context {
    /// [`Service`] instance.
    service: Service,

    /// Parts of the HTTP request.
    parts: http::request::Parts,

    /// Authenticated [`Session`], if any.
    current_session: OnceCell<Session>,
}

impl Context {
    /// Returns [`Service`] instance of this [`Context`].
    #[must_use]
    pub fn service(&self) -> &Service {
        &self.service
    }

    /// Returns the current [`Session`] for this [`Context`].
    ///
    /// # Errors
    ///
    /// Errors if:
    /// - the current HTTP request is not authorized;
    /// - the provided authentication token is invalid or expired;
    /// - the authenticated user doesn't exist anymore.
    pub async fn current_session(&self) -> Result<&Session, Error> {
        self.current_session
            .get_or_try_init(|| self.do_authentication())
            .await
    }

    /// Returns the current [`Session`] for this [`Context`], ensuring that it
    /// belongs to an administrator.
    ///
    /// # Errors
    ///
    /// Errors if the current [`Session`] is absent, invalid or doesn't belong
    /// to an administrator.
    pub async fn admin_session(&self) -> Result<&Session, Error> {
        let session = self.current_session().await?;
        if !session.is_admin {
            return Err(AuthError::NotAdmin.into());
        }
        Ok(session)
    }

    /// Performs the [`Session`] authentication.
    ///
    /// # Errors
    ///
    /// Errors if the provided authentication token is invalid.
    async fn do_authentication(&self) -> Result<Session, Error> {
        let TypedHeader(Authorization(bearer)) = self
            .parts
            .clone()
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| Error::from(AuthError::AuthorizationRequired))?;

        #[expect(unsafe_code, reason = "specified in correct header")]
        let token =
            unsafe { session::Token::new_unchecked(bearer.token().to_owned()) };
        let (session, user) = self
            .service
            .execute(command::AuthorizeUserSession { token })
            .await
            .map_err(AsError::into_error)?;

        Ok(Session {
            user_id: user.id,
            is_admin: user.is_admin,
            expires_at: session.expires_at.coerce(),
            user,
        })
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Context
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut http::request::Parts,
        _: &S,
    ) -> Result<Self, Self::Rejection> {
        let service = parts
            .extensions
            .get::<Service>()
            .cloned()
            .ok_or_else(|| Error::internal(&"missing `Service` extension"))?;

        Ok(Self {
            service,
            parts: parts.clone(),
            current_session: OnceCell::new(),
        })
    }
}

/// Authenticated user session.
#[derive(Clone, Debug)]
pub struct Session {
    /// ID of the [`User`] associated with this [`Session`].
    ///
    /// [`User`]: service::domain::User
    pub user_id: user::Id,

    /// Indicator whether the [`User`] is an administrator.
    ///
    /// Read from storage rather than from the token claims.
    ///
    /// [`User`]: service::domain::User
    pub is_admin: bool,

    /// [`DateTime`] when this [`Session`] expires.
    pub expires_at: DateTime,

    /// [`User`] loaded while authenticating this [`Session`].
    pub user: User,
}

impl AsError for command::authorize_user_session::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::JsonWebTokenDecodeError(_) | Self::UserNotExists(_) => {
                Some(AuthError::AuthorizationRequired.into())
            }
        }
    }
}

define_error! {
    enum AuthError {
        #[code = "AUTHORIZATION_REQUIRED"]
        #[status = UNAUTHORIZED]
        #[message = "Authorization required"]
        AuthorizationRequired,

        #[code = "NOT_ADMIN"]
        #[status = FORBIDDEN]
        #[message = "Administrator rights required"]
        NotAdmin,
    }
}
