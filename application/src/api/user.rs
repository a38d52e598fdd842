//! [`User`] registration and authentication endpoints.

use axum::{http::StatusCode, Json};
use axum_extra::extract::WithRejection;
use secrecy::SecretBox;
use serde::{Deserialize, Serialize};
use service::{
    command::{self, create_user, create_user_session, Command as _},
    domain::{self, user},
};

use crate::{define_error, AsError, Context, Error};

/// Public profile of a [`domain::User`].
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// ID of this [`User`].
    pub id: user::Id,

    /// Name of this [`User`].
    pub name: String,

    /// Email address of this [`User`].
    pub email: String,

    /// Phone number of this [`User`], if any.
    pub phone: Option<String>,

    /// Indicator whether this [`User`] is an administrator.
    pub is_admin: bool,

    /// RFC 3339 [`DateTime`] when this [`User`] registered.
    ///
    /// [`DateTime`]: common::DateTime
    pub created_at: String,
}

impl From<domain::User> for User {
    fn from(user: domain::User) -> Self {
        Self {
            id: user.id,
            name: user.name.to_string(),
            email: user.email.to_string(),
            phone: user.phone.as_ref().map(ToString::to_string),
            is_admin: user.is_admin,
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

/// Request body of the [`register()`] endpoint.
#[derive(Deserialize)]
pub struct Register {
    /// Name of a new [`User`].
    pub name: String,

    /// Email address of a new [`User`].
    pub email: String,

    /// Plaintext password of a new [`User`].
    pub password: String,

    /// Optional phone number of a new [`User`].
    #[serde(default)]
    pub phone: Option<String>,
}

impl TryFrom<Register> for command::CreateUser {
    type Error = UserError;

    fn try_from(req: Register) -> Result<Self, Self::Error> {
        let Register {
            name,
            email,
            password,
            phone,
        } = req;

        Ok(Self {
            name: user::Name::new(name).ok_or(UserError::InvalidName)?,
            email: user::Email::new(email).ok_or(UserError::InvalidEmail)?,
            password: SecretBox::new(Box::new(
                user::Password::new(password)
                    .ok_or(UserError::InvalidPassword)?,
            )),
            phone: phone
                .filter(|p| !p.trim().is_empty())
                .map(|p| user::Phone::new(p).ok_or(UserError::InvalidPhone))
                .transpose()?,
        })
    }
}

/// Request body of the [`login()`] endpoint.
#[derive(Deserialize)]
pub struct Login {
    /// Email address of a [`User`].
    pub email: String,

    /// Plaintext password of a [`User`].
    pub password: String,
}

/// Response body of the [`login()`] endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Authenticated {
    /// Bearer access token.
    pub access_token: String,

    /// RFC 3339 [`DateTime`] when the `access_token` expires.
    ///
    /// [`DateTime`]: common::DateTime
    pub expires_at: String,

    /// Authenticated [`User`].
    pub user: User,
}

/// Registers a new [`User`].
///
/// # Errors
///
/// Possible error codes:
/// - `INVALID_NAME`, `INVALID_EMAIL`, `INVALID_PASSWORD`, `INVALID_PHONE` if
///   the corresponding field is malformed;
/// - `EMAIL_OCCUPIED` if the email is registered already.
#[tracing::instrument(skip_all, fields(email = %req.email))]
pub async fn register(
    ctx: Context,
    WithRejection(Json(req), _): WithRejection<Json<Register>, Error>,
) -> Result<(StatusCode, Json<User>), Error> {
    let cmd = command::CreateUser::try_from(req)?;

    let user = ctx
        .service()
        .execute(cmd)
        .await
        .map_err(AsError::into_error)?;

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// Exchanges [`User`] credentials for an access token.
///
/// # Errors
///
/// Possible error codes:
/// - `WRONG_CREDENTIALS` if the email is unknown or the password doesn't
///   match.
#[tracing::instrument(skip_all, fields(email = %req.email))]
pub async fn login(
    ctx: Context,
    WithRejection(Json(req), _): WithRejection<Json<Login>, Error>,
) -> Result<Json<Authenticated>, Error> {
    if req.email.trim().is_empty() || req.password.is_empty() {
        return Err(Error::invalid_input(
            &"`email` and `password` are required",
        ));
    }
    // Malformed emails cannot belong to anyone.
    let email =
        user::Email::new(req.email).ok_or(UserError::WrongCredentials)?;
    #[expect(unsafe_code, reason = "only compared against the stored hash")]
    let password = unsafe { user::Password::new_unchecked(req.password) };

    let out = ctx
        .service()
        .execute(command::CreateUserSession {
            email,
            password: SecretBox::new(Box::new(password)),
        })
        .await
        .map_err(AsError::into_error)?;

    Ok(Json(Authenticated {
        access_token: out.token.to_string(),
        expires_at: out.expires_at.to_rfc3339(),
        user: out.user.into(),
    }))
}

/// Returns the profile of the authenticated [`User`].
///
/// # Errors
///
/// Possible error codes:
/// - `AUTHORIZATION_REQUIRED` if the access token is missing or invalid.
#[tracing::instrument(skip_all)]
pub async fn me(ctx: Context) -> Result<Json<User>, Error> {
    let session = ctx.current_session().await?;

    Ok(Json(session.user.clone().into()))
}

impl AsError for create_user::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::EmailOccupied(_) => Some(UserError::EmailOccupied.into()),
            Self::PasswordHash(_) => None,
        }
    }
}

impl AsError for create_user_session::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::WrongCredentials => Some(UserError::WrongCredentials.into()),
            Self::JsonWebTokenEncodeError(_) => None,
        }
    }
}

define_error! {
    enum UserError {
        #[code = "INVALID_NAME"]
        #[status = BAD_REQUEST]
        #[message = "Name must be non-empty and have no surrounding spaces"]
        InvalidName,

        #[code = "INVALID_EMAIL"]
        #[status = BAD_REQUEST]
        #[message = "Invalid email address"]
        InvalidEmail,

        #[code = "INVALID_PASSWORD"]
        #[status = BAD_REQUEST]
        #[message = "Password must have 8 to 128 characters, a letter and a digit"]
        InvalidPassword,

        #[code = "INVALID_PHONE"]
        #[status = BAD_REQUEST]
        #[message = "Invalid phone number"]
        InvalidPhone,

        #[code = "EMAIL_OCCUPIED"]
        #[status = CONFLICT]
        #[message = "Email is already registered"]
        EmailOccupied,

        #[code = "WRONG_CREDENTIALS"]
        #[status = UNAUTHORIZED]
        #[message = "Invalid credentials"]
        WrongCredentials,
    }
}

#[cfg(test)]
mod spec {
    use service::command::CreateUser;

    use crate::Error;

    use super::{Register, UserError};

    fn register(name: &str, email: &str, password: &str) -> Register {
        Register {
            name: name.into(),
            email: email.into(),
            password: password.into(),
            phone: None,
        }
    }

    fn code(err: UserError) -> &'static str {
        Error::from(err).code
    }

    #[test]
    fn validates_each_field() {
        let err = |r: Register| CreateUser::try_from(r).map(drop).unwrap_err();

        assert_eq!(
            code(err(register("", "bruce@wayne.com", "gotham42"))),
            "INVALID_NAME",
        );
        assert_eq!(
            code(err(register("Bruce", "not-an-email", "gotham42"))),
            "INVALID_EMAIL",
        );
        assert_eq!(
            code(err(register("Bruce", "bruce@wayne.com", "short"))),
            "INVALID_PASSWORD",
        );
        assert_eq!(
            code(err(Register {
                phone: Some("call me".into()),
                ..register("Bruce", "bruce@wayne.com", "gotham42")
            })),
            "INVALID_PHONE",
        );
    }

    #[test]
    fn ignores_blank_phone() {
        let cmd = CreateUser::try_from(Register {
            phone: Some("  ".into()),
            ..register("Bruce", "Bruce@Wayne.com", "gotham42")
        })
        .unwrap();

        let email: &str = cmd.email.as_ref();
        assert!(cmd.phone.is_none());
        assert_eq!(email, "bruce@wayne.com");
    }
}
