//! [`Command`] for creating a [`Session`].

use common::{
    operations::{By, Select},
    DateTime,
};
use derive_more::{Display, Error, From};
use secrecy::{ExposeSecret, SecretBox};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::user::{session::Token, Email, Password};
use crate::{
    domain::{
        user::{self, session, Session},
        User,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating a [`Session`] by [`User`] credentials.
#[derive(Clone, Debug)]
pub struct CreateUserSession {
    /// [`Email`] of a [`User`].
    pub email: user::Email,

    /// [`Password`] of a [`User`].
    pub password: SecretBox<user::Password>,
}

/// Output of [`CreateUserSession`] [`Command`].
#[derive(Clone, Debug)]
pub struct Output {
    /// [`Token`] of the created [`Session`].
    pub token: session::Token,

    /// [`User`] whose [`Session`] has been created.
    pub user: User,

    /// [`DateTime`] when the [`Session`] expires.
    pub expires_at: session::ExpirationDateTime,
}

impl<Db> Command<CreateUserSession> for Service<Db>
where
    Db: for<'e> Database<
        Select<By<Option<User>, &'e user::Email>>,
        Ok = Option<User>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Output;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateUserSession,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateUserSession { email, password } = cmd;
        let password = password.expose_secret();

        let user = self
            .database()
            .execute(Select(By::new(&email)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Unknown email and wrong password are indistinguishable for the
        // caller, the response time included.
        let verified = user.as_ref().map_or_else(
            || {
                _ = user::PasswordHash::dummy().verify(password);
                false
            },
            |u| u.password_hash.verify(password),
        );
        let user = user
            .filter(|_| verified)
            .ok_or(E::WrongCredentials)
            .map_err(tracerr::wrap!())?;

        let issued_at = DateTime::now();
        let expires_at = (issued_at + self.config().session_ttl).coerce();
        let token = jsonwebtoken::encode::<Session>(
            &jsonwebtoken::Header::default(),
            &Session {
                user_id: user.id,
                email: user.email.clone(),
                name: user.name.clone(),
                is_admin: user.is_admin,
                issued_at: issued_at.coerce(),
                expires_at,
            },
            &self.config().jwt_encoding_key,
        )
        .map_err(tracerr::from_and_wrap!(=> E))?;

        // SAFETY: `jsonwebtoken::encode` always returns a valid
        //         `session::Token`.
        #[expect(unsafe_code, reason = "invariants are preserved")]
        let token = unsafe { session::Token::new_unchecked(token) };

        Ok(Output {
            token,
            user,
            expires_at,
        })
    }
}

/// Error of [`CreateUserSession`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`jsonwebtoken`] encoding error.
    #[display("Failed to encode a JSON Web Token: {_0}")]
    JsonWebTokenEncodeError(jsonwebtoken::errors::Error),

    /// [`CreateUserSession`] contains wrong credentials.
    #[display("Wrong `User` credentials")]
    WrongCredentials,
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use jsonwebtoken::Validation;
    use secrecy::SecretBox;

    use crate::{
        command::{Command as _, CreateUser},
        domain::user::{self, Session},
        test_util::service,
    };

    use super::{CreateUserSession, ExecutionError};

    fn password(raw: &str) -> SecretBox<user::Password> {
        SecretBox::new(Box::new(user::Password::new(raw).unwrap()))
    }

    async fn register(svc: &crate::Service<crate::infra::Memory>) {
        drop(
            svc.execute(CreateUser {
                name: user::Name::new("Diana Prince").unwrap(),
                email: user::Email::new("diana@example.com").unwrap(),
                password: password("themyscira1"),
                phone: None,
            })
            .await
            .unwrap(),
        );
    }

    #[tokio::test]
    async fn issues_token_for_valid_credentials() {
        let svc = service();
        register(&svc).await;

        let out = svc
            .execute(CreateUserSession {
                email: user::Email::new("DIANA@example.com").unwrap(),
                password: password("themyscira1"),
            })
            .await
            .unwrap();

        let claims = jsonwebtoken::decode::<Session>(
            out.token.as_ref(),
            &svc.config().jwt_decoding_key,
            &Validation::default(),
        )
        .unwrap()
        .claims;
        assert_eq!(claims.user_id, out.user.id);
        assert_eq!(claims.email, out.user.email);
        assert_eq!(
            claims.expires_at.unix_timestamp(),
            out.expires_at.unix_timestamp(),
        );
        assert_eq!(
            claims.expires_at.unix_timestamp()
                - claims.issued_at.unix_timestamp(),
            i64::try_from(Duration::from_secs(60 * 60).as_secs()).unwrap(),
        );
    }

    #[tokio::test]
    async fn rejects_wrong_password() {
        let svc = service();
        register(&svc).await;

        let err = svc
            .execute(CreateUserSession {
                email: user::Email::new("diana@example.com").unwrap(),
                password: password("themyscira2"),
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::WrongCredentials));
    }

    #[tokio::test]
    async fn rejects_unknown_email_the_same_way() {
        let svc = service();
        register(&svc).await;

        let err = svc
            .execute(CreateUserSession {
                email: user::Email::new("bruce@example.com").unwrap(),
                password: password("themyscira1"),
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::WrongCredentials));
    }
}
