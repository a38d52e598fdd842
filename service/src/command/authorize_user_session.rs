//! [`Command`] for authorizing a [`User`].

use common::operations::{By, Select};
use derive_more::{Display, Error, From};
use jsonwebtoken::Validation;
use tracerr::Traced;

use crate::{
    domain::{
        user::{self, session, Session},
        User,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for authorizing a [`User`] by a [`session::Token`].
#[derive(Clone, Debug, From)]
pub struct AuthorizeUserSession {
    /// [`Session`] token to authorize.
    pub token: session::Token,
}

impl<Db> Command<AuthorizeUserSession> for Service<Db>
where
    Db: Database<
        Select<By<Option<User>, user::Id>>,
        Ok = Option<User>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = (Session, User);
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: AuthorizeUserSession,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let AuthorizeUserSession { token } = cmd;

        // Verifies the signature and the `exp` claim.
        let session = jsonwebtoken::decode::<Session>(
            token.as_ref(),
            &self.config().jwt_decoding_key,
            &Validation::default(),
        )
        .map_err(tracerr::from_and_wrap!(=> E))?
        .claims;

        let user = self
            .database()
            .execute(Select(By::new(session.user_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or_else(|| E::UserNotExists(session.user_id))
            .map_err(tracerr::wrap!())?;

        Ok((session, user))
    }
}

/// Error of [`AuthorizeUserSession`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`jsonwebtoken`] decoding error.
    #[display("Failed to decode a JSON Web Token: {_0}")]
    JsonWebTokenDecodeError(jsonwebtoken::errors::Error),

    /// [`User`] the [`Session`] belongs to does not exist.
    #[display("`User(id: {_0})` does not exist")]
    #[from(ignore)]
    UserNotExists(#[error(not(source))] user::Id),
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::DateTime;
    use jsonwebtoken::{EncodingKey, Header};
    use secrecy::SecretBox;

    use crate::{
        command::{Command as _, CreateUser, CreateUserSession},
        domain::user::{self, session, Session},
        infra::Memory,
        test_util::service,
        Service,
    };

    use super::{AuthorizeUserSession, ExecutionError};

    async fn login(svc: &Service<Memory>) -> session::Token {
        let password =
            || SecretBox::new(Box::new(user::Password::new("gotham42").unwrap()));
        drop(
            svc.execute(CreateUser {
                name: user::Name::new("Bruce Wayne").unwrap(),
                email: user::Email::new("bruce@example.com").unwrap(),
                password: password(),
                phone: None,
            })
            .await
            .unwrap(),
        );
        svc.execute(CreateUserSession {
            email: user::Email::new("bruce@example.com").unwrap(),
            password: password(),
        })
        .await
        .unwrap()
        .token
    }

    #[tokio::test]
    async fn authorizes_issued_token() {
        let svc = service();
        let token = login(&svc).await;

        let (session, user) = svc
            .execute(AuthorizeUserSession { token })
            .await
            .unwrap();

        assert_eq!(session.user_id, user.id);
        let email: &str = user.email.as_ref();
        assert_eq!(email, "bruce@example.com");
    }

    #[tokio::test]
    async fn rejects_tampered_token() {
        let svc = service();
        let token = login(&svc).await;

        let token = token.to_string();
        let (unsigned, signature) = token.rsplit_once('.').unwrap();
        let flipped = if signature.starts_with('A') { 'B' } else { 'A' };
        let tampered: session::Token =
            format!("{unsigned}.{flipped}{}", &signature[1..]).parse().unwrap();

        let err = svc
            .execute(AuthorizeUserSession { token: tampered })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::JsonWebTokenDecodeError(_),
        ));
    }

    #[tokio::test]
    async fn rejects_token_with_altered_payload() {
        let svc = service();
        let token = login(&svc).await;
        let original = token.to_string();
        let (session, _) = svc
            .execute(AuthorizeUserSession { token })
            .await
            .unwrap();

        let escalated = jsonwebtoken::encode(
            &Header::default(),
            &Session {
                is_admin: true,
                ..session
            },
            &EncodingKey::from_secret(b"irrelevant"),
        )
        .unwrap();
        let payload = escalated.split('.').nth(1).unwrap();
        let (header, rest) = original.split_once('.').unwrap();
        let (_, signature) = rest.split_once('.').unwrap();
        let tampered: session::Token =
            format!("{header}.{payload}.{signature}").parse().unwrap();

        let err = svc
            .execute(AuthorizeUserSession { token: tampered })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::JsonWebTokenDecodeError(_),
        ));
    }

    #[tokio::test]
    async fn rejects_token_signed_with_other_secret() {
        let svc = service();
        let token = login(&svc).await;
        let (session, _) = svc
            .execute(AuthorizeUserSession { token })
            .await
            .unwrap();

        let forged = jsonwebtoken::encode(
            &Header::default(),
            &session,
            &EncodingKey::from_secret(b"other-secret"),
        )
        .unwrap();

        let err = svc
            .execute(AuthorizeUserSession {
                token: forged.parse().unwrap(),
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::JsonWebTokenDecodeError(_),
        ));
    }

    #[tokio::test]
    async fn rejects_expired_token() {
        let svc = service();
        let token = login(&svc).await;
        let (session, _) = svc
            .execute(AuthorizeUserSession { token })
            .await
            .unwrap();

        let expired = Session {
            expires_at: (DateTime::now() - Duration::from_secs(2 * 60 * 60))
                .coerce(),
            ..session
        };
        let token = jsonwebtoken::encode(
            &Header::default(),
            &expired,
            &svc.config().jwt_encoding_key,
        )
        .unwrap();

        let err = svc
            .execute(AuthorizeUserSession {
                token: token.parse().unwrap(),
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::JsonWebTokenDecodeError(_),
        ));
    }
}
