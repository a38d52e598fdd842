//! [`Command`] for creating a new [`User`].

use common::{
    operations::{By, Commit, Insert, Select, Transact, Transacted},
    DateTime,
};
use derive_more::{Display, Error, From};
use secrecy::{ExposeSecret, SecretBox};
use tracerr::Traced;
use tracing as log;

#[cfg(doc)]
use crate::domain::user::{Email, Name, Password, Phone};
use crate::{
    domain::{user, User},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for registering a new [`User`].
#[derive(Clone, Debug)]
pub struct CreateUser {
    /// [`Name`] of a new [`User`].
    pub name: user::Name,

    /// [`Email`] of a new [`User`].
    pub email: user::Email,

    /// [`Password`] of a new [`User`].
    pub password: SecretBox<user::Password>,

    /// [`Phone`] of a new [`User`].
    pub phone: Option<user::Phone>,
}

impl<Db> Command<CreateUser> for Service<Db>
where
    Db: for<'e> Database<
            Select<By<Option<User>, &'e user::Email>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<Insert<User>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = User;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateUser) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateUser {
            name,
            email,
            password,
            phone,
        } = cmd;

        let u = self
            .database()
            .execute(Select(By::new(&email)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if u.is_some() {
            return Err(tracerr::new!(E::EmailOccupied(email)));
        }

        let password_hash = user::PasswordHash::new(password.expose_secret())
            .map_err(tracerr::from_and_wrap!(=> E))?;
        let is_admin = self.config().admin_emails.contains(&email);

        let user = User {
            id: user::Id::new(),
            name,
            email,
            password_hash,
            phone,
            is_admin,
            created_at: DateTime::now().coerce(),
        };

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if let Err(e) = tx.execute(Insert(user.clone())).await {
            // Concurrent registration may pass the check above.
            if e.as_ref().is_unique_violation(user::Email::UNIQUE_CONSTRAINT) {
                return Err(tracerr::new!(E::EmailOccupied(user.email)));
            }
            return Err(e).map_err(tracerr::map_from_and_wrap!(=> E));
        }
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::info!(
            user.id = %user.id,
            is_admin = user.is_admin,
            "user registered",
        );
        Ok(user)
    }
}

/// Error of [`CreateUser`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`user::Email`] is already occupied.
    #[display("`{_0}` email is occupied")]
    #[from(ignore)]
    EmailOccupied(#[error(not(source))] user::Email),

    /// [`user::Password`] hashing failed.
    #[display("Failed to hash `Password`: {_0}")]
    PasswordHash(argon2::password_hash::Error),
}

#[cfg(test)]
mod spec {
    use secrecy::SecretBox;

    use crate::{
        command::Command as _,
        domain::user,
        infra::Memory,
        test_util::service,
        Config, Service,
    };

    use super::{CreateUser, ExecutionError};

    fn cmd(email: &str) -> CreateUser {
        CreateUser {
            name: user::Name::new("Peter Parker").unwrap(),
            email: user::Email::new(email).unwrap(),
            password: SecretBox::new(Box::new(
                user::Password::new("webslinger1").unwrap(),
            )),
            phone: None,
        }
    }

    #[tokio::test]
    async fn registers_user() {
        let svc = service();

        let user = svc.execute(cmd("Peter@Example.com")).await.unwrap();

        let email: &str = user.email.as_ref();
        assert_eq!(email, "peter@example.com");
        assert!(!user.is_admin);
        assert_ne!(user.password_hash.to_string(), "webslinger1");
        assert!(user.password_hash.verify(
            &user::Password::new("webslinger1").unwrap()
        ));
    }

    #[tokio::test]
    async fn rejects_occupied_email_case_insensitively() {
        let svc = service();
        drop(svc.execute(cmd("peter@example.com")).await.unwrap());

        let err = svc.execute(cmd("PETER@example.com")).await.unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::EmailOccupied(_)));
    }

    #[tokio::test]
    async fn salts_every_hash() {
        let svc = service();

        let first = svc.execute(cmd("first@example.com")).await.unwrap();
        let second = svc.execute(cmd("second@example.com")).await.unwrap();

        assert_ne!(first.password_hash, second.password_hash);
    }

    #[tokio::test]
    async fn grants_admin_to_configured_emails() {
        let svc = Service::new(
            Config {
                admin_emails: vec![user::Email::new("boss@example.com").unwrap()],
                ..Config::with_secret(b"secret")
            },
            Memory::default(),
        );

        let admin = svc.execute(cmd("Boss@Example.com")).await.unwrap();
        let customer = svc.execute(cmd("fan@example.com")).await.unwrap();

        assert!(admin.is_admin);
        assert!(!customer.is_admin);
    }
}
