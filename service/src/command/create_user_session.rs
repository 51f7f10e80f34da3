//! [`Command`] for signing a site operator in.

use std::time::Duration;

use common::{
    operations::{By, Select},
    DateTime,
};
use derive_more::{Display, Error, From};
use secrecy::{ExposeSecret, SecretBox};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::user::{session::Token, Login, Password};
use crate::{
    domain::{
        user::{self, session, Session},
        User,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for issuing a new [`Session`] to a site operator.
#[derive(Clone, Debug, From)]
pub enum CreateUserSession {
    /// Issue a [`Session`] to the operator with the provided credentials.
    ByCredentials {
        /// [`Login`] of the operator.
        login: user::Login,

        /// [`Password`] of the operator.
        password: SecretBox<user::Password>,
    },

    /// Issue a [`Session`] to the operator with the provided [`User`] ID.
    ///
    /// Meant for flows where the operator is trusted already, like right
    /// after registration.
    ByUserId(user::Id),
}

impl CreateUserSession {
    /// [`Duration`] an issued [`Session`] stays valid for.
    const EXPIRATION_DURATION: Duration = Duration::from_secs(30 * 60);
}

/// Output of [`CreateUserSession`] [`Command`].
#[derive(Clone, Debug)]
pub struct Output {
    /// [`Token`] of the issued [`Session`].
    pub token: session::Token,

    /// [`User`] the [`Session`] has been issued to.
    pub user: User,

    /// [`DateTime`] when the issued [`Session`] expires.
    pub expires_at: session::ExpirationDateTime,
}

impl<Db> Command<CreateUserSession> for Service<Db>
where
    Db: Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + for<'l> Database<
            Select<By<Option<User>, &'l user::Login>>,
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
        use CreateUserSession as Cmd;
        use ExecutionError as E;

        let user = match cmd {
            Cmd::ByCredentials { login, password } => {
                // An unknown `Login` and a wrong `Password` are
                // indistinguishable on purpose.
                let user = self
                    .database()
                    .execute(Select(By::new(&login)))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?
                    .ok_or_else(|| E::WrongCredentials)
                    .map_err(tracerr::wrap!())?;

                let hash = user::PasswordHash::new(password.expose_secret());
                if user.password_hash != hash {
                    return Err(tracerr::new!(E::WrongCredentials));
                }

                user
            }
            Cmd::ByUserId(user_id) => self
                .database()
                .execute(Select(By::new(user_id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .ok_or_else(|| E::UserNotExists(user_id))
                .map_err(tracerr::wrap!())?,
        };

        let expires_at = (DateTime::now() + Cmd::EXPIRATION_DURATION).coerce();
        let token = jsonwebtoken::encode::<Session>(
            &jsonwebtoken::Header::default(),
            &Session {
                user_id: user.id,
                expires_at,
            },
            &self.config.jwt_encoding_key,
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

    /// [`User`] with the provided ID does not exist.
    #[display("`User(id: {_0}` does not exist")]
    #[from(ignore)]
    UserNotExists(#[error(not(source))] user::Id),

    /// [`CreateUserSession::ByCredentials`] contains wrong credentials.
    #[display("Wrong `User` credentials")]
    WrongCredentials,
}

#[cfg(test)]
mod spec {
    use secrecy::SecretBox;

    use crate::{
        command::testing::{self, MockDb, State},
        domain::user,
        Command as _,
    };

    use super::{CreateUserSession, ExecutionError};

    fn setup() -> (crate::Service<MockDb>, user::Id) {
        let operator = testing::operator();
        let operator_id = operator.id;
        let svc = testing::service(MockDb::new(State {
            users: vec![operator],
            ..State::default()
        }));
        (svc, operator_id)
    }

    fn password(raw: &str) -> SecretBox<user::Password> {
        let pass = user::Password::new(raw).unwrap();
        SecretBox::init_with(move || pass)
    }

    #[tokio::test]
    async fn signs_in_with_valid_credentials() {
        let (svc, operator_id) = setup();

        let out = svc
            .execute(CreateUserSession::ByCredentials {
                login: user::Login::new("admin").unwrap(),
                password: password("secret"),
            })
            .await
            .unwrap();

        assert_eq!(out.user.id, operator_id);
        assert!(!out.token.as_ref().is_empty());
    }

    #[tokio::test]
    async fn rejects_wrong_password() {
        let (svc, _) = setup();

        let err = svc
            .execute(CreateUserSession::ByCredentials {
                login: user::Login::new("admin").unwrap(),
                password: password("hunter2"),
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::WrongCredentials));
    }

    #[tokio::test]
    async fn rejects_unknown_login() {
        let (svc, _) = setup();

        let err = svc
            .execute(CreateUserSession::ByCredentials {
                login: user::Login::new("nobody").unwrap(),
                password: password("secret"),
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::WrongCredentials));
    }

    #[tokio::test]
    async fn issues_session_by_user_id() {
        let (svc, operator_id) = setup();

        let out = svc
            .execute(CreateUserSession::ByUserId(operator_id))
            .await
            .unwrap();

        assert_eq!(out.user.id, operator_id);
    }

    #[tokio::test]
    async fn rejects_unknown_user_id() {
        let (svc, _) = setup();

        let err = svc
            .execute(CreateUserSession::ByUserId(user::Id::new()))
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::UserNotExists(_)));
    }
}
