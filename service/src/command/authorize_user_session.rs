//! [`Command`] for authorizing a site operator.

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

/// [`Command`] for authorizing a site operator by a [`Session`] token.
///
/// Expired tokens are rejected by [`jsonwebtoken`] validation, and tokens of
/// removed [`User`]s are rejected explicitly.
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
    type Ok = Session;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: AuthorizeUserSession,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let AuthorizeUserSession { token } = cmd;

        let session = jsonwebtoken::decode::<Session>(
            token.as_ref(),
            &self.config.jwt_decoding_key,
            &Validation::default(),
        )
        .map_err(tracerr::from_and_wrap!(=> E))?
        .claims;

        drop(
            self.database()
                .execute(Select(By::new(session.user_id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .ok_or_else(|| E::UserNotExists(session.user_id))
                .map_err(tracerr::wrap!())?,
        );

        Ok(session)
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
    #[display("`User(id: {_0}` does not exist")]
    #[from(ignore)]
    UserNotExists(#[error(not(source))] user::Id),
}

#[cfg(test)]
mod spec {
    use crate::{
        command::{
            testing::{self, MockDb, State},
            CreateUserSession,
        },
        Command as _,
    };

    use super::{AuthorizeUserSession, ExecutionError};

    #[tokio::test]
    async fn authorizes_freshly_issued_token() {
        let operator = testing::operator();
        let operator_id = operator.id;
        let svc = testing::service(MockDb::new(State {
            users: vec![operator],
            ..State::default()
        }));

        let issued = svc
            .execute(CreateUserSession::ByUserId(operator_id))
            .await
            .unwrap();

        let session = svc
            .execute(AuthorizeUserSession {
                token: issued.token,
            })
            .await
            .unwrap();

        assert_eq!(session.user_id, operator_id);
    }

    #[tokio::test]
    async fn rejects_malformed_token() {
        let svc = testing::service(MockDb::new(State::default()));

        let err = svc
            .execute(AuthorizeUserSession {
                token: "not-a-jwt".parse().unwrap(),
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::JsonWebTokenDecodeError(_),
        ));
    }

    #[tokio::test]
    async fn rejects_token_of_removed_operator() {
        let operator = testing::operator();
        let operator_id = operator.id;
        let svc = testing::service(MockDb::new(State {
            users: vec![operator],
            ..State::default()
        }));

        let issued = svc
            .execute(CreateUserSession::ByUserId(operator_id))
            .await
            .unwrap();

        svc.execute(AuthorizeUserSession {
            token: issued.token.clone(),
        })
        .await
        .unwrap();

        let svc = testing::service(MockDb::new(State::default()));
        let err = svc
            .execute(AuthorizeUserSession {
                token: issued.token,
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::UserNotExists(_)));
    }
}
