//! [`Command`] for deciding a pending [`Booking`].

use common::operations::{By, Commit, Insert, Lock, Select, Transact, Transacted};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{booking, user, Booking, User},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for confirming or cancelling a pending [`Booking`].
///
/// Both target statuses are terminal: a decided [`Booking`] cannot be
/// decided again. Confirming a [`Booking`] doesn't touch any overlapping
/// pending ones.
#[derive(Clone, Copy, Debug)]
pub struct DecideBooking {
    /// ID of the [`Booking`] to decide.
    pub booking_id: booking::Id,

    /// Target [`booking::Status`], either [`Confirmed`] or [`Cancelled`].
    ///
    /// [`Cancelled`]: booking::Status::Cancelled
    /// [`Confirmed`]: booking::Status::Confirmed
    pub decision: booking::Status,

    /// ID of the [`User`] making the decision.
    pub initiator_id: user::Id,
}

impl<Db> Command<DecideBooking> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>
        + Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Booking>, booking::Id>>,
            Ok = Option<Booking>,
            Err = Traced<database::Error>,
        >,
    Transacted<Db>: Database<
            Lock<By<Booking, booking::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Booking>, booking::Id>>,
            Ok = Option<Booking>,
            Err = Traced<database::Error>,
        > + Database<Insert<Booking>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Booking;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: DecideBooking) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let DecideBooking {
            booking_id,
            decision,
            initiator_id,
        } = cmd;

        if decision == booking::Status::Pending {
            return Err(tracerr::new!(E::NotADecision));
        }

        self.database()
            .execute(Select(By::<Option<User>, _>::new(initiator_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::UserNotExists(initiator_id))
            .map_err(tracerr::wrap!())
            .map(drop)?;

        self.database()
            .execute(Select(By::<Option<Booking>, _>::new(booking_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::BookingNotExists(booking_id))
            .map_err(tracerr::wrap!())
            .map(drop)?;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent decisions upon the same `Booking`.
        tx.execute(Lock(By::new(booking_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut booking = tx
            .execute(Select(By::<Option<Booking>, _>::new(booking_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::BookingNotExists(booking_id))
            .map_err(tracerr::wrap!())?;

        if booking.status != booking::Status::Pending {
            return Err(tracerr::new!(E::AlreadyDecided {
                booking_id,
                status: booking.status,
            }));
        }

        booking.status = decision;

        tx.execute(Insert(booking.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(booking)
    }
}

/// Error of [`DecideBooking`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Booking`] is already decided.
    #[display("`Booking(id: {booking_id})` is already {status}")]
    AlreadyDecided {
        /// ID of the [`Booking`].
        booking_id: booking::Id,

        /// Terminal [`booking::Status`] the [`Booking`] is in.
        status: booking::Status,
    },

    /// [`Booking`] with the provided ID does not exist.
    #[display("`Booking(id: {_0})` does not exist")]
    BookingNotExists(#[error(not(source))] booking::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`booking::Status::Pending`] is not a decision.
    #[display("`PENDING` is not a `Booking` decision")]
    NotADecision,

    /// [`User`] with the provided ID does not exist.
    #[display("`User(id: {_0})` does not exist")]
    UserNotExists(#[error(not(source))] user::Id),
}

#[cfg(test)]
mod spec {
    use crate::{
        command::{
            testing::{self, MockDb, State},
            CreateBooking,
        },
        domain::{booking, user},
        Command as _,
    };

    use super::{DecideBooking, ExecutionError};

    async fn setup() -> (crate::Service<MockDb>, booking::Id, user::Id) {
        let stay = testing::stay(2);
        let stay_id = stay.id;
        let operator = testing::operator();
        let operator_id = operator.id;
        let svc = testing::service(MockDb::new(State {
            stays: vec![stay],
            users: vec![operator],
            ..State::default()
        }));

        let booking = svc
            .execute(CreateBooking {
                stay_id,
                period: testing::period((2025, 7, 1), (2025, 7, 5)),
                adults: 2,
                children: 0,
                rooms: 1,
                guest: testing::guest(),
            })
            .await
            .unwrap();

        (svc, booking.id, operator_id)
    }

    #[tokio::test]
    async fn confirms_pending_booking() {
        let (svc, booking_id, operator_id) = setup().await;

        let booking = svc
            .execute(DecideBooking {
                booking_id,
                decision: booking::Status::Confirmed,
                initiator_id: operator_id,
            })
            .await
            .unwrap();

        assert_eq!(booking.status, booking::Status::Confirmed);
    }

    #[tokio::test]
    async fn rejects_second_decision() {
        let (svc, booking_id, operator_id) = setup().await;

        svc.execute(DecideBooking {
            booking_id,
            decision: booking::Status::Cancelled,
            initiator_id: operator_id,
        })
        .await
        .unwrap();

        let err = svc
            .execute(DecideBooking {
                booking_id,
                decision: booking::Status::Confirmed,
                initiator_id: operator_id,
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::AlreadyDecided {
                status: booking::Status::Cancelled,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn rejects_pending_as_decision() {
        let (svc, booking_id, operator_id) = setup().await;

        let err = svc
            .execute(DecideBooking {
                booking_id,
                decision: booking::Status::Pending,
                initiator_id: operator_id,
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::NotADecision));
    }

    #[tokio::test]
    async fn rejects_unknown_initiator() {
        let (svc, booking_id, _) = setup().await;

        let err = svc
            .execute(DecideBooking {
                booking_id,
                decision: booking::Status::Confirmed,
                initiator_id: user::Id::new(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::UserNotExists(_)));
    }

    #[tokio::test]
    async fn rejects_unknown_booking() {
        let (svc, _, operator_id) = setup().await;

        let err = svc
            .execute(DecideBooking {
                booking_id: booking::Id::new(),
                decision: booking::Status::Confirmed,
                initiator_id: operator_id,
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::BookingNotExists(_)
        ));
    }

    // The lock must serialize decisions, so racing operators cannot both see
    // the `Booking` as pending.
    #[tokio::test(flavor = "multi_thread")]
    async fn concurrent_decisions_pick_one_winner() {
        let (svc, booking_id, operator_id) = setup().await;

        let confirm = {
            let svc = svc.clone();
            tokio::spawn(async move {
                svc.execute(DecideBooking {
                    booking_id,
                    decision: booking::Status::Confirmed,
                    initiator_id: operator_id,
                })
                .await
            })
        };
        let cancel = {
            let svc = svc.clone();
            tokio::spawn(async move {
                svc.execute(DecideBooking {
                    booking_id,
                    decision: booking::Status::Cancelled,
                    initiator_id: operator_id,
                })
                .await
            })
        };

        let (confirm, cancel) =
            (confirm.await.unwrap(), cancel.await.unwrap());

        let succeeded =
            [&confirm, &cancel].into_iter().filter(|r| r.is_ok()).count();
        assert_eq!(succeeded, 1);

        let lost = if confirm.is_ok() { cancel } else { confirm };
        assert!(matches!(
            lost.unwrap_err().as_ref(),
            ExecutionError::AlreadyDecided { .. }
        ));
    }
}
