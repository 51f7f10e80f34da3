//! [`Booking`]-related [`Database`] implementations.

use std::collections::HashMap;

use common::operations::{By, Insert, Lock, Select, Update};
use itertools::Itertools as _;
use postgres_types::ToSql;
use tracerr::Traced;

use crate::{
    domain::{booking, Booking},
    infra::{
        database::{
            self,
            postgres::{Connection, FuzzPattern},
            Postgres,
        },
        Database,
    },
    read,
};

impl<C, IDs> Database<Select<By<HashMap<booking::Id, Booking>, IDs>>>
    for Postgres<C>
where
    C: Connection,
    IDs: AsRef<[booking::Id]>,
{
    type Ok = HashMap<booking::Id, Booking>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<HashMap<booking::Id, Booking>, IDs>>,
    ) -> Result<Self::Ok, Self::Err> {
        let ids = by.into_inner();
        // Avoid subtle change for SQL.
        let ids: &[booking::Id] = ids.as_ref();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let limit = i32::try_from(ids.len()).unwrap();

        const SQL: &str = "\
            SELECT id, stay_id, \
                   check_in, check_out, \
                   adults, children, rooms, \
                   guest_name, guest_email, guest_phone, special_requests, \
                   status, created_at \
            FROM bookings \
            WHERE id IN (SELECT unnest($1::UUID[]) LIMIT $2::INT4) \
            LIMIT $2::INT4";
        Ok(self
            .query(SQL, &[&ids, &limit])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| {
                let id = row.get("id");
                // SAFETY: `bookings` table `CHECK`s the `check_out` day to
                //         follow the `check_in` one.
                #[expect(unsafe_code, reason = "invariants are preserved")]
                let period = unsafe {
                    booking::Period::new_unchecked(
                        row.get("check_in"),
                        row.get("check_out"),
                    )
                };
                (
                    id,
                    Booking {
                        id,
                        stay_id: row.get("stay_id"),
                        period,
                        adults: u16::try_from(row.get::<_, i32>("adults"))
                            .expect("`adults` overflow"),
                        children: u16::try_from(row.get::<_, i32>("children"))
                            .expect("`children` overflow"),
                        rooms: u16::try_from(row.get::<_, i32>("rooms"))
                            .expect("`rooms` overflow"),
                        guest: booking::Guest {
                            name: row.get("guest_name"),
                            email: row.get("guest_email"),
                            phone: row.get("guest_phone"),
                            special_requests: row.get("special_requests"),
                        },
                        status: row.get("status"),
                        created_at: row.get("created_at"),
                    },
                )
            })
            .collect())
    }
}

impl<C> Database<Select<By<Option<Booking>, booking::Id>>> for Postgres<C>
where
    C: Connection,
    Self: Database<
        Select<By<HashMap<booking::Id, Booking>, [booking::Id; 1]>>,
        Ok = HashMap<booking::Id, Booking>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Option<Booking>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Booking>, booking::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self
            .execute(Select(By::new([id])))
            .await
            .map_err(tracerr::wrap!())?
            .remove(&id))
    }
}

impl<C> Database<Insert<Booking>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Booking>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(booking): Insert<Booking>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(booking)).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Booking>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(booking): Update<Booking>,
    ) -> Result<Self::Ok, Self::Err> {
        let Booking {
            id,
            stay_id,
            period,
            adults,
            children,
            rooms,
            guest:
                booking::Guest {
                    name,
                    email,
                    phone,
                    special_requests,
                },
            status,
            created_at,
        } = booking;

        let adults = i32::from(adults);
        let children = i32::from(children);
        let rooms = i32::from(rooms);

        const SQL: &str = "\
            INSERT INTO bookings (\
                id, stay_id, \
                check_in, check_out, \
                adults, children, rooms, \
                guest_name, guest_email, guest_phone, special_requests, \
                status, created_at \
            ) VALUES (\
                $1::UUID, $2::UUID, \
                $3::DATE, $4::DATE, \
                $5::INT4, $6::INT4, $7::INT4, \
                $8::VARCHAR, $9::VARCHAR, $10::VARCHAR, $11::VARCHAR, \
                $12::INT2, $13::TIMESTAMPTZ \
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET stay_id = EXCLUDED.stay_id, \
                check_in = EXCLUDED.check_in, \
                check_out = EXCLUDED.check_out, \
                adults = EXCLUDED.adults, \
                children = EXCLUDED.children, \
                rooms = EXCLUDED.rooms, \
                guest_name = EXCLUDED.guest_name, \
                guest_email = EXCLUDED.guest_email, \
                guest_phone = EXCLUDED.guest_phone, \
                special_requests = EXCLUDED.special_requests, \
                status = EXCLUDED.status, \
                created_at = EXCLUDED.created_at";
        self.exec(
            SQL,
            &[
                &id,
                &stay_id,
                &period.check_in(),
                &period.check_out(),
                &adults,
                &children,
                &rooms,
                &name,
                &email,
                &phone,
                &special_requests,
                &status,
                &created_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Lock<By<Booking, booking::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Booking, booking::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: booking::Id = by.into_inner();

        // `DO NOTHING` wouldn't lock a pre-existing row, letting a second
        // transaction through before the first one commits.
        const SQL: &str = "\
            INSERT INTO bookings_lock \
            VALUES ($1::UUID) \
            ON CONFLICT (id) DO UPDATE \
            SET id = EXCLUDED.id";
        self.query(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C>
    Database<
        Select<By<read::booking::list::Page, read::booking::list::Selector>>,
    > for Postgres<C>
where
    C: Connection,
{
    type Ok = read::booking::list::Page;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::booking::list::Page, read::booking::list::Selector>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let read::booking::list::Selector {
            arguments,
            filter:
                read::booking::list::Filter {
                    status,
                    stay,
                    guest_name,
                },
        } = by.into_inner();

        let limit = i32::try_from(arguments.limit()).unwrap() + 1;

        let mut ps: Vec<&(dyn ToSql + Sync)> = vec![&limit];

        let cursor_idx = arguments.cursor().map(|c| {
            ps.push(c);
            ps.len()
        });
        let status_idx = status.as_ref().map(|s| {
            ps.push(s);
            ps.len()
        });
        let stay_idx = stay.as_ref().map(|s| {
            ps.push(s);
            ps.len()
        });
        let guest_name_idx = guest_name.as_ref().map(|n| {
            ps.push(n);
            ps.len()
        });

        let guest_name_pattern =
            guest_name.as_ref().map(|n| FuzzPattern::new(n.as_ref()));
        let guest_name_pattern_idx = guest_name_pattern.as_ref().map(|n| {
            ps.push(n);
            ps.len()
        });

        let sql = format!(
            "SELECT id \
             FROM bookings \
             WHERE true \
                   {cursor} \
                   {status_filtering} \
                   {stay_filtering} \
                   {guest_name_filtering} \
             ORDER BY {guest_name_ordering} \
                      id {order} \
             LIMIT $1::INT4",
            cursor = cursor_idx.into_iter().format_with("", |idx, f| {
                let op = arguments.kind().operator();
                f(&format_args!("AND id {op} ${idx}::UUID"))
            }),
            order = arguments.kind().order().sql(),
            status_filtering =
                status_idx.into_iter().format_with("", |idx, f| {
                    f(&format_args!("AND status = ${idx}::INT2"))
                }),
            stay_filtering = stay_idx.into_iter().format_with("", |idx, f| {
                f(&format_args!("AND stay_id = ${idx}::UUID"))
            }),
            guest_name_filtering = guest_name_pattern_idx
                .into_iter()
                .format_with("", |idx, f| {
                    f(&format_args!(
                        "AND LOWER(guest_name) \
                         SIMILAR TO LOWER(${idx}::VARCHAR)"
                    ))
                }),
            guest_name_ordering =
                guest_name_idx.into_iter().format_with("", |idx, f| {
                    let order = arguments.kind().order().sql();
                    f(&format_args!(
                        "LEVENSHTEIN(guest_name, ${idx}::VARCHAR, 1, 1, 0) \
                         {order},"
                    ))
                })
        );
        let rows = self
            .query(&sql, ps.as_slice())
            .await
            .map_err(tracerr::wrap!())?;

        let has_more = rows.len() > arguments.limit();
        let edges = rows
            .into_iter()
            .take(arguments.limit())
            .map(|row| {
                let id = row.get("id");
                (id, id)
            })
            .collect::<Vec<_>>();

        Ok(read::booking::list::Page::new(&arguments, edges, has_more))
    }
}

impl<C> Database<Select<By<read::booking::list::TotalCount, ()>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = read::booking::list::TotalCount;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(_): Select<By<read::booking::list::TotalCount, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = "\
            SELECT COUNT(*)::INT4 \
            FROM bookings";
        self.query_opt(SQL, &[])
            .await
            .map_err(tracerr::wrap!())
            .map(|row| row.expect("always exists").get::<_, i32>(0).into())
    }
}

impl<C> Database<Select<By<read::booking::Stats, ()>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = read::booking::Stats;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(_): Select<By<read::booking::Stats, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = "\
            SELECT status, COUNT(*)::INT4 AS count \
            FROM bookings \
            GROUP BY status";
        let mut stats = read::booking::Stats::default();
        for row in self.query(SQL, &[]).await.map_err(tracerr::wrap!())? {
            let count = row.get::<_, i32>("count").into();
            match row.get::<_, booking::Status>("status") {
                booking::Status::Pending => stats.pending = count,
                booking::Status::Confirmed => stats.confirmed = count,
                booking::Status::Cancelled => stats.cancelled = count,
            }
        }
        Ok(stats)
    }
}
