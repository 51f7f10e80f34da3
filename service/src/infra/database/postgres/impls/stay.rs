//! [`Stay`]-related [`Database`] implementations.

use std::collections::HashMap;

use common::{
    operations::{By, Insert, Lock, Select, Update},
    Money,
};
use itertools::Itertools as _;
use postgres_types::ToSql;
use tracerr::Traced;

use crate::{
    domain::{booking, stay, Stay},
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

impl<C, IDs> Database<Select<By<HashMap<stay::Id, Stay>, IDs>>> for Postgres<C>
where
    C: Connection,
    IDs: AsRef<[stay::Id]>,
{
    type Ok = HashMap<stay::Id, Stay>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<HashMap<stay::Id, Stay>, IDs>>,
    ) -> Result<Self::Ok, Self::Err> {
        let ids = by.into_inner();
        // Avoid subtle change for SQL.
        let ids: &[stay::Id] = ids.as_ref();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let limit = i32::try_from(ids.len()).unwrap();

        const SQL: &str = "\
            SELECT id, slug, name, \
                   short_description, long_description, \
                   price_per_night, price_currency, \
                   max_adults, max_children, total_rooms, \
                   amenities, images, is_featured, \
                   created_at \
            FROM stays \
            WHERE id IN (SELECT unnest($1::UUID[]) LIMIT $2::INT4) \
            LIMIT $2::INT4";
        Ok(self
            .query(SQL, &[&ids, &limit])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| {
                let id = row.get("id");
                let price = Money {
                    amount: row.get("price_per_night"),
                    currency: row.get("price_currency"),
                };
                // SAFETY: `stays` table `CHECK`s the price to be positive.
                #[expect(unsafe_code, reason = "invariants are preserved")]
                let price_per_night =
                    unsafe { stay::Price::new_unchecked(price) };
                (
                    id,
                    Stay {
                        id,
                        slug: row.get("slug"),
                        name: row.get("name"),
                        short_description: row.get("short_description"),
                        long_description: row.get("long_description"),
                        price_per_night,
                        max_adults: u16::try_from(
                            row.get::<_, i32>("max_adults"),
                        )
                        .expect("`max_adults` overflow"),
                        max_children: u16::try_from(
                            row.get::<_, i32>("max_children"),
                        )
                        .expect("`max_children` overflow"),
                        total_rooms: u16::try_from(
                            row.get::<_, i32>("total_rooms"),
                        )
                        .expect("`total_rooms` overflow"),
                        amenities: row.get("amenities"),
                        images: row.get("images"),
                        is_featured: row.get("is_featured"),
                        created_at: row.get("created_at"),
                    },
                )
            })
            .collect())
    }
}

impl<C> Database<Select<By<Option<Stay>, stay::Id>>> for Postgres<C>
where
    C: Connection,
    Self: Database<
        Select<By<HashMap<stay::Id, Stay>, [stay::Id; 1]>>,
        Ok = HashMap<stay::Id, Stay>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Option<Stay>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Stay>, stay::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self
            .execute(Select(By::new([id])))
            .await
            .map_err(tracerr::wrap!())?
            .remove(&id))
    }
}

impl<'s, C> Database<Select<By<Option<Stay>, &'s stay::Slug>>> for Postgres<C>
where
    C: Connection,
    Self: Database<
        Select<By<Option<Stay>, stay::Id>>,
        Ok = Option<Stay>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Option<Stay>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Stay>, &'s stay::Slug>>,
    ) -> Result<Self::Ok, Self::Err> {
        let slug = by.into_inner();

        const SQL: &str = "\
            SELECT id \
            FROM stays \
            WHERE slug = $1::VARCHAR \
            LIMIT 1";
        let Some(row) = self
            .query_opt(SQL, &[&slug])
            .await
            .map_err(tracerr::wrap!())?
        else {
            return Ok(None);
        };

        self.execute(Select(By::new(row.get::<_, stay::Id>("id"))))
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Select<By<Option<Stay>, stay::Slug>>> for Postgres<C>
where
    C: Connection,
    Self: for<'s> Database<
        Select<By<Option<Stay>, &'s stay::Slug>>,
        Ok = Option<Stay>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Option<Stay>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Stay>, stay::Slug>>,
    ) -> Result<Self::Ok, Self::Err> {
        let slug = by.into_inner();
        self.execute(Select(By::new(&slug)))
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Insert<Stay>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Stay>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(stay): Insert<Stay>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(stay)).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Stay>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(stay): Update<Stay>,
    ) -> Result<Self::Ok, Self::Err> {
        let Stay {
            id,
            slug,
            name,
            short_description,
            long_description,
            price_per_night,
            max_adults,
            max_children,
            total_rooms,
            amenities,
            images,
            is_featured,
            created_at,
        } = stay;

        let price = price_per_night.money();
        let max_adults = i32::from(max_adults);
        let max_children = i32::from(max_children);
        let total_rooms = i32::from(total_rooms);

        const SQL: &str = "\
            INSERT INTO stays (\
                id, slug, name, \
                short_description, long_description, \
                price_per_night, price_currency, \
                max_adults, max_children, total_rooms, \
                amenities, images, is_featured, \
                created_at \
            ) VALUES (\
                $1::UUID, $2::VARCHAR, $3::VARCHAR, \
                $4::VARCHAR, $5::VARCHAR, \
                $6::NUMERIC, $7::INT2, \
                $8::INT4, $9::INT4, $10::INT4, \
                $11::INT2[], $12::VARCHAR[], $13::BOOLEAN, \
                $14::TIMESTAMPTZ \
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET slug = EXCLUDED.slug, \
                name = EXCLUDED.name, \
                short_description = EXCLUDED.short_description, \
                long_description = EXCLUDED.long_description, \
                price_per_night = EXCLUDED.price_per_night, \
                price_currency = EXCLUDED.price_currency, \
                max_adults = EXCLUDED.max_adults, \
                max_children = EXCLUDED.max_children, \
                total_rooms = EXCLUDED.total_rooms, \
                amenities = EXCLUDED.amenities, \
                images = EXCLUDED.images, \
                is_featured = EXCLUDED.is_featured, \
                created_at = EXCLUDED.created_at";
        self.exec(
            SQL,
            &[
                &id,
                &slug,
                &name,
                &short_description,
                &long_description,
                &price.amount,
                &price.currency,
                &max_adults,
                &max_children,
                &total_rooms,
                &amenities,
                &images,
                &is_featured,
                &created_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Lock<By<Stay, stay::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Stay, stay::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: stay::Id = by.into_inner();

        // `DO NOTHING` wouldn't lock a pre-existing row, letting a second
        // transaction through before the first one commits.
        const SQL: &str = "\
            INSERT INTO stays_lock \
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
    Database<Select<By<read::stay::RoomsBooked, (stay::Id, booking::Period)>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = read::stay::RoomsBooked;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::stay::RoomsBooked, (stay::Id, booking::Period)>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let (stay_id, period) = by.into_inner();

        const SQL: &str = "\
            SELECT COALESCE(SUM(rooms), 0)::INT8 \
            FROM bookings \
            WHERE stay_id = $1::UUID \
              AND status <> $2::INT2 \
              AND check_in < $4::DATE \
              AND check_out > $3::DATE";
        self.query_opt(
            SQL,
            &[
                &stay_id,
                &booking::Status::Cancelled,
                &period.check_in(),
                &period.check_out(),
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(|row| row.expect("always exists").get::<_, i64>(0).into())
    }
}

impl<C>
    Database<
        Select<By<Vec<(Stay, read::stay::RoomsBooked)>, booking::Period>>,
    > for Postgres<C>
where
    C: Connection,
    Self: for<'i> Database<
        Select<By<HashMap<stay::Id, Stay>, &'i [stay::Id]>>,
        Ok = HashMap<stay::Id, Stay>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Vec<(Stay, read::stay::RoomsBooked)>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<Vec<(Stay, read::stay::RoomsBooked)>, booking::Period>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let period: booking::Period = by.into_inner();

        const SQL: &str = "\
            SELECT s.id AS id, \
                   COALESCE(SUM(b.rooms), 0)::INT8 AS rooms_booked \
            FROM stays AS s \
            LEFT JOIN bookings AS b \
                   ON b.stay_id = s.id \
                  AND b.status <> $1::INT2 \
                  AND b.check_in < $3::DATE \
                  AND b.check_out > $2::DATE \
            GROUP BY s.id";
        let occupancy = self
            .query(
                SQL,
                &[
                    &booking::Status::Cancelled,
                    &period.check_in(),
                    &period.check_out(),
                ],
            )
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| {
                (
                    row.get::<_, stay::Id>("id"),
                    row.get::<_, i64>("rooms_booked"),
                )
            })
            .collect::<Vec<_>>();

        let ids = occupancy.iter().map(|(id, _)| *id).collect::<Vec<_>>();
        let mut stays = self
            .execute(Select(By::new(ids.as_slice())))
            .await
            .map_err(tracerr::wrap!())?;

        Ok(occupancy
            .into_iter()
            .filter_map(|(id, booked)| {
                stays.remove(&id).map(|stay| (stay, booked.into()))
            })
            .collect())
    }
}

impl<C>
    Database<Select<By<read::stay::list::Page, read::stay::list::Selector>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = read::stay::list::Page;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::stay::list::Page, read::stay::list::Selector>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let read::stay::list::Selector {
            arguments,
            filter: read::stay::list::Filter { featured, name },
        } = by.into_inner();

        let limit = i32::try_from(arguments.limit()).unwrap() + 1;

        let mut ps: Vec<&(dyn ToSql + Sync)> = vec![&limit];

        let cursor_idx = arguments.cursor().map(|c| {
            ps.push(c);
            ps.len()
        });
        let featured_idx = featured.as_ref().map(|f| {
            ps.push(f);
            ps.len()
        });
        let name_idx = name.as_ref().map(|n| {
            ps.push(n);
            ps.len()
        });

        let name_pattern = name.as_ref().map(|n| FuzzPattern::new(n.as_ref()));
        let name_pattern_idx = name_pattern.as_ref().map(|n| {
            ps.push(n);
            ps.len()
        });

        let sql = format!(
            "SELECT id \
             FROM stays \
             WHERE true \
                   {cursor} \
                   {featured_filtering} \
                   {name_filtering} \
             ORDER BY {name_ordering} \
                      id {order} \
             LIMIT $1::INT4",
            cursor = cursor_idx.into_iter().format_with("", |idx, f| {
                let op = arguments.kind().operator();
                f(&format_args!("AND id {op} ${idx}::UUID"))
            }),
            order = arguments.kind().order().sql(),
            featured_filtering =
                featured_idx.into_iter().format_with("", |idx, f| {
                    f(&format_args!("AND is_featured = ${idx}::BOOLEAN"))
                }),
            name_filtering =
                name_pattern_idx.into_iter().format_with("", |idx, f| {
                    f(&format_args!(
                        "AND LOWER(name) SIMILAR TO LOWER(${idx}::VARCHAR)"
                    ))
                }),
            name_ordering = name_idx.into_iter().format_with("", |idx, f| {
                let order = arguments.kind().order().sql();
                f(&format_args!(
                    "LEVENSHTEIN(name, ${idx}::VARCHAR, 1, 1, 0) {order},"
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

        Ok(read::stay::list::Page::new(&arguments, edges, has_more))
    }
}

impl<C> Database<Select<By<read::stay::list::TotalCount, ()>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = read::stay::list::TotalCount;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(_): Select<By<read::stay::list::TotalCount, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = "\
            SELECT COUNT(*)::INT4 \
            FROM stays";
        self.query_opt(SQL, &[])
            .await
            .map_err(tracerr::wrap!())
            .map(|row| row.expect("always exists").get::<_, i32>(0).into())
    }
}
