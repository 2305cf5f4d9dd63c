use async_trait::async_trait;
use chrono::NaiveDate;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::SqliteConnection;
use log::debug;
use std::sync::Arc;
use uuid::Uuid;

use nestegg_core::errors::Result;
use nestegg_core::portfolio::snapshot::{
    FundSnapshot, NewFundSnapshot, SnapshotRepositoryTrait, SnapshotWrite,
};

use super::model::FundSnapshotDB;
use crate::db::{get_connection, WriteHandle};
use crate::errors::{IntoCore, StorageError};
use crate::schema::fund_snapshots;
use crate::utils::day_to_text;

pub struct SnapshotRepository {
    pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl SnapshotRepository {
    pub fn new(pool: Arc<Pool<ConnectionManager<SqliteConnection>>>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

fn day_exists(conn: &mut SqliteConnection, owner: &str, day: &str) -> Result<bool> {
    diesel::select(diesel::dsl::exists(
        fund_snapshots::table
            .filter(fund_snapshots::user_id.eq(owner))
            .filter(fund_snapshots::as_of_day.eq(day)),
    ))
    .get_result::<bool>(conn)
    .into_core()
}

#[async_trait]
impl SnapshotRepositoryTrait for SnapshotRepository {
    fn has_snapshots_for_day(&self, user_id: &str, as_of_day: NaiveDate) -> Result<bool> {
        let mut conn = get_connection(&self.pool)?;
        day_exists(&mut conn, user_id, &day_to_text(as_of_day))
    }

    fn get_snapshots_for_day(
        &self,
        user_id: &str,
        as_of_day: NaiveDate,
    ) -> Result<Vec<FundSnapshot>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = fund_snapshots::table
            .filter(fund_snapshots::user_id.eq(user_id))
            .filter(fund_snapshots::as_of_day.eq(day_to_text(as_of_day)))
            .order(fund_snapshots::fund_code.asc())
            .select(FundSnapshotDB::as_select())
            .load::<FundSnapshotDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(FundSnapshot::from).collect())
    }

    fn get_snapshots_in_range(
        &self,
        user_id: &str,
        start_day: Option<NaiveDate>,
        end_day: Option<NaiveDate>,
    ) -> Result<Vec<FundSnapshot>> {
        let mut conn = get_connection(&self.pool)?;
        let mut query = fund_snapshots::table
            .filter(fund_snapshots::user_id.eq(user_id))
            .into_boxed();
        // Days are stored as zero-padded ISO text, so lexical order is date order.
        if let Some(start) = start_day {
            query = query.filter(fund_snapshots::as_of_day.ge(day_to_text(start)));
        }
        if let Some(end) = end_day {
            query = query.filter(fund_snapshots::as_of_day.le(day_to_text(end)));
        }

        let rows = query
            .order((
                fund_snapshots::as_of_day.asc(),
                fund_snapshots::fund_code.asc(),
            ))
            .select(FundSnapshotDB::as_select())
            .load::<FundSnapshotDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(FundSnapshot::from).collect())
    }

    async fn save_day_if_absent(
        &self,
        user_id: &str,
        as_of_day: NaiveDate,
        snapshots: Vec<NewFundSnapshot>,
    ) -> Result<SnapshotWrite> {
        let owner = user_id.to_string();
        let day = day_to_text(as_of_day);
        let rows: Vec<FundSnapshotDB> = snapshots
            .into_iter()
            .map(|snapshot| {
                FundSnapshotDB::from_new(
                    Uuid::now_v7().to_string(),
                    NewFundSnapshot {
                        user_id: owner.clone(),
                        as_of_day,
                        ..snapshot
                    },
                )
            })
            .collect();

        self.writer
            .exec(move |conn| -> Result<SnapshotWrite> {
                // Re-checked under the write lock: a set committed by another
                // writer since the caller's check wins.
                if day_exists(conn, &owner, &day)? {
                    debug!("Snapshot set for '{}' on {} already present", owner, day);
                    return Ok(SnapshotWrite::AlreadyPresent);
                }

                if rows.is_empty() {
                    return Ok(SnapshotWrite::Inserted(0));
                }
                // Any conflict fails the whole set and rolls the transaction back.
                let inserted = diesel::insert_into(fund_snapshots::table)
                    .values(&rows)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(SnapshotWrite::Inserted(inserted))
            })
            .await
    }
}
