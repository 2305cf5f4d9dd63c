use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::SqliteConnection;
use std::sync::Arc;
use uuid::Uuid;

use nestegg_core::errors::Result;
use nestegg_core::funds::normalize_fund_code;
use nestegg_core::positions::{FundPosition, FundPositionRepositoryTrait, NewFundPosition};

use super::model::FundPositionDB;
use crate::db::{get_connection, WriteHandle};
use crate::errors::{IntoCore, StorageError};
use crate::schema::fund_positions;

pub struct FundPositionRepository {
    pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl FundPositionRepository {
    pub fn new(pool: Arc<Pool<ConnectionManager<SqliteConnection>>>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

/// Loads a user's rows on an existing connection, ordered by fund code.
pub(crate) fn load_positions(
    conn: &mut SqliteConnection,
    owner: &str,
) -> Result<Vec<FundPositionDB>> {
    fund_positions::table
        .filter(fund_positions::user_id.eq(owner))
        .order(fund_positions::fund_code.asc())
        .select(FundPositionDB::as_select())
        .load::<FundPositionDB>(conn)
        .into_core()
}

/// Validates and canonicalizes input rows before they reach the writer.
fn prepare_rows(positions: Vec<NewFundPosition>) -> Result<Vec<FundPositionDB>> {
    let now = Utc::now().naive_utc();
    positions
        .into_iter()
        .map(|mut new| {
            new.fund_code = normalize_fund_code(&new.fund_code);
            new.validate()?;
            Ok(FundPositionDB::from_new(
                Uuid::now_v7().to_string(),
                new,
                now,
            ))
        })
        .collect()
}

#[async_trait]
impl FundPositionRepositoryTrait for FundPositionRepository {
    fn list_positions(&self, user_id: &str) -> Result<Vec<FundPosition>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = load_positions(&mut conn, user_id)?;
        Ok(rows.into_iter().map(FundPosition::from).collect())
    }

    async fn insert_missing_positions(&self, positions: Vec<NewFundPosition>) -> Result<usize> {
        let rows = prepare_rows(positions)?;
        if rows.is_empty() {
            return Ok(0);
        }

        self.writer
            .exec(move |conn| -> Result<usize> {
                let mut created = 0;
                for row in &rows {
                    // The (user_id, fund_code) unique index turns duplicates into no-ops.
                    created += diesel::insert_or_ignore_into(fund_positions::table)
                        .values(row)
                        .execute(conn)
                        .map_err(StorageError::from)?;
                }
                Ok(created)
            })
            .await
    }

    async fn replace_positions(
        &self,
        user_id: &str,
        positions: Vec<NewFundPosition>,
    ) -> Result<Vec<FundPosition>> {
        let owner = user_id.to_string();
        let rows = prepare_rows(
            positions
                .into_iter()
                .map(|new| NewFundPosition {
                    user_id: owner.clone(),
                    ..new
                })
                .collect(),
        )?;

        self.writer
            .exec(move |conn| -> Result<Vec<FundPosition>> {
                diesel::delete(fund_positions::table.filter(fund_positions::user_id.eq(&owner)))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                if !rows.is_empty() {
                    diesel::insert_into(fund_positions::table)
                        .values(&rows)
                        .execute(conn)
                        .map_err(StorageError::from)?;
                }
                let stored = load_positions(conn, &owner)?;
                Ok(stored.into_iter().map(FundPosition::from).collect())
            })
            .await
    }
}
