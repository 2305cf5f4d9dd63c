use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::SqliteConnection;
use log::info;
use std::collections::BTreeSet;
use std::sync::Arc;

use nestegg_core::errors::Result;
use nestegg_core::profiles::{ProfileAggregate, ProfileRepositoryTrait, ProfileUpdate};

use super::model::{RetirementProfileChangeset, RetirementProfileDB};
use crate::db::{get_connection, WriteHandle};
use crate::errors::{IntoCore, StorageError};
use crate::schema::{fund_positions, fund_snapshots, retirement_profiles};
use crate::utils::timestamp_to_text;

pub struct ProfileRepository {
    pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl ProfileRepository {
    pub fn new(pool: Arc<Pool<ConnectionManager<SqliteConnection>>>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

/// Loads a user's profile on an existing connection.
pub(crate) fn load_profile(
    conn: &mut SqliteConnection,
    owner: &str,
) -> Result<Option<RetirementProfileDB>> {
    retirement_profiles::table
        .find(owner)
        .select(RetirementProfileDB::as_select())
        .first::<RetirementProfileDB>(conn)
        .optional()
        .into_core()
}

#[async_trait]
impl ProfileRepositoryTrait for ProfileRepository {
    fn get_profile(&self, user_id: &str) -> Result<Option<ProfileAggregate>> {
        let mut conn = get_connection(&self.pool)?;
        Ok(load_profile(&mut conn, user_id)?.map(ProfileAggregate::from))
    }

    async fn upsert_profile(&self, profile: ProfileUpdate) -> Result<ProfileAggregate> {
        profile.validate()?;
        let now = timestamp_to_text(Utc::now().naive_utc());
        let owner = profile.user_id.clone();
        let changes = RetirementProfileChangeset::new(&profile, now.clone());

        self.writer
            .exec(move |conn| -> Result<ProfileAggregate> {
                diesel::insert_into(retirement_profiles::table)
                    .values(changes.clone().into_new_row(owner.clone(), now))
                    .on_conflict(retirement_profiles::user_id)
                    .do_update()
                    .set(&changes)
                    .execute(conn)
                    .map_err(StorageError::from)?;

                let stored = retirement_profiles::table
                    .find(&owner)
                    .select(RetirementProfileDB::as_select())
                    .first::<RetirementProfileDB>(conn)
                    .map_err(StorageError::from)?;
                Ok(ProfileAggregate::from(stored))
            })
            .await
    }

    fn list_user_ids(&self) -> Result<Vec<String>> {
        let mut conn = get_connection(&self.pool)?;
        let mut ids: BTreeSet<String> = retirement_profiles::table
            .select(retirement_profiles::user_id)
            .load::<String>(&mut conn)
            .map_err(StorageError::from)?
            .into_iter()
            .collect();
        ids.extend(
            fund_positions::table
                .select(fund_positions::user_id)
                .distinct()
                .load::<String>(&mut conn)
                .map_err(StorageError::from)?,
        );
        Ok(ids.into_iter().collect())
    }

    async fn delete_user(&self, user_id: &str) -> Result<usize> {
        let owner = user_id.to_string();
        let removed = self
            .writer
            .exec(move |conn| -> Result<usize> {
                let snapshots = diesel::delete(
                    fund_snapshots::table.filter(fund_snapshots::user_id.eq(&owner)),
                )
                .execute(conn)
                .map_err(StorageError::from)?;
                let positions = diesel::delete(
                    fund_positions::table.filter(fund_positions::user_id.eq(&owner)),
                )
                .execute(conn)
                .map_err(StorageError::from)?;
                let profiles = diesel::delete(retirement_profiles::table.find(&owner))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(snapshots + positions + profiles)
            })
            .await?;

        info!("Deleted {} row(s) for user '{}'", removed, user_id);
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::create_test_database;
    use crate::{FundPositionRepository, SnapshotRepository};
    use chrono::NaiveDate;
    use nestegg_core::portfolio::snapshot::{NewFundSnapshot, SnapshotRepositoryTrait};
    use nestegg_core::positions::{FundPositionRepositoryTrait, NewFundPosition};
    use rust_decimal_macros::dec;

    fn profile_update(user_id: &str, balance: rust_decimal::Decimal) -> ProfileUpdate {
        ProfileUpdate {
            g_fund_percent: dec!(40),
            c_fund_percent: dec!(60),
            current_balance: balance,
            ..ProfileUpdate::new(user_id)
        }
    }

    #[tokio::test]
    async fn test_upsert_creates_then_updates() {
        let (pool, writer, _dir) = create_test_database();
        let repo = ProfileRepository::new(pool, writer);

        let created = repo
            .upsert_profile(profile_update("alice", dec!(10000)))
            .await
            .unwrap();
        let updated = repo
            .upsert_profile(profile_update("alice", dec!(12000)))
            .await
            .unwrap();

        assert_eq!(created.current_balance, dec!(10000));
        assert_eq!(updated.current_balance, dec!(12000));
        assert_eq!(updated.g_fund_percent, dec!(40));
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.total_balance.is_none());
        assert_eq!(
            repo.get_profile("alice").unwrap().unwrap().current_balance,
            dec!(12000)
        );
        assert!(repo.get_profile("bob").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_user_removes_every_table_and_lists_remaining_users() {
        let (pool, writer, _dir) = create_test_database();
        let profiles = ProfileRepository::new(pool.clone(), writer.clone());
        let positions = FundPositionRepository::new(pool.clone(), writer.clone());
        let snapshots = SnapshotRepository::new(pool, writer);

        profiles
            .upsert_profile(profile_update("alice", dec!(100)))
            .await
            .unwrap();
        positions
            .insert_missing_positions(vec![
                NewFundPosition::baseline("alice", "G"),
                NewFundPosition::baseline("carol", "C"),
            ])
            .await
            .unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 6, 7).unwrap();
        snapshots
            .save_day_if_absent(
                "alice",
                day,
                vec![NewFundSnapshot {
                    user_id: "alice".to_string(),
                    fund_code: "G".to_string(),
                    price: Some(dec!(10)),
                    units: Some(dec!(1)),
                    market_value: dec!(10),
                    mix_percent: dec!(100),
                    contribution_percent_at_capture: dec!(0),
                    as_of_day: day,
                    captured_at: day.and_hms_opt(23, 0, 0).unwrap(),
                }],
            )
            .await
            .unwrap();

        assert_eq!(profiles.list_user_ids().unwrap(), vec!["alice", "carol"]);

        let removed = profiles.delete_user("alice").await.unwrap();

        assert_eq!(removed, 3);
        assert!(profiles.get_profile("alice").unwrap().is_none());
        assert!(positions.list_positions("alice").unwrap().is_empty());
        assert!(!snapshots.has_snapshots_for_day("alice", day).unwrap());
        assert_eq!(profiles.list_user_ids().unwrap(), vec!["carol"]);
    }
}
