//! In-memory repositories and collaborators shared by the service tests.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::errors::{DatabaseError, Error, Result};
use crate::portfolio::snapshot::{
    FundSnapshot, NewFundSnapshot, SnapshotRepositoryTrait, SnapshotWrite,
};
use crate::portfolio::valuation::{
    HoldingsState, ValuationConfig, ValuationJob, ValuationRepositoryTrait, ValuationService,
    ValuationSummary,
};
use crate::positions::{FundPosition, FundPositionRepositoryTrait, NewFundPosition};
use crate::prices::{FundPriceMap, PriceSourceError, PriceSourceTrait, StaticPriceSource};
use crate::profiles::{ProfileAggregate, ProfileRepositoryTrait, ProfileUpdate};
use crate::utils::FixedClock;

pub fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Friday 2024-06-07 after the cutoff; resolves to that same Friday.
pub fn friday_after_close() -> DateTime<Utc> {
    at(2024, 6, 7, 23, 0)
}

fn stamp() -> NaiveDateTime {
    at(2024, 1, 1, 0, 0).naive_utc()
}

/// Store backing every repository trait with plain vectors.
#[derive(Default)]
pub struct MockRetirementStore {
    positions: Mutex<Vec<FundPosition>>,
    profiles: Mutex<HashMap<String, ProfileAggregate>>,
    snapshots: Mutex<Vec<FundSnapshot>>,
    next_id: AtomicUsize,
    pub fail_writes: AtomicBool,
    pub refresh_calls: AtomicUsize,
    pub snapshot_saves: AtomicUsize,
}

impl MockRetirementStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_positions(self, user_id: &str, holdings: &[(&str, Decimal, Decimal)]) -> Self {
        {
            let mut positions = self.positions.lock().unwrap();
            for (code, units, contribution) in holdings {
                let new = NewFundPosition::new(user_id, code, *contribution, *units);
                positions.push(self.materialize(new));
            }
        }
        self
    }

    /// Seeds a raw row, bypassing code normalization.
    pub fn with_raw_position(self, user_id: &str, fund_code: &str, units: Decimal) -> Self {
        {
            let mut positions = self.positions.lock().unwrap();
            let mut row = self.materialize(NewFundPosition::baseline(user_id, "G"));
            row.fund_code = fund_code.to_string();
            row.units = units;
            positions.push(row);
        }
        self
    }

    pub fn with_profile(self, profile: ProfileAggregate) -> Self {
        self.profiles
            .lock()
            .unwrap()
            .insert(profile.user_id.clone(), profile);
        self
    }

    pub fn positions_of(&self, user_id: &str) -> Vec<FundPosition> {
        let mut rows: Vec<FundPosition> = self
            .positions
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.fund_code.cmp(&b.fund_code));
        rows
    }

    pub fn profile_of(&self, user_id: &str) -> Option<ProfileAggregate> {
        self.profiles.lock().unwrap().get(user_id).cloned()
    }

    pub fn snapshot_rows(&self, user_id: &str) -> Vec<FundSnapshot> {
        self.snapshots
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect()
    }

    pub fn seed_snapshot(&self, row: NewFundSnapshot) {
        let stored = self.stored_snapshot(row);
        self.snapshots.lock().unwrap().push(stored);
    }

    fn materialize(&self, new: NewFundPosition) -> FundPosition {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        FundPosition {
            id: format!("pos-{id}"),
            user_id: new.user_id,
            fund_code: new.fund_code,
            contribution_percent: new.contribution_percent,
            units: new.units,
            cached_price: None,
            cached_market_value: None,
            cached_mix_percent: None,
            last_priced_as_of: None,
            created_at: stamp(),
            updated_at: stamp(),
        }
    }

    fn stored_snapshot(&self, row: NewFundSnapshot) -> FundSnapshot {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        FundSnapshot {
            id: format!("snap-{id}"),
            user_id: row.user_id,
            fund_code: row.fund_code,
            price: row.price,
            units: row.units,
            market_value: row.market_value,
            mix_percent: row.mix_percent,
            contribution_percent_at_capture: row.contribution_percent_at_capture,
            as_of_day: row.as_of_day,
            captured_at: row.captured_at,
        }
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Database(DatabaseError::TransactionFailed(
                "simulated write failure".to_string(),
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl ValuationRepositoryTrait for MockRetirementStore {
    async fn refresh_valuation(
        &self,
        user_id: &str,
        job: ValuationJob,
    ) -> Result<ValuationSummary> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        let mut positions = self.positions.lock().unwrap();
        let mut profiles = self.profiles.lock().unwrap();

        let state = HoldingsState {
            positions: positions
                .iter()
                .filter(|p| p.user_id == user_id)
                .cloned()
                .collect(),
            profile: profiles.get(user_id).cloned(),
        };
        let outcome = job(&state)?;
        self.check_writable()?;

        let writeback = outcome.writeback;
        for update in &writeback.position_updates {
            if let Some(row) = positions.iter_mut().find(|p| p.id == update.position_id) {
                row.cached_price = Some(update.price);
                row.cached_market_value = Some(update.market_value);
                row.cached_mix_percent = Some(update.mix_percent);
                row.last_priced_as_of = Some(writeback.as_of_day);
            }
        }
        if let Some(balance) = writeback.profile_balance {
            if let Some(profile) = profiles.get_mut(user_id) {
                profile.total_balance = Some(balance.total_balance);
                profile.last_updated_at = Some(balance.last_updated_at);
            }
        }
        Ok(outcome.summary)
    }
}

#[async_trait]
impl FundPositionRepositoryTrait for MockRetirementStore {
    fn list_positions(&self, user_id: &str) -> Result<Vec<FundPosition>> {
        Ok(self.positions_of(user_id))
    }

    async fn insert_missing_positions(&self, new_positions: Vec<NewFundPosition>) -> Result<usize> {
        self.check_writable()?;
        let mut positions = self.positions.lock().unwrap();
        let mut created = 0;
        for new in new_positions {
            let exists = positions
                .iter()
                .any(|p| p.user_id == new.user_id && p.fund_code == new.fund_code);
            if !exists {
                positions.push(self.materialize(new));
                created += 1;
            }
        }
        Ok(created)
    }

    async fn replace_positions(
        &self,
        user_id: &str,
        new_positions: Vec<NewFundPosition>,
    ) -> Result<Vec<FundPosition>> {
        self.check_writable()?;
        {
            let mut positions = self.positions.lock().unwrap();
            positions.retain(|p| p.user_id != user_id);
            for new in new_positions {
                positions.push(self.materialize(new));
            }
        }
        Ok(self.positions_of(user_id))
    }
}

#[async_trait]
impl ProfileRepositoryTrait for MockRetirementStore {
    fn get_profile(&self, user_id: &str) -> Result<Option<ProfileAggregate>> {
        Ok(self.profile_of(user_id))
    }

    async fn upsert_profile(&self, update: ProfileUpdate) -> Result<ProfileAggregate> {
        self.check_writable()?;
        let mut profiles = self.profiles.lock().unwrap();
        let entry = profiles
            .entry(update.user_id.clone())
            .or_insert_with(|| legacy_profile(&update.user_id, Decimal::ZERO, &[]));
        entry.employee_contribution_percent = update.employee_contribution_percent;
        entry.employer_match_percent = update.employer_match_percent;
        entry.g_fund_percent = update.g_fund_percent;
        entry.f_fund_percent = update.f_fund_percent;
        entry.c_fund_percent = update.c_fund_percent;
        entry.s_fund_percent = update.s_fund_percent;
        entry.i_fund_percent = update.i_fund_percent;
        entry.current_balance = update.current_balance;
        entry.target_balance = update.target_balance;
        Ok(entry.clone())
    }

    fn list_user_ids(&self) -> Result<Vec<String>> {
        let mut ids: BTreeSet<String> = self.profiles.lock().unwrap().keys().cloned().collect();
        ids.extend(
            self.positions
                .lock()
                .unwrap()
                .iter()
                .map(|p| p.user_id.clone()),
        );
        Ok(ids.into_iter().collect())
    }

    async fn delete_user(&self, user_id: &str) -> Result<usize> {
        self.check_writable()?;
        let mut removed = 0;
        {
            let mut positions = self.positions.lock().unwrap();
            let before = positions.len();
            positions.retain(|p| p.user_id != user_id);
            removed += before - positions.len();
        }
        {
            let mut snapshots = self.snapshots.lock().unwrap();
            let before = snapshots.len();
            snapshots.retain(|s| s.user_id != user_id);
            removed += before - snapshots.len();
        }
        if self.profiles.lock().unwrap().remove(user_id).is_some() {
            removed += 1;
        }
        Ok(removed)
    }
}

#[async_trait]
impl SnapshotRepositoryTrait for MockRetirementStore {
    fn has_snapshots_for_day(&self, user_id: &str, as_of_day: NaiveDate) -> Result<bool> {
        Ok(self
            .snapshots
            .lock()
            .unwrap()
            .iter()
            .any(|s| s.user_id == user_id && s.as_of_day == as_of_day))
    }

    fn get_snapshots_for_day(
        &self,
        user_id: &str,
        as_of_day: NaiveDate,
    ) -> Result<Vec<FundSnapshot>> {
        let mut rows: Vec<FundSnapshot> = self
            .snapshot_rows(user_id)
            .into_iter()
            .filter(|s| s.as_of_day == as_of_day)
            .collect();
        rows.sort_by(|a, b| a.fund_code.cmp(&b.fund_code));
        Ok(rows)
    }

    fn get_snapshots_in_range(
        &self,
        user_id: &str,
        start_day: Option<NaiveDate>,
        end_day: Option<NaiveDate>,
    ) -> Result<Vec<FundSnapshot>> {
        let mut rows: Vec<FundSnapshot> = self
            .snapshot_rows(user_id)
            .into_iter()
            .filter(|s| start_day.map_or(true, |start| s.as_of_day >= start))
            .filter(|s| end_day.map_or(true, |end| s.as_of_day <= end))
            .collect();
        rows.sort_by(|a, b| {
            a.as_of_day
                .cmp(&b.as_of_day)
                .then_with(|| a.fund_code.cmp(&b.fund_code))
        });
        Ok(rows)
    }

    async fn save_day_if_absent(
        &self,
        user_id: &str,
        as_of_day: NaiveDate,
        rows: Vec<NewFundSnapshot>,
    ) -> Result<SnapshotWrite> {
        self.snapshot_saves.fetch_add(1, Ordering::SeqCst);
        self.check_writable()?;
        let mut snapshots = self.snapshots.lock().unwrap();
        if snapshots
            .iter()
            .any(|s| s.user_id == user_id && s.as_of_day == as_of_day)
        {
            return Ok(SnapshotWrite::AlreadyPresent);
        }
        let count = rows.len();
        snapshots.extend(rows.into_iter().map(|row| self.stored_snapshot(row)));
        Ok(SnapshotWrite::Inserted(count))
    }
}

/// Profile carrying only legacy percentages and a balance.
pub fn legacy_profile(
    user_id: &str,
    current_balance: Decimal,
    percents: &[(&str, Decimal)],
) -> ProfileAggregate {
    let percent = |code: &str| {
        percents
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, p)| *p)
            .unwrap_or(Decimal::ZERO)
    };
    ProfileAggregate {
        user_id: user_id.to_string(),
        employee_contribution_percent: None,
        employer_match_percent: None,
        g_fund_percent: percent("G"),
        f_fund_percent: percent("F"),
        c_fund_percent: percent("C"),
        s_fund_percent: percent("S"),
        i_fund_percent: percent("I"),
        current_balance,
        target_balance: None,
        total_balance: None,
        last_updated_at: None,
        created_at: stamp(),
        updated_at: stamp(),
    }
}

/// Always fails with a transport error.
pub struct FailingPriceSource;

#[async_trait]
impl PriceSourceTrait for FailingPriceSource {
    fn id(&self) -> &'static str {
        "FAILING"
    }

    async fn get_current_prices(&self) -> std::result::Result<FundPriceMap, PriceSourceError> {
        Err(PriceSourceError::Transport {
            source_id: "FAILING".to_string(),
            message: "connection refused".to_string(),
        })
    }
}

/// Answers with fixed prices after a delay.
pub struct SlowPriceSource {
    pub delay: Duration,
    pub inner: StaticPriceSource,
}

#[async_trait]
impl PriceSourceTrait for SlowPriceSource {
    fn id(&self) -> &'static str {
        "SLOW"
    }

    async fn get_current_prices(&self) -> std::result::Result<FundPriceMap, PriceSourceError> {
        tokio::time::sleep(self.delay).await;
        self.inner.get_current_prices().await
    }
}

pub fn static_prices(entries: &[(&str, Decimal)]) -> Arc<StaticPriceSource> {
    Arc::new(StaticPriceSource::new(entries.iter().copied()))
}

pub fn valuation_service(
    store: Arc<MockRetirementStore>,
    prices: Arc<dyn PriceSourceTrait>,
    clock: Arc<FixedClock>,
) -> ValuationService {
    ValuationService::new(store, prices, clock, ValuationConfig::default())
}
