use rust_decimal_macros::dec;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use crate::portfolio::snapshot::{
    CaptureOutcome, NewFundSnapshot, SnapshotService, SnapshotServiceTrait,
};
use crate::portfolio::valuation::{FundSummaryItem, ValuationServiceTrait};
use crate::test_support::{
    at, day, friday_after_close, legacy_profile, static_prices, valuation_service,
    MockRetirementStore,
};
use crate::utils::FixedClock;

fn store() -> Arc<MockRetirementStore> {
    Arc::new(MockRetirementStore::new().with_positions(
        "alice",
        &[("G", dec!(100), dec!(50)), ("C", dec!(50), dec!(50))],
    ))
}

fn snapshot_service(
    store: Arc<MockRetirementStore>,
    clock: Arc<FixedClock>,
    prices: &[(&str, rust_decimal::Decimal)],
) -> SnapshotService {
    let valuation: Arc<dyn ValuationServiceTrait> = Arc::new(valuation_service(
        store.clone(),
        static_prices(prices),
        clock.clone(),
    ));
    SnapshotService::new(store, valuation, clock)
}

fn item(code: &str, market_value: rust_decimal::Decimal) -> FundSummaryItem {
    FundSummaryItem {
        fund_code: code.to_string(),
        price: Some(dec!(10)),
        units: Some(market_value / dec!(10)),
        market_value,
        mix_percent: dec!(0),
        contribution_percent: dec!(0),
    }
}

#[tokio::test]
async fn test_capture_twice_writes_one_set() {
    let store = store();
    let clock = Arc::new(FixedClock::new(friday_after_close()));
    let service = snapshot_service(store.clone(), clock, &[("G", dec!(10)), ("C", dec!(20))]);

    let first = service.capture_if_absent("alice").await.unwrap();
    let second = service.capture_if_absent("alice").await.unwrap();

    assert_eq!(
        first,
        CaptureOutcome::Captured {
            as_of_day: day(2024, 6, 7),
            rows: 2
        }
    );
    assert_eq!(
        second,
        CaptureOutcome::AlreadyCaptured {
            as_of_day: day(2024, 6, 7)
        }
    );
    assert_eq!(store.snapshot_rows("alice").len(), 2);
    // The second call never reached the valuation engine.
    assert_eq!(store.refresh_calls.load(Ordering::SeqCst), 1);
    assert_eq!(store.snapshot_saves.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_captured_rows_mirror_the_summary() {
    let store = store();
    let clock = Arc::new(FixedClock::new(friday_after_close()));
    let service = snapshot_service(store.clone(), clock, &[("G", dec!(10)), ("C", dec!(20))]);

    service.capture_if_absent("alice").await.unwrap();

    let rows = service
        .get_snapshots_for_day("alice", day(2024, 6, 7))
        .unwrap();
    assert_eq!(rows.len(), 2);
    let g = rows.iter().find(|r| r.fund_code == "G").unwrap();
    assert_eq!(g.price, Some(dec!(10)));
    assert_eq!(g.units, Some(dec!(100)));
    assert_eq!(g.market_value, dec!(1000));
    assert_eq!(g.mix_percent, dec!(50));
    assert_eq!(g.contribution_percent_at_capture, dec!(50));
    assert_eq!(g.captured_at, friday_after_close().naive_utc());
}

#[tokio::test]
async fn test_nothing_to_capture_without_prices() {
    let store = store();
    let clock = Arc::new(FixedClock::new(friday_after_close()));
    let service = snapshot_service(store.clone(), clock, &[]);

    let outcome = service.capture_if_absent("alice").await.unwrap();

    assert_eq!(
        outcome,
        CaptureOutcome::NothingToCapture {
            as_of_day: day(2024, 6, 7)
        }
    );
    assert!(store.snapshot_rows("alice").is_empty());
    assert_eq!(store.snapshot_saves.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_legacy_holdings_are_captured() {
    let store = Arc::new(MockRetirementStore::new().with_profile(legacy_profile(
        "bob",
        dec!(10000),
        &[("G", dec!(40)), ("C", dec!(60))],
    )));
    let clock = Arc::new(FixedClock::new(friday_after_close()));
    let service = snapshot_service(
        store.clone(),
        clock,
        &[("G", dec!(10)), ("C", dec!(20))],
    );

    let outcome = service.capture_if_absent("bob").await.unwrap();

    assert_eq!(
        outcome,
        CaptureOutcome::Captured {
            as_of_day: day(2024, 6, 7),
            rows: 2
        }
    );
    let rows = store.snapshot_rows("bob");
    let total: rust_decimal::Decimal = rows.iter().map(|r| r.market_value).sum();
    assert_eq!(total, dec!(10000));
    assert!(rows.iter().all(|r| r.price.is_some() && r.units.is_some()));
    assert!(store.positions_of("bob").is_empty());
}

#[tokio::test]
async fn test_legacy_capture_waits_for_prices() {
    let store = Arc::new(MockRetirementStore::new().with_profile(legacy_profile(
        "bob",
        dec!(10000),
        &[("G", dec!(40)), ("C", dec!(60))],
    )));
    let clock = Arc::new(FixedClock::new(friday_after_close()));

    let during_outage = snapshot_service(store.clone(), clock.clone(), &[]);
    let first = during_outage.capture_if_absent("bob").await.unwrap();
    assert_eq!(
        first,
        CaptureOutcome::NothingToCapture {
            as_of_day: day(2024, 6, 7)
        }
    );
    assert!(store.snapshot_rows("bob").is_empty());

    let partly_priced = snapshot_service(store.clone(), clock.clone(), &[("G", dec!(10))]);
    let second = partly_priced.capture_if_absent("bob").await.unwrap();
    assert!(matches!(second, CaptureOutcome::NothingToCapture { .. }));
    assert!(store.snapshot_rows("bob").is_empty());

    let recovered = snapshot_service(store.clone(), clock, &[("G", dec!(10)), ("C", dec!(20))]);
    let third = recovered.capture_if_absent("bob").await.unwrap();
    assert!(matches!(third, CaptureOutcome::Captured { rows: 2, .. }));
    assert_eq!(store.snapshot_rows("bob").len(), 2);
}

#[tokio::test]
async fn test_concurrent_captures_produce_one_set() {
    let store = store();
    let clock = Arc::new(FixedClock::new(friday_after_close()));
    let prices = [("G", dec!(10)), ("C", dec!(20))];
    // Separate services share nothing but the store.
    let a = Arc::new(snapshot_service(store.clone(), clock.clone(), &prices));
    let b = Arc::new(snapshot_service(store.clone(), clock, &prices));

    let (first, second) = tokio::join!(a.capture_if_absent("alice"), b.capture_if_absent("alice"));
    let outcomes = [first.unwrap(), second.unwrap()];

    let captured = outcomes
        .iter()
        .filter(|o| matches!(o, CaptureOutcome::Captured { .. }))
        .count();
    assert_eq!(captured, 1);
    assert_eq!(store.snapshot_rows("alice").len(), 2);
}

#[tokio::test]
async fn test_next_trading_day_gets_its_own_set() {
    let store = store();
    let clock = Arc::new(FixedClock::new(friday_after_close()));
    let service = snapshot_service(
        store.clone(),
        clock.clone(),
        &[("G", dec!(10)), ("C", dec!(20))],
    );

    service.capture_if_absent("alice").await.unwrap();
    // Weekend captures resolve to Friday and are no-ops.
    clock.set(at(2024, 6, 9, 12, 0));
    assert!(matches!(
        service.capture_if_absent("alice").await.unwrap(),
        CaptureOutcome::AlreadyCaptured { .. }
    ));
    clock.set(at(2024, 6, 10, 22, 30));
    let monday = service.capture_if_absent("alice").await.unwrap();

    assert_eq!(monday.as_of_day(), day(2024, 6, 10));
    assert_eq!(store.snapshot_rows("alice").len(), 4);
}

#[tokio::test]
async fn test_write_failure_leaves_no_rows() {
    let store = store();
    let clock = Arc::new(FixedClock::new(friday_after_close()));
    let service = snapshot_service(store.clone(), clock, &[("G", dec!(10))]);
    store.fail_writes.store(true, Ordering::SeqCst);

    assert!(service.capture_if_absent("alice").await.is_err());
    assert!(store.snapshot_rows("alice").is_empty());

    // A retry after recovery succeeds.
    store.fail_writes.store(false, Ordering::SeqCst);
    assert!(matches!(
        service.capture_if_absent("alice").await.unwrap(),
        CaptureOutcome::Captured { rows: 1, .. }
    ));
}

#[test]
fn test_history_groups_rows_by_day() {
    let store = Arc::new(MockRetirementStore::new());
    let captured_at = friday_after_close().naive_utc();
    for (d, code, value) in [
        (day(2024, 6, 6), "G", dec!(100)),
        (day(2024, 6, 6), "C", dec!(50)),
        (day(2024, 6, 7), "G", dec!(110)),
        (day(2024, 6, 10), "G", dec!(120)),
    ] {
        store.seed_snapshot(NewFundSnapshot::from_item(
            "alice",
            d,
            captured_at,
            &item(code, value),
        ));
    }
    let service = snapshot_service(store, Arc::new(FixedClock::new(friday_after_close())), &[]);

    let history = service.get_history("alice", None, None).unwrap();
    let totals: Vec<_> = history
        .iter()
        .map(|d| (d.as_of_day, d.total_market_value))
        .collect();
    assert_eq!(
        totals,
        vec![
            (day(2024, 6, 6), dec!(150)),
            (day(2024, 6, 7), dec!(110)),
            (day(2024, 6, 10), dec!(120)),
        ]
    );
    assert_eq!(history[0].items[0].fund_code, "C");

    let bounded = service
        .get_history("alice", Some(day(2024, 6, 7)), Some(day(2024, 6, 7)))
        .unwrap();
    assert_eq!(bounded.len(), 1);
    assert_eq!(bounded[0].total_market_value, dec!(110));
}
