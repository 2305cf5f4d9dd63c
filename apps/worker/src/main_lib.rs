use std::sync::Arc;

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use nestegg_core::portfolio::snapshot::{SnapshotService, SnapshotServiceTrait};
use nestegg_core::portfolio::valuation::{ValuationService, ValuationServiceTrait};
use nestegg_core::positions::{BackfillService, BackfillServiceTrait};
use nestegg_core::prices::{PriceSourceTrait, StaticPriceSource};
use nestegg_core::profiles::ProfileRepositoryTrait;
use nestegg_core::utils::{Clock, SystemClock};
use nestegg_storage_sqlite::{
    db, FundPositionRepository, ProfileRepository, SnapshotRepository, ValuationRepository,
};

use crate::config::Config;
use crate::price_file::JsonFilePriceSource;

pub struct AppState {
    pub valuation_service: Arc<dyn ValuationServiceTrait>,
    pub snapshot_service: Arc<dyn SnapshotServiceTrait>,
    pub backfill_service: Arc<dyn BackfillServiceTrait>,
    pub profile_repository: Arc<dyn ProfileRepositoryTrait>,
    pub db_path: String,
}

pub fn init_tracing() {
    let log_format = std::env::var("NESTEGG_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

pub fn build_price_source(config: &Config) -> Arc<dyn PriceSourceTrait> {
    match &config.prices_file {
        Some(path) => {
            tracing::info!("Reading fund prices from {}", path.display());
            Arc::new(JsonFilePriceSource::new(path.clone()))
        }
        None => {
            tracing::warn!("NESTEGG_PRICES_FILE is not set; valuations will run without prices");
            Arc::new(StaticPriceSource::default())
        }
    }
}

pub fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let db_path = db::init(&config.db_path)?;
    tracing::info!("Database path in use: {}", db_path);

    let pool = db::create_pool(&db_path)?;
    db::run_migrations(&pool)?;
    let writer = db::spawn_writer((*pool).clone());

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let position_repository = Arc::new(FundPositionRepository::new(pool.clone(), writer.clone()));
    let profile_repository = Arc::new(ProfileRepository::new(pool.clone(), writer.clone()));
    let snapshot_repository = Arc::new(SnapshotRepository::new(pool, writer.clone()));
    let valuation_repository = Arc::new(ValuationRepository::new(writer));

    let valuation_service: Arc<dyn ValuationServiceTrait> = Arc::new(ValuationService::new(
        valuation_repository,
        build_price_source(config),
        clock.clone(),
        config.valuation_config(),
    ));
    let snapshot_service: Arc<dyn SnapshotServiceTrait> = Arc::new(SnapshotService::new(
        snapshot_repository,
        valuation_service.clone(),
        clock,
    ));
    let backfill_service: Arc<dyn BackfillServiceTrait> =
        Arc::new(BackfillService::new(position_repository));

    Ok(Arc::new(AppState {
        valuation_service,
        snapshot_service,
        backfill_service,
        profile_repository,
        db_path,
    }))
}
