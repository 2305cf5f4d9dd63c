pub mod valuation_calculator;
mod valuation_model;
pub mod valuation_service;
mod valuation_traits;

pub use valuation_calculator::{calculate_valuation, resolve_positions, ResolvedPositions};
pub use valuation_model::*;
pub use valuation_service::{ValuationConfig, ValuationService};
pub use valuation_traits::*;
