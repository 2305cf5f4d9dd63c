//! Fund code handling.

mod fund_code;

pub use fund_code::normalize_fund_code;
