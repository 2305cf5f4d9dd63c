mod model;
mod repository;

pub use model::FundPositionDB;
pub(crate) use repository::load_positions;
pub use repository::FundPositionRepository;
