mod model;
mod repository;

pub use model::FundSnapshotDB;
pub use repository::SnapshotRepository;
