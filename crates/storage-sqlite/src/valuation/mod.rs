mod repository;

pub use repository::ValuationRepository;
