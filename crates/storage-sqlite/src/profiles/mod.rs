mod model;
mod repository;

pub use model::{RetirementProfileChangeset, RetirementProfileDB};
pub(crate) use repository::load_profile;
pub use repository::ProfileRepository;
