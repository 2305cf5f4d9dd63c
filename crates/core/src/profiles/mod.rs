//! Profile aggregate - legacy allocation fields and the denormalized total balance.

mod profiles_model;
mod profiles_traits;

pub use profiles_model::{ProfileAggregate, ProfileBalanceUpdate, ProfileUpdate};
pub use profiles_traits::ProfileRepositoryTrait;
