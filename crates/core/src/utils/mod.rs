pub mod clock;
pub mod time_utils;
pub mod user_locks;

pub use clock::{Clock, FixedClock, SystemClock};
pub use time_utils::{resolve_as_of, resolve_as_of_with_cutoff};
pub use user_locks::{UserLockGuard, UserLocks};
