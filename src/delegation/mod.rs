//! The delegation fabric: how a worker hands a remote key's weight off to
//! the owning worker without blocking on it (spec §4.1, §4.6).

mod filter;
mod inbox;
mod router;

pub use filter::DelegationFilter;
pub use inbox::Inbox;
pub use router::{DelegationRouter, RouteOutcome};
