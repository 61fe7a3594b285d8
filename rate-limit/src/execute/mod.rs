//! Execute handlers for the IBC rate limit contract.
//!
//! - `governance` - authority-only policy updates

mod governance;

pub use governance::*;
