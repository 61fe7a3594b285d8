//! IBC Rate Limit - Windowed Admission Control for ICS-20 Transfers
//!
//! Middleware that sits between the IBC transport and the ICS-20 transfer
//! application and refuses transfers that would breach a configured limit.
//!
//! # Limit Families
//! Each `(channel, denom)` config may carry any number of:
//! - Supply-shift limits: `|net inflow - outflow| <= max` over a window
//! - Unique-sender limits: distinct inbound senders per channel over a window
//! - Address limits: per-sender transfer count and absolute volume
//!
//! # Packet Flow
//! 1. Decode ICS-20; anything else passes through untouched
//! 2. Admission check against the first matching config
//! 3. Inner application runs inside an atomic context
//! 4. On success the transfer is tracked and the context committed
//!
//! # Windows
//! Windows are measured in block heights. HOUR and DAY timeframes are
//! converted using the configured average block time, so they drift when the
//! real block time differs from it.

pub mod atomic;
pub mod contract;
pub mod error;
mod execute;
pub mod keys;
pub mod limiter;
pub mod middleware;
pub mod msg;
pub mod params;
mod query;
pub mod state;
pub mod timeframe;

pub use crate::atomic::{AtomicContext, JournaledStorage, SnapshotStorage, StateHandle};
pub use crate::error::{ContractError, MODULE_TAG};
pub use crate::limiter::Transfer;
pub use crate::middleware::{PacketResult, PacketVerdict, RateLimitMiddleware, TransferApp};
pub use crate::params::{Params, RateLimitConfig};
pub use crate::timeframe::{Timeframe, TimeframeType};
