//! Admission check and post-commit tracking.
//!
//! - `check` - pure accept/reject decision; only rolls windows over
//! - `track` - counter updates, called after the transport committed a transfer
//!
//! Both look up the first matching [`RateLimitConfig`] and do nothing when
//! there is none.

mod check;
mod track;

pub use check::*;
pub use track::*;

use cosmwasm_std::Storage;

use crate::error::ContractError;
use crate::params::{Params, RateLimitConfig, TimeframeLimit};
use crate::state::{amount_abs, Amount, CONFIG, DEFAULT_BLOCK_TIME_SECONDS, PARAMS};
use crate::timeframe::Timeframe;

/// A candidate ICS-20 transfer as seen from this chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transfer<'a> {
    pub channel_id: &'a str,
    /// Local (canonicalized) denom
    pub denom: &'a str,
    /// Non-negative transfer amount
    pub amount: Amount,
    pub is_inflow: bool,
    /// Empty when unknown; sender-scoped limits are skipped then
    pub sender: &'a str,
}

impl Transfer<'_> {
    /// `+amount` for inflows, `-amount` for outflows.
    pub fn signed_amount(&self) -> Result<Amount, ContractError> {
        if self.is_inflow {
            Ok(self.amount)
        } else {
            Ok(Amount::zero().checked_sub(self.amount)?)
        }
    }

    pub fn abs_amount(&self) -> Result<Amount, ContractError> {
        Ok(amount_abs(self.amount)?)
    }
}

/// Height and block time the windows are evaluated against.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Clock {
    pub height: u64,
    pub block_time_seconds: u64,
}

/// Current policy and clock. Missing params mean no limits.
pub fn load_policy(storage: &dyn Storage, height: u64) -> Result<(Params, Clock), ContractError> {
    let params = PARAMS.may_load(storage)?.unwrap_or_default();
    let block_time_seconds = CONFIG
        .may_load(storage)?
        .map(|c| c.block_time_seconds)
        .unwrap_or(DEFAULT_BLOCK_TIME_SECONDS);
    Ok((
        params,
        Clock {
            height,
            block_time_seconds,
        },
    ))
}

/// Admission check against the stored policy.
pub fn check(
    storage: &mut dyn Storage,
    height: u64,
    transfer: &Transfer,
) -> Result<(), ContractError> {
    let (params, clock) = load_policy(storage, height)?;
    match params.find_matching_config(transfer.channel_id, transfer.denom) {
        Some(config) => check_config(storage, &clock, config, transfer),
        None => Ok(()),
    }
}

/// Post-commit tracking against the stored policy.
pub fn track(
    storage: &mut dyn Storage,
    height: u64,
    transfer: &Transfer,
) -> Result<(), ContractError> {
    let (params, clock) = load_policy(storage, height)?;
    match params.find_matching_config(transfer.channel_id, transfer.denom) {
        Some(config) => track_config(storage, &clock, config, transfer),
        None => Ok(()),
    }
}

/// Timeframes in first-seen order without repeats.
fn distinct_timeframes<'a>(timeframes: impl Iterator<Item = &'a Timeframe>) -> Vec<Timeframe> {
    let mut out: Vec<Timeframe> = Vec::new();
    for timeframe in timeframes {
        if !out.contains(timeframe) {
            out.push(*timeframe);
        }
    }
    out
}

/// The legacy limit of `config` when it is set with a positive max.
pub(crate) fn active_legacy_limit(config: &RateLimitConfig) -> Option<&TimeframeLimit> {
    config
        .legacy_limit
        .as_ref()
        .filter(|l| l.max_amount > Amount::zero())
}
