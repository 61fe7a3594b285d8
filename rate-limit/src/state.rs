//! State definitions for the IBC rate limit middleware
//!
//! Module configuration and policy live in `cw_storage_plus` items. Counters
//! and their windows live under the raw keys built by [`crate::keys`] and are
//! encoded with the host's deterministic JSON marshalling.

use cosmwasm_schema::cw_serde;
use cosmwasm_std::{from_json, to_json_vec, Addr, Int512, OverflowError, Storage};
use cw_storage_plus::Item;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ContractError;
use crate::keys::CounterKey;
use crate::params::Params;
use crate::timeframe::Timeframe;

/// Signed amount. Inflows and outflows share one counter.
///
/// Wide enough to hold any unsigned 256-bit packet amount and the difference
/// of two of them.
pub type Amount = Int512;

/// Absolute value of an amount.
pub fn amount_abs(value: Amount) -> Result<Amount, OverflowError> {
    if value < Amount::zero() {
        Amount::zero().checked_sub(value)
    } else {
        Ok(value)
    }
}

// ============================================================================
// Core Configuration
// ============================================================================

/// Module configuration
#[cw_serde]
pub struct Config {
    /// Only address allowed to replace or edit Params
    pub authority: Addr,
    /// Average block time used to turn hour/day timeframes into blocks
    pub block_time_seconds: u64,
}

// ============================================================================
// Counter Values
// ============================================================================

/// A value stored by one of the counter families.
pub trait CounterValue: Serialize + DeserializeOwned {
    /// Value written when a window is opened.
    fn zero() -> Self;
}

/// Net flow over a window. Inflows add, outflows subtract.
#[cw_serde]
pub struct ChannelFlow {
    pub net_flow: Amount,
}

impl CounterValue for ChannelFlow {
    fn zero() -> Self {
        ChannelFlow {
            net_flow: Amount::zero(),
        }
    }
}

/// Senders seen over a window, in insertion order, without duplicates.
#[cw_serde]
pub struct UniqueSenders {
    pub senders: Vec<String>,
}

impl UniqueSenders {
    pub fn contains(&self, sender: &str) -> bool {
        self.senders.iter().any(|s| s == sender)
    }

    /// Append the sender unless it is already present.
    pub fn insert(&mut self, sender: &str) -> bool {
        if self.contains(sender) {
            return false;
        }
        self.senders.push(sender.to_string());
        true
    }

    pub fn len(&self) -> usize {
        self.senders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }
}

impl CounterValue for UniqueSenders {
    fn zero() -> Self {
        UniqueSenders { senders: vec![] }
    }
}

/// Per-address activity over a window
#[cw_serde]
pub struct AddressTransferData {
    pub transfer_count: u64,
    /// Sum of absolute transfer amounts
    pub total_amount: Amount,
}

impl CounterValue for AddressTransferData {
    fn zero() -> Self {
        AddressTransferData {
            transfer_count: 0,
            total_amount: Amount::zero(),
        }
    }
}

/// Accounting window `[window_start, window_start + window_duration)` in block heights.
#[cw_serde]
#[derive(Copy, Eq)]
pub struct Window {
    pub window_start: u64,
    pub window_duration: u64,
}

impl Window {
    pub fn ends_at(&self) -> u64 {
        self.window_start.saturating_add(self.window_duration)
    }

    pub fn is_expired(&self, height: u64) -> bool {
        height >= self.ends_at()
    }
}

// ============================================================================
// Constants
// ============================================================================

/// Contract name for cw2 migration info
pub const CONTRACT_NAME: &str = "crates.io:ibc-rate-limit";

/// Contract version for cw2 migration info
pub const CONTRACT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default average block time in seconds
pub const DEFAULT_BLOCK_TIME_SECONDS: u64 = 6;

// ============================================================================
// Core State Storage
// ============================================================================

/// Module configuration
pub const CONFIG: Item<Config> = Item::new("config");

/// Active rate limit policy, replaced only through governance
pub const PARAMS: Item<Params> = Item::new("params");

// ============================================================================
// Windowed Counter Store
// ============================================================================

fn load_raw<T: DeserializeOwned>(
    storage: &dyn Storage,
    key: &[u8],
) -> Result<Option<T>, ContractError> {
    match storage.get(key) {
        Some(bytes) => Ok(Some(from_json(bytes)?)),
        None => Ok(None),
    }
}

fn save_raw<T: Serialize>(
    storage: &mut dyn Storage,
    key: &[u8],
    value: &T,
) -> Result<(), ContractError> {
    storage.set(key, &to_json_vec(value)?);
    Ok(())
}

/// Read a counter. Returns the zero value and `false` when absent.
pub fn get_counter<K: CounterKey>(
    storage: &dyn Storage,
    key: &K,
) -> Result<(K::Value, bool), ContractError> {
    match load_raw(storage, &key.counter_key()?)? {
        Some(value) => Ok((value, true)),
        None => Ok((K::Value::zero(), false)),
    }
}

/// Unconditionally write a counter.
pub fn set_counter<K: CounterKey>(
    storage: &mut dyn Storage,
    key: &K,
    value: &K::Value,
) -> Result<(), ContractError> {
    save_raw(storage, &key.counter_key()?, value)
}

pub fn get_window<K: CounterKey>(
    storage: &dyn Storage,
    key: &K,
) -> Result<Option<Window>, ContractError> {
    load_raw(storage, &key.window_key()?)
}

pub fn set_window<K: CounterKey>(
    storage: &mut dyn Storage,
    key: &K,
    window: &Window,
) -> Result<(), ContractError> {
    save_raw(storage, &key.window_key()?, window)
}

/// The stored window start paired with the duration the timeframe converts to
/// under the current block time.
fn live_window<K: CounterKey>(
    storage: &dyn Storage,
    key: &K,
    duration: u64,
) -> Result<Option<Window>, ContractError> {
    Ok(get_window(storage, key)?.map(|stored| Window {
        window_start: stored.window_start,
        window_duration: duration,
    }))
}

/// Sliding-window roll-over.
///
/// Opens a fresh window at `height` and zeroes the counter when the window is
/// missing, has expired, or has no counter next to it. Otherwise leaves both
/// untouched. Expiry is judged against the current block time, not the
/// duration recorded when the window opened. Returns the live window.
pub fn reset_window<K: CounterKey>(
    storage: &mut dyn Storage,
    key: &K,
    height: u64,
    timeframe: &Timeframe,
    block_time_seconds: u64,
) -> Result<Window, ContractError> {
    let duration = timeframe.duration_in_blocks(block_time_seconds)?;
    let counter_key = key.counter_key()?;

    if let Some(window) = live_window(storage, key, duration)? {
        if !window.is_expired(height) && storage.get(&counter_key).is_some() {
            return Ok(window);
        }
    }

    let window = Window {
        window_start: height,
        window_duration: duration,
    };
    set_window(storage, key, &window)?;
    save_raw(storage, &counter_key, &K::Value::zero())?;
    Ok(window)
}

/// The counter and window `reset_window` would leave behind, without writing.
pub fn effective_counter<K: CounterKey>(
    storage: &dyn Storage,
    key: &K,
    height: u64,
    timeframe: &Timeframe,
    block_time_seconds: u64,
) -> Result<(K::Value, Window), ContractError> {
    let duration = timeframe.duration_in_blocks(block_time_seconds)?;

    if let Some(window) = live_window(storage, key, duration)? {
        if !window.is_expired(height) {
            if let (value, true) = get_counter(storage, key)? {
                return Ok((value, window));
            }
        }
    }

    Ok((
        K::Value::zero(),
        Window {
            window_start: height,
            window_duration: duration,
        },
    ))
}
