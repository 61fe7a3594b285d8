//! Key codec for the windowed counter families.
//!
//! # Byte Layout
//! `prefix | component 0x00 | component 0x00 | ...`
//!
//! - `prefix` is one byte per family and per record kind (counter or window)
//! - every component is followed by the separator `0x00`, which may not occur
//!   inside a component
//! - timeframes are rendered as two textual integers: the unit code, then the
//!   configured count
//!
//! The legacy flow family carries no timeframe suffix so that values written
//! before multi-timeframe support stay readable.

use crate::error::ContractError;
use crate::state::{AddressTransferData, ChannelFlow, CounterValue, UniqueSenders};
use crate::timeframe::Timeframe;

/// Separator written after every key component
pub const KEY_SEPARATOR: u8 = 0x00;

/// Counter families. Each owns two one-byte prefixes: counter and window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Family {
    ChannelFlow,
    UniqueSenders,
    AddressTransfers,
    LegacyChannelFlow,
}

impl Family {
    pub const fn counter_prefix(&self) -> u8 {
        match self {
            Family::ChannelFlow => 0x01,
            Family::UniqueSenders => 0x03,
            Family::AddressTransfers => 0x05,
            Family::LegacyChannelFlow => 0x07,
        }
    }

    pub const fn window_prefix(&self) -> u8 {
        match self {
            Family::ChannelFlow => 0x02,
            Family::UniqueSenders => 0x04,
            Family::AddressTransfers => 0x06,
            Family::LegacyChannelFlow => 0x08,
        }
    }
}

/// Reject components that would break injectivity.
pub fn validate_component(component: &str) -> Result<(), ContractError> {
    if component.as_bytes().contains(&KEY_SEPARATOR) {
        return Err(ContractError::InvalidKeyComponent);
    }
    Ok(())
}

/// Incremental key writer.
pub struct KeyBuilder {
    bytes: Vec<u8>,
}

impl KeyBuilder {
    pub fn new(prefix: u8) -> Self {
        KeyBuilder { bytes: vec![prefix] }
    }

    pub fn push(mut self, component: &str) -> Result<Self, ContractError> {
        validate_component(component)?;
        self.bytes.extend_from_slice(component.as_bytes());
        self.bytes.push(KEY_SEPARATOR);
        Ok(self)
    }

    pub fn push_timeframe(self, timeframe: &Timeframe) -> Result<Self, ContractError> {
        self.push(&timeframe.timeframe_type.code().to_string())?
            .push(&timeframe.duration.to_string())
    }

    pub fn finish(self) -> Vec<u8> {
        self.bytes
    }
}

/// A typed key tuple of one counter family. The key type selects both the
/// family prefixes and the stored value type.
pub trait CounterKey {
    const FAMILY: Family;

    type Value: CounterValue;

    /// Write the components in their fixed order after `prefix`.
    fn encode(&self, prefix: u8) -> Result<Vec<u8>, ContractError>;

    fn counter_key(&self) -> Result<Vec<u8>, ContractError> {
        self.encode(Self::FAMILY.counter_prefix())
    }

    fn window_key(&self) -> Result<Vec<u8>, ContractError> {
        self.encode(Self::FAMILY.window_prefix())
    }
}

/// (channel, denom, timeframe)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FlowKey<'a> {
    pub channel_id: &'a str,
    pub denom: &'a str,
    pub timeframe: Timeframe,
}

impl CounterKey for FlowKey<'_> {
    const FAMILY: Family = Family::ChannelFlow;
    type Value = ChannelFlow;

    fn encode(&self, prefix: u8) -> Result<Vec<u8>, ContractError> {
        Ok(KeyBuilder::new(prefix)
            .push(self.channel_id)?
            .push(self.denom)?
            .push_timeframe(&self.timeframe)?
            .finish())
    }
}

/// (channel, timeframe)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SendersKey<'a> {
    pub channel_id: &'a str,
    pub timeframe: Timeframe,
}

impl CounterKey for SendersKey<'_> {
    const FAMILY: Family = Family::UniqueSenders;
    type Value = UniqueSenders;

    fn encode(&self, prefix: u8) -> Result<Vec<u8>, ContractError> {
        Ok(KeyBuilder::new(prefix)
            .push(self.channel_id)?
            .push_timeframe(&self.timeframe)?
            .finish())
    }
}

/// (address, channel, denom, timeframe)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AddressKey<'a> {
    pub address: &'a str,
    pub channel_id: &'a str,
    pub denom: &'a str,
    pub timeframe: Timeframe,
}

impl CounterKey for AddressKey<'_> {
    const FAMILY: Family = Family::AddressTransfers;
    type Value = AddressTransferData;

    fn encode(&self, prefix: u8) -> Result<Vec<u8>, ContractError> {
        Ok(KeyBuilder::new(prefix)
            .push(self.address)?
            .push(self.channel_id)?
            .push(self.denom)?
            .push_timeframe(&self.timeframe)?
            .finish())
    }
}

/// (channel, denom), no timeframe suffix
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LegacyFlowKey<'a> {
    pub channel_id: &'a str,
    pub denom: &'a str,
}

impl CounterKey for LegacyFlowKey<'_> {
    const FAMILY: Family = Family::LegacyChannelFlow;
    type Value = ChannelFlow;

    fn encode(&self, prefix: u8) -> Result<Vec<u8>, ContractError> {
        Ok(KeyBuilder::new(prefix)
            .push(self.channel_id)?
            .push(self.denom)?
            .finish())
    }
}
