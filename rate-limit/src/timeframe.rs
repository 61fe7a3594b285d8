//! Time model: converts a configured timeframe into a window length in blocks.
//!
//! Hour and day timeframes are converted with an average block time, which is
//! part of the module [`Config`](crate::state::Config). Integer arithmetic only.

use cosmwasm_schema::cw_serde;

use crate::error::ContractError;

/// Seconds per hour
pub const SECONDS_PER_HOUR: i64 = 3_600;

/// Seconds per day
pub const SECONDS_PER_DAY: i64 = 86_400;

/// Unit of a timeframe. `Unspecified` only exists so that a missing value
/// decodes to something validation can reject.
#[cw_serde]
#[derive(Copy, Eq)]
pub enum TimeframeType {
    Unspecified,
    Block,
    Hour,
    Day,
}

impl TimeframeType {
    /// Stable numeric code used in storage keys
    pub fn code(&self) -> u8 {
        match self {
            TimeframeType::Unspecified => 0,
            TimeframeType::Block => 1,
            TimeframeType::Hour => 2,
            TimeframeType::Day => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeframeType::Unspecified => "unspecified",
            TimeframeType::Block => "block",
            TimeframeType::Hour => "hour",
            TimeframeType::Day => "day",
        }
    }
}

/// A (unit, count) pair such as `(Hour, 6)`.
#[cw_serde]
#[derive(Copy, Eq)]
pub struct Timeframe {
    pub timeframe_type: TimeframeType,
    pub duration: i64,
}

impl Timeframe {
    pub const fn blocks(count: i64) -> Self {
        Timeframe {
            timeframe_type: TimeframeType::Block,
            duration: count,
        }
    }

    pub const fn hours(count: i64) -> Self {
        Timeframe {
            timeframe_type: TimeframeType::Hour,
            duration: count,
        }
    }

    pub const fn days(count: i64) -> Self {
        Timeframe {
            timeframe_type: TimeframeType::Day,
            duration: count,
        }
    }

    /// Window length in blocks for this timeframe.
    pub fn duration_in_blocks(&self, block_time_seconds: u64) -> Result<u64, ContractError> {
        blocks(self.timeframe_type, self.duration, block_time_seconds)
    }

    pub fn validate(&self) -> Result<(), ContractError> {
        if self.timeframe_type == TimeframeType::Unspecified || self.duration <= 0 {
            return Err(ContractError::InvalidTimeframe);
        }
        Ok(())
    }
}

/// Convert `(timeframe_type, count)` into a number of blocks.
///
/// Fails with `InvalidTimeframe` for an unspecified unit, a non-positive
/// count, a zero block time, or a result that would be shorter than one block.
pub fn blocks(
    timeframe_type: TimeframeType,
    count: i64,
    block_time_seconds: u64,
) -> Result<u64, ContractError> {
    if count <= 0 {
        return Err(ContractError::InvalidTimeframe);
    }

    let seconds_per_unit = match timeframe_type {
        TimeframeType::Unspecified => return Err(ContractError::InvalidTimeframe),
        TimeframeType::Block => return Ok(count as u64),
        TimeframeType::Hour => SECONDS_PER_HOUR,
        TimeframeType::Day => SECONDS_PER_DAY,
    };

    let block_time = i64::try_from(block_time_seconds).map_err(|_| ContractError::InvalidTimeframe)?;
    if block_time == 0 {
        return Err(ContractError::InvalidTimeframe);
    }

    let total_seconds = count
        .checked_mul(seconds_per_unit)
        .ok_or(ContractError::InvalidTimeframe)?;
    let result = total_seconds / block_time;
    if result <= 0 {
        return Err(ContractError::InvalidTimeframe);
    }
    Ok(result as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_timeframe_is_identity() {
        assert_eq!(blocks(TimeframeType::Block, 1000, 6).unwrap(), 1000);
        assert_eq!(blocks(TimeframeType::Block, 1, 6).unwrap(), 1);
    }

    #[test]
    fn test_hour_and_day_conversion() {
        assert_eq!(blocks(TimeframeType::Hour, 1, 6).unwrap(), 600);
        assert_eq!(blocks(TimeframeType::Hour, 24, 6).unwrap(), 14_400);
        assert_eq!(blocks(TimeframeType::Day, 1, 6).unwrap(), 14_400);
        assert_eq!(blocks(TimeframeType::Day, 7, 5).unwrap(), 120_960);
        assert_eq!(Timeframe::days(1).duration_in_blocks(6).unwrap(), 14_400);
    }

    #[test]
    fn test_invalid_timeframes() {
        assert_eq!(
            blocks(TimeframeType::Unspecified, 1, 6),
            Err(ContractError::InvalidTimeframe)
        );
        assert_eq!(blocks(TimeframeType::Block, 0, 6), Err(ContractError::InvalidTimeframe));
        assert_eq!(blocks(TimeframeType::Hour, -3, 6), Err(ContractError::InvalidTimeframe));
        assert_eq!(blocks(TimeframeType::Hour, 1, 0), Err(ContractError::InvalidTimeframe));
        // Block time longer than the unit
        assert_eq!(blocks(TimeframeType::Hour, 1, 7_200), Err(ContractError::InvalidTimeframe));
        assert_eq!(
            blocks(TimeframeType::Day, i64::MAX, 6),
            Err(ContractError::InvalidTimeframe)
        );
    }

    #[test]
    fn test_validate() {
        assert!(Timeframe::hours(1).validate().is_ok());
        assert!(Timeframe::blocks(0).validate().is_err());
        assert!(Timeframe {
            timeframe_type: TimeframeType::Unspecified,
            duration: 10,
        }
        .validate()
        .is_err());
    }

    #[test]
    fn test_codes_are_distinct() {
        let codes = [
            TimeframeType::Unspecified.code(),
            TimeframeType::Block.code(),
            TimeframeType::Hour.code(),
            TimeframeType::Day.code(),
        ];
        for (i, a) in codes.iter().enumerate() {
            for b in &codes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
