//! Policy model: rate limit configurations and their lookup.
//!
//! `Params` is an ordered list. Lookup is first match wins: an empty
//! `channel_id` matches any channel, `denom` must match exactly. Order is part
//! of the policy.

use cosmwasm_schema::cw_serde;

use crate::error::ContractError;
use crate::keys::validate_component;
use crate::state::Amount;
use crate::timeframe::Timeframe;

/// Cap on the absolute net flow over a timeframe. Zero disables the limit.
#[cw_serde]
pub struct TimeframeLimit {
    pub max_amount: Amount,
    pub timeframe: Timeframe,
}

/// Cap on distinct inbound senders per channel over a timeframe. Zero disables the limit.
#[cw_serde]
pub struct UniqueSenderLimit {
    pub max_unique_senders: i64,
    pub timeframe: Timeframe,
}

/// Per-sender caps over a timeframe. Each field disables its own check when zero.
#[cw_serde]
pub struct AddressLimit {
    pub max_transfers: i64,
    pub max_amount: Amount,
    pub timeframe: Timeframe,
}

/// All limits for one (channel, denom)
#[cw_serde]
pub struct RateLimitConfig {
    /// Empty matches every channel
    pub channel_id: String,
    pub denom: String,
    #[serde(default)]
    pub supply_shift_limits: Vec<TimeframeLimit>,
    #[serde(default)]
    pub unique_sender_limits: Vec<UniqueSenderLimit>,
    #[serde(default)]
    pub address_limits: Vec<AddressLimit>,
    /// Deprecated single-window supply limit, tracked under the legacy keys
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legacy_limit: Option<TimeframeLimit>,
}

impl RateLimitConfig {
    /// Empty config for a (channel, denom) pair.
    pub fn new(channel_id: impl Into<String>, denom: impl Into<String>) -> Self {
        RateLimitConfig {
            channel_id: channel_id.into(),
            denom: denom.into(),
            supply_shift_limits: vec![],
            unique_sender_limits: vec![],
            address_limits: vec![],
            legacy_limit: None,
        }
    }

    pub fn matches(&self, channel_id: &str, denom: &str) -> bool {
        (self.channel_id.is_empty() || self.channel_id == channel_id) && self.denom == denom
    }

    /// Exact (channel_id, denom) identity used by upsert and removal.
    pub fn has_key(&self, channel_id: &str, denom: &str) -> bool {
        self.channel_id == channel_id && self.denom == denom
    }

    pub fn validate(&self, block_time_seconds: u64) -> Result<(), ContractError> {
        if self.denom.is_empty() {
            return Err(invalid("denom cannot be empty"));
        }
        validate_component(&self.channel_id)
            .map_err(|_| invalid("channel_id contains a reserved byte"))?;
        validate_component(&self.denom).map_err(|_| invalid("denom contains a reserved byte"))?;

        for limit in &self.supply_shift_limits {
            validate_amount(limit.max_amount, "supply shift max_amount")?;
            validate_timeframe(&limit.timeframe, block_time_seconds)?;
        }
        for limit in &self.unique_sender_limits {
            if limit.max_unique_senders < 0 {
                return Err(invalid("max_unique_senders cannot be negative"));
            }
            validate_timeframe(&limit.timeframe, block_time_seconds)?;
        }
        for limit in &self.address_limits {
            if limit.max_transfers < 0 {
                return Err(invalid("max_transfers cannot be negative"));
            }
            validate_amount(limit.max_amount, "address max_amount")?;
            validate_timeframe(&limit.timeframe, block_time_seconds)?;
        }
        if let Some(limit) = &self.legacy_limit {
            validate_amount(limit.max_amount, "legacy max_amount")?;
            validate_timeframe(&limit.timeframe, block_time_seconds)?;
        }
        Ok(())
    }
}

fn invalid(reason: &str) -> ContractError {
    ContractError::InvalidParams {
        reason: reason.to_string(),
    }
}

fn validate_amount(amount: Amount, field: &str) -> Result<(), ContractError> {
    if amount < Amount::zero() {
        return Err(invalid(&format!("{} cannot be negative", field)));
    }
    Ok(())
}

fn validate_timeframe(timeframe: &Timeframe, block_time_seconds: u64) -> Result<(), ContractError> {
    timeframe
        .validate()
        .and_then(|_| timeframe.duration_in_blocks(block_time_seconds))
        .map_err(|_| {
            invalid(&format!(
                "invalid timeframe {} x{}",
                timeframe.timeframe_type.as_str(),
                timeframe.duration
            ))
        })?;
    Ok(())
}

/// The full rate limit policy
#[cw_serde]
#[derive(Default)]
pub struct Params {
    pub rate_limits: Vec<RateLimitConfig>,
}

impl Params {
    /// First config in declaration order matching (channel, denom).
    pub fn find_matching_config(&self, channel_id: &str, denom: &str) -> Option<&RateLimitConfig> {
        self.rate_limits.iter().find(|c| c.matches(channel_id, denom))
    }

    /// Validate every entry; any invalid entry rejects the whole bundle.
    pub fn validate(&self, block_time_seconds: u64) -> Result<(), ContractError> {
        self.rate_limits
            .iter()
            .try_for_each(|c| c.validate(block_time_seconds))
    }

    /// Replace the entry with the same (channel_id, denom) in place, or append.
    /// Returns true when an entry was replaced.
    pub fn upsert(&mut self, config: RateLimitConfig) -> bool {
        match self
            .rate_limits
            .iter_mut()
            .find(|c| c.has_key(&config.channel_id, &config.denom))
        {
            Some(existing) => {
                *existing = config;
                true
            }
            None => {
                self.rate_limits.push(config);
                false
            }
        }
    }

    pub fn remove(&mut self, channel_id: &str, denom: &str) -> Option<RateLimitConfig> {
        let index = self
            .rate_limits
            .iter()
            .position(|c| c.has_key(channel_id, denom))?;
        Some(self.rate_limits.remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeframe::TimeframeType;

    fn supply(max: i128, timeframe: Timeframe) -> TimeframeLimit {
        TimeframeLimit {
            max_amount: Amount::from(max),
            timeframe,
        }
    }

    fn config_with_supply(channel_id: &str, denom: &str, max: i128) -> RateLimitConfig {
        let mut config = RateLimitConfig::new(channel_id, denom);
        config.supply_shift_limits.push(supply(max, Timeframe::blocks(100)));
        config
    }

    #[test]
    fn test_first_match_wins() {
        let params = Params {
            rate_limits: vec![
                config_with_supply("channel-0", "uatom", 1),
                config_with_supply("", "uatom", 2),
                config_with_supply("channel-1", "uatom", 3),
            ],
        };

        let found = params.find_matching_config("channel-0", "uatom").unwrap();
        assert_eq!(found.supply_shift_limits[0].max_amount, Amount::from(1i128));

        // Wildcard entry shadows the later channel-1 entry
        let found = params.find_matching_config("channel-1", "uatom").unwrap();
        assert_eq!(found.supply_shift_limits[0].max_amount, Amount::from(2i128));

        assert!(params.find_matching_config("channel-0", "uosmo").is_none());
    }

    #[test]
    fn test_denom_match_is_exact() {
        let params = Params {
            rate_limits: vec![config_with_supply("", "uatom", 1)],
        };
        assert!(params.find_matching_config("channel-0", "uatom").is_some());
        assert!(params.find_matching_config("channel-0", "UATOM").is_none());
        assert!(params.find_matching_config("channel-0", "uatom2").is_none());
        assert!(params.find_matching_config("channel-0", "").is_none());
    }

    #[test]
    fn test_validate_accepts_good_params() {
        let mut config = config_with_supply("channel-0", "uatom", 300_000);
        config.unique_sender_limits.push(UniqueSenderLimit {
            max_unique_senders: 0,
            timeframe: Timeframe::hours(1),
        });
        config.address_limits.push(AddressLimit {
            max_transfers: 5,
            max_amount: Amount::zero(),
            timeframe: Timeframe::days(1),
        });
        let params = Params {
            rate_limits: vec![config],
        };
        assert!(params.validate(6).is_ok());
        assert!(Params::default().validate(6).is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_denom() {
        let params = Params {
            rate_limits: vec![config_with_supply("channel-0", "", 1)],
        };
        assert!(matches!(
            params.validate(6),
            Err(ContractError::InvalidParams { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_bad_timeframes() {
        let mut unspecified = RateLimitConfig::new("channel-0", "uatom");
        unspecified.supply_shift_limits.push(supply(
            1,
            Timeframe {
                timeframe_type: TimeframeType::Unspecified,
                duration: 1,
            },
        ));
        assert!(unspecified.validate(6).is_err());

        let mut zero = RateLimitConfig::new("channel-0", "uatom");
        zero.unique_sender_limits.push(UniqueSenderLimit {
            max_unique_senders: 3,
            timeframe: Timeframe::blocks(0),
        });
        assert!(zero.validate(6).is_err());

        let mut legacy = RateLimitConfig::new("channel-0", "uatom");
        legacy.legacy_limit = Some(supply(10, Timeframe::hours(-1)));
        assert!(legacy.validate(6).is_err());
    }

    #[test]
    fn test_validate_rejects_negative_max() {
        let bad_supply = config_with_supply("channel-0", "uatom", -1);
        assert!(bad_supply.validate(6).is_err());

        let mut bad_senders = RateLimitConfig::new("channel-0", "uatom");
        bad_senders.unique_sender_limits.push(UniqueSenderLimit {
            max_unique_senders: -1,
            timeframe: Timeframe::blocks(1),
        });
        assert!(bad_senders.validate(6).is_err());

        let mut bad_transfers = RateLimitConfig::new("channel-0", "uatom");
        bad_transfers.address_limits.push(AddressLimit {
            max_transfers: -2,
            max_amount: Amount::zero(),
            timeframe: Timeframe::blocks(1),
        });
        assert!(bad_transfers.validate(6).is_err());
    }

    #[test]
    fn test_validate_fails_closed() {
        let params = Params {
            rate_limits: vec![
                config_with_supply("channel-0", "uatom", 1),
                config_with_supply("channel-0", "", 1),
            ],
        };
        assert!(params.validate(6).is_err());
    }

    #[test]
    fn test_validate_rejects_reserved_byte() {
        let params = Params {
            rate_limits: vec![config_with_supply("channel\0-0", "uatom", 1)],
        };
        assert!(params.validate(6).is_err());
    }

    #[test]
    fn test_upsert_replaces_in_place() {
        let mut params = Params {
            rate_limits: vec![
                config_with_supply("channel-0", "uatom", 1),
                config_with_supply("channel-1", "uatom", 2),
            ],
        };

        assert!(params.upsert(config_with_supply("channel-0", "uatom", 9)));
        assert_eq!(params.rate_limits.len(), 2);
        assert_eq!(params.rate_limits[0].supply_shift_limits[0].max_amount, Amount::from(9i128));

        // Wildcard channel is its own primary key
        assert!(!params.upsert(config_with_supply("", "uatom", 5)));
        assert_eq!(params.rate_limits.len(), 3);
        assert_eq!(params.rate_limits[2].channel_id, "");
    }

    #[test]
    fn test_remove() {
        let mut params = Params {
            rate_limits: vec![
                config_with_supply("channel-0", "uatom", 1),
                config_with_supply("channel-1", "uatom", 2),
            ],
        };
        assert!(params.remove("channel-2", "uatom").is_none());
        let removed = params.remove("channel-0", "uatom").unwrap();
        assert_eq!(removed.channel_id, "channel-0");
        assert_eq!(params.rate_limits.len(), 1);
        assert_eq!(params.rate_limits[0].channel_id, "channel-1");
    }

    #[test]
    fn test_legacy_limit_defaults_to_none() {
        let raw = br#"{"channel_id":"channel-0","denom":"uatom"}"#;
        let config: RateLimitConfig = cosmwasm_std::from_json(raw).unwrap();
        assert!(config.legacy_limit.is_none());
        assert!(config.supply_shift_limits.is_empty());
    }
}
