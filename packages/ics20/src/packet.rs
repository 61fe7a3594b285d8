//! ICS-20 v1 fungible token packet payload.

use cosmwasm_schema::cw_serde;
use cosmwasm_std::{from_json, StdError, StdResult, Uint256};

/// Fungible token transfer payload carried in `IbcPacket::data`.
///
/// `amount` is a decimal string of arbitrary precision. The payload is never
/// rewritten by the middleware.
#[cw_serde]
pub struct FungibleTokenPacketData {
    /// Base denom or trace-prefixed denom (`port/channel/.../base`)
    pub denom: String,
    /// Non-negative decimal amount
    pub amount: String,
    pub sender: String,
    pub receiver: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
}

impl FungibleTokenPacketData {
    /// Decode packet bytes as an ICS-20 payload.
    pub fn decode(data: &[u8]) -> StdResult<Self> {
        from_json(data)
    }

    /// Parse `amount` the way the transfer module does.
    ///
    /// Grammar is Go's base-0 integer syntax: an optional `+`, then decimal
    /// digits, or a `0x`/`0o`/`0b` prefix, or a bare leading `0` for octal.
    /// Underscores may separate digits only after a prefix. Negative values
    /// and anything wider than 256 bits are rejected.
    pub fn parse_amount(&self) -> StdResult<Uint256> {
        parse_sdk_uint(&self.amount).ok_or_else(|| {
            StdError::parse_err(
                "Uint256",
                format!("invalid transfer amount: {}", self.amount),
            )
        })
    }
}

fn parse_sdk_uint(input: &str) -> Option<Uint256> {
    let unsigned = input.strip_prefix('+').unwrap_or(input);
    let bytes = unsigned.as_bytes();

    let (radix, digits, prefixed) = match bytes {
        [b'0', b'x' | b'X', rest @ ..] => (16, rest, true),
        [b'0', b'o' | b'O', rest @ ..] => (8, rest, true),
        [b'0', b'b' | b'B', rest @ ..] => (2, rest, true),
        [b'0', rest @ ..] if !rest.is_empty() => (8, rest, true),
        _ => (10, bytes, false),
    };

    let radix_value = Uint256::from(radix as u128);
    let mut value = Uint256::zero();
    let mut seen_digit = false;
    // An underscore may follow the prefix or a digit, and must precede a digit
    let mut after_separator_slot = prefixed;
    let mut pending_underscore = false;

    for &byte in digits {
        if byte == b'_' {
            if !prefixed || !after_separator_slot || pending_underscore {
                return None;
            }
            pending_underscore = true;
            continue;
        }
        let digit = (byte as char).to_digit(radix)?;
        value = value
            .checked_mul(radix_value)
            .ok()?
            .checked_add(Uint256::from(digit as u128))
            .ok()?;
        seen_digit = true;
        after_separator_slot = true;
        pending_underscore = false;
    }

    if pending_underscore || !seen_digit {
        return None;
    }
    Some(value)
}
