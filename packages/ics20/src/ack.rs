//! Standard IBC acknowledgement envelope.
//!
//! Serialized as `{"result":"<base64>"}` on success and `{"error":"<reason>"}`
//! on failure. An error acknowledgement makes the source chain refund the sender.

use cosmwasm_schema::cw_serde;
use cosmwasm_std::{from_json, to_json_binary, Binary, StdResult};

#[cw_serde]
pub enum Acknowledgement {
    Result(Binary),
    Error(String),
}

impl Acknowledgement {
    /// ICS-20 success acknowledgement (`AQ==`, a single `0x01` byte).
    pub fn success() -> Self {
        Acknowledgement::Result(Binary::from(vec![1u8]))
    }

    pub fn error(reason: impl Into<String>) -> Self {
        Acknowledgement::Error(reason.into())
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Acknowledgement::Result(_))
    }

    /// Bytes written back to the source chain.
    pub fn to_binary(&self) -> StdResult<Binary> {
        to_json_binary(self)
    }

    pub fn decode(data: &[u8]) -> StdResult<Self> {
        from_json(data)
    }
}
