//! Wire codec shared by the producer and the consumer.
//!
//! One flat, field-named JSON object per order. There is no envelope and no
//! version field; unknown fields are ignored on decode so additive changes do
//! not break consumers that have not been upgraded.

use crate::error::CodecError;
use crate::order::Order;

/// Serializes an order into its wire representation.
///
/// # Errors
///
/// Returns `CodecError::Encode` if serialization fails.
pub fn encode(order: &Order) -> Result<Vec<u8>, CodecError> {
    serde_json::to_vec(order).map_err(CodecError::Encode)
}

/// Parses an order from its wire representation.
///
/// # Errors
///
/// Returns `CodecError::Decode` if the bytes are not a well-formed order.
pub fn decode(bytes: &[u8]) -> Result<Order, CodecError> {
    serde_json::from_slice(bytes).map_err(CodecError::Decode)
}
