//! Data Models
//!
//! This module contains the model contract and the conversion helpers that
//! move records between typed structs and the store's generic mapping:
//!
//! - `Model` - Identity + serde requirements for stored records
//! - `Mapping` - Generic string-keyed JSON map
//! - `converter` - Encode/decode through an intermediate JSON buffer

pub mod converter;
mod model;

pub use converter::{decode, decode_mapping, encode, try_encode};
pub use model::{Mapping, Model};
