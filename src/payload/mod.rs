//! Payload module - field tables and typed value decoding.
//!
//! This module turns a packet's raw frame bytes into named values:
//! - Field tables parsed from JSON, one rule per output field
//! - Numeric, time, compound, and bitmask rule kinds
//! - Records sorted by field name for deterministic output

mod interpret;
mod spec;

pub use interpret::decode_payload;
pub use spec::{CompoundPart, FieldSpec, FieldTable, FieldValue};
