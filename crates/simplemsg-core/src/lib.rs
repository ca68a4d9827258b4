//! simplemsg-core — shared types: the posting, the wire line grammar, and
//! client configuration. The client crate depends on this one.

pub mod config;
pub mod wire;

pub use config::{
    ClientConfig, ConfigError, DecoderConfig, OutputConfig, MAX_CHUNK_SIZE, MAX_HEADER_LINE,
    MIN_HEADER_LINE,
};
pub use wire::{Posting, WireError};
