//! Wire protocol codec: path encoding, single and batch JSON encodings, and
//! optional HMAC authentication.

pub mod path;
pub mod signing;
pub mod wire;

pub use signing::Signer;
pub use wire::{WireMetric, authenticate_batch, decode_batch, decode_one};
