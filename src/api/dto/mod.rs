//! Data Transfer Objects for read API responses.
//!
//! All amounts are serialized as JSON strings so raw on-chain integers and
//! 5-digit prices never pass through floating point.

pub mod pool_dto;
pub mod token_dto;

pub use pool_dto::*;
pub use token_dto::*;
