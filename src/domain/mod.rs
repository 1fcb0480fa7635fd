//! Domain layer: decimal quantities, pricing arithmetic, and the token,
//! pool and swap records the oracle reads and writes.

pub mod amount;
pub mod pool;
pub mod pool_id;
pub mod pricing;
pub mod swap;
pub mod token;

pub use amount::Amount;
pub use pool::{ContractPool, Pool, PoolVolume};
pub use pool_id::PoolId;
pub use swap::Swap;
pub use token::{FtMetadata, Token, TokenQuote};
