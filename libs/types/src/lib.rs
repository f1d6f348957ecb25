//! Types library for the AMM protocol
//!
//! Value types shared by the contract layer and off-chain tooling.
//!
//! # Modules
//! - `ids`: Account addresses and token identifiers
//! - `numeric`: Integer amounts, slots and overflow-safe helpers
//! - `fee`: Swap fee schedule
//! - `errors`: Parsing errors

pub mod ids;
pub mod numeric;
pub mod fee;
pub mod errors;

// Library version constant
pub const LIB_VERSION: &str = "1.0.0";

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::ids::*;
    pub use crate::numeric::*;
    pub use crate::fee::*;
    pub use crate::errors::*;
}
