//! Pure computation: event decoding and profit.

pub mod decoder;
pub mod profit;

pub use decoder::{DecodeError, EventDecoder, EventLayout};
pub use profit::{CostBasisPolicy, ProfitCalculator, ProfitResult};
