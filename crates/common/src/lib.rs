pub mod config;
pub mod error;
pub mod supplier;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use supplier::{CandleSupplier, FundingSupplier};
pub use types::*;
