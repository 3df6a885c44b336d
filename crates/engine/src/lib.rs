pub mod scanner;
pub mod store;

pub use scanner::{MarketScan, ScanConfig, Scanner};
pub use store::{CandleStore, LiveUpdate, SeriesKey};
