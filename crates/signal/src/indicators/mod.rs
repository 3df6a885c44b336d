pub mod ema;
pub mod macd;
pub mod rsi;
pub mod trend;

pub use ema::{ema_last, ema_series};
pub use macd::{Macd, MacdOutput};
pub use rsi::Rsi;
pub use trend::{adx, atr};
