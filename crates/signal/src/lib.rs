pub mod classifier;
pub mod config;
pub mod indicators;
pub mod session;

pub use classifier::{Bias, FlagClassifier};
pub use config::{ClassifierConfig, ClassifierFileConfig};
pub use session::{detect_trend, session_window, SessionWindow, TrendState};
