//! Double Moving Average Strategy
//!
//! A dual moving-average crossover strategy with trend and volume filters,
//! plus the hyperopt loss used to tune it.

pub mod config;
pub mod data;
pub mod frame;
pub mod hyperopt;
pub mod indicators;
pub mod strategies;
pub mod types;

pub use config::Config;
pub use strategies::Strategy;
pub use types::*;
