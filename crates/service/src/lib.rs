//! Facade selecting between the two execution strategies per order.

mod config;
mod facade;

pub use config::Config;
pub use facade::{ExecutionStrategy, FulfilmentService, ParseStrategyError, Submission};
