//! Core domain types and logic.

pub mod bar;
pub mod indicator;
pub mod strategy;
pub mod state_machine;
pub mod portfolio;
pub mod backtest;
pub mod live;
pub mod metrics;
pub mod config_validation;
pub mod error;
