//! Core domain types and logic.

pub mod price_bar;
pub mod indicator;
pub mod strategy;
pub mod fusion;
pub mod position;
pub mod trade;
pub mod portfolio;
pub mod risk;
pub mod execution;
pub mod symbol_data;
pub mod backtest;
pub mod metrics;
pub mod analysis;
pub mod universe;
pub mod config_validation;
pub mod error;
