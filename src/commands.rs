pub mod backtest;
pub mod clean;
pub mod reproduce;
pub mod search;
pub mod simulate;
