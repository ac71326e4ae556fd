//! Martingale ladder planner: derives entry ladders for futures bots, keeps
//! the settings form consistent, and shapes bot-creation and backtest bodies.

pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod format;
pub mod ladder;
pub mod logging;
pub mod payload;
pub mod price;
pub mod session;
pub mod ui;
