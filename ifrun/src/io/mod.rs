//! Side-effecting helpers: filesystem layout, configuration, and interpreter processes.

pub mod config;
pub mod games;
pub mod interpreter;
pub mod locator;
pub mod metadata_store;
pub mod process;
pub mod spawn;
