pub mod config;
pub mod control;
pub mod error;
pub mod messages;
pub mod runtime;
pub mod store;
pub mod transport;
