pub mod accumulator;
pub mod api;
pub mod channel;
pub mod config;
pub mod context;
pub mod coordinator;
pub mod delta;
pub mod document;
pub mod error;
pub mod events_out;
pub mod registry;
pub mod services;
pub mod source;
pub mod store;
