pub mod factory;
pub mod handlers;
pub mod services;
pub mod source;
pub mod store;
