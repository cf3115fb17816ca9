//! HTTP front end: documents over SSE, lookups, cancellation and lifecycle.

pub mod middleware;
pub mod models;
pub mod routes;
pub mod server;
pub mod state;

pub use state::AppState;
