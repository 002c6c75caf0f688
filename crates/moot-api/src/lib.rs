//! # Moot API
//!
//! HTTP front for the debate service.
//!
//! - `POST /start` opens a session, `POST /run` plays one turn
//! - `GET /sessions/{id}` returns a session snapshot
//! - `GET /health`, `GET /metrics` (Prometheus text), `GET /api-docs/openapi.json`
//!
//! Errors are JSON bodies of the form `{"error": {"code", "message"}}`.

pub mod error;
pub mod middleware;
pub mod routes;
pub mod sanitize;
pub mod server;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use routes::api_router;
pub use server::{init_tracing, MootServer, ServerConfig};
pub use state::AppState;
