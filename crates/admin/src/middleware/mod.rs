//! HTTP middleware for admin.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request span with status and latency)
//! 3. Request ID (add unique ID to each request)
//! 4. Bearer token check on `/api` routes (`RequireAdminAuth`)

pub mod auth;
pub mod request_id;

pub use auth::RequireAdminAuth;
pub use request_id::request_id_middleware;
