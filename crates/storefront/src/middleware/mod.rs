//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request span with status and latency)
//! 3. Request ID (add unique ID to each request)
//! 4. CORS
//! 5. Rate limiting on order and review submission (governor)

pub mod rate_limit;
pub mod request_id;

pub use rate_limit::submission_rate_limiter;
pub use request_id::request_id_middleware;
