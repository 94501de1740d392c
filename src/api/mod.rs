//! API Module
//!
//! HTTP admin surface over the server-tier cache. Mutating route handlers of
//! the application call the same invalidation operations in-process; these
//! endpoints expose them for operators and out-of-process writers.
//!
//! # Endpoints
//! - `GET /health`, `GET /stats`
//! - `GET /cache`, `PUT /cache`, `DELETE /cache`
//! - `GET /cache/:key`, `DELETE /cache/:key`
//! - `POST /invalidate`

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
