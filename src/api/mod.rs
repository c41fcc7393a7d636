//! API Module
//!
//! HTTP handlers and routing exposing one cache over a REST API.
//!
//! # Endpoints
//! - `PUT /set` - Store a value
//! - `GET /get/:key` - Retrieve the live value(s) for a key
//! - `DELETE /del/:key` - Delete a key
//! - `POST /touch/:key` - Restart a key's TTL
//! - `GET /keys` - List keys
//! - `DELETE /purge` - Remove every entry
//! - `POST /expire` - Run an expiration sweep now
//! - `POST /evict` - Evict the oldest entries now
//! - `GET /stats` - Get cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
