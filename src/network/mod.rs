//! Network Module
//!
//! Static-file HTTP serving over the data directory.
//!
//! ## Architecture
//! - `axum` router on a `tokio` listener; hyper handles the wire format
//! - `StaticFiles` maps request paths to files, independent of HTTP
//! - Concurrency limit, request timeout and request tracing as tower layers
//!
//! ### Status Codes
//! - 200: OK
//! - 400: Bad Request (malformed request, answered by hyper)
//! - 404: Not Found
//! - 405: Method Not Allowed (anything but GET / HEAD)
//! - 408: Request Timeout
//! - 500: Internal Server Error

mod content_type;
mod files;
mod router;
mod server;

pub use content_type::{content_type, has_arg};
pub use files::{StaticFile, StaticFiles};
pub use router::build_router;
pub use server::Server;
