//! Middleware components for request processing.

mod error_handler;
mod logging;
mod request_id;

pub use error_handler::{error_code, error_status, global_error_handler};
pub use logging::logging_middleware;
pub use request_id::{REQUEST_ID_HEADER, RequestId, request_id_middleware};
