mod rate_limit;
mod request_logger;

pub use rate_limit::{identity_from_headers, RateLimit};
pub use request_logger::{RequestLogger, REQUEST_ID_HEADER};
