mod link;

pub use link::{validate_custom_code, validate_payload};
