mod admin;
mod link;

pub use admin::{list_handler, ADMIN_KEY_HEADER};
pub use link::{create_handler, resolve_handler};
