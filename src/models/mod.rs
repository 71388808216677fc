mod link;
mod rate_record;

pub use link::{AllocatedLink, CreateLinkDto, KeyListing, LinkEntry};
pub use rate_record::RateRecord;
