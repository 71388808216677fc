pub mod clock;
pub mod code_generator;
pub mod hash;

pub use clock::{Clock, ManualClock, SystemClock};
pub use code_generator::{generate_code, CodeFormat};
