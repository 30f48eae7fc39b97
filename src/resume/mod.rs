//! Resume documents owned by accounts

pub mod store;
pub mod types;

pub use store::ResumeStore;
pub use types::{payload_from_value, Payload, Resume, ResumeId};
