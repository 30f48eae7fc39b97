pub mod account; // credential store + OTPs
pub mod api;
pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod notify;
pub mod resume;
pub mod session;
