pub mod error;
pub mod preflight;
