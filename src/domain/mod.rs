// Domain layer - Pure models and rules, no I/O
pub mod consumption;
pub mod dashboard;
pub mod error;
pub mod port;
pub mod reading;
