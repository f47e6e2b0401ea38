//! API handlers for the zkLogin service.

pub mod health;
pub mod zklogin;
