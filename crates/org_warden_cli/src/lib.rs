//! OrgWarden CLI library exports for integration testing.

pub mod auth;
pub mod commands;
pub mod errors;
