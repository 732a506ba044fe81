//! Command modules for the OrgWarden CLI.
//!
//! - `apply_cmd`: reconciles organizations with a configuration document
//! - `dump_cmd`: prints the live state of an organization as configuration

pub mod apply_cmd;
pub mod dump_cmd;
