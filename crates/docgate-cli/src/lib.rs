//! # docgate-cli
//!
//! Admin CLI for docgate.
//!
//! This crate provides the command-line surface over the library crates:
//! - ACL label provisioning (dry run by default, confirmation-gated apply)
//! - Search-index creation and status
//! - ACL-filtered text, vector, and hybrid search
//! - Configuration management

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod cli;
pub mod commands;
pub mod config_handlers;
