//! # stackwire-common
//!
//! Shared error definitions, the layered generator configuration, and
//! built-in defaults used across the stackwire workspace.
//!
//! This crate is the leaf of the dependency graph: it depends on no other
//! internal crate.

pub mod config;
pub mod constants;
pub mod error;
