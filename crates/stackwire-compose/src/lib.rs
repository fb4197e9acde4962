//! # stackwire-compose
//!
//! Compiles a directory of per-service container definitions into compose
//! fragments plus a master manifest that wires them into one network.
//!
//! Handles:
//! - **Definition**: Loading multi-document YAML definition files.
//! - **Naming**: Unique service names and bind folders across a run.
//! - **Volume**: Host-bind synthesis for implicit volume specs.
//! - **Device**: Device mapping normalization.
//! - **Service**: Assembly of the write-ready service record.
//! - **Network / Manifest**: The shared network block, fragments, and the
//!   master `extends` document.
//! - **Generator**: The run driver that ties it all together.

pub mod definition;
pub mod device;
pub mod generator;
pub mod manifest;
pub mod naming;
pub mod network;
pub mod service;
pub mod volume;
