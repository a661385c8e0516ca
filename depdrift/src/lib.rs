//! depdrift library surface
//!
//! The binary wires these pieces to the `manifest` parser and the `history`
//! inspector: scan a Dockerfile for installs, compare against a manifest
//! snapshot, render the result.

pub mod config;
pub mod dockerfile;
pub mod report;

pub use config::CheckConfig;
pub use dockerfile::{normalize_name, scan_installs, InstalledPackage};
pub use report::{ConstraintChange, DriftReport, KindDiff, SnapshotDiff, VersionMismatch};
