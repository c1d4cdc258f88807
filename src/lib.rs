//! Retrace - replay captured remote-storage HTTP traffic
//!
//! Reads archives of captured request/response pairs and re-issues the
//! requests against a live endpoint under bounded concurrency. Also speaks
//! the Prometheus remote-read protocol for one-off queries.

#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::cargo)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::cast_possible_truncation,
    clippy::multiple_crate_versions
)]

pub mod archive;
pub mod config;
pub mod error;
pub mod inspect;
pub mod network;
pub mod record;
pub mod remote;
pub mod replay;
pub mod shutdown;

pub use error::{Result, RetraceError};
