#![forbid(unsafe_code)]

//! Test harness for Bindery.
//!
//! This crate provides:
//! - [`MockToolkit`], an in-memory [`bindery_core::Toolkit`] with a standard
//!   Qt-like class table ([`ClassTable::standard`])
//! - [`MockWidget`], whose property store, signal connections and call log
//!   tests can inspect directly
//! - [`install_mock_toolkit`] to install a fresh toolkit on the test thread
//! - [`init_tracing`] to route `tracing` output through the test writer
//!
//! Every test thread gets its own toolkit, so tests never share widgets.

pub mod classes;
pub mod toolkit;
pub mod widget;

pub use classes::{ClassTable, HORIZONTAL, VERTICAL};
pub use toolkit::{MockToolkit, install_mock_toolkit};
pub use widget::{ACCEPTABLE, INTERMEDIATE, INVALID, MockWidget};

/// Install a `tracing` subscriber that writes through the test harness.
///
/// Filtered by `RUST_LOG` when set. Safe to call from every test; only the
/// first call installs anything.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
