//! Integration test suite for the promise runtime
//!
//! This crate verifies that the components work together across crate
//! boundaries: values from `core_types`, promises and the event loop from
//! `promise_runtime`, and the scenario runner from `promise_cli`.

/// Re-export components for test convenience
pub mod components {
    pub use core_types;
    pub use promise_cli;
    pub use promise_runtime;
}
