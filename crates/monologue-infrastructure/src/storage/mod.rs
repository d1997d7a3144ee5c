//! Low-level storage utilities.

pub mod atomic_json;

pub use atomic_json::{AtomicJsonError, AtomicJsonFile};
