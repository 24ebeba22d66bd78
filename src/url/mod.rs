//! URL handling module
//!
//! Addresses are kept as the exact strings they were discovered as; this
//! module only derives the host used to group fetches for admission control.

mod host;

pub use host::extract_host;
