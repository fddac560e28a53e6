//! Shared helpers: stream I/O with compression and atomic publishing, and input limits.

pub mod io;
pub mod validation;
