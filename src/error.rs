//! Unified error type for the cuelink crate.
//!
//! Errors only arise while loading the SDK library and resolving its exported
//! symbols. Once a [`Controller`](crate::Controller) is constructed, every
//! operation is an untrusted passthrough: native calls that fail return
//! whatever the SDK returns (false, null, zero) and the wrapper surfaces that
//! value instead of inventing stricter guarantees.

use std::fmt;

/// Errors raised while binding the native CUE SDK.
///
/// String payloads follow the convention **"context: details"** where
/// *context* identifies the library path or symbol name and *details* carries
/// the loader's own message.
#[derive(Debug)]
pub enum CueError {
    /// The dynamic library could not be loaded (missing file, wrong
    /// architecture, unresolved transitive dependency).
    LibraryLoad(String),
    /// The library loaded but an expected entry point is not exported.
    MissingSymbol(String),
}

impl fmt::Display for CueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CueError::LibraryLoad(e) => write!(f, "Failed to load CUE SDK library: {e}"),
            CueError::MissingSymbol(e) => write!(f, "Missing CUE SDK symbol: {e}"),
        }
    }
}

impl std::error::Error for CueError {}

/// Crate-level Result alias using [`CueError`].
pub type Result<T> = std::result::Result<T, CueError>;
