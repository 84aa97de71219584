//! Regex backend selection.
//!
//! The `regex` feature uses the full `regex` crate, `lite` swaps in
//! `regex-lite` for smaller binaries. Both expose the same API surface used
//! by this crate.

#[cfg(all(feature = "lite", not(feature = "regex")))]
pub use ::regex_lite::{Captures, Error, Regex};

#[cfg(feature = "regex")]
pub use ::regex::{Captures, Error, Regex};

#[cfg(not(any(feature = "regex", feature = "lite")))]
compile_error!("either the `regex` or the `lite` feature must be enabled");
