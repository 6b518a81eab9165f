//! JSON encoding for files kept in the config directory.
//!
//! Files are written pretty-printed with 2-space indentation and a trailing
//! newline so they stay readable when edited by hand.

mod json;

pub use json::*;
