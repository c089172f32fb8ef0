#![deny(unused_must_use)]
#![deny(unreachable_patterns)]
#![deny(unknown_lints)]
//! # Sift Test Utilities
//!
//! Commonly useful test utilities for the Sift codebase.
//!
//! ## Modules
//!
//! - `enums` - Assert on and destructure enum variants
//! - `random` - Utilities to make generating random values easier
//! - `signals` - Shutdown signals on a timer
//! - `streams` - Utilities which make testing channel-based code easier

#[macro_use]
pub mod enums;
pub mod random;
pub mod signals;
pub mod streams;
