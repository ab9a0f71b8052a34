#![doc = include_str!("../README.md")]
#![cfg_attr(feature = "doc_cfg", feature(doc_cfg))]
// If this was in Cargo.toml, it would cover examples as well
#![warn(
    missing_docs,
    clippy::panic_in_result_fn,
    clippy::missing_assert_message,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects
)]

mod platform_check;

#[macro_use]
mod macros;

pub mod error;
pub mod relay;

/// Platform-specific plumbing underneath the relay.
///
/// Only `unix` exists: the relay is built on `pipe(2)`, `poll(2)` and `read(2)`, none of which
/// have a faithful counterpart elsewhere.
pub mod os {
    #[cfg(unix)]
    #[cfg_attr(feature = "doc_cfg", doc(cfg(unix)))]
    pub mod unix;
}

pub use {
    error::InitError,
    relay::{DrainOutcome, DrainStage, Drained, PipeRelay, RelayOptions},
};

mod misc;
pub(crate) use misc::*;

#[cfg(test)]
#[path = "../tests/index.rs"]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects, clippy::indexing_slicing)]
mod tests;
