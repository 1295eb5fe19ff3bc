//! Host-side utilities for the `virtual-list` crate.
//!
//! `virtual-list` decides what to render; this crate drives it against a concrete view system:
//!
//! - [`Substrate`]: the scroll container and positioned cells a host provides
//! - [`ListHost`]: paints frames onto a substrate and runs the settle loop
//! - [`Animator`] / [`Tween`]: offset animations for cells flagged `animate`
//!
//! This crate is intentionally framework-agnostic (no ratatui/egui bindings).
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

#[macro_use]
mod macros;

mod animator;
mod host;
mod substrate;
mod tween;


pub use animator::{Animator, DEFAULT_ANIMATION_MS};
pub use host::{DEFAULT_MAX_PAINTS_PER_PUMP, ListHost, RenderFn};
pub use substrate::Substrate;
pub use tween::{Easing, Tween};
