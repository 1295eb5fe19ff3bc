//! A headless virtualized list engine.
//!
//! For host-side utilities (a substrate trait, a render/settle driver, offset tweens), see the
//! `virtual-list-adapter` crate.
//!
//! The engine renders only the items inside the viewport plus an overdraw margin, for lists of
//! any length along one scroll axis. It covers:
//! - render block bookkeeping: which items sit above, inside and below the rendered window
//! - a cell pool that recycles cells by template
//! - incremental measurement of items whose extent is only guessed up front, with corrections
//!   above the viewport deferred instead of moving visible content
//! - keyboard focus traversal that scrolls unrendered targets into view
//!
//! It is UI-agnostic. A host is expected to provide:
//! - the item list (keyed, diffed on every update)
//! - viewport geometry and scroll offsets
//! - measurements for items flagged `needs_measure`
//! - a paint of every frame, followed by [`VirtualList::settle`]
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

#[macro_use]
mod macros;

mod block;
mod directory;
mod fenwick;
mod focus;
mod item;
mod key;
mod list;
mod options;
mod oracle;
mod pool;
mod reconciler;
mod state;
mod types;

#[cfg(test)]
mod tests;

pub use block::RenderBlock;
pub use directory::{DuplicateKey, ItemDirectory, ListDiff};
pub use focus::{FocusChange, FocusDirection, FocusNavigator, FocusSource, NavKey};
pub use item::Item;
pub use key::ListKey;
pub use list::VirtualList;
pub use options::{
    DEFAULT_MAX_SIMULTANEOUS_MEASURES, ListOptions, Margins, OnChangeCallback,
    OnFocusChangeCallback, OverdrawPolicy,
};
pub use oracle::SizeOracle;
pub use pool::{Cell, CellPool, CellRequest, DEFAULT_POOL_CAPACITY, PoolStats};
pub use reconciler::CorrectionReconciler;
pub use state::{CellFrame, ListFrame, ListState};
pub use types::{Align, Axis, CellId, Rect, ScrollRequest};
