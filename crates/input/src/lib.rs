//! Driver input: press/release edges accumulated into per-frame controls.
//!
//! # Invariants
//! - Pedals are never clamped here; holding opposing keys cancels out and
//!   holding several forward keys can exceed one.
//! - Every press is matched by its release, so a released keyboard returns
//!   to neutral controls.

pub mod action;

pub use action::{ControlState, Edge, PedalAction};
