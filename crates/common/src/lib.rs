//! Render-facing types shared by the carsim crates.
//!
//! The dynamics kernel works in double precision; everything here is `f32`,
//! ready to hand to a scene graph.

pub mod types;

pub use types::{RenderPose, Transform};
