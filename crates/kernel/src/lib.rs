//! Vehicle kernel: profile, engine torque curves, and the per-frame dynamics
//! integrator of a single car.
//!
//! # Invariants
//! - A step is a pure function of profile, state, controls and `dt`.
//! - Profile preconditions are checked once, at construction.
//! - A vehicle owns exactly one live state, replaced wholesale each step.

pub mod config;
pub mod engine;
pub mod forces;
pub mod integrator;
pub mod profile;
pub mod state;
pub mod vehicle;

pub use config::{ConfigError, EngineSpec, ProfileConfig};
pub use engine::{ConstantTorque, EngineTorqueCurve, TableTorque};
pub use integrator::{StepForces, StepReport, simulate, step};
pub use profile::{ProfileError, ProfileParams, VehicleProfile};
pub use state::{Controls, FRONT, UP, VehicleState};
pub use vehicle::{MAX_SUBSTEPS, Vehicle, VehicleEvent};
