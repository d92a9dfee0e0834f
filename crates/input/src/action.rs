use carsim_kernel::Controls;
use serde::{Deserialize, Serialize};

/// A driver intent that a key, button or axis can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PedalAction {
    /// Push the fuel pedal forward.
    Fuel,
    /// Push the fuel pedal backward (drive in reverse).
    Reverse,
    Brake,
    SteerLeft,
    SteerRight,
}

/// Transition of a binary input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Edge {
    Press,
    Release,
}

impl Edge {
    fn sign(self) -> f64 {
        match self {
            Edge::Press => 1.0,
            Edge::Release => -1.0,
        }
    }
}

/// Running pedal and steering totals fed by input edges.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ControlState {
    fuel_pedal: f64,
    brake_pedal: f64,
    steering: f64,
}

impl ControlState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one edge.
    pub fn apply(&mut self, action: PedalAction, edge: Edge) {
        let delta = edge.sign();
        match action {
            PedalAction::Fuel => self.fuel_pedal += delta,
            PedalAction::Reverse => self.fuel_pedal -= delta,
            PedalAction::Brake => self.brake_pedal += delta,
            PedalAction::SteerLeft => self.steering += delta,
            PedalAction::SteerRight => self.steering -= delta,
        }
        tracing::trace!(?action, ?edge, fuel = self.fuel_pedal, brake = self.brake_pedal, "control edge");
    }

    pub fn press(&mut self, action: PedalAction) {
        self.apply(action, Edge::Press);
    }

    pub fn release(&mut self, action: PedalAction) {
        self.apply(action, Edge::Release);
    }

    /// Controls for the current frame.
    pub fn controls(&self) -> Controls {
        Controls {
            fuel_pedal: self.fuel_pedal,
            brake_pedal: self.brake_pedal,
            steering: self.steering,
        }
    }

    /// Drop everything back to neutral, e.g. when the window loses focus and
    /// release edges will never arrive.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
