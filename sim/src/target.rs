//! Target trajectory models and state propagation.
//!
//! Each target has a 6-DOF true state [px,py,pz,vx,vy,vz] and a `MotionSpec`
//! describing how it moves. The simulator steps each target forward in time
//! and hands sensors a [`State`] snapshot.

use serde::{Deserialize, Serialize};
use tracker_core::types::State;

/// Position indices of the truth state handed to sensors.
pub const POSITION_2D: [usize; 2] = [0, 1];
pub const POSITION_3D: [usize; 3] = [0, 1, 2];
/// Dimension of the truth state handed to sensors.
pub const STATE_DIM: usize = 6;

/// Describes how a target moves.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum MotionSpec {
    /// Does not move; velocity is ignored.
    Static,
    /// Constant velocity: no acceleration.
    ConstantVelocity,
    /// Constant-turn-rate on XY plane. `omega` = yaw rate (rad/s).
    ConstantTurn { omega: f64 },
}

/// A simulated target with ground-truth state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub id: u64,
    /// True state [px, py, pz, vx, vy, vz]
    pub state: [f64; 6],
    pub motion: MotionSpec,
    /// Optional: target disappears after this time
    pub disappear_at: Option<f64>,
    /// Optional: target appears after this time (no measurements before)
    pub appear_at: Option<f64>,
}

impl Target {
    pub fn new(id: u64, position: [f64; 3], velocity: [f64; 3], motion: MotionSpec) -> Self {
        Self {
            id,
            state: [
                position[0], position[1], position[2], velocity[0], velocity[1], velocity[2],
            ],
            motion,
            disappear_at: None,
            appear_at: None,
        }
    }

    /// Propagate true state by `dt` seconds according to motion spec.
    pub fn step(&mut self, dt: f64) {
        let s = &mut self.state;
        match self.motion {
            MotionSpec::Static => {}
            MotionSpec::ConstantVelocity => {
                s[0] += s[3] * dt;
                s[1] += s[4] * dt;
                s[2] += s[5] * dt;
            }
            MotionSpec::ConstantTurn { omega } => {
                let v = (s[3] * s[3] + s[4] * s[4]).sqrt();
                let heading = s[4].atan2(s[3]);
                let new_heading = heading + omega * dt;
                s[0] += v * heading.cos() * dt;
                s[1] += v * heading.sin() * dt;
                s[2] += s[5] * dt;
                s[3] = v * new_heading.cos();
                s[4] = v * new_heading.sin();
            }
        }
    }

    /// True if target is active at time `t`.
    pub fn is_active(&self, t: f64) -> bool {
        if let Some(appear) = self.appear_at {
            if t < appear {
                return false;
            }
        }
        if let Some(disappear) = self.disappear_at {
            if t >= disappear {
                return false;
            }
        }
        true
    }

    /// Ground truth at time `t` as seen by sensors.
    pub fn truth(&self, t: f64) -> State {
        State::from_slice(&self.state, t)
    }
}
