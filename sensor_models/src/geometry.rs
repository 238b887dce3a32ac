//! Global → sensor frame conversion.
//!
//! # Conventions
//! - Orientation is `[θx, θy, θz]` (roll, pitch, yaw) in radians.
//! - A global vector `p` is taken into the sensor frame by
//!   `Rz(−θz)·Ry(−θy)·Rx(−θx)·(p − t)` where `t` is the sensor position,
//!   i.e. the inverse of the sensor's own attitude.
//! - 2D positions are handled as 3D with z = 0.
//! - Bearing / azimuth = atan2(y, x), elevation = asin(z / r).

use crate::error::{ensure_len, Result, SensorError};
use nalgebra::{Matrix3, Rotation3, Vector3};
use tracker_core::types::{Bearing, State};

/// Rotation taking global-frame vectors into the frame of a sensor with
/// the given orientation.
pub fn rotation_matrix(orientation: &Vector3<f64>) -> Matrix3<f64> {
    let rot_x = Rotation3::from_axis_angle(&Vector3::x_axis(), -orientation[0]);
    let rot_y = Rotation3::from_axis_angle(&Vector3::y_axis(), -orientation[1]);
    let rot_z = Rotation3::from_axis_angle(&Vector3::z_axis(), -orientation[2]);
    (rot_z * rot_y * rot_x).into_inner()
}

/// Pick the position components of `state` named by `mapping`.
pub fn mapped_position(state: &State, mapping: &[usize]) -> Result<Vec<f64>> {
    mapping
        .iter()
        .map(|&idx| {
            state
                .state_vector
                .get(idx)
                .copied()
                .ok_or(SensorError::Dimension {
                    context: "state mapping",
                    expected: idx + 1,
                    actual: state.ndim(),
                })
        })
        .collect()
}

/// Sensor-relative Cartesian vector of a 2D or 3D global `position`.
pub fn to_sensor_frame(
    position: &[f64],
    translation: &[f64],
    orientation: &Vector3<f64>,
) -> Result<Vector3<f64>> {
    ensure_len("translation offset", position.len(), translation.len())?;
    let relative = match position.len() {
        2 => Vector3::new(
            position[0] - translation[0],
            position[1] - translation[1],
            0.0,
        ),
        3 => Vector3::new(
            position[0] - translation[0],
            position[1] - translation[1],
            position[2] - translation[2],
        ),
        n => {
            return Err(SensorError::Dimension {
                context: "position",
                expected: if n < 2 { 2 } else { 3 },
                actual: n,
            })
        }
    };
    Ok(rotation_matrix(orientation) * relative)
}

/// (rho, phi) of a planar vector.
pub fn cart2pol(x: f64, y: f64) -> (f64, f64) {
    ((x * x + y * y).sqrt(), y.atan2(x))
}

/// Spherical coordinates of a sensor-frame vector.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Spherical {
    pub range: f64,
    pub azimuth: f64,
    pub elevation: f64,
}

pub fn cart2sphere(v: &Vector3<f64>) -> Spherical {
    let range = v.norm();
    let elevation = if range > 0.0 {
        (v.z / range).asin()
    } else {
        0.0
    };
    Spherical {
        range,
        azimuth: v.y.atan2(v.x),
        elevation,
    }
}

/// Planar bearing and range of `position` as seen by the sensor.
pub fn bearing_range(
    position: &[f64],
    translation: &[f64],
    orientation: &Vector3<f64>,
) -> Result<(Bearing, f64)> {
    let rel = to_sensor_frame(position, translation, orientation)?;
    let (rho, phi) = cart2pol(rel.x, rel.y);
    Ok((Bearing::new(phi), rho))
}
