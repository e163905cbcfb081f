//! Spherical rotation applied before the raw projection.

use std::f64::consts::{PI, TAU};

use super::Rotation;

/// Precomputed trigonometry for a [`Rotation`].
#[derive(Debug, Clone, Copy)]
pub(super) struct Rotator {
    delta_lambda: f64,
    cos_phi: f64,
    sin_phi: f64,
    cos_gamma: f64,
    sin_gamma: f64,
    tilts: bool,
}

impl Rotator {
    pub(super) fn new(rotation: Rotation) -> Self {
        let delta_phi = rotation.phi().to_radians();
        let delta_gamma = rotation.gamma().to_radians();
        Self {
            delta_lambda: rotation.lambda().to_radians(),
            cos_phi: delta_phi.cos(),
            sin_phi: delta_phi.sin(),
            cos_gamma: delta_gamma.cos(),
            sin_gamma: delta_gamma.sin(),
            tilts: delta_phi != 0.0 || delta_gamma != 0.0,
        }
    }

    /// Rotates `(lambda, phi)` in radians.
    pub(super) fn forward(&self, lambda: f64, phi: f64) -> (f64, f64) {
        let lambda = wrap_longitude(lambda + self.delta_lambda);
        if !self.tilts {
            return (lambda, phi);
        }

        let cos_p = phi.cos();
        let x = lambda.cos() * cos_p;
        let y = lambda.sin() * cos_p;
        let z = phi.sin();
        let k = z * self.cos_phi + x * self.sin_phi;

        (
            (y * self.cos_gamma - k * self.sin_gamma).atan2(x * self.cos_phi - z * self.sin_phi),
            asin_clamped(k * self.cos_gamma + y * self.sin_gamma),
        )
    }

    /// Undoes [`forward`](Rotator::forward).
    pub(super) fn inverse(&self, lambda: f64, phi: f64) -> (f64, f64) {
        let (lambda, phi) = if self.tilts {
            let cos_p = phi.cos();
            let x = lambda.cos() * cos_p;
            let y = lambda.sin() * cos_p;
            let z = phi.sin();
            let k = z * self.cos_gamma - y * self.sin_gamma;

            (
                (y * self.cos_gamma + z * self.sin_gamma).atan2(x * self.cos_phi + k * self.sin_phi),
                asin_clamped(k * self.cos_phi - x * self.sin_phi),
            )
        } else {
            (lambda, phi)
        };

        (wrap_longitude(lambda - self.delta_lambda), phi)
    }
}

/// Wraps a longitude in radians into `[-π, π]`.
pub(super) fn wrap_longitude(lambda: f64) -> f64 {
    if lambda > PI {
        lambda - TAU
    } else if lambda < -PI {
        lambda + TAU
    } else {
        lambda
    }
}

pub(super) fn asin_clamped(value: f64) -> f64 {
    value.clamp(-1.0, 1.0).asin()
}
