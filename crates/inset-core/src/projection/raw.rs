//! Raw projection formulas on the unit sphere.
//!
//! Inputs and outputs are radians; `y` grows northward. Scaling, centering
//! and the screen flip happen in [`ConfiguredProjection`](super::ConfiguredProjection).

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

use super::{ProjectionFamily, rotation::asin_clamped};

const EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Copy)]
pub(super) enum RawProjection {
    Mercator,
    Equirectangular,
    CylindricalEqualArea { cos_phi0: f64 },
    ConicEqualArea { n: f64, c: f64, r0: f64 },
    ConicConformal { n: f64, f: f64 },
    AzimuthalEqualArea,
    AzimuthalEquidistant,
}

impl RawProjection {
    pub(super) fn new(family: ProjectionFamily) -> Self {
        match family {
            ProjectionFamily::Mercator => Self::Mercator,
            ProjectionFamily::Equirectangular => Self::Equirectangular,
            ProjectionFamily::ConicEqualArea { parallels } => conic_equal_area(parallels),
            ProjectionFamily::ConicConformal { parallels } => conic_conformal(parallels),
            ProjectionFamily::AzimuthalEqualArea => Self::AzimuthalEqualArea,
            ProjectionFamily::AzimuthalEquidistant => Self::AzimuthalEquidistant,
        }
    }

    pub(super) fn forward(&self, lambda: f64, phi: f64) -> Option<(f64, f64)> {
        let (x, y) = match *self {
            Self::Mercator => {
                if phi.abs() >= FRAC_PI_2 {
                    return None;
                }
                (lambda, tan_half(phi).ln())
            }
            Self::Equirectangular => (lambda, phi),
            Self::CylindricalEqualArea { cos_phi0 } => (lambda * cos_phi0, phi.sin() / cos_phi0),
            Self::ConicEqualArea { n, c, r0 } => {
                let r = (c - 2.0 * n * phi.sin()).max(0.0).sqrt() / n;
                let theta = lambda * n;
                (r * theta.sin(), r0 - r * theta.cos())
            }
            Self::ConicConformal { n, f } => {
                let phi = if f > 0.0 {
                    phi.max(-FRAC_PI_2 + EPSILON)
                } else {
                    phi.min(FRAC_PI_2 - EPSILON)
                };
                let r = f / tan_half(phi).powf(n);
                let theta = lambda * n;
                (r * theta.sin(), f - r * theta.cos())
            }
            Self::AzimuthalEqualArea => {
                let cos_c = lambda.cos() * phi.cos();
                let k = (2.0 / (1.0 + cos_c)).sqrt();
                azimuthal(lambda, phi, k)?
            }
            Self::AzimuthalEquidistant => {
                let c = asin_safe_acos(lambda.cos() * phi.cos());
                let k = if c.abs() < EPSILON { 1.0 } else { c / c.sin() };
                azimuthal(lambda, phi, k)?
            }
        };
        (x.is_finite() && y.is_finite()).then_some((x, y))
    }

    pub(super) fn inverse(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let (lambda, phi) = match *self {
            Self::Mercator => (x, 2.0 * y.exp().atan() - FRAC_PI_2),
            Self::Equirectangular => (x, y),
            Self::CylindricalEqualArea { cos_phi0 } => {
                let s = y * cos_phi0;
                if s.abs() > 1.0 + EPSILON {
                    return None;
                }
                (x / cos_phi0, asin_clamped(s))
            }
            Self::ConicEqualArea { n, c, r0 } => {
                let r0y = r0 - y;
                let mut l = x.atan2(r0y.abs()) * sign(r0y);
                if r0y * n < 0.0 {
                    l -= PI * sign(x) * sign(r0y);
                }
                let s = (c - (x * x + r0y * r0y) * n * n) / (2.0 * n);
                if s.abs() > 1.0 + EPSILON {
                    return None;
                }
                (l / n, asin_clamped(s))
            }
            Self::ConicConformal { n, f } => {
                let fy = f - y;
                let r = sign(n) * (x * x + fy * fy).sqrt();
                let mut l = x.atan2(fy.abs()) * sign(fy);
                if fy * n < 0.0 {
                    l -= PI * sign(x) * sign(fy);
                }
                (l / n, 2.0 * (f / r).powf(1.0 / n).atan() - FRAC_PI_2)
            }
            Self::AzimuthalEqualArea => {
                let z = x.hypot(y);
                if z > 2.0 + EPSILON {
                    return None;
                }
                azimuthal_inverse(x, y, z, 2.0 * asin_clamped(z / 2.0))
            }
            Self::AzimuthalEquidistant => {
                let z = x.hypot(y);
                if z > PI + EPSILON {
                    return None;
                }
                azimuthal_inverse(x, y, z, z)
            }
        };
        (lambda.is_finite() && phi.is_finite() && lambda.abs() <= PI + EPSILON && phi.abs() <= FRAC_PI_2 + EPSILON)
            .then_some((lambda, phi))
    }
}

fn conic_equal_area([phi0, phi1]: [f64; 2]) -> RawProjection {
    let (phi0, phi1) = (phi0.to_radians(), phi1.to_radians());
    let sin0 = phi0.sin();
    let n = (sin0 + phi1.sin()) / 2.0;
    if n.abs() < EPSILON {
        return RawProjection::CylindricalEqualArea {
            cos_phi0: phi0.cos(),
        };
    }
    let c = 1.0 + sin0 * (2.0 * n - sin0);
    RawProjection::ConicEqualArea {
        n,
        c,
        r0: c.sqrt() / n,
    }
}

fn conic_conformal([phi0, phi1]: [f64; 2]) -> RawProjection {
    let (phi0, phi1) = (phi0.to_radians(), phi1.to_radians());
    let cos0 = phi0.cos();
    let n = if (phi0 - phi1).abs() < f64::EPSILON {
        phi0.sin()
    } else {
        (cos0 / phi1.cos()).ln() / (tan_half(phi1) / tan_half(phi0)).ln()
    };
    if n.abs() < EPSILON || !n.is_finite() {
        return RawProjection::Mercator;
    }
    RawProjection::ConicConformal {
        n,
        f: cos0 * tan_half(phi0).powf(n) / n,
    }
}

/// Sign that maps zero to zero, unlike [`f64::signum`].
fn sign(value: f64) -> f64 {
    if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else {
        0.0
    }
}

fn tan_half(phi: f64) -> f64 {
    (FRAC_PI_4 + phi / 2.0).tan()
}

fn asin_safe_acos(value: f64) -> f64 {
    value.clamp(-1.0, 1.0).acos()
}

fn azimuthal(lambda: f64, phi: f64, k: f64) -> Option<(f64, f64)> {
    if !k.is_finite() {
        return None;
    }
    let cos_phi = phi.cos();
    Some((k * cos_phi * lambda.sin(), k * phi.sin()))
}

fn azimuthal_inverse(x: f64, y: f64, z: f64, c: f64) -> (f64, f64) {
    let (sin_c, cos_c) = c.sin_cos();
    let phi = if z == 0.0 { 0.0 } else { asin_clamped(y * sin_c / z) };
    ((x * sin_c).atan2(z * cos_c), phi)
}
