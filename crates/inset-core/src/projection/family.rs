//! The closed set of built-in projection families.
//!
//! [`FamilyKind`] is the name a territory configuration refers to;
//! [`ProjectionFamily`] is the kind together with the parameters that family
//! actually uses. Only the conic families carry standard parallels.

use std::{
    fmt::{self, Display},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::GeoPoint;

/// Half the width, in degrees, of the parallels synthesised for a conic
/// family when none are given.
const SYNTHESISED_PARALLEL_SPREAD: f64 = 2.0;

/// Error returned when parsing an unrecognised family name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "unknown projection family `{0}`, valid values: mercator, equirectangular, conic_equal_area, conic_conformal, azimuthal_equal_area, azimuthal_equidistant"
)]
pub struct UnknownFamily(pub String);

/// The name of a projection family.
///
/// Names match external configuration strings (snake_case). Parsing also
/// accepts kebab-case and the alias `cylindrical` for Mercator.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum FamilyKind {
    #[default]
    Mercator,
    Equirectangular,
    ConicEqualArea,
    ConicConformal,
    AzimuthalEqualArea,
    AzimuthalEquidistant,
}

impl FamilyKind {
    /// Every family, in the order they are documented.
    pub const ALL: [FamilyKind; 6] = [
        FamilyKind::Mercator,
        FamilyKind::Equirectangular,
        FamilyKind::ConicEqualArea,
        FamilyKind::ConicConformal,
        FamilyKind::AzimuthalEqualArea,
        FamilyKind::AzimuthalEquidistant,
    ];

    pub fn is_conic(self) -> bool {
        matches!(self, Self::ConicEqualArea | Self::ConicConformal)
    }

    pub fn is_azimuthal(self) -> bool {
        matches!(self, Self::AzimuthalEqualArea | Self::AzimuthalEquidistant)
    }
}

impl FromStr for FamilyKind {
    type Err = UnknownFamily;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "mercator" | "cylindrical" => Ok(Self::Mercator),
            "equirectangular" => Ok(Self::Equirectangular),
            "conic_equal_area" => Ok(Self::ConicEqualArea),
            "conic_conformal" => Ok(Self::ConicConformal),
            "azimuthal_equal_area" => Ok(Self::AzimuthalEqualArea),
            "azimuthal_equidistant" => Ok(Self::AzimuthalEquidistant),
            _ => Err(UnknownFamily(s.to_string())),
        }
    }
}

impl TryFrom<String> for FamilyKind {
    type Error = UnknownFamily;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FamilyKind> for &'static str {
    fn from(val: FamilyKind) -> Self {
        match val {
            FamilyKind::Mercator => "mercator",
            FamilyKind::Equirectangular => "equirectangular",
            FamilyKind::ConicEqualArea => "conic_equal_area",
            FamilyKind::ConicConformal => "conic_conformal",
            FamilyKind::AzimuthalEqualArea => "azimuthal_equal_area",
            FamilyKind::AzimuthalEquidistant => "azimuthal_equidistant",
        }
    }
}

impl Display for FamilyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s: &'static str = (*self).into();
        write!(f, "{s}")
    }
}

/// A projection family with its family-specific parameters.
///
/// Parallels are standard latitudes in degrees.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub enum ProjectionFamily {
    #[default]
    Mercator,
    Equirectangular,
    ConicEqualArea { parallels: [f64; 2] },
    ConicConformal { parallels: [f64; 2] },
    AzimuthalEqualArea,
    AzimuthalEquidistant,
}

impl ProjectionFamily {
    /// Builds a family of the given kind.
    ///
    /// Conic kinds use `parallels` when given, otherwise parallels two
    /// degrees either side of `center`'s latitude. Non-conic kinds ignore
    /// `parallels`.
    pub fn from_kind(kind: FamilyKind, parallels: Option<[f64; 2]>, center: GeoPoint) -> Self {
        let conic_parallels = || {
            parallels.unwrap_or([
                center.lat() - SYNTHESISED_PARALLEL_SPREAD,
                center.lat() + SYNTHESISED_PARALLEL_SPREAD,
            ])
        };
        match kind {
            FamilyKind::Mercator => Self::Mercator,
            FamilyKind::Equirectangular => Self::Equirectangular,
            FamilyKind::ConicEqualArea => Self::ConicEqualArea {
                parallels: conic_parallels(),
            },
            FamilyKind::ConicConformal => Self::ConicConformal {
                parallels: conic_parallels(),
            },
            FamilyKind::AzimuthalEqualArea => Self::AzimuthalEqualArea,
            FamilyKind::AzimuthalEquidistant => Self::AzimuthalEquidistant,
        }
    }

    pub fn kind(self) -> FamilyKind {
        match self {
            Self::Mercator => FamilyKind::Mercator,
            Self::Equirectangular => FamilyKind::Equirectangular,
            Self::ConicEqualArea { .. } => FamilyKind::ConicEqualArea,
            Self::ConicConformal { .. } => FamilyKind::ConicConformal,
            Self::AzimuthalEqualArea => FamilyKind::AzimuthalEqualArea,
            Self::AzimuthalEquidistant => FamilyKind::AzimuthalEquidistant,
        }
    }

    /// Returns the standard parallels of a conic family.
    pub fn parallels(self) -> Option<[f64; 2]> {
        match self {
            Self::ConicEqualArea { parallels } | Self::ConicConformal { parallels } => Some(parallels),
            _ => None,
        }
    }

    /// Returns a copy with new parallels, or `None` for non-conic families.
    pub fn with_parallels(self, parallels: [f64; 2]) -> Option<Self> {
        match self {
            Self::ConicEqualArea { .. } => Some(Self::ConicEqualArea { parallels }),
            Self::ConicConformal { .. } => Some(Self::ConicConformal { parallels }),
            _ => None,
        }
    }

    pub fn is_conic(self) -> bool {
        self.kind().is_conic()
    }

    pub fn is_azimuthal(self) -> bool {
        self.kind().is_azimuthal()
    }
}
