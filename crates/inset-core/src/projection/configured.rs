//! A ready-made [`Projection`] over the built-in families.

use std::f64::consts::FRAC_1_SQRT_2;

use log::debug;

use crate::{
    clip::{clip_ring, clip_segment},
    geometry::{ClipExtent, GeoPoint, ScreenPoint, ScreenRect},
    stream::GeometrySink,
};

use super::{Projection, ProjectionError, ProjectionFamily, Rotation, raw::RawProjection, rotation::Rotator};

const DEFAULT_SCALE: f64 = 150.0;
const DEFAULT_TRANSLATE: ScreenPoint = ScreenPoint::new(480.0, 250.0);

/// Maximum number of times a stream edge is halved while resampling.
const MAX_RESAMPLE_DEPTH: u32 = 8;

/// A projection of one [`ProjectionFamily`] with rotation, center, scale,
/// translate, clip extent and resampling precision.
///
/// The screen transform is
///
/// ```text
/// x' = tx + k * (x - cx)
/// y' = ty - k * (y - cy)
/// ```
///
/// where `(x, y)` is the raw projection of the rotated point, `k` the scale,
/// `(tx, ty)` the translate and `(cx, cy)` the raw projection of the rotated
/// center. The center is therefore always drawn at the translate.
///
/// # Examples
///
/// ```
/// # use inset_core::geometry::{GeoPoint, ScreenPoint};
/// # use inset_core::projection::{ConfiguredProjection, Projection, ProjectionFamily, Rotation};
/// let projection = ConfiguredProjection::new(ProjectionFamily::AzimuthalEqualArea)
///     .with_rotation(Rotation::new(-2.0, -47.0, 0.0))
///     .unwrap()
///     .with_center(GeoPoint::new(2.0, 47.0))
///     .unwrap()
///     .with_translate(ScreenPoint::new(400.0, 300.0));
///
/// let at_center = projection.project(GeoPoint::new(2.0, 47.0)).unwrap();
/// assert!((at_center.x() - 400.0).abs() < 1e-9);
/// assert!((at_center.y() - 300.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone)]
pub struct ConfiguredProjection {
    family: ProjectionFamily,
    scale: f64,
    translate: ScreenPoint,
    center: GeoPoint,
    rotation: Rotation,
    clip_extent: Option<ClipExtent>,
    precision: f64,

    rotator: Rotator,
    raw: RawProjection,
    center_raw: (f64, f64),
}

impl ConfiguredProjection {
    /// Creates a projection of `family` centred on `(0°, 0°)` with no
    /// rotation and no clip extent.
    pub fn new(family: ProjectionFamily) -> Self {
        let raw = RawProjection::new(family);
        Self {
            family,
            scale: DEFAULT_SCALE,
            translate: DEFAULT_TRANSLATE,
            center: GeoPoint::default(),
            rotation: Rotation::default(),
            clip_extent: None,
            precision: FRAC_1_SQRT_2,
            rotator: Rotator::new(Rotation::default()),
            raw,
            center_raw: raw.forward(0.0, 0.0).unwrap_or_default(),
        }
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_translate(mut self, translate: ScreenPoint) -> Self {
        self.translate = translate;
        self
    }

    pub fn with_clip_extent(mut self, clip_extent: Option<ClipExtent>) -> Self {
        self.clip_extent = clip_extent;
        self
    }

    /// Sets the center.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectionError::OutOfDomain`] if the center cannot be
    /// projected with the current family and rotation.
    pub fn with_center(mut self, center: GeoPoint) -> Result<Self, ProjectionError> {
        self.set_center(center)?;
        Ok(self)
    }

    /// Sets the rotation.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectionError::OutOfDomain`] if the rotated center cannot
    /// be projected.
    pub fn with_rotation(mut self, rotation: Rotation) -> Result<Self, ProjectionError> {
        self.set_rotation(rotation)?;
        Ok(self)
    }

    /// Sets the resampling precision.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectionError::InvalidParameter`] for negative or
    /// non-finite values.
    pub fn with_precision(mut self, precision: f64) -> Result<Self, ProjectionError> {
        self.set_precision(precision)?;
        Ok(self)
    }

    pub fn family(&self) -> ProjectionFamily {
        self.family
    }

    /// Switches to another family, keeping every other setting.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectionError::OutOfDomain`] if the current center cannot
    /// be projected by the new family. The projection is left unchanged.
    pub fn set_family(&mut self, family: ProjectionFamily) -> Result<(), ProjectionError> {
        self.reconfigure(|next| next.family = family)
    }

    fn reconfigure(&mut self, update: impl FnOnce(&mut Self)) -> Result<(), ProjectionError> {
        let mut next = self.clone();
        update(&mut next);
        next.rotator = Rotator::new(next.rotation);
        next.raw = RawProjection::new(next.family);
        let Some(center_raw) = next.project_unit(next.center) else {
            debug!(family:% = next.family.kind(), center:% = next.center; "Center does not project, keeping previous configuration");
            return Err(ProjectionError::OutOfDomain(next.center.to_string()));
        };
        next.center_raw = center_raw;
        *self = next;
        Ok(())
    }

    /// Rotates and raw-projects a point, before the screen transform.
    fn project_unit(&self, point: GeoPoint) -> Option<(f64, f64)> {
        if !point.is_finite() || point.lat().abs() > 90.0 {
            return None;
        }
        let (lambda, phi) = self
            .rotator
            .forward(point.lon().to_radians(), point.lat().to_radians());
        self.raw.forward(lambda, phi)
    }

    fn to_screen(&self, (x, y): (f64, f64)) -> ScreenPoint {
        ScreenPoint::new(
            self.translate.x() + self.scale * (x - self.center_raw.0),
            self.translate.y() - self.scale * (y - self.center_raw.1),
        )
    }

    fn clip_rect(&self) -> Option<ScreenRect> {
        self.clip_extent.map(ClipExtent::normalized)
    }

    /// Pushes the screen points that approximate the edge `from → to` into
    /// `out`, ending with `to`'s screen point.
    ///
    /// Edges are interpolated linearly in longitude and latitude and halved
    /// while the projected midpoint strays from the chord by more than the
    /// precision.
    fn resample(&self, from: (GeoPoint, ScreenPoint), to: (GeoPoint, ScreenPoint), depth: u32, out: &mut Vec<ScreenPoint>) {
        let crosses_antimeridian = (to.0.lon() - from.0.lon()).abs() > 180.0;
        if depth > 0 && self.precision > 0.0 && !crosses_antimeridian {
            let mid_geo = GeoPoint::new(
                (from.0.lon() + to.0.lon()) / 2.0,
                (from.0.lat() + to.0.lat()) / 2.0,
            );
            if let Some(mid) = self.project(mid_geo) {
                let offset = mid.sub_point(from.1.lerp(to.1, 0.5));
                if offset.x().hypot(offset.y()) > self.precision {
                    self.resample(from, (mid_geo, mid), depth - 1, out);
                    self.resample((mid_geo, mid), to, depth - 1, out);
                    return;
                }
            }
        }
        out.push(to.1);
    }
}

impl Default for ConfiguredProjection {
    fn default() -> Self {
        Self::new(ProjectionFamily::default())
    }
}

impl Projection for ConfiguredProjection {
    fn project(&self, point: GeoPoint) -> Option<ScreenPoint> {
        self.project_unit(point).map(|unit| self.to_screen(unit))
    }

    fn stream(&self, output: Box<dyn GeometrySink>) -> Box<dyn GeometrySink> {
        Box::new(ProjectionStream::new(self.clone(), output))
    }

    fn scale(&self) -> f64 {
        self.scale
    }

    fn set_scale(&mut self, scale: f64) {
        self.scale = scale;
    }

    fn translate(&self) -> ScreenPoint {
        self.translate
    }

    fn set_translate(&mut self, translate: ScreenPoint) {
        self.translate = translate;
    }

    fn supports_invert(&self) -> bool {
        true
    }

    fn invert(&self, point: ScreenPoint) -> Result<GeoPoint, ProjectionError> {
        let out_of_domain = || ProjectionError::OutOfDomain(format!("({}, {})", point.x(), point.y()));
        if !point.is_finite() || self.scale == 0.0 {
            return Err(out_of_domain());
        }
        let x = (point.x() - self.translate.x()) / self.scale + self.center_raw.0;
        let y = (self.translate.y() - point.y()) / self.scale + self.center_raw.1;
        let (lambda, phi) = self.raw.inverse(x, y).ok_or_else(out_of_domain)?;
        let (lambda, phi) = self.rotator.inverse(lambda, phi);
        Ok(GeoPoint::new(lambda.to_degrees(), phi.to_degrees()))
    }

    fn center(&self) -> Option<GeoPoint> {
        Some(self.center)
    }

    fn set_center(&mut self, center: GeoPoint) -> Result<(), ProjectionError> {
        self.reconfigure(|next| next.center = center)
    }

    fn rotation(&self) -> Option<Rotation> {
        Some(self.rotation)
    }

    fn set_rotation(&mut self, rotation: Rotation) -> Result<(), ProjectionError> {
        self.reconfigure(|next| next.rotation = rotation)
    }

    fn parallels(&self) -> Option<[f64; 2]> {
        self.family.parallels()
    }

    fn set_parallels(&mut self, parallels: [f64; 2]) -> Result<(), ProjectionError> {
        if !parallels.iter().all(|p| p.is_finite() && p.abs() <= 90.0) {
            return Err(ProjectionError::InvalidParameter(format!(
                "parallels {parallels:?} must be latitudes in [-90, 90]"
            )));
        }
        let family = self
            .family
            .with_parallels(parallels)
            .ok_or(ProjectionError::Unsupported("parallels"))?;
        self.set_family(family)
    }

    fn clip_extent(&self) -> Option<ClipExtent> {
        self.clip_extent
    }

    fn set_clip_extent(&mut self, extent: Option<ClipExtent>) -> Result<(), ProjectionError> {
        self.clip_extent = extent;
        Ok(())
    }

    fn precision(&self) -> Option<f64> {
        Some(self.precision)
    }

    fn set_precision(&mut self, precision: f64) -> Result<(), ProjectionError> {
        if !precision.is_finite() || precision < 0.0 {
            return Err(ProjectionError::InvalidParameter(format!(
                "precision must be a non-negative number, got {precision}"
            )));
        }
        self.precision = precision;
        Ok(())
    }
}

/// Stream returned by [`ConfiguredProjection::stream`].
///
/// Incoming coordinates are `(lon, lat)` in degrees. Lines are resampled and
/// split wherever a vertex fails to project; with a clip extent, line
/// segments are clipped as they arrive and polygon rings are buffered and
/// clipped once the ring ends.
struct ProjectionStream {
    projection: ConfiguredProjection,
    clip: Option<ScreenRect>,
    output: Box<dyn GeometrySink>,

    in_line: bool,
    in_polygon: bool,
    /// Output has an open line for the current line run.
    line_open: bool,
    /// Output has received `polygon_start` for the current polygon.
    polygon_open: bool,
    previous: Option<(GeoPoint, ScreenPoint)>,
    ring: Vec<ScreenPoint>,
    scratch: Vec<ScreenPoint>,
}

impl ProjectionStream {
    fn new(projection: ConfiguredProjection, output: Box<dyn GeometrySink>) -> Self {
        let clip = projection.clip_rect();
        Self {
            projection,
            clip,
            output,
            in_line: false,
            in_polygon: false,
            line_open: false,
            polygon_open: false,
            previous: None,
            ring: Vec::new(),
            scratch: Vec::new(),
        }
    }

    fn lone_point(&mut self, geo: GeoPoint) {
        let Some(screen) = self.projection.project(geo) else {
            return;
        };
        if self.clip.is_none_or(|rect| rect.contains(screen)) {
            self.output.point(screen.x(), screen.y());
        }
    }

    fn line_point(&mut self, geo: GeoPoint) {
        let Some(screen) = self.projection.project(geo) else {
            self.previous = None;
            if !self.in_polygon {
                self.close_line();
            }
            return;
        };

        let Some(previous) = self.previous.replace((geo, screen)) else {
            self.start_run(screen);
            return;
        };

        let mut points = std::mem::take(&mut self.scratch);
        points.clear();
        self.projection
            .resample(previous, (geo, screen), MAX_RESAMPLE_DEPTH, &mut points);

        let mut from = previous.1;
        for &to in &points {
            if self.in_polygon {
                self.ring.push(to);
            } else {
                self.line_segment(from, to);
            }
            from = to;
        }
        self.scratch = points;
    }

    fn start_run(&mut self, screen: ScreenPoint) {
        if self.in_polygon {
            self.ring.push(screen);
        } else if self.clip.is_none_or(|rect| rect.contains(screen)) {
            self.open_line(screen);
        }
    }

    fn line_segment(&mut self, from: ScreenPoint, to: ScreenPoint) {
        let Some(rect) = self.clip else {
            self.output.point(to.x(), to.y());
            return;
        };
        match clip_segment(from, to, rect) {
            Some((start, end)) => {
                if !self.line_open {
                    self.open_line(start);
                }
                self.output.point(end.x(), end.y());
                if end != to {
                    self.close_line();
                }
            }
            None => self.close_line(),
        }
    }

    fn open_line(&mut self, start: ScreenPoint) {
        self.output.line_start();
        self.output.point(start.x(), start.y());
        self.line_open = true;
    }

    fn close_line(&mut self) {
        if self.line_open {
            self.output.line_end();
            self.line_open = false;
        }
    }

    fn flush_ring(&mut self) {
        let ring = match self.clip {
            Some(rect) if self.ring.len() >= 3 => clip_ring(&self.ring, rect),
            Some(_) => Vec::new(),
            None => std::mem::take(&mut self.ring),
        };
        self.ring.clear();
        self.emit_ring(&ring);
    }

    fn emit_ring(&mut self, ring: &[ScreenPoint]) {
        if ring.is_empty() {
            return;
        }
        if !self.polygon_open {
            self.output.polygon_start();
            self.polygon_open = true;
        }
        self.output.line_start();
        for point in ring {
            self.output.point(point.x(), point.y());
        }
        self.output.line_end();
    }
}

impl GeometrySink for ProjectionStream {
    fn point(&mut self, x: f64, y: f64) {
        let geo = GeoPoint::new(x, y);
        if self.in_line {
            self.line_point(geo);
        } else {
            self.lone_point(geo);
        }
    }

    fn line_start(&mut self) {
        self.in_line = true;
        self.previous = None;
        self.ring.clear();
    }

    fn line_end(&mut self) {
        if self.in_polygon {
            self.flush_ring();
        } else {
            self.close_line();
        }
        self.in_line = false;
        self.previous = None;
    }

    fn polygon_start(&mut self) {
        self.in_polygon = true;
        self.polygon_open = false;
    }

    fn polygon_end(&mut self) {
        if self.polygon_open {
            self.output.polygon_end();
        }
        self.in_polygon = false;
        self.polygon_open = false;
    }

    fn supports_sphere(&self) -> bool {
        true
    }

    /// Emits the clip rectangle as a polygon when clipped, otherwise passes
    /// the sphere on to an output that understands it.
    fn sphere(&mut self) {
        match self.clip {
            Some(rect) => {
                let was_open = self.polygon_open;
                self.polygon_open = false;
                self.emit_ring(&rect.corners());
                self.output.polygon_end();
                self.polygon_open = was_open;
            }
            None if self.output.supports_sphere() => self.output.sphere(),
            None => {}
        }
    }
}
