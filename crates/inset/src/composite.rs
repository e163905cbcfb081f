//! Composite projections: many sub-projections behind one [`Projection`].
//!
//! A [`CompositeProjection`] routes every forward projection to the first
//! sub-projection whose geographic bounds contain the point, fans geometry
//! streams out to all sub-projections, and resolves inverse projection with
//! an [`InvertResolver`].
//!
//! # Example
//!
//! ```
//! # use std::rc::Rc;
//! # use inset::composite::{CompositeProjectionBuilder, CompositeProjectionConfig, SubProjectionEntry};
//! # use inset_core::geometry::{GeoBounds, GeoPoint};
//! # use inset_core::projection::{ConfiguredProjection, Projection, ProjectionFamily};
//! let mainland = SubProjectionEntry::new(
//!     "mainland",
//!     "Mainland",
//!     Rc::new(ConfiguredProjection::new(ProjectionFamily::Mercator)),
//! )
//! .with_bounds(GeoBounds::new(-5.0, 41.0, 10.0, 51.0).unwrap());
//!
//! let composite = CompositeProjectionBuilder::new(CompositeProjectionConfig::new(vec![mainland]))
//!     .build()
//!     .unwrap();
//!
//! assert!(composite.project(GeoPoint::new(2.0, 47.0)).is_some());
//! assert!(composite.project(GeoPoint::new(100.0, 0.0)).is_none());
//! ```

use std::{cell::RefCell, collections::HashSet, fmt, rc::Rc};

use log::{debug, info, trace, warn};

use inset_core::{
    geometry::{GeoBounds, GeoPoint, ScreenPoint},
    identifier::Id,
    projection::{Projection, ProjectionError},
    stream::{GeometrySink, PointCapture},
};

use crate::{
    InsetError,
    config::{EngineConfig, ValidationPolicy},
    invert::{self, InvertHit, InvertResolver},
    multiplex::Multiplexer,
};

/// One sub-projection of a composite with its identity and coverage.
///
/// An entry without bounds never receives forward-projected points but
/// accepts any inverted point (a catch-all).
#[derive(Debug, Clone)]
pub struct SubProjectionEntry {
    id: Id,
    display_name: String,
    projection: Rc<dyn Projection>,
    bounds: Option<GeoBounds>,
}

impl SubProjectionEntry {
    pub fn new(id: impl Into<Id>, display_name: impl Into<String>, projection: Rc<dyn Projection>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            projection,
            bounds: None,
        }
    }

    pub fn with_bounds(mut self, bounds: GeoBounds) -> Self {
        self.bounds = Some(bounds);
        self
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn projection(&self) -> &dyn Projection {
        self.projection.as_ref()
    }

    pub fn bounds(&self) -> Option<GeoBounds> {
        self.bounds
    }
}

/// The entries of a composite projection and how to treat them.
#[derive(Debug, Clone)]
pub struct CompositeProjectionConfig {
    entries: Vec<SubProjectionEntry>,
    debug_logging: bool,
    validation: ValidationPolicy,
    invert_tolerance: f64,
}

impl CompositeProjectionConfig {
    /// Creates a configuration with default engine settings.
    pub fn new(entries: Vec<SubProjectionEntry>) -> Self {
        Self {
            entries,
            debug_logging: false,
            validation: ValidationPolicy::default(),
            invert_tolerance: invert::DEFAULT_TOLERANCE,
        }
    }

    /// Applies the debug logging, validation and invert tolerance of `engine`.
    pub fn with_engine(self, engine: &EngineConfig) -> Self {
        self.with_debug_logging(engine.debug_logging())
            .with_validation(engine.validation())
            .with_invert_tolerance(engine.invert_tolerance())
    }

    pub fn with_debug_logging(mut self, debug_logging: bool) -> Self {
        self.debug_logging = debug_logging;
        self
    }

    pub fn with_validation(mut self, validation: ValidationPolicy) -> Self {
        self.validation = validation;
        self
    }

    pub fn with_invert_tolerance(mut self, invert_tolerance: f64) -> Self {
        self.invert_tolerance = invert_tolerance;
        self
    }

    pub fn entries(&self) -> &[SubProjectionEntry] {
        &self.entries
    }
}

/// Validates a [`CompositeProjectionConfig`] and builds the composite.
#[derive(Debug, Clone)]
pub struct CompositeProjectionBuilder {
    config: CompositeProjectionConfig,
}

impl CompositeProjectionBuilder {
    pub fn new(config: CompositeProjectionConfig) -> Self {
        Self { config }
    }

    /// Builds the composite projection.
    ///
    /// # Errors
    ///
    /// Returns [`InsetError::EmptyComposite`] when there are no entries.
    /// Under [`ValidationPolicy::Reject`], returns
    /// [`InsetError::DuplicateEntry`] for a repeated id and
    /// [`InsetError::AmbiguousConfiguration`] for several unbounded entries
    /// or overlapping bounds.
    pub fn build(self) -> Result<CompositeProjection, InsetError> {
        let config = self.config;
        if config.entries.is_empty() {
            return Err(InsetError::EmptyComposite);
        }

        validate(&config.entries, config.validation)?;

        let probes = config
            .entries
            .iter()
            .map(|entry| Probe::new(entry.projection()))
            .collect();

        info!(entries_count = config.entries.len(); "Composite projection built");

        Ok(CompositeProjection {
            entries: config.entries,
            probes,
            debug_logging: config.debug_logging,
            invert_tolerance: config.invert_tolerance,
        })
    }
}

/// A configuration finding that makes routing depend on declaration order.
enum Finding {
    DuplicateId(Id),
    SeveralUnbounded(Vec<Id>),
    Overlap(Id, Id),
}

impl Finding {
    fn into_error(self) -> InsetError {
        match self {
            Finding::DuplicateId(id) => InsetError::DuplicateEntry(id),
            other => InsetError::AmbiguousConfiguration(other.to_string()),
        }
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Finding::DuplicateId(id) => write!(f, "entry id `{id}` is declared more than once"),
            Finding::SeveralUnbounded(ids) => {
                let names: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
                write!(
                    f,
                    "entries {} have no bounds; only the first can ever match an inverted point",
                    names.join(", ")
                )
            }
            Finding::Overlap(first, second) => write!(
                f,
                "bounds of `{first}` and `{second}` overlap; `{first}` wins where they do"
            ),
        }
    }
}

fn findings(entries: &[SubProjectionEntry]) -> Vec<Finding> {
    let mut findings = Vec::new();

    let mut seen = HashSet::new();
    for entry in entries {
        if !seen.insert(entry.id()) {
            findings.push(Finding::DuplicateId(entry.id()));
        }
    }

    let unbounded: Vec<Id> = entries
        .iter()
        .filter(|entry| entry.bounds().is_none())
        .map(SubProjectionEntry::id)
        .collect();
    if unbounded.len() > 1 {
        findings.push(Finding::SeveralUnbounded(unbounded));
    }

    for (index, first) in entries.iter().enumerate() {
        let Some(first_bounds) = first.bounds() else {
            continue;
        };
        for second in &entries[index + 1..] {
            if second.bounds().is_some_and(|bounds| bounds.overlaps(first_bounds)) {
                findings.push(Finding::Overlap(first.id(), second.id()));
            }
        }
    }

    findings
}

fn validate(entries: &[SubProjectionEntry], policy: ValidationPolicy) -> Result<(), InsetError> {
    if policy == ValidationPolicy::Off {
        return Ok(());
    }
    for finding in findings(entries) {
        match policy {
            ValidationPolicy::Reject => return Err(finding.into_error()),
            _ => warn!(finding:% = finding; "Ambiguous composite configuration"),
        }
    }
    Ok(())
}

/// A pre-built stream of one sub-projection ending in a point capture.
///
/// Forward projection pushes a single point through the stream and reads
/// the capture back, so the sub-projection's own clipping applies.
struct Probe {
    capture: Rc<RefCell<PointCapture>>,
    stream: RefCell<Box<dyn GeometrySink>>,
}

impl Probe {
    fn new(projection: &dyn Projection) -> Self {
        let capture = Rc::new(RefCell::new(PointCapture::default()));
        let stream = projection.stream(Box::new(Rc::clone(&capture)));
        Self {
            capture,
            stream: RefCell::new(stream),
        }
    }

    fn project(&self, point: GeoPoint) -> Option<ScreenPoint> {
        self.capture.borrow_mut().reset();
        self.stream.borrow_mut().point(point.lon(), point.lat());
        self.capture.borrow_mut().take()
    }
}

/// Several sub-projections behaving as one [`Projection`].
///
/// Built by [`CompositeProjectionBuilder`]. A composite is immutable: to
/// change a sub-projection, build a new composite.
pub struct CompositeProjection {
    entries: Vec<SubProjectionEntry>,
    probes: Vec<Probe>,
    debug_logging: bool,
    invert_tolerance: f64,
}

impl CompositeProjection {
    /// Returns the entries in declaration order.
    pub fn entries(&self) -> &[SubProjectionEntry] {
        &self.entries
    }

    /// Returns the entry with the given id.
    pub fn entry(&self, id: Id) -> Option<&SubProjectionEntry> {
        self.entries.iter().find(|entry| entry.id() == id)
    }

    /// Projects `point` and reports which entry routed it.
    ///
    /// Only bounded entries are consulted, in declaration order, with zero
    /// tolerance. The first entry whose stream captures the point wins.
    pub fn project_with_entry(&self, point: GeoPoint) -> Option<(Id, ScreenPoint)> {
        for (entry, probe) in self.entries.iter().zip(&self.probes) {
            let Some(bounds) = entry.bounds() else {
                continue;
            };
            if !bounds.contains(point, 0.0) {
                continue;
            }
            if let Some(screen) = probe.project(point) {
                if self.debug_logging {
                    trace!(entry_id:% = entry.id(), point:% = point, x = screen.x(), y = screen.y(); "Routed point");
                }
                return Some((entry.id(), screen));
            }
        }

        if self.debug_logging {
            trace!(point:% = point; "No entry accepted point");
        }
        None
    }

    /// Inverts `point` and reports which entry resolved it.
    pub fn invert_with_entry(&self, point: ScreenPoint) -> Option<InvertHit> {
        let hit = InvertResolver::new(&self.entries, self.invert_tolerance).resolve(point);
        if self.debug_logging {
            trace!(x = point.x(), y = point.y(), hit:? = hit; "Inverted point");
        }
        hit
    }

    fn first(&self) -> &SubProjectionEntry {
        // Construction guarantees at least one entry
        &self.entries[0]
    }
}

impl fmt::Debug for CompositeProjection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeProjection")
            .field("entries", &self.entries)
            .field("debug_logging", &self.debug_logging)
            .field("invert_tolerance", &self.invert_tolerance)
            .finish_non_exhaustive()
    }
}

impl Projection for CompositeProjection {
    fn project(&self, point: GeoPoint) -> Option<ScreenPoint> {
        self.project_with_entry(point).map(|(_, screen)| screen)
    }

    fn stream(&self, output: Box<dyn GeometrySink>) -> Box<dyn GeometrySink> {
        Box::new(Multiplexer::new(
            self.entries.iter().map(SubProjectionEntry::projection),
            output,
        ))
    }

    /// Returns the first entry's scale.
    fn scale(&self) -> f64 {
        self.first().projection().scale()
    }

    /// Does nothing: each entry manages its own scale.
    fn set_scale(&mut self, scale: f64) {
        debug!(scale; "Ignoring set_scale on a composite projection");
    }

    /// Returns the first entry's translate.
    fn translate(&self) -> ScreenPoint {
        self.first().projection().translate()
    }

    /// Does nothing: each entry manages its own translate.
    fn set_translate(&mut self, translate: ScreenPoint) {
        debug!(x = translate.x(), y = translate.y(); "Ignoring set_translate on a composite projection");
    }

    fn supports_invert(&self) -> bool {
        self.entries.iter().any(|entry| entry.projection().supports_invert())
    }

    fn invert(&self, point: ScreenPoint) -> Result<GeoPoint, ProjectionError> {
        self.invert_with_entry(point)
            .map(|hit| hit.point())
            .ok_or(ProjectionError::Uncovered)
    }
}
