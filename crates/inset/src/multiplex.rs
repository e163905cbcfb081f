//! Fan-out of one geometry stream to many projection streams.

use std::{cell::RefCell, rc::Rc};

use inset_core::{projection::Projection, stream::GeometrySink};

/// A sink that forwards every event to one stream per sub-projection.
///
/// All derived streams write into the same output, so a single traversal of
/// the geometry renders it through every sub-projection (and its clip extent)
/// in one pass. Events reach the streams in declaration order.
///
/// # Examples
///
/// ```
/// # use std::{cell::RefCell, rc::Rc};
/// # use inset::multiplex::Multiplexer;
/// # use inset_core::projection::{ConfiguredProjection, Projection, ProjectionFamily};
/// # use inset_core::stream::{GeometrySink, RecordingSink};
/// let mercator = ConfiguredProjection::new(ProjectionFamily::Mercator);
/// let azimuthal = ConfiguredProjection::new(ProjectionFamily::AzimuthalEqualArea);
/// let projections: [&dyn Projection; 2] = [&mercator, &azimuthal];
///
/// let output = Rc::new(RefCell::new(RecordingSink::default()));
/// let mut fanout = Multiplexer::new(projections, Box::new(Rc::clone(&output)));
/// fanout.point(0.0, 0.0);
///
/// assert_eq!(output.borrow().points().len(), 2);
/// ```
pub struct Multiplexer {
    streams: Vec<Box<dyn GeometrySink>>,
}

impl Multiplexer {
    /// Derives one stream per projection, all writing into `output`.
    pub fn new<'a>(projections: impl IntoIterator<Item = &'a dyn Projection>, output: Box<dyn GeometrySink>) -> Self {
        let shared: Rc<RefCell<Box<dyn GeometrySink>>> = Rc::new(RefCell::new(output));
        let streams = projections
            .into_iter()
            .map(|projection| projection.stream(Box::new(Rc::clone(&shared))))
            .collect();
        Self { streams }
    }

    /// Fans out to already-derived streams.
    pub fn from_streams(streams: Vec<Box<dyn GeometrySink>>) -> Self {
        Self { streams }
    }

    /// Returns the number of streams events are forwarded to.
    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }
}

impl GeometrySink for Multiplexer {
    fn point(&mut self, x: f64, y: f64) {
        for stream in &mut self.streams {
            stream.point(x, y);
        }
    }

    fn line_start(&mut self) {
        for stream in &mut self.streams {
            stream.line_start();
        }
    }

    fn line_end(&mut self) {
        for stream in &mut self.streams {
            stream.line_end();
        }
    }

    fn polygon_start(&mut self) {
        for stream in &mut self.streams {
            stream.polygon_start();
        }
    }

    fn polygon_end(&mut self) {
        for stream in &mut self.streams {
            stream.polygon_end();
        }
    }

    fn supports_sphere(&self) -> bool {
        self.streams.iter().any(|stream| stream.supports_sphere())
    }

    /// Forwards the sphere only to streams that support it.
    fn sphere(&mut self) {
        for stream in self.streams.iter_mut().filter(|stream| stream.supports_sphere()) {
            stream.sphere();
        }
    }
}
