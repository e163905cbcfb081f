//! The geometry-stream contract.
//!
//! Geometry is traversed once as a sequence of events (points, line and
//! polygon delimiters, and the sphere outline) pushed into a
//! [`GeometrySink`]. Projections wrap a sink with their own transform, so a
//! single traversal can render through a projection without materialising
//! intermediate coordinate arrays.
//!
//! This module also provides the small sinks the engine itself relies on:
//!
//! - [`PointCapture`] - remembers the last point it received; used to probe
//!   whether a projection stream accepts a point.
//! - [`RecordingSink`] - records every event; used to inspect what a stream
//!   produced.

use std::{cell::RefCell, rc::Rc};

use crate::geometry::ScreenPoint;

/// A consumer of geometry-stream events.
///
/// Only [`point`](GeometrySink::point) carries data. The line and polygon
/// delimiters have empty default bodies so that simple sinks implement what
/// they need. The sphere outline is an optional capability: callers must check
/// [`supports_sphere`](GeometrySink::supports_sphere) before relying on it.
pub trait GeometrySink {
    /// Receives a single coordinate.
    fn point(&mut self, x: f64, y: f64);

    /// Marks the start of a line or polygon ring.
    fn line_start(&mut self) {}

    /// Marks the end of a line or polygon ring.
    fn line_end(&mut self) {}

    /// Marks the start of a polygon (one or more rings follow).
    fn polygon_start(&mut self) {}

    /// Marks the end of a polygon.
    fn polygon_end(&mut self) {}

    /// Returns true if this sink handles [`sphere`](GeometrySink::sphere).
    fn supports_sphere(&self) -> bool {
        false
    }

    /// Receives the outline of the whole sphere.
    fn sphere(&mut self) {}
}

impl<S: GeometrySink + ?Sized> GeometrySink for Box<S> {
    fn point(&mut self, x: f64, y: f64) {
        (**self).point(x, y);
    }

    fn line_start(&mut self) {
        (**self).line_start();
    }

    fn line_end(&mut self) {
        (**self).line_end();
    }

    fn polygon_start(&mut self) {
        (**self).polygon_start();
    }

    fn polygon_end(&mut self) {
        (**self).polygon_end();
    }

    fn supports_sphere(&self) -> bool {
        (**self).supports_sphere()
    }

    fn sphere(&mut self) {
        (**self).sphere();
    }
}

/// A sink shared between several writers.
///
/// Each projection stream in a fan-out owns one clone of the handle; all of
/// them write into the same underlying sink.
impl<S: GeometrySink + ?Sized> GeometrySink for Rc<RefCell<S>> {
    fn point(&mut self, x: f64, y: f64) {
        self.borrow_mut().point(x, y);
    }

    fn line_start(&mut self) {
        self.borrow_mut().line_start();
    }

    fn line_end(&mut self) {
        self.borrow_mut().line_end();
    }

    fn polygon_start(&mut self) {
        self.borrow_mut().polygon_start();
    }

    fn polygon_end(&mut self) {
        self.borrow_mut().polygon_end();
    }

    fn supports_sphere(&self) -> bool {
        self.borrow().supports_sphere()
    }

    fn sphere(&mut self) {
        self.borrow_mut().sphere();
    }
}

/// A sink that keeps only the most recent point.
///
/// Pushing one geographic point through a projection's stream into a
/// `PointCapture` and reading it back tells the caller whether the projection
/// accepted the point and where it landed.
///
/// # Examples
///
/// ```
/// # use inset_core::stream::{GeometrySink, PointCapture};
/// let mut capture = PointCapture::default();
/// assert!(capture.captured().is_none());
///
/// capture.point(1.0, 2.0);
/// capture.line_start();
/// capture.point(3.0, 4.0);
/// assert_eq!(capture.captured().map(|p| p.x()), Some(3.0));
///
/// capture.reset();
/// assert!(capture.captured().is_none());
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct PointCapture {
    captured: Option<ScreenPoint>,
}

impl PointCapture {
    /// Returns the last captured point, if any.
    pub fn captured(&self) -> Option<ScreenPoint> {
        self.captured
    }

    /// Forgets the captured point.
    pub fn reset(&mut self) {
        self.captured = None;
    }

    /// Returns the captured point and forgets it.
    pub fn take(&mut self) -> Option<ScreenPoint> {
        self.captured.take()
    }
}

impl GeometrySink for PointCapture {
    fn point(&mut self, x: f64, y: f64) {
        self.captured = Some(ScreenPoint::new(x, y));
    }
}

/// A single geometry-stream event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StreamEvent {
    Point(f64, f64),
    LineStart,
    LineEnd,
    PolygonStart,
    PolygonEnd,
    Sphere,
}

/// A sink that records every event it receives, in order.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    events: Vec<StreamEvent>,
    accepts_sphere: bool,
}

impl RecordingSink {
    /// Creates a recorder that also advertises sphere support.
    pub fn with_sphere() -> Self {
        Self {
            events: Vec::new(),
            accepts_sphere: true,
        }
    }

    /// Returns the recorded events.
    pub fn events(&self) -> &[StreamEvent] {
        &self.events
    }

    /// Returns the recorded points, ignoring delimiters.
    pub fn points(&self) -> Vec<ScreenPoint> {
        self.events
            .iter()
            .filter_map(|event| match event {
                StreamEvent::Point(x, y) => Some(ScreenPoint::new(*x, *y)),
                _ => None,
            })
            .collect()
    }

    /// Drops every recorded event.
    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl GeometrySink for RecordingSink {
    fn point(&mut self, x: f64, y: f64) {
        self.events.push(StreamEvent::Point(x, y));
    }

    fn line_start(&mut self) {
        self.events.push(StreamEvent::LineStart);
    }

    fn line_end(&mut self) {
        self.events.push(StreamEvent::LineEnd);
    }

    fn polygon_start(&mut self) {
        self.events.push(StreamEvent::PolygonStart);
    }

    fn polygon_end(&mut self) {
        self.events.push(StreamEvent::PolygonEnd);
    }

    fn supports_sphere(&self) -> bool {
        self.accepts_sphere
    }

    fn sphere(&mut self) {
        self.events.push(StreamEvent::Sphere);
    }
}
