//!
//! # Geometry Module
//!
//! Defines the core geometric types including [Point], [Shape], and the
//! (layer, datatype)-tagged [Element], plus conversions to and from the
//! boolean kernel's representation.
//!

// Crates.io
use enum_dispatch::enum_dispatch;
use geo::{LineString, MultiPolygon};
use serde::{Deserialize, Serialize};

// Local imports
use crate::table::LayerSpec;
use crate::Coord;

/// # Point in two-dimensional layout-space
#[derive(Debug, Copy, Clone, Default, Serialize, Deserialize, PartialEq, PartialOrd)]
pub struct Point {
    pub x: Coord,
    pub y: Coord,
}
impl Point {
    /// Create a new [Point] from (x,y) coordinates
    pub fn new(x: Coord, y: Coord) -> Self {
        Self { x, y }
    }
    /// Euclidean distance to [Point] `other`
    pub fn dist(&self, other: &Point) -> Coord {
        ((other.x - self.x).powi(2) + (other.y - self.y).powi(2)).sqrt()
    }
}

/// # Directed Line Segment
///
/// Endpoint pair, primarily produced by common-edge detection.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq)]
pub struct Segment {
    pub p0: Point,
    pub p1: Point,
}
impl Segment {
    pub fn new(p0: Point, p1: Point) -> Self {
        Self { p0, p1 }
    }
    /// Segment length
    pub fn length(&self) -> Coord {
        self.p0.dist(&self.p1)
    }
    /// Boolean indication of whether `other` covers the same endpoints,
    /// in either orientation, within tolerance `tol`
    pub fn coincident(&self, other: &Segment, tol: Coord) -> bool {
        (self.p0.dist(&other.p0) <= tol && self.p1.dist(&other.p1) <= tol)
            || (self.p0.dist(&other.p1) <= tol && self.p1.dist(&other.p0) <= tol)
    }
}

/// # Polygon
///
/// Closed n-sided polygon with arbitrary number of vertices.
/// Primarily consists of a series of ordered [Point]s.
///
/// Closure from the last point back to the first is implied;
/// the initial point need not be repeated at the end.
///
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq)]
pub struct Polygon {
    pub points: Vec<Point>,
}
impl Polygon {
    /// Create a new [Polygon] from a vector of [Point]s
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }
    /// Create a new [Polygon] from (x, y) coordinate pairs
    pub fn from_coords(coords: &[(Coord, Coord)]) -> Self {
        Self {
            points: coords.iter().map(|(x, y)| Point::new(*x, *y)).collect(),
        }
    }
    /// Number of vertices
    pub fn len(&self) -> usize {
        self.points.len()
    }
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
    /// Iterate over the polygon's edges, including the implied closing edge
    pub fn edges(&self) -> impl Iterator<Item = Segment> + '_ {
        let n = self.points.len();
        (0..n).map(move |k| Segment::new(self.points[k], self.points[(k + 1) % n]))
    }
    /// Convert to the kernel's polygon representation.
    /// The kernel closes the exterior ring itself.
    pub fn to_kernel(&self) -> geo::Polygon<Coord> {
        let coords: Vec<(Coord, Coord)> = self.points.iter().map(|p| (p.x, p.y)).collect();
        geo::Polygon::new(LineString::from(coords), vec![])
    }
    /// Create from a kernel polygon, taking its exterior ring.
    /// Interior rings (holes) are not representable and are dropped;
    /// routing shapes from fracture-based layouts do not carry them.
    pub fn from_kernel(poly: &geo::Polygon<Coord>) -> Self {
        let ext = poly.exterior();
        let mut points: Vec<Point> = ext.0.iter().map(|c| Point::new(c.x, c.y)).collect();
        // The kernel's rings are closed; drop the repeated final vertex
        if points.len() > 1 && points.first() == points.last() {
            points.pop();
        }
        if !poly.interiors().is_empty() {
            log::debug!(
                "dropping {} interior ring(s) from kernel polygon",
                poly.interiors().len()
            );
        }
        Self { points }
    }
}

/// # Rectangle
///
/// Axis-aligned rectangle, specified by two opposite corners.
///
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq)]
pub struct Rect {
    pub p0: Point,
    pub p1: Point,
}
impl Rect {
    /// Create a new [Rect] from two corner [Point]s
    pub fn new(p0: Point, p1: Point) -> Self {
        Self { p0, p1 }
    }
}

/// # Shape
///
/// The primary geometric primitive comprising raw layout.
/// Variants include [Rect] and [Polygon].
///
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[enum_dispatch(ShapeTrait)]
pub enum Shape {
    Rect(Rect),
    Polygon(Polygon),
}
impl Default for Shape {
    fn default() -> Self {
        Self::Rect(Rect::default())
    }
}

/// # ShapeTrait
///
/// Common shape operations, dispatched from the [Shape] enum to its variants
/// by [enum_dispatch].
///
#[enum_dispatch]
pub trait ShapeTrait {
    /// Convert to a [Polygon], our most general of shapes
    fn to_poly(&self) -> Polygon;
}

impl ShapeTrait for Rect {
    fn to_poly(&self) -> Polygon {
        // Create a four-sided polygon, counter-clockwise from our lower-left
        let (p0, p1) = (
            Point::new(self.p0.x.min(self.p1.x), self.p0.y.min(self.p1.y)),
            Point::new(self.p0.x.max(self.p1.x), self.p0.y.max(self.p1.y)),
        );
        Polygon {
            points: vec![
                p0,
                Point::new(p1.x, p0.y),
                p1,
                Point::new(p0.x, p1.y),
            ],
        }
    }
}
impl ShapeTrait for Polygon {
    fn to_poly(&self) -> Polygon {
        self.clone()
    }
}

/// # Primitive Geometric Element
///
/// Primary unit of [Layout] definition.
/// Combines a geometric [Shape] with its (layer, datatype) [LayerSpec],
/// and optional net connectivity annotation.
/// The `net` attribute is the one mutable field; labeling rewrites it.
///
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Element {
    /// Net Name
    pub net: Option<String>,
    /// Layer & datatype
    pub spec: LayerSpec,
    /// Shape
    pub inner: Shape,
}
impl Element {
    /// Create a new [Element]
    pub fn new(net: Option<&str>, spec: LayerSpec, inner: impl Into<Shape>) -> Self {
        Self {
            net: net.map(|s| s.to_string()),
            spec,
            inner: inner.into(),
        }
    }
    /// Create a rectangular, unlabeled [Element]; the common test fixture
    pub fn rect(spec: LayerSpec, p0: (Coord, Coord), p1: (Coord, Coord)) -> Self {
        Self::new(
            None,
            spec,
            Rect::new(Point::new(p0.0, p0.1), Point::new(p1.0, p1.1)),
        )
    }
    /// Our shape's vertex sequence, as a [Polygon]
    pub fn poly(&self) -> Polygon {
        self.inner.to_poly()
    }
    /// Convert our shape to the kernel's multi-polygon representation
    pub fn to_kernel(&self) -> MultiPolygon<Coord> {
        MultiPolygon(vec![self.poly().to_kernel()])
    }
}

/// # Layout
///
/// An unordered collection of tagged polygon [Element]s.
/// Paths, labels and cell references are import-time concerns of the
/// external loader; by the time a [Layout] reaches this engine, everything
/// is a polygon.
///
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Layout {
    /// Cell Name
    pub name: String,
    /// Primitive/ Geometric Elements
    pub elems: Vec<Element>,
}
impl Layout {
    /// Create a new and empty Layout named `name`
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            elems: Vec::new(),
        }
    }
    /// Get all elements on [LayerSpec] `spec`
    pub fn elems_on(&self, spec: LayerSpec) -> Vec<&Element> {
        self.elems.iter().filter(|e| e.spec == spec).collect()
    }
}

/// Merge a kernel multi-polygon back into tagged [Element]s on `spec`
pub(crate) fn elements_from_kernel(mp: &MultiPolygon<Coord>, spec: LayerSpec) -> Vec<Element> {
    mp.0.iter()
        .map(|p| Element {
            net: None,
            spec,
            inner: Shape::Polygon(Polygon::from_kernel(p)),
        })
        .collect()
}
