//!
//! # Polygon Predicates
//!
//! Pure geometric tests over tagged polygons, built on the external
//! boolean-algebra kernel. Boolean results are filtered by the configured
//! precision tolerance: slivers below that scale, which the kernel can
//! produce along shared boundaries, are treated as empty.
//!

// Crates.io
use geo::{Area, BooleanOps, Contains, MultiPolygon};
use serde::{Deserialize, Serialize};

// Local imports
use crate::bbox::BoundBoxTrait;
use crate::error::{ExtractError, ExtractResult};
use crate::geom::{Point, Polygon, Segment};
use crate::{Coord, ExtractConfig};

/// Tolerance for treating a cross product as zero (colinearity)
const COLINEAR_EPS: Coord = 1e-9;
/// Tolerance for treating a signed polygon area as zero
const AREA_EPS: Coord = 1e-12;

/// Eight-way compass direction between polygon centroids
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CompassDir {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}
impl CompassDir {
    /// Whichever direction we are, return the antipodal one.
    pub fn opposite(self) -> Self {
        use CompassDir::*;
        match self {
            North => South,
            NorthEast => SouthWest,
            East => West,
            SouthEast => NorthWest,
            South => North,
            SouthWest => NorthEast,
            West => East,
            NorthWest => SouthEast,
        }
    }
}

/// Drop boolean-result components with area below the noise scale.
/// `precision` is a length tolerance, so the area cutoff is its square;
/// a component must be thinner than `precision` in both dimensions to be
/// discarded. Returns `None` when nothing of substance remains.
pub(crate) fn filtered(mp: MultiPolygon<Coord>, cfg: &ExtractConfig) -> Option<MultiPolygon<Coord>> {
    let min_area = cfg.precision * cfg.precision;
    let kept: Vec<geo::Polygon<Coord>> = mp
        .0
        .into_iter()
        .filter(|p| p.unsigned_area() > min_area)
        .collect();
    if kept.is_empty() {
        None
    } else {
        Some(MultiPolygon(kept))
    }
}

/// Kernel intersection of two multi-polygons, tolerance-filtered
pub(crate) fn overlap_kernel(
    a: &MultiPolygon<Coord>,
    b: &MultiPolygon<Coord>,
    cfg: &ExtractConfig,
) -> Option<MultiPolygon<Coord>> {
    filtered(a.intersection(b), cfg)
}

/// Boolean indication of whether both directed differences of `a` and `b`
/// are empty under tolerance, i.e. the two cover the same area
fn same_area(a: &MultiPolygon<Coord>, b: &MultiPolygon<Coord>, cfg: &ExtractConfig) -> bool {
    filtered(a.difference(b), cfg).is_none() && filtered(b.difference(a), cfg).is_none()
}

/// Compute the geometric intersection of polygons `a` and `b`.
/// Returns the overlapping region when non-empty, else `None`.
pub fn overlap(a: &Polygon, b: &Polygon, cfg: &ExtractConfig) -> Option<Vec<Polygon>> {
    let mp = overlap_kernel(
        &MultiPolygon(vec![a.to_kernel()]),
        &MultiPolygon(vec![b.to_kernel()]),
        cfg,
    )?;
    Some(mp.0.iter().map(Polygon::from_kernel).collect())
}

/// Boolean indication of whether polygons `a` and `b` overlap
pub fn overlaps(a: &Polygon, b: &Polygon, cfg: &ExtractConfig) -> bool {
    overlap(a, b, cfg).is_some()
}

/// Check whether two tagged polygons are the same: layer and datatype match,
/// and the symmetric difference of the two shapes is empty under tolerance.
/// This is the identity test used throughout to detect a polygon duplicated
/// across container boundaries, deliberately *not* a reference comparison.
pub fn same_polygon(a: &crate::geom::Element, b: &crate::geom::Element, cfg: &ExtractConfig) -> bool {
    if a.spec != b.spec {
        return false;
    }
    same_area(&a.to_kernel(), &b.to_kernel(), cfg)
}

/// Check whether tagged polygon `a` contains `b`: layer and datatype match,
/// and the union of the two equals `a` (or the two are already equal).
pub fn contains_polygon(
    a: &crate::geom::Element,
    b: &crate::geom::Element,
    cfg: &ExtractConfig,
) -> bool {
    if a.spec != b.spec {
        return false;
    }
    let ka = a.to_kernel();
    let kb = b.to_kernel();
    if same_area(&ka, &kb, cfg) {
        return true;
    }
    let union = ka.union(&kb);
    same_area(&union, &ka, cfg)
}

/// Detect colinear overlapping sub-segments between the edges of `a` and
/// the edges of `b`, the implied closing edges included.
/// Degenerate (sub-tolerance) fragments are dropped.
/// Returns `None` when no common edge exists.
pub fn common_edges(a: &Polygon, b: &Polygon, cfg: &ExtractConfig) -> Option<Vec<Segment>> {
    let mut found = Vec::new();
    for ea in a.edges() {
        let da = (ea.p1.x - ea.p0.x, ea.p1.y - ea.p0.y);
        let la = ea.length();
        if la <= cfg.precision {
            continue;
        }
        // Reference-edge span, for cheap rejection within tolerance
        let span = ea.p0.bbox().union(&ea.p1.bbox());
        for eb in b.edges() {
            if !span.contains_tol(&eb.p0, cfg.precision) && !span.contains_tol(&eb.p1, cfg.precision)
            {
                continue;
            }
            let db = (eb.p1.x - eb.p0.x, eb.p1.y - eb.p0.y);
            // Zero cross product of the edge vectors: parallel
            if (da.0 * db.1 - da.1 * db.0).abs() > COLINEAR_EPS {
                continue;
            }
            // And zero cross against the connecting vector: same line
            let c = (eb.p0.x - ea.p0.x, eb.p0.y - ea.p0.y);
            if (da.0 * c.1 - da.1 * c.0).abs() > COLINEAR_EPS {
                continue;
            }
            // Project `eb`'s endpoints onto the reference edge and clamp
            let t = |p: &Point| ((p.x - ea.p0.x) * da.0 + (p.y - ea.p0.y) * da.1) / (la * la);
            let (t0, t1) = (t(&eb.p0), t(&eb.p1));
            let lo = t0.min(t1).max(0.);
            let hi = t0.max(t1).min(1.);
            if (hi - lo) * la <= cfg.precision {
                continue; // degenerate: touch at most in a point
            }
            let at = |t: Coord| Point::new(ea.p0.x + t * da.0, ea.p0.y + t * da.1);
            found.push(Segment::new(at(lo), at(hi)));
        }
    }
    if found.is_empty() {
        None
    } else {
        Some(found)
    }
}

/// Check whether two tagged polygons are neighbours: layer and datatype
/// match, they share at least one edge segment, and they do not overlap.
pub fn neighbours(a: &crate::geom::Element, b: &crate::geom::Element, cfg: &ExtractConfig) -> bool {
    if a.spec != b.spec {
        return false;
    }
    let (pa, pb) = (a.poly(), b.poly());
    common_edges(&pa, &pb, cfg).is_some() && !overlaps(&pa, &pb, cfg)
}

/// Compute the signed-area (shoelace) centroid of `poly`.
/// Fails with [ExtractError::InvalidPolygon] for polygons without a
/// well-defined area: fewer than three vertices, or zero signed area
/// (degenerate or self-cancelling).
pub fn centroid(poly: &Polygon) -> ExtractResult<Point> {
    let n = poly.len();
    if n < 3 {
        return Err(ExtractError::invalid(format!(
            "centroid of a {}-vertex polygon",
            n
        )));
    }
    let mut signed_area = 0.;
    let (mut cx, mut cy) = (0., 0.);
    for k in 0..n {
        let p0 = &poly.points[k];
        let p1 = &poly.points[(k + 1) % n];
        let a = p0.x * p1.y - p1.x * p0.y;
        signed_area += a;
        cx += (p0.x + p1.x) * a;
        cy += (p0.y + p1.y) * a;
    }
    signed_area *= 0.5;
    if signed_area.abs() < AREA_EPS {
        return Err(ExtractError::invalid("centroid of a zero-area polygon"));
    }
    Ok(Point::new(cx / (6. * signed_area), cy / (6. * signed_area)))
}

/// Unit vector from `a` to `b`, or `None` when the points coincide
fn unit_vec(a: &Point, b: &Point) -> Option<(Coord, Coord)> {
    let (vx, vy) = (b.x - a.x, b.y - a.y);
    let norm = (vx * vx + vy * vy).sqrt();
    if norm < AREA_EPS {
        return None;
    }
    Some((vx / norm, vy / norm))
}

/// Saturate each component of a unit vector to {-1, 0, 1} at the 0.5 threshold
fn saturate(v: (Coord, Coord)) -> (i8, i8) {
    let sat = |c: Coord| {
        if c >= 0.5 {
            1
        } else if c <= -0.5 {
            -1
        } else {
            0
        }
    };
    (sat(v.0), sat(v.1))
}

/// Compute the eight-way compass direction from the centroid of `from`
/// toward the centroid of `to`. Returns `None` only when both axis
/// components saturate to zero (the centroids coincide).
pub fn direction(from: &Polygon, to: &Polygon) -> ExtractResult<Option<CompassDir>> {
    let c0 = centroid(from)?;
    let c1 = centroid(to)?;
    let unit = match unit_vec(&c0, &c1) {
        Some(u) => u,
        None => return Ok(None),
    };
    use CompassDir::*;
    Ok(match saturate(unit) {
        (0, 1) => Some(North),
        (1, 1) => Some(NorthEast),
        (1, 0) => Some(East),
        (1, -1) => Some(SouthEast),
        (0, -1) => Some(South),
        (-1, -1) => Some(SouthWest),
        (-1, 0) => Some(West),
        (-1, 1) => Some(NorthWest),
        _ => None,
    })
}

/// Direction between two rectangles, with diagonal results collapsed along
/// the dominant axis of the `from` rectangle.
/// Fails with [ExtractError::InvalidPolygon] unless both have exactly four
/// vertices.
pub fn rect_direction(from: &Polygon, to: &Polygon) -> ExtractResult<Option<CompassDir>> {
    if from.len() != 4 || to.len() != 4 {
        return Err(ExtractError::invalid(
            "rectangle direction requires 4-vertex polygons",
        ));
    }
    let dir = match direction(from, to)? {
        Some(d) => d,
        None => return Ok(None),
    };
    let bb = from.bbox();
    let (width, height) = bb.size();
    use CompassDir::*;
    let collapsed = if height > width {
        match dir {
            NorthEast | NorthWest => North,
            SouthEast | SouthWest => South,
            d => d,
        }
    } else {
        match dir {
            NorthEast | SouthEast => East,
            SouthWest | NorthWest => West,
            d => d,
        }
    };
    Ok(Some(collapsed))
}

/// Kernel point-in-polygon test
pub fn point_in_polygon(poly: &Polygon, pt: &Point) -> bool {
    poly.to_kernel().contains(&geo::Point::new(pt.x, pt.y))
}

/// Check whether tagged polygons `a` and `b` are connected through `via`:
/// the three are pairwise distinct polygons on three distinct layers, and
/// the via overlaps both. Only meaningful when the three sit on consecutive
/// stack layers; the caller guarantees that.
pub fn via_connected(
    a: &crate::geom::Element,
    via: &crate::geom::Element,
    b: &crate::geom::Element,
    cfg: &ExtractConfig,
) -> bool {
    if same_polygon(a, b, cfg) || same_polygon(a, via, cfg) || same_polygon(b, via, cfg) {
        return false;
    }
    if a.spec.layer() == b.spec.layer()
        || a.spec.layer() == via.spec.layer()
        || b.spec.layer() == via.spec.layer()
    {
        return false;
    }
    overlaps(&a.poly(), &via.poly(), cfg) && overlaps(&b.poly(), &via.poly(), cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{Element, Rect, ShapeTrait};
    use crate::table::LayerSpec;

    fn rect(p0: (Coord, Coord), p1: (Coord, Coord)) -> Polygon {
        Rect::new(Point::new(p0.0, p0.1), Point::new(p1.0, p1.1)).to_poly()
    }

    #[test]
    fn test_overlap() {
        let cfg = ExtractConfig::default();
        let a = rect((0., 0.), (3., 1.));
        let b = rect((0., 0.), (1., 3.));
        let c = rect((1., 0.), (2., 1.));
        assert!(overlaps(&a, &b, &cfg));
        // Edge-touching rectangles share zero area
        assert!(!overlaps(&b, &c, &cfg));
    }

    #[test]
    fn test_common_edges() {
        let cfg = ExtractConfig::default();
        let a = rect((0., 0.), (3., 1.));
        let b = rect((0., 0.), (1., 3.));
        let edges = common_edges(&a, &b, &cfg).unwrap();
        // The shared corner segments along the bottom and left edges
        let bottom = Segment::new(Point::new(0., 0.), Point::new(1., 0.));
        let left = Segment::new(Point::new(0., 0.), Point::new(0., 1.));
        assert!(edges.iter().any(|s| s.coincident(&bottom, cfg.precision)));
        assert!(edges.iter().any(|s| s.coincident(&left, cfg.precision)));

        // Disjoint, non-touching rectangles share nothing
        let far = rect((10., 10.), (11., 11.));
        assert!(common_edges(&a, &far, &cfg).is_none());

        // Abutting rectangles share exactly their contact segment
        let c = rect((0., 0.), (1., 1.));
        let d = rect((1., 0.), (2., 1.));
        let edges = common_edges(&c, &d, &cfg).unwrap();
        let contact = Segment::new(Point::new(1., 0.), Point::new(1., 1.));
        assert!(edges.iter().all(|s| s.coincident(&contact, cfg.precision)));
    }

    #[test]
    fn test_common_edges_symmetry() {
        let cfg = ExtractConfig::default();
        let a = rect((0., 0.), (3., 1.));
        let b = rect((0., 0.), (1., 3.));
        let ab = common_edges(&a, &b, &cfg).unwrap();
        let ba = common_edges(&b, &a, &cfg).unwrap();
        assert_eq!(ab.len(), ba.len());
        for s in &ab {
            assert!(ba.iter().any(|t| t.coincident(s, cfg.precision)));
        }
    }

    #[test]
    fn test_same_polygon_and_containment() {
        let cfg = ExtractConfig::default();
        let m1 = LayerSpec::new(68, 20);
        let a = Element::rect(m1, (0., 0.), (3., 1.));
        let b = Element::rect(m1, (0., 0.), (1., 3.));
        // Overlapping but unequal shapes
        assert!(!same_polygon(&a, &b, &cfg));
        assert!(!same_polygon(&b, &a, &cfg));
        // Equal shapes, and symmetry of the test
        let a2 = Element::rect(m1, (0., 0.), (3., 1.));
        assert!(same_polygon(&a, &a2, &cfg));
        assert!(same_polygon(&a2, &a, &cfg));
        // Equal shapes on different layers are not the same polygon
        let other = Element::rect(LayerSpec::new(69, 20), (0., 0.), (3., 1.));
        assert!(!same_polygon(&a, &other, &cfg));

        // Containment is reflexive, and holds for a proper sub-rectangle
        assert!(contains_polygon(&a, &a, &cfg));
        let inner = Element::rect(m1, (0.5, 0.2), (1.5, 0.8));
        assert!(contains_polygon(&a, &inner, &cfg));
        assert!(!contains_polygon(&inner, &a, &cfg));
        assert!(!contains_polygon(&a, &b, &cfg));
    }

    #[test]
    fn test_overlap_tolerance() {
        let cfg = ExtractConfig::default();
        let a = rect((0., 0.), (1., 1.));
        // A small but real corner overlap, 0.02 x 0.02: many times the
        // length tolerance in each dimension, and must be detected
        let b = rect((0.98, 0.98), (2., 2.));
        assert!(overlaps(&a, &b, &cfg));
        assert!(overlaps(&b, &a, &cfg));
        // A sliver thinner than the tolerance in both dimensions is noise
        let c = rect((1. - 5e-4, 0.5), (2., 0.5005));
        assert!(!overlaps(&a, &c, &cfg));
    }

    #[test]
    fn test_overlap_symmetry() {
        let cfg = ExtractConfig::default();
        let a = rect((0., 0.), (3., 1.));
        let b = rect((0., 0.), (1., 3.));
        let c = rect((10., 10.), (11., 11.));
        assert_eq!(overlaps(&a, &b, &cfg), overlaps(&b, &a, &cfg));
        assert_eq!(overlaps(&a, &c, &cfg), overlaps(&c, &a, &cfg));
    }

    #[test]
    fn test_neighbours() {
        let cfg = ExtractConfig::default();
        let m2 = LayerSpec::new(2, 0);
        let c = Element::rect(m2, (0., 0.), (1., 1.));
        let d = Element::rect(m2, (1., 0.), (2., 1.));
        let e = Element::rect(m2, (0.5, 0.), (2., 1.));
        assert!(neighbours(&c, &d, &cfg));
        // Overlapping polygons are not neighbours
        assert!(!neighbours(&c, &e, &cfg));
        // Neither are polygons on different layers
        let other = Element::rect(LayerSpec::new(1, 0), (1., 0.), (2., 1.));
        assert!(!neighbours(&c, &other, &cfg));
    }

    #[test]
    fn test_centroid() {
        let sq = rect((0., 0.), (2., 2.));
        let c = centroid(&sq).unwrap();
        assert!((c.x - 1.).abs() < 1e-9);
        assert!((c.y - 1.).abs() < 1e-9);

        // Degenerate polygons fail rather than yielding NaN
        let line = Polygon::from_coords(&[(0., 0.), (1., 0.), (2., 0.)]);
        assert!(matches!(
            centroid(&line),
            Err(ExtractError::InvalidPolygon { .. })
        ));
        let empty = Polygon::default();
        assert!(centroid(&empty).is_err());
    }

    #[test]
    fn test_direction() {
        let a = rect((0., 0.), (1., 1.));
        let north = rect((0., 2.), (1., 3.));
        let east = rect((2., 0.), (3., 1.));
        let ne = rect((2., 2.), (3., 3.));
        assert_eq!(direction(&a, &north).unwrap(), Some(CompassDir::North));
        assert_eq!(direction(&a, &east).unwrap(), Some(CompassDir::East));
        assert_eq!(direction(&a, &ne).unwrap(), Some(CompassDir::NorthEast));
        // Coincident centroids have no direction
        assert_eq!(direction(&a, &a).unwrap(), None);
    }

    #[test]
    fn test_direction_antipodal() {
        let a = rect((0., 0.), (1., 1.));
        let others = [
            rect((0., 2.), (1., 3.)),
            rect((2., 0.), (3., 1.)),
            rect((2., 2.), (3., 3.)),
            rect((-3., -3.), (-2., -2.)),
        ];
        for b in &others {
            let fwd = direction(&a, b).unwrap().unwrap();
            let rev = direction(b, &a).unwrap().unwrap();
            assert_eq!(fwd.opposite(), rev);
        }
    }

    #[test]
    fn test_rect_direction() {
        // A tall rectangle collapses diagonals to its vertical axis
        let tall = rect((0., 0.), (1., 10.));
        let ne = rect((2., 11.), (3., 12.));
        assert_eq!(rect_direction(&tall, &ne).unwrap(), Some(CompassDir::North));
        // A wide one collapses to its horizontal axis
        let wide = rect((0., 0.), (10., 1.));
        assert_eq!(rect_direction(&wide, &ne).unwrap(), Some(CompassDir::East));
        // Non-quadrilaterals are rejected
        let tri = Polygon::from_coords(&[(0., 0.), (1., 0.), (0., 1.)]);
        assert!(rect_direction(&tri, &ne).is_err());
    }

    #[test]
    fn test_point_in_polygon() {
        let a = rect((0., 0.), (3., 1.));
        assert!(point_in_polygon(&a, &Point::new(0.3, 0.3)));
        assert!(!point_in_polygon(&a, &Point::new(3.1, 3.1)));
    }

    #[test]
    fn test_via_connected() {
        let cfg = ExtractConfig::default();
        let m1 = Element::rect(LayerSpec::new(1, 0), (0., 0.), (2., 1.));
        let via = Element::rect(LayerSpec::new(2, 0), (1.5, 0.), (2.5, 1.));
        let m2 = Element::rect(LayerSpec::new(3, 0), (2., 0.), (4., 1.));
        assert!(via_connected(&m1, &via, &m2, &cfg));
        // A via overlapping only one side connects nothing
        let far = Element::rect(LayerSpec::new(3, 0), (10., 10.), (12., 11.));
        assert!(!via_connected(&m1, &via, &far, &cfg));
    }
}
