//!
//! # Same-Layer Polygon Merging
//!
//! Pre-pass over the raw layout: polygons on each stack layer are unioned
//! into maximal connected components ("buckets"), one bucket per stack
//! index. The search engine operates solely on buckets, so every polygon it
//! sees is already a maximal same-layer region. Layers outside the stack
//! (labels, boundaries, fill) are ignored.
//!

// Crates.io
use geo::BooleanOps;

// Local imports
use crate::geom::{elements_from_kernel, Element, Layout};
use crate::predicates::filtered;
use crate::stack::LayerStack;
use crate::ExtractConfig;

/// # Per-Stack-Layer Merged Polygon Buckets
///
/// One bucket of merged [Element]s per stack index, parallel to the
/// [LayerStack] entries. Overlapping and abutting same-layer polygons
/// become a single polygon; disjoint ones stay separate.
#[derive(Debug, Clone, Default)]
pub struct PolygonBuckets {
    buckets: Vec<Vec<Element>>,
}
impl PolygonBuckets {
    /// Build the buckets for `layout` over `stack`.
    ///
    /// Union results are tolerance-filtered: components with area below
    /// the square of `cfg.precision` are discarded rather than kept as
    /// slivers.
    pub fn build(layout: &Layout, stack: &LayerStack, cfg: &ExtractConfig) -> Self {
        let mut buckets = Vec::with_capacity(stack.len());
        for idx in 0..stack.len() {
            let spec = match stack.get(idx) {
                Some(entry) => entry.spec,
                None => continue, // unreachable: idx < stack.len()
            };
            let elems = layout.elems_on(spec);
            let mut merged: Option<geo::MultiPolygon<crate::Coord>> = None;
            for elem in &elems {
                let kernel = elem.to_kernel();
                merged = Some(match merged {
                    Some(m) => m.union(&kernel),
                    None => kernel,
                });
            }
            let bucket = match merged.and_then(|m| filtered(m, cfg)) {
                Some(mp) => elements_from_kernel(&mp, spec),
                None => Vec::new(),
            };
            log::debug!(
                "merged {} polygons on stack layer {} into {} components",
                elems.len(),
                idx,
                bucket.len()
            );
            buckets.push(bucket);
        }
        Self { buckets }
    }

    /// The merged [Element]s at stack index `idx`
    pub fn bucket(&self, idx: usize) -> &[Element] {
        self.buckets.get(idx).map(Vec::as_slice).unwrap_or(&[])
    }
    /// Number of buckets, equal to the stack length
    pub fn len(&self) -> usize {
        self.buckets.len()
    }
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
    /// Iterate over (stack index, bucket) pairs
    pub fn iter(&self) -> impl Iterator<Item = (usize, &[Element])> {
        self.buckets.iter().enumerate().map(|(i, b)| (i, b.as_slice()))
    }
    /// Total merged polygon count across all buckets
    pub fn polygon_count(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }
}
