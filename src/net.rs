//!
//! # Nets and Net-Level Operations
//!
//! A [Net] is a maximal set of electrically connected polygons collected by
//! the search engine. This module owns the net container, the fusion pass
//! that merges partial nets sharing a polygon, and the labeling, highlight,
//! and rename operations applied once extraction settles.
//!

// Std-Lib
use std::collections::HashSet;

// Crates.io
use serde::{Deserialize, Serialize};

// Local imports
use crate::error::{ExtractError, ExtractResult};
use crate::geom::{Element, Layout};
use crate::predicates::same_polygon;
use crate::table::LayerSpec;
use crate::ExtractConfig;

/// # Polygon Identity Key
///
/// A (layer, datatype) tag plus the vertex sequence quantized to the
/// precision grid. Two polygons produced by the same merged bucket hash to
/// the same key, giving O(1) membership tests where the geometric
/// same-polygon predicate would cost a kernel call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct PolyKey {
    spec: LayerSpec,
    verts: Vec<(i64, i64)>,
}
impl PolyKey {
    /// Create the key for [Element] `elem` on the `cfg.precision` grid
    pub fn of(elem: &Element, cfg: &ExtractConfig) -> Self {
        let quantize = |c: crate::Coord| (c / cfg.precision).round() as i64;
        Self {
            spec: elem.spec,
            verts: elem
                .poly()
                .points
                .iter()
                .map(|p| (quantize(p.x), quantize(p.y)))
                .collect(),
        }
    }
}

/// # Net
///
/// A named set of connected polygon [Element]s, with a parallel key set
/// for fast membership and fusion tests.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Net {
    /// Net Name
    pub name: String,
    /// Member polygons, in discovery order
    pub elems: Vec<Element>,
    /// Quantized identity keys of the members
    keys: HashSet<PolyKey>,
}
impl Net {
    /// Create a new and empty [Net] named `name`
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
    /// Add [Element] `elem`, if not already a member.
    /// Returns whether the element was newly added.
    pub fn add(&mut self, elem: Element, cfg: &ExtractConfig) -> bool {
        let key = PolyKey::of(&elem, cfg);
        if !self.keys.insert(key) {
            return false;
        }
        self.elems.push(elem);
        true
    }
    /// Boolean indication of whether `elem` is a member
    pub fn contains(&self, elem: &Element, cfg: &ExtractConfig) -> bool {
        self.keys.contains(&PolyKey::of(elem, cfg))
    }
    /// Number of member polygons
    pub fn len(&self) -> usize {
        self.elems.len()
    }
    pub fn is_empty(&self) -> bool {
        self.elems.is_empty()
    }
    /// Iterate over the member keys
    pub fn keys(&self) -> impl Iterator<Item = &PolyKey> {
        self.keys.iter()
    }
    /// Boolean indication of whether we share at least one polygon with
    /// `other`. Tests key-set intersection first, falling back to the
    /// geometric same-polygon predicate for members added off-grid.
    pub fn shares_polygon(&self, other: &Net, cfg: &ExtractConfig) -> bool {
        if self.keys.iter().any(|k| other.keys.contains(k)) {
            return true;
        }
        self.elems
            .iter()
            .any(|a| other.elems.iter().any(|b| same_polygon(a, b, cfg)))
    }
    /// Absorb every member of `other`, dropping duplicates
    pub fn merge(&mut self, other: Net, cfg: &ExtractConfig) {
        for elem in other.elems {
            self.add(elem, cfg);
        }
    }
    /// Write our name into every member's `net` attribute
    pub fn label(&mut self) {
        for elem in self.elems.iter_mut() {
            elem.net = Some(self.name.clone());
        }
    }
}

/// # Net List
///
/// The ordered collection of extracted [Net]s for one layout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetList {
    pub nets: Vec<Net>,
}
impl NetList {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn push(&mut self, net: Net) {
        self.nets.push(net);
    }
    pub fn len(&self) -> usize {
        self.nets.len()
    }
    pub fn is_empty(&self) -> bool {
        self.nets.is_empty()
    }
    pub fn iter(&self) -> impl Iterator<Item = &Net> {
        self.nets.iter()
    }
    /// Find the net named `name`
    pub fn get(&self, name: &str) -> Option<&Net> {
        self.nets.iter().find(|n| n.name == name)
    }
    /// Label every net's members with its name
    pub fn label_all(&mut self) {
        for net in self.nets.iter_mut() {
            net.label();
        }
    }
    /// Total polygon count across all nets
    pub fn polygon_count(&self) -> usize {
        self.nets.iter().map(Net::len).sum()
    }
}

/// Fuse partial nets to a fixed point: any two nets sharing a polygon are
/// merged into one, repeatedly, until no pair shares. The surviving net of
/// each merge keeps the earlier name.
///
/// The scan restarts after every merge, so transitively connected chains
/// collapse regardless of input order.
pub fn fuse(nets: Vec<Net>, cfg: &ExtractConfig) -> Vec<Net> {
    let mut nets = nets;
    loop {
        let mut merged_any = false;
        'scan: for i in 0..nets.len() {
            for j in (i + 1)..nets.len() {
                if nets[i].shares_polygon(&nets[j], cfg) {
                    let absorbed = nets.remove(j);
                    log::debug!("fusing net `{}` into `{}`", absorbed.name, nets[i].name);
                    nets[i].merge(absorbed, cfg);
                    merged_any = true;
                    break 'scan;
                }
            }
        }
        if !merged_any {
            break;
        }
    }
    nets
}

/// Copy every polygon of `net` into `layout` on the dedicated highlight
/// layer `highlight_spec`, carrying the net name. Originals are untouched.
pub fn highlight(layout: &mut Layout, net: &Net, highlight_spec: LayerSpec) {
    for elem in net.elems.iter() {
        layout.elems.push(Element {
            net: Some(net.name.clone()),
            spec: highlight_spec,
            inner: elem.inner.clone(),
        });
    }
}

/// Remove every highlight-layer element from `layout`.
/// Returns the number of elements removed.
pub fn delete_highlight(layout: &mut Layout, highlight_spec: LayerSpec) -> usize {
    let before = layout.elems.len();
    layout.elems.retain(|e| e.spec != highlight_spec);
    before - layout.elems.len()
}

/// Rewrite every `net` attribute equal to `old` to `new`, across the whole
/// layout. Returns the number of elements renamed.
pub fn rename_net(layout: &mut Layout, old: &str, new: &str) -> usize {
    let mut renamed = 0;
    for elem in layout.elems.iter_mut() {
        if elem.net.as_deref() == Some(old) {
            elem.net = Some(new.to_string());
            renamed += 1;
        }
    }
    renamed
}

/// Collect the already-labeled elements carrying net-name `name` into a
/// [Net]. Fails with [ExtractError::TypeMismatch] when no element carries
/// the label.
pub fn net_by_label(layout: &Layout, name: &str, cfg: &ExtractConfig) -> ExtractResult<Net> {
    let mut net = Net::new(name);
    for elem in layout.elems.iter() {
        if elem.net.as_deref() == Some(name) {
            net.add(elem.clone(), cfg);
        }
    }
    if net.is_empty() {
        return Err(ExtractError::mismatch(format!(
            "no element labeled with net `{}`",
            name
        )));
    }
    Ok(net)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m1() -> LayerSpec {
        LayerSpec::new(68, 20)
    }

    #[test]
    fn test_poly_key() {
        let cfg = ExtractConfig::default();
        let a = Element::rect(m1(), (0., 0.), (2., 1.));
        // Perturbations below the precision grid collapse to the same key
        let b = Element::rect(m1(), (1e-5, -1e-5), (2., 1.));
        assert_eq!(PolyKey::of(&a, &cfg), PolyKey::of(&b, &cfg));
        // Perturbations above it do not
        let c = Element::rect(m1(), (0.01, 0.), (2., 1.));
        assert_ne!(PolyKey::of(&a, &cfg), PolyKey::of(&c, &cfg));
        // Nor do differing (layer, datatype) tags
        let d = Element::rect(LayerSpec::new(68, 44), (0., 0.), (2., 1.));
        assert_ne!(PolyKey::of(&a, &cfg), PolyKey::of(&d, &cfg));
    }

    #[test]
    fn test_net_dedup() {
        let cfg = ExtractConfig::default();
        let mut net = Net::new("net_0");
        assert!(net.add(Element::rect(m1(), (0., 0.), (2., 1.)), &cfg));
        assert!(!net.add(Element::rect(m1(), (0., 0.), (2., 1.)), &cfg));
        assert_eq!(net.len(), 1);
    }

    #[test]
    fn test_fuse() {
        let cfg = ExtractConfig::default();
        let shared = Element::rect(m1(), (0., 0.), (2., 1.));
        let mut a = Net::new("net_0");
        a.add(shared.clone(), &cfg);
        a.add(Element::rect(m1(), (5., 5.), (6., 6.)), &cfg);
        let mut b = Net::new("net_1");
        b.add(shared, &cfg);
        let mut c = Net::new("net_2");
        c.add(Element::rect(m1(), (10., 10.), (11., 11.)), &cfg);

        let fused = fuse(vec![a, b, c], &cfg);
        assert_eq!(fused.len(), 2);
        // The earlier name survives the merge
        assert_eq!(fused[0].name, "net_0");
        assert_eq!(fused[0].len(), 2);
        assert_eq!(fused[1].name, "net_2");

        // Fusion is idempotent: a second run changes nothing
        let again = fuse(fused.clone(), &cfg);
        assert_eq!(again.len(), 2);
        assert_eq!(again[0].len(), 2);
    }

    #[test]
    fn test_fuse_transitive_chain() {
        let cfg = ExtractConfig::default();
        let p0 = Element::rect(m1(), (0., 0.), (1., 1.));
        let p1 = Element::rect(m1(), (2., 0.), (3., 1.));
        let p2 = Element::rect(m1(), (4., 0.), (5., 1.));
        // a-b share p1, b-c share p2; all three must collapse to one
        let mut a = Net::new("net_0");
        a.add(p0, &cfg);
        a.add(p1.clone(), &cfg);
        let mut b = Net::new("net_1");
        b.add(p1, &cfg);
        b.add(p2.clone(), &cfg);
        let mut c = Net::new("net_2");
        c.add(p2, &cfg);

        let fused = fuse(vec![a, b, c], &cfg);
        assert_eq!(fused.len(), 1);
        assert_eq!(fused[0].name, "net_0");
        assert_eq!(fused[0].len(), 3);
    }

    #[test]
    fn test_rename() {
        let cfg = ExtractConfig::default();
        let mut layout = Layout::new("cell");
        layout.elems.push(Element::rect(m1(), (0., 0.), (1., 1.)));
        let mut net = Net::new("net_0");
        net.add(layout.elems[0].clone(), &cfg);
        net.label();
        layout.elems[0].net = Some("net_0".to_string());

        assert_eq!(rename_net(&mut layout, "net_0", "vdd"), 1);
        assert_eq!(layout.elems[0].net.as_deref(), Some("vdd"));
        let found = net_by_label(&layout, "vdd", &cfg).unwrap();
        assert_eq!(found.len(), 1);
        assert!(net_by_label(&layout, "net_0", &cfg).is_err());
    }
}
