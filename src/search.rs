//!
//! # Net Search Engine
//!
//! Recursive traversal of the merged polygon buckets: starting from a seed
//! metal polygon, connectivity expands through overlapping vias one stack
//! level at a time, upward and downward, until no unvisited polygon
//! remains reachable. The batch driver seeds every metal bucket, then
//! fuses partial nets sharing a polygon into maximal ones.
//!
//! Vias enter a net as their full merged bucket polygon rather than as
//! the via/metal intersection. Two traversals reaching the same via from
//! different seeds thereby hold an identical member, which is what the
//! fusion pass keys on.
//!

// Std-Lib
use std::collections::HashSet;

// Crates.io
use serde::{Deserialize, Serialize};

// Local imports
use crate::error::{ExtractError, ExtractResult};
use crate::geom::Element;
use crate::merge::PolygonBuckets;
use crate::net::{fuse, Net, NetList, PolyKey};
use crate::predicates::{contains_polygon, overlaps};
use crate::stack::LayerStack;
use crate::ExtractConfig;

/// Traversal direction along the stack's index space
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum StackDir {
    Up,
    Down,
}

/// # Extraction Outcome
///
/// The fused, labeled [NetList], plus warnings for branches the depth
/// guard truncated. An empty `warnings` means the partition is exact.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Extraction {
    pub nets: NetList,
    pub warnings: Vec<String>,
}

/// # Net Extractor
///
/// Borrows the resolved [LayerStack], the merged [PolygonBuckets], and the
/// run configuration; owns no state of its own, so one extractor serves
/// any number of extraction calls.
pub struct NetExtractor<'a> {
    stack: &'a LayerStack,
    buckets: &'a PolygonBuckets,
    cfg: &'a ExtractConfig,
}
impl<'a> NetExtractor<'a> {
    pub fn new(stack: &'a LayerStack, buckets: &'a PolygonBuckets, cfg: &'a ExtractConfig) -> Self {
        Self {
            stack,
            buckets,
            cfg,
        }
    }

    /// Extract every net in the layout.
    ///
    /// Seeds traversals from the midpoint metal first, then each remaining
    /// metal bucket in ascending stack order, skipping polygons already
    /// claimed by an earlier net. Via polygons left unclaimed afterwards
    /// become singleton nets, keeping the result an exact partition of the
    /// stack's polygons. Partial nets are fused and labeled before return.
    ///
    /// A [ExtractError::DepthExceeded] from a single traversal is
    /// downgraded here to a warning with the partial net kept.
    pub fn extract_all(&self) -> ExtractResult<Extraction> {
        let mut nets: Vec<Net> = Vec::new();
        let mut warnings = Vec::new();
        let mut claimed: HashSet<PolyKey> = HashSet::new();
        let mut next_id = 0;

        // Midpoint metal first; depth from a central anchor is minimal
        let midpoint = self.stack.midpoint_metal();
        let mut seed_order = vec![midpoint];
        seed_order.extend(
            self.stack
                .metal_indices()
                .into_iter()
                .filter(|idx| *idx != midpoint),
        );

        for metal_idx in seed_order {
            for seed in self.buckets.bucket(metal_idx) {
                if claimed.contains(&PolyKey::of(seed, self.cfg)) {
                    continue;
                }
                let mut net = Net::new(format!("net_{}", next_id));
                next_id += 1;
                net.add(seed.clone(), self.cfg);
                match self.expand(seed, metal_idx, 0, &mut net) {
                    Ok(()) => (),
                    Err(ExtractError::DepthExceeded { depth }) => {
                        warnings.push(format!(
                            "net `{}`: search depth {} exceeded, net truncated",
                            net.name, depth
                        ));
                    }
                    Err(e) => return Err(e),
                }
                claimed.extend(net.keys().cloned());
                nets.push(net);
            }
        }

        // Orphan vias: overlapped by no metal on either side
        for (idx, bucket) in self.buckets.iter() {
            if !self.stack.is_via(idx) {
                continue;
            }
            for via in bucket {
                if claimed.contains(&PolyKey::of(via, self.cfg)) {
                    continue;
                }
                let mut net = Net::new(format!("net_{}", next_id));
                next_id += 1;
                net.add(via.clone(), self.cfg);
                claimed.extend(net.keys().cloned());
                nets.push(net);
            }
        }

        let mut netlist = NetList {
            nets: fuse(nets, self.cfg),
        };
        netlist.label_all();
        log::info!(
            "extracted {} nets over {} polygons, {} warnings",
            netlist.len(),
            netlist.polygon_count(),
            warnings.len()
        );
        Ok(Extraction {
            nets: netlist,
            warnings,
        })
    }

    /// Extract the single net containing metal polygon `seed`.
    ///
    /// The seed must lie on a metal stack layer; via and off-stack seeds
    /// fail with [ExtractError::TypeMismatch]. The traversal runs from the
    /// merged bucket polygon covering the seed, so a pre-merge fragment is
    /// an acceptable seed. Unlike [NetExtractor::extract_all], a depth
    /// overrun here is a hard error.
    pub fn extract_from(&self, seed: &Element) -> ExtractResult<Net> {
        let metal_idx = self
            .stack
            .index_of(seed.spec)
            .ok_or(ExtractError::mismatch(format!(
                "seed layer {:?} is not in the stack",
                seed.spec
            )))?;
        if self.stack.is_via(metal_idx) {
            return Err(ExtractError::mismatch(format!(
                "seed layer {:?} is a via layer; seeds must be metal",
                seed.spec
            )));
        }
        let merged = self
            .buckets
            .bucket(metal_idx)
            .iter()
            .find(|b| contains_polygon(b, seed, self.cfg))
            .ok_or(ExtractError::mismatch(
                "seed polygon not found on its metal layer",
            ))?;

        let name = seed.net.clone().unwrap_or_else(|| "net_0".to_string());
        let mut net = Net::new(name);
        net.add(merged.clone(), self.cfg);
        self.expand(merged, metal_idx, 0, &mut net)?;
        net.label();
        Ok(net)
    }

    /// Expand `net` from metal polygon `elem` at stack index `metal_idx`,
    /// in both directions. `depth` counts metal hops from the seed.
    ///
    /// Both directions always run; a depth overrun in one must not starve
    /// the other of polygons still within budget. The first overrun is
    /// surfaced after the full pass.
    fn expand(
        &self,
        elem: &Element,
        metal_idx: usize,
        depth: usize,
        net: &mut Net,
    ) -> ExtractResult<()> {
        if let Some(max) = self.cfg.max_depth {
            if depth > max {
                return Err(ExtractError::DepthExceeded { depth });
            }
        }
        let up = self.expand_dir(elem, metal_idx, StackDir::Up, depth, net);
        let down = self.expand_dir(elem, metal_idx, StackDir::Down, depth, net);
        up.and(down)
    }

    /// One directional step: the adjacent via bucket, then the metal
    /// beyond it. Via hits enter the net whole; each newly reached metal
    /// polygon recurses. Already-member metals do not recurse again, which
    /// is the termination guarantee.
    fn expand_dir(
        &self,
        elem: &Element,
        metal_idx: usize,
        dir: StackDir,
        depth: usize,
        net: &mut Net,
    ) -> ExtractResult<()> {
        let (via_idx, next_idx) = match dir {
            StackDir::Up => {
                if metal_idx + 2 >= self.stack.len() {
                    return Ok(()); // top of the stack
                }
                (metal_idx + 1, metal_idx + 2)
            }
            StackDir::Down => {
                if metal_idx < 2 {
                    return Ok(()); // bottom of the stack
                }
                (metal_idx - 1, metal_idx - 2)
            }
        };
        let poly = elem.poly();
        let mut hits = Vec::new();
        for via in self.buckets.bucket(via_idx) {
            if overlaps(&poly, &via.poly(), self.cfg) {
                net.add(via.clone(), self.cfg);
                hits.push(via);
            }
        }
        if hits.is_empty() {
            return Ok(());
        }
        // A depth overrun on one candidate's recursion must not stop the
        // remaining candidates at this level from being added
        let mut exceeded = None;
        for candidate in self.buckets.bucket(next_idx) {
            if net.contains(candidate, self.cfg) {
                continue;
            }
            let cpoly = candidate.poly();
            if hits.iter().any(|v| overlaps(&v.poly(), &cpoly, self.cfg)) {
                net.add(candidate.clone(), self.cfg);
                match self.expand(candidate, next_idx, depth + 1, net) {
                    Ok(()) => (),
                    Err(e @ ExtractError::DepthExceeded { .. }) => {
                        if exceeded.is_none() {
                            exceeded = Some(e);
                        }
                    }
                    Err(e) => return Err(e),
                }
            }
        }
        match exceeded {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
