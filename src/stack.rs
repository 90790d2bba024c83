//!
//! # Layer Stack Model
//!
//! Resolves the technology layer table into the ordered metal/via sequence
//! that drives net traversal. The stack alternates routing-metal and via
//! entries, beginning and ending on a metal; its index space is what
//! "stepping up or down the stack" means to the search engine.
//!

// Crates.io
use serde::{Deserialize, Serialize};

// Local imports
use crate::error::{ExtractError, ExtractResult};
use crate::table::{metal_number, via_name, LayerPurpose, LayerSpec, LayerTable};

/// Stack-entry role: routing metal or inter-metal via
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum StackRole {
    Metal,
    Via,
}

/// One (layer, datatype) entry in the stack, with its resolved name
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StackEntry {
    pub spec: LayerSpec,
    pub name: String,
    pub role: StackRole,
}

/// # Layer Stack
///
/// The z-ordered sequence of drawing metal and via layers.
/// Invariant: entries alternate Metal and Via, the first and last entries
/// are Metal, and the length is odd.
///
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LayerStack {
    entries: Vec<StackEntry>,
}
impl LayerStack {
    /// Build the stack from [LayerTable] `table`.
    ///
    /// Starts at the lowest-numbered `met{n}` drawing layer, then
    /// alternates the paired via layer and the next metal, stopping when
    /// the next metal cannot be resolved by name. A via whose upper metal
    /// is missing is not entered, keeping the stack metal-terminated.
    ///
    /// Fails with [ExtractError::LayerStack] when the table holds no
    /// resolvable metal layer at all.
    pub fn build(table: &LayerTable) -> ExtractResult<LayerStack> {
        let drawing = LayerPurpose::Drawing;
        // Find the lowest-numbered drawing metal
        let start = table
            .iter()
            .filter(|info| info.has_purpose(&drawing))
            .filter_map(|info| metal_number(&info.name))
            .min()
            .ok_or(ExtractError::LayerStack {
                message: "layer table holds no drawing metal layer".to_string(),
            })?;

        let mut entries = Vec::new();
        let mut n = start;
        let first = format!("met{}", n);
        entries.push(StackEntry {
            spec: table.require(&first, &drawing)?,
            name: first,
            role: StackRole::Metal,
        });
        loop {
            let via = via_name(n);
            let upper = format!("met{}", n + 1);
            let via_spec = table.spec_for(&via, &drawing);
            let upper_spec = table.spec_for(&upper, &drawing);
            match (via_spec, upper_spec) {
                (Some(v), Some(m)) => {
                    entries.push(StackEntry {
                        spec: v,
                        name: via,
                        role: StackRole::Via,
                    });
                    entries.push(StackEntry {
                        spec: m,
                        name: upper,
                        role: StackRole::Metal,
                    });
                    n += 1;
                }
                // No via, or a via with no metal above it: the stack ends here
                _ => break,
            }
        }
        Ok(LayerStack { entries })
    }

    /// Number of stack entries (metals plus vias); always odd
    pub fn len(&self) -> usize {
        self.entries.len()
    }
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
    /// Get the entry at stack index `idx`
    pub fn get(&self, idx: usize) -> Option<&StackEntry> {
        self.entries.get(idx)
    }
    /// The ordered (layer, datatype) sequence
    pub fn specs(&self) -> Vec<LayerSpec> {
        self.entries.iter().map(|e| e.spec).collect()
    }
    /// Boolean indication of whether index `idx` is a via entry
    pub fn is_via(&self, idx: usize) -> bool {
        matches!(self.entries.get(idx), Some(e) if e.role == StackRole::Via)
    }
    /// Number of metal entries
    pub fn metal_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.role == StackRole::Metal)
            .count()
    }
    /// Stack indices of the metal entries, in order
    pub fn metal_indices(&self) -> Vec<usize> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_i, e)| e.role == StackRole::Metal)
            .map(|(i, _e)| i)
            .collect()
    }
    /// The stack index the extraction driver seeds from: the midpoint metal
    /// when more than 3 metal layers exist, else the lowest metal.
    /// Anchoring at the electrically central layer minimizes traversal depth.
    pub fn midpoint_metal(&self) -> usize {
        let metals = self.metal_count();
        if metals > 3 {
            2 * (metals / 2)
        } else {
            0
        }
    }
    /// Find the stack index of [LayerSpec] `spec`
    pub fn index_of(&self, spec: LayerSpec) -> Option<usize> {
        self.entries.iter().position(|e| e.spec == spec)
    }
}
