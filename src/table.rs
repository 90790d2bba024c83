//!
//! # Technology Layer Table
//!
//! Maps (layer, datatype) pairs to layer names, purposes, and descriptions.
//! Supplied, already materialized, by an external loader; read-only for the
//! duration of an extraction run, apart from the explicit highlight and
//! backannotation derivations.
//!

// Std-Lib
use std::collections::HashMap;

// Crates.io
use serde::{Deserialize, Serialize};
use slotmap::{new_key_type, SlotMap};

// Local imports
use crate::error::{ExtractError, ExtractResult};

// Create key-types for each internal type stored in [SlotMap]s
new_key_type! {
    /// Keys for [LayerInfo] entries
    pub struct LayerKey;
}

/// # Layer Specification
/// As in seemingly every layout system, this uses two numbers to identify each layer.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, Default,
)]
pub struct LayerSpec(pub i16, pub i16);
impl LayerSpec {
    pub fn new(layer: i16, datatype: i16) -> Self {
        Self(layer, datatype)
    }
    /// The GDS layer number
    pub fn layer(&self) -> i16 {
        self.0
    }
    /// The GDS datatype number
    pub fn datatype(&self) -> i16 {
        self.1
    }
}

/// Layer-Purpose Enumeration
/// Includes the purposes this engine touches first-class,
/// and a numbered escape hatch for everything else.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum LayerPurpose {
    Drawing,
    Text,
    Pin,
    Label,
    Net,
    Boundary,
    Highlight,
    Backannotation,
    /// Other purpose, not first-class supported
    Other(i16),
}

/// # Layer Table Entry
///
/// Name, purposes and description for one (layer, datatype) pair.
/// A layer may carry multiple purposes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LayerInfo {
    /// Layer & datatype
    pub spec: LayerSpec,
    /// Layer Name
    pub name: String,
    /// Purposes
    pub purposes: Vec<LayerPurpose>,
    /// Free-text description
    pub description: String,
}
impl LayerInfo {
    /// Create a new [LayerInfo]
    pub fn new(
        spec: LayerSpec,
        name: impl Into<String>,
        purposes: Vec<LayerPurpose>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            spec,
            name: name.into(),
            purposes,
            description: description.into(),
        }
    }
    /// Boolean indication of whether we carry [LayerPurpose] `purpose`
    pub fn has_purpose(&self, purpose: &LayerPurpose) -> bool {
        self.purposes.contains(purpose)
    }
}

/// # Layer Table
///
/// Keep track of technology layers, and index them by spec and name.
/// Invariant: specs are unique; re-adding a spec replaces its entry.
///
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayerTable {
    slots: SlotMap<LayerKey, LayerInfo>,
    specs: HashMap<LayerSpec, LayerKey>,
    names: HashMap<String, Vec<LayerKey>>,
}
impl LayerTable {
    /// Create a new and empty [LayerTable]
    pub fn new() -> Self {
        Self::default()
    }
    /// Add a [LayerInfo] to our slot-map, spec-map, and name-map.
    /// An existing entry at the same spec is replaced.
    pub fn add(&mut self, info: LayerInfo) -> LayerKey {
        if let Some(old) = self.specs.remove(&info.spec) {
            if let Some(removed) = self.slots.remove(old) {
                if let Some(keys) = self.names.get_mut(&removed.name) {
                    keys.retain(|k| *k != old);
                }
            }
        }
        let spec = info.spec;
        let name = info.name.clone();
        let key = self.slots.insert(info);
        self.specs.insert(spec, key);
        self.names.entry(name).or_default().push(key);
        key
    }
    /// Get a reference to the [LayerInfo] at `spec`
    pub fn get(&self, spec: LayerSpec) -> Option<&LayerInfo> {
        let key = self.specs.get(&spec)?;
        self.slots.get(*key)
    }
    /// Get the layer name at `spec`
    pub fn name_of(&self, spec: LayerSpec) -> Option<&str> {
        self.get(spec).map(|info| info.name.as_str())
    }
    /// Get the purposes at `spec`
    pub fn purposes_of(&self, spec: LayerSpec) -> Option<&Vec<LayerPurpose>> {
        self.get(spec).map(|info| &info.purposes)
    }
    /// Get every [LayerSpec] carrying `name` and `purpose`, in insertion order
    pub fn specs_for(&self, name: &str, purpose: &LayerPurpose) -> Vec<LayerSpec> {
        let keys = match self.names.get(name) {
            Some(keys) => keys,
            None => return Vec::new(),
        };
        keys.iter()
            .filter_map(|k| self.slots.get(*k))
            .filter(|info| info.has_purpose(purpose))
            .map(|info| info.spec)
            .collect()
    }
    /// Get the first [LayerSpec] carrying `name` and `purpose`
    pub fn spec_for(&self, name: &str, purpose: &LayerPurpose) -> Option<LayerSpec> {
        self.specs_for(name, purpose).into_iter().next()
    }
    /// Like [LayerTable::spec_for], but failing with a [ExtractError::LayerStack]
    pub fn require(&self, name: &str, purpose: &LayerPurpose) -> ExtractResult<LayerSpec> {
        self.spec_for(name, purpose).ok_or(ExtractError::LayerStack {
            message: format!("no layer named `{}` with purpose {:?}", name, purpose),
        })
    }
    /// Iterate over all entries
    pub fn iter(&self) -> impl Iterator<Item = &LayerInfo> {
        self.slots.iter().map(|(_k, info)| info)
    }
    /// Number of entries
    pub fn len(&self) -> usize {
        self.slots.len()
    }
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Add the dedicated net-highlight layer, `(65, 0)`,
    /// returning its [LayerSpec]
    pub fn add_highlight(&mut self) -> LayerSpec {
        let spec = LayerSpec::new(65, 0);
        self.add(LayerInfo::new(
            spec,
            "highlight",
            vec![LayerPurpose::Highlight],
            "net highlighting",
        ));
        spec
    }
    /// Add a backannotation datatype for every drawing metal layer,
    /// at the metal's drawing datatype plus six.
    /// Returns the added [LayerSpec]s.
    pub fn add_backannotation(&mut self) -> Vec<LayerSpec> {
        let derived: Vec<LayerInfo> = self
            .iter()
            .filter(|info| {
                info.has_purpose(&LayerPurpose::Drawing) && metal_number(&info.name).is_some()
            })
            .map(|info| {
                LayerInfo::new(
                    LayerSpec::new(info.spec.layer(), info.spec.datatype() + 6),
                    info.name.clone(),
                    vec![LayerPurpose::Backannotation],
                    format!("{} backannotation", info.name),
                )
            })
            .collect();
        derived
            .into_iter()
            .map(|info| {
                let spec = info.spec;
                self.add(info);
                spec
            })
            .collect()
    }
}

/// Parse the metal index from a routing-layer name of the form `met{n}`.
/// Returns `None` for anything else, vias and cut layers included.
pub(crate) fn metal_number(name: &str) -> Option<u32> {
    name.strip_prefix("met")?.parse().ok()
}

/// The via-layer name connecting metal `n` upward to metal `n + 1`.
/// The first via layer is unnumbered by convention.
pub(crate) fn via_name(n: u32) -> String {
    if n == 1 {
        "via".to_string()
    } else {
        format!("via{}", n)
    }
}
