//!
//! # netx21: Layer-Stack Net Extraction
//!
//! Extracts electrically connected groups of polygons ("nets") from an
//! integrated-circuit layout organized as stacked metal and via layers,
//! for parasitic-resistance analysis.
//!
//! Given a [Layout] of (layer, datatype)-tagged polygons and a [LayerTable]
//! ordering those tags into an alternating metal/via [LayerStack], the
//! engine partitions the polygons into maximal connected components.
//! Connectivity is transitive through geometric overlap within a layer and
//! across vias between adjacent metal layers.
//!
//! Layout loading (GDSII et al), table persistence, resistance computation,
//! and rendering are all external collaborators; this crate consumes
//! already-materialized inputs and produces [Net] partitions.
//!

pub mod bbox;
pub mod error;
pub mod geom;
pub mod merge;
pub mod net;
pub mod predicates;
pub mod search;
pub mod stack;
pub mod table;


// Re-exports of the primary API
pub use error::{ExtractError, ExtractResult};
pub use geom::{Element, Layout, Point, Polygon, Rect, Shape, ShapeTrait};
pub use merge::PolygonBuckets;
pub use net::{
    delete_highlight, fuse, highlight, net_by_label, rename_net, Net, NetList, PolyKey,
};
pub use predicates::CompassDir;
pub use search::{Extraction, NetExtractor, StackDir};
pub use stack::{LayerStack, StackEntry, StackRole};
pub use table::{LayerInfo, LayerPurpose, LayerSpec, LayerTable};

/// # Coordinate Type-Alias
///
/// Layout spatial coordinates, in (float) layout units.
/// The boolean kernel and all tolerances operate in the same units.
pub type Coord = f64;

/// # Extraction Configuration
///
/// Explicit, caller-supplied knobs for one extraction run.
/// Replaces any notion of process-wide defaults: the engine holds no
/// module-level mutable state.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractConfig {
    /// Numeric precision tolerance, a length in layout units.
    /// Boolean-operation components with area below its square are
    /// treated as empty.
    pub precision: Coord,
    /// Maximum vertex count per kernel polygon.
    /// Carried for interface fidelity with fracture-based kernels;
    /// unused by the `geo` kernel.
    pub max_points: usize,
    /// Optional bound on traversal depth (metal hops per search branch).
    /// `None` disables the guard.
    pub max_depth: Option<usize>,
}
impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            precision: 1e-3,
            max_points: 199,
            max_depth: None,
        }
    }
}
