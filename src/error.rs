//!
//! # Extraction Result and Error Types
//!

/// # [ExtractError] Result Type
pub type ExtractResult<T> = Result<T, ExtractError>;

///
/// # Extraction Error Enumeration
///
/// All failures are deterministic given the same input and surface
/// synchronously to the caller; nothing here is retried internally.
///
pub enum ExtractError {
    /// A polygon is degenerate or self-intersecting where an operation
    /// requires a well-defined area
    InvalidPolygon { message: String },
    /// The layer table contains no resolvable metal layer,
    /// or a metal/via naming gap breaks the expected alternation
    LayerStack { message: String },
    /// A predicate or search was invoked on inputs whose
    /// (layer, datatype) tags are absent or incompatible
    TypeMismatch { message: String },
    /// Traversal exceeded the caller-configured depth bound.
    /// The batch driver downgrades this to a partial-result warning.
    DepthExceeded { depth: usize },
    /// Uncategorized Error, with String Message
    Str(String),
}
impl ExtractError {
    /// Create an [ExtractError::Str] from anything String-convertible
    pub fn msg(s: impl Into<String>) -> Self {
        Self::Str(s.into())
    }
    /// Create an error-variant [Result] of our [ExtractError::Str] variant
    /// from anything String-convertible
    pub fn fail<T>(s: impl Into<String>) -> Result<T, Self> {
        Err(Self::msg(s))
    }
    /// Create an [ExtractError::InvalidPolygon] from anything String-convertible
    pub fn invalid(s: impl Into<String>) -> Self {
        Self::InvalidPolygon { message: s.into() }
    }
    /// Create an [ExtractError::TypeMismatch] from anything String-convertible
    pub fn mismatch(s: impl Into<String>) -> Self {
        Self::TypeMismatch { message: s.into() }
    }
}
impl std::fmt::Debug for ExtractError {
    /// Display an [ExtractError]
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            ExtractError::InvalidPolygon { message } => {
                write!(f, "Invalid Polygon: {}", message)
            }
            ExtractError::LayerStack { message } => {
                write!(f, "Layer Stack Error: {}", message)
            }
            ExtractError::TypeMismatch { message } => {
                write!(f, "Type Mismatch: {}", message)
            }
            ExtractError::DepthExceeded { depth } => {
                write!(f, "Search Depth Exceeded: {}", depth)
            }
            ExtractError::Str(err) => err.fmt(f),
        }
    }
}
impl std::fmt::Display for ExtractError {
    /// Display an [ExtractError]
    /// Delegates to the [Debug] implementation
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}
impl std::error::Error for ExtractError {}

impl From<String> for ExtractError {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}
impl From<&str> for ExtractError {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}
