// Our Real scalar type:
#[cfg(feature = "f32")]
pub type Real = f32;
#[cfg(feature = "f64")]
pub type Real = f64;

/// Dead zone around a plane inside which a point counts as lying *on* it.
///
/// Every classification in the crate (clipping, trivial rejection, separator
/// construction) uses this same value so that both endpoints of a clipped edge
/// are judged consistently.
pub const ON_EPSILON: Real = 0.1;

/// Maximum number of points a loaded portal winding may carry.
pub const MAX_POINTS_ON_WINDING: usize = 64;

/// Maximum number of portals bounding a single cluster.
pub const MAX_PORTALS_ON_CLUSTER: usize = 128;

/// Two unit normals closer than this per component are treated as identical.
pub const NORMAL_EPSILON: Real = 1e-5;

/// Squared length below which a separator candidate's normal is degenerate.
pub const SEPARATOR_EPSILON: Real = ON_EPSILON;
