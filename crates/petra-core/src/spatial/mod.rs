//! Spatial types: points, vectors, voxel spacings and direction matrices.
//!
//! Thin wrappers around nalgebra types. A volume's voxel-to-world affine is
//! stored factored as origin (Point), spacing (Spacing) and direction
//! (Direction); the wrappers keep that decomposition explicit in signatures.

pub mod point;
pub mod vector;
pub mod spacing;
pub mod direction;

pub use point::Point;
pub use vector::Vector;
pub use spacing::Spacing;
pub use direction::Direction;

// Common type aliases for 2D and 3D
pub type Point2 = Point<2>;
pub type Point3 = Point<3>;
pub type Vector2 = Vector<2>;
pub type Vector3 = Vector<3>;
pub type Spacing2 = Spacing<2>;
pub type Spacing3 = Spacing<3>;
pub type Direction2 = Direction<2>;
pub type Direction3 = Direction<3>;
