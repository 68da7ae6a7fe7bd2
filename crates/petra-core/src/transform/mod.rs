//! Spatial transforms mapping world points to world points.
//!
//! [`RigidTransform`] and [`AffineTransform`] are differentiable modules
//! whose parameters can be optimized; [`MatrixTransform`] is the plain
//! numeric form used once optimization is done.

pub mod affine;
pub mod matrix;
pub mod rigid;
pub mod trait_;

pub use affine::AffineTransform;
pub use matrix::MatrixTransform;
pub use rigid::RigidTransform;
pub use trait_::SpatialTransform;
