//! Constructive solid geometry model
//!
//! # Overview
//!
//! This is the OpenMC side of the translation. Everything the translator
//! produces ends up in these structures, and the [xml](crate::xml) module
//! writes them out as an OpenMC `geometry.xml`.
//!
//! | Type         | Description                                             |
//! | ------------ | ------------------------------------------------------- |
//! | [Surface]    | primitive surface with an id and boundary condition     |
//! | [Region]     | boolean tree of signed surface half-spaces              |
//! | [Cell]       | region bound to a material, universe, or the outside    |
//! | [Universe]   | ordered set of cells, or a rectangular [Lattice]        |
//! | [Geometry]   | all of the above plus the root universe name            |
//!
//! Surfaces support exact translation and rotation. Rotating anything other
//! than a plane, sphere, cylinder, or axis-aligned torus turns it into a
//! general quadric.
//!
//! ```rust
//! # use geoport::csg::{Region, Surface, SurfaceKind};
//! # use indexmap::IndexMap;
//! let mut surfaces = IndexMap::new();
//! surfaces.insert(1, Surface::new(1, "fuel", SurfaceKind::Sphere { x0: 0.0, y0: 0.0, z0: 0.0, r: 1.0 }));
//!
//! let region = Region::from_expression("-1").unwrap();
//! assert!(region.contains([0.5, 0.0, 0.0], &surfaces));
//! ```

// Split into subfiles for development, but anything important is re-exported
mod cell;
mod geometry;
mod material;
mod region;
mod surface;
mod universe;

#[doc(inline)]
pub use crate::csg::cell::{Cell, Fill};

#[doc(inline)]
pub use crate::csg::geometry::Geometry;

#[doc(inline)]
pub use crate::csg::material::{Material, MaterialLibrary};

#[doc(inline)]
pub use crate::csg::region::{Halfspace, Region, Side};

#[doc(inline)]
pub use crate::csg::surface::{BoundaryType, Surface, SurfaceId, SurfaceKind};

#[doc(inline)]
pub use crate::csg::universe::{Lattice, LatticeKind, Universe};

/// 3D vector type
pub type Vector3 = nalgebra::Vector3<f64>;

/// 3x3 matrix type, used for rotations
pub type Matrix3 = nalgebra::Matrix3<f64>;

/// Tolerance for deciding a direction lies along a coordinate axis
pub const TOLERANCE: f64 = 1e-10;
