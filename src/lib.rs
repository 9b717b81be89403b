//! # The Geoport crate
//!
//! Translate Serpent 2 geometry input into OpenMC constructive solid geometry
//!
//! ## Installation
//!
//! Direct install from github:
//!
//! ```shell
//! cargo install --git https://github.com/repositony/geoport.git
//! ```
//!
//! ## Overview
//!
//! The crate provides a command line tool for converting a Serpent geometry
//! into an OpenMC `geometry.xml`, with cell materials resolved against an
//! existing OpenMC `materials.xml`.
//!
//! | Command line | Description                                         |
//! | ------------ | --------------------------------------------------- |
//! | `sss2omc`    | Convert a Serpent geometry to OpenMC `geometry.xml` |
//!
//! The tool is fully documented with a detailed `--help` message, including
//! examples for common use cases.
//!
//! ### Supported cards
//!
//! | Card                 | Notes                                              |
//! | -------------------- | -------------------------------------------------- |
//! | `surf`               | planes, cylinders, spheres, cones, tori, quadrics  |
//! | `surf` (composite)   | `sqc`, `rect`, `hexxc`, `hexyc`, `cube`, `cuboid`  |
//! | `cell`               | material, `void`, `fill`, and `outside` cells      |
//! | `lat`                | square (1), infinite square (6), single layer (11) |
//! | `trans`              | surface (`S`) and universe (`U`) transformations   |
//! | `set bc`, `set root` | boundary conditions and the root universe          |
//! | `include`            | followed relative to the including file            |
//!
//! Composite surfaces are broken down into planes and substituted into cell
//! regions as the intersection of their faces.
//!
//! ## Advanced use
//!
//! The crate itself is more useful than the command line tool to anyone
//! working in Rust. A geometry can be read into a [Geometry](crate::csg::Geometry)
//! with a one-liner, then queried, modified, or written out.
//!
//! ```rust
//! use geoport::csg::{Fill, MaterialLibrary};
//! use geoport::translate_lines;
//!
//! let lines = [
//!     "surf pin cyl 0.0 0.0 0.4",
//!     "surf box sqc 0.0 0.0 0.63",
//!     "cell fuel 0 uo2 -pin",
//!     "cell mod  0 water pin -box",
//!     "cell out  0 outside box",
//!     "set bc 2",
//! ];
//! let materials = MaterialLibrary::from_names(["uo2", "water"]);
//! let geometry = translate_lines(&lines, materials).unwrap();
//!
//! // find out what is where
//! let cell = geometry.find_cell([0.5, 0.0, 0.0]).unwrap();
//! assert_eq!(cell.fill, Fill::Material("water".into()));
//!
//! // or write it out for OpenMC
//! let xml = geometry.to_xml();
//! assert!(xml.contains("boundary=\"reflective\""));
//! ```
//!
//! As an overview:
//! - The [csg] module contains the OpenMC side of things, surfaces, regions,
//! cells, universes, and lattices.
//! - The [translate] module turns Serpent cards into those structures.
//! - The [xml] module writes a [Geometry](crate::csg::Geometry) to
//! `geometry.xml`.
//! - The [error] module lists everything that can go wrong in a translation.
//!
//! In the background, the `nom` parser combinator library is used to read the
//! cards, `nalgebra` handles the rotations, and `clap` is used for the command
//! line interface.

// Public facing modules
pub mod csg;
pub mod error;
pub mod translate;
pub mod utils;
pub mod xml;

// note that docs are hidden to prevent confusing the current simple API
pub mod readers;

// Re-exports of useful data structures
#[doc(inline)]
pub use crate::error::{Error, Result};

#[doc(inline)]
pub use crate::readers::{read_openmc_materials, read_serpent_geometry};

#[doc(inline)]
pub use crate::translate::translate_lines;

#[doc(inline)]
pub use crate::xml::write_geometry;
