#![doc(hidden)]
//! Readers for Serpent geometry files and OpenMC material files

// internal modules
use crate::csg::{Geometry, MaterialLibrary};

// standard library
use std::path::Path;

// external crates
use anyhow::Result;

// files under the readers module
mod geometry_file;
mod materials_file;
pub mod parsers;

// inline the readers for a nice API
#[doc(inline)]
pub use crate::readers::geometry_file::GeometryReader;

#[doc(inline)]
pub use crate::readers::materials_file::MaterialsReader;

/// Read and translate a Serpent geometry file
///
/// Returns a result containing the [Geometry] translated from the file at
/// `path`, with `include` cards followed and cell materials resolved against
/// `materials`.
///
/// - `path` - Path to the geometry file, can be [&str], [String], [Path], etc...
/// - `materials` - Every material a cell card may name
///
/// Example
/// ```ignore
/// // Translate a geometry that uses the materials of an OpenMC model
/// let materials = geoport::read_openmc_materials("path/to/materials.xml")?;
/// let geometry = geoport::read_serpent_geometry("path/to/geometry.inp", materials)?;
/// ```
pub fn read_serpent_geometry<P: AsRef<Path>>(
    path: P,
    materials: MaterialLibrary,
) -> Result<Geometry> {
    let path: &Path = Path::new(path.as_ref());
    let mut reader = GeometryReader::new();
    reader.disable_progress();
    reader.parse(path, materials)
}

/// Read the materials of an OpenMC `materials.xml`
///
/// Returns a result containing a [MaterialLibrary] with the id and name of
/// every `<material>` element in the file at `path`.
///
/// Example
/// ```ignore
/// let materials = geoport::read_openmc_materials("path/to/materials.xml")?;
/// let fuel = materials.get("fuel");
/// ```
pub fn read_openmc_materials<P: AsRef<Path>>(path: P) -> Result<MaterialLibrary> {
    let path: &Path = Path::new(path.as_ref());
    let mut reader = MaterialsReader::new();
    reader.parse(path)
}
