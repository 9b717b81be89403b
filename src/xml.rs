//! OpenMC `geometry.xml` output
//!
//! Cells are written first, then lattices, then surfaces. Every universe and
//! lattice is referred to by the id of the universe it belongs to, since
//! OpenMC shares one id space between the two.
//!
//! Placements of filling universes are written as a translation plus a
//! 9-value rotation matrix. OpenMC maps a point into the filling universe
//! with `M (x - t)`, so the matrix written is the transpose of the rotation
//! applied to the universe.

// internal modules
use crate::csg::{Cell, Fill, Geometry, Lattice, LatticeKind, Surface, BoundaryType, Universe};
use crate::utils::*;

// standard library
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

// external crates
use anyhow::{Context, Result};
use itertools::Itertools;
use log::{debug, warn};

/// Write a geometry to an OpenMC `geometry.xml` file
///
/// Example
/// ```ignore
/// let geometry = geoport::read_serpent_geometry("core.inp", materials)?;
/// geoport::xml::write_geometry(&geometry, "geometry.xml")?;
/// ```
pub fn write_geometry<P: AsRef<Path>>(geometry: &Geometry, path: P) -> Result<()> {
    let path = path.as_ref();
    let f = File::create(path).with_context(|| f!("Unable to create {}", path.display()))?;
    let mut f = BufWriter::new(f);

    debug!("Writing {}", path.display());
    f.write_all(geometry.to_xml().as_bytes())
        .with_context(|| f!("Failed to write {}", path.display()))?;
    f.flush()?;
    Ok(())
}

impl Geometry {
    /// Full text of the OpenMC `geometry.xml`
    ///
    /// ```rust
    /// # use geoport::csg::MaterialLibrary;
    /// # use geoport::translate::translate_lines;
    /// let lines = ["surf 1 sph 0 0 0 10", "cell 1 0 outside 1"];
    /// let xml = translate_lines(&lines, MaterialLibrary::new()).unwrap().to_xml();
    /// assert!(xml.contains(r#"<surface id="1" name="1" type="sphere" coeffs="0 0 0 10" boundary="vacuum" />"#));
    /// ```
    pub fn to_xml(&self) -> String {
        let mut s = String::from("<?xml version='1.0' encoding='utf-8'?>\n<geometry>\n");

        for cell in self.cells.values() {
            s += &self.cell_element(cell);
        }

        for universe in self.universes.values() {
            if let Some(lattice) = &universe.lattice {
                s += &self.lattice_element(universe, lattice);
            }
        }

        for surface in self.surfaces.values() {
            s += &surface_element(surface);
        }

        s += "</geometry>\n";
        s
    }

    /// Id of a universe, or of the lattice registered on it
    fn universe_id(&self, name: &str) -> u32 {
        self.universes.get(name).map(|u| u.id).unwrap_or_default()
    }

    fn cell_element(&self, cell: &Cell) -> String {
        let mut attributes = vec![
            ("id", cell.id.to_string()),
            ("name", escape(&cell.name)),
            ("universe", self.universe_id(&cell.universe).to_string()),
        ];

        match &cell.fill {
            Fill::Material(name) => {
                let id = self.materials.get(name).map(|m| m.id).unwrap_or_default();
                attributes.push(("material", id.to_string()));
            }
            Fill::Void | Fill::Outside => attributes.push(("material", "void".to_string())),
            Fill::Universe(name) => attributes.push(("fill", self.universe_id(name).to_string())),
        }

        if let Some(region) = &cell.region {
            attributes.push(("region", openmc_region(&region.to_string())));
        }

        if let Some(t) = cell.translation {
            attributes.push(("translation", join_floats(&t)));
        }

        if cell.rotation.is_some() {
            let m = cell.rotation_matrix().transpose();
            let rows: Vec<f64> = (0..3).flat_map(|i| (0..3).map(move |j| m[(i, j)])).collect();
            attributes.push(("rotation", join_floats(&rows)));
        }

        let attributes = attributes
            .into_iter()
            .map(|(key, value)| f!("{key}=\"{value}\""))
            .join(" ");
        f!("  <cell {attributes} />\n")
    }

    fn lattice_element(&self, universe: &Universe, lattice: &Lattice) -> String {
        if lattice.kind == LatticeKind::SquareInfinite {
            warn!("Lattice {} is infinite, written with its finite extent", universe.name);
        }

        // top row first, as OpenMC expects
        let rows = lattice
            .universes
            .iter()
            .rev()
            .map(|row| row.iter().map(|name| self.universe_id(name)).join(" "))
            .join("\n");

        let mut s = f!("  <lattice id=\"{}\" name=\"{}\">\n", universe.id, escape(&universe.name));
        s += &f!("    <pitch>{}</pitch>\n", join_floats(&lattice.pitch));
        s += &f!(
            "    <dimension>{} {}</dimension>\n",
            lattice.dimension[0], lattice.dimension[1]
        );
        s += &f!("    <lower_left>{}</lower_left>\n", join_floats(&lattice.lower_left()));
        s += &f!("    <universes>\n{rows}\n    </universes>\n");
        s += "  </lattice>\n";
        s
    }
}

fn surface_element(surface: &Surface) -> String {
    let mut s = f!(
        "  <surface id=\"{}\" name=\"{}\" type=\"{}\" coeffs=\"{}\"",
        surface.id,
        escape(&surface.name),
        surface.kind.openmc_type(),
        join_floats(&surface.kind.openmc_coefficients())
    );
    if surface.boundary != BoundaryType::Transmission {
        s += &f!(" boundary=\"{}\"", surface.boundary);
    }
    s += " />\n";
    s
}

/// OpenMC writes positive half-spaces without a sign
fn openmc_region(expression: &str) -> String {
    expression.replace('+', "")
}

/// Escape the characters XML does not allow in attribute values
fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csg::MaterialLibrary;
    use crate::translate::translate_lines;

    fn translate(lines: &[&str]) -> Geometry {
        translate_lines(lines, MaterialLibrary::from_names(["fuel", "water"])).unwrap()
    }

    #[test]
    fn writes_material_and_outside_cells() {
        let xml = translate(&[
            "surf 1 cyl 0 0 1",
            "surf 2 cyl 0 0 2",
            "cell 10 0 fuel -1",
            "cell 11 0 water 1 -2",
            "cell 12 0 outside 2",
        ])
        .to_xml();

        let fuel = stable_id("fuel");
        assert!(xml.contains(&f!(
            "<cell id=\"10\" name=\"10\" universe=\"1\" material=\"{fuel}\" region=\"-1\" />"
        )));
        assert!(xml.contains("region=\"1 -2\""));
        assert!(xml.contains("material=\"void\" region=\"2\""));
        assert!(xml.contains("type=\"z-cylinder\" coeffs=\"0 0 2\" boundary=\"vacuum\""));
        assert!(xml.contains("type=\"z-cylinder\" coeffs=\"0 0 1\" />"));
    }

    #[test]
    fn writes_lattice_top_row_first() {
        let geometry = translate(&[
            "surf 1 sqc 0 0 10",
            "surf all inf",
            "cell a A fuel all",
            "cell b B water all",
            "lat L 1 0 0 2 2 10 A A B B",
            "cell c 0 fill L -1",
            "cell d 0 outside 1",
        ]);
        let xml = geometry.to_xml();
        let (a, b) = (geometry.universes["A"].id, geometry.universes["B"].id);

        assert!(xml.contains(&f!("<universes>\n{a} {a}\n{b} {b}\n    </universes>")));
        assert!(xml.contains("<lower_left>-10 -10</lower_left>"));
        assert!(xml.contains("<dimension>2 2</dimension>"));
        assert!(xml.contains(&f!("fill=\"{}\"", geometry.universes["L"].id)));
    }

    #[test]
    fn writes_fill_placement() {
        let geometry = translate(&[
            "surf 1 sph 0 0 0 10",
            "surf all inf",
            "cell p pin fuel all",
            "cell c 0 fill pin -1",
            "cell o 0 outside 1",
            "trans U 0 1 2 3",
        ]);
        let xml = geometry.to_xml();
        assert!(xml.contains("translation=\"1 2 3\""));
        assert!(!xml.contains("rotation"));
    }

    #[test]
    fn escapes_attribute_values() {
        assert_eq!(escape("a<b>&\"c\""), "a&lt;b&gt;&amp;&quot;c&quot;");
    }
}
