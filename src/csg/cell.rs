// internal modules
use crate::csg::region::Region;
use crate::csg::surface::{Surface, SurfaceId};
use crate::csg::{Matrix3, Vector3};

// external crates
use indexmap::IndexMap;
use serde::Serialize;

/// What occupies a cell
///
/// Serpent decides this from the shape of the cell card. Resolved once by the
/// cell builder and carried explicitly from then on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "name")]
pub enum Fill {
    /// Named material from the material library
    Material(String),
    /// Serpent's reserved `void` material
    Void,
    /// Another universe (or lattice) placed inside the cell
    Universe(String),
    /// Outside of the geometry, where particles are killed
    Outside,
}

/// A region of space bound to a fill
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cell {
    pub id: u32,
    pub name: String,
    /// Universe the cell was declared in
    pub universe: String,
    pub fill: Fill,
    /// `None` means the whole of space, for `inf` material cells
    pub region: Option<Region>,
    /// Placement of a filling universe, `x -> R x + t`
    pub translation: Option<[f64; 3]>,
    pub rotation: Option<[[f64; 3]; 3]>,
}

impl Cell {
    pub fn new(id: u32, name: &str, universe: &str, fill: Fill, region: Option<Region>) -> Self {
        Self {
            id,
            name: name.to_string(),
            universe: universe.to_string(),
            fill,
            region,
            translation: None,
            rotation: None,
        }
    }

    /// Shift the placement of the filling universe
    pub fn translate_fill(&mut self, t: [f64; 3]) {
        let current = Vector3::from(self.translation.unwrap_or_default());
        self.translation = Some((current + Vector3::from(t)).into());
    }

    /// Rotate the placement of the filling universe about the origin
    pub fn rotate_fill(&mut self, rotation: &Matrix3) {
        let r = rotation * self.rotation_matrix();
        self.rotation = Some(r.transpose().into());
        if let Some(t) = self.translation {
            self.translation = Some((rotation * Vector3::from(t)).into());
        }
    }

    /// Placement rotation as a matrix, identity if unset
    pub fn rotation_matrix(&self) -> Matrix3 {
        match self.rotation {
            // stored row by row, nalgebra converts from column arrays
            Some(rows) => Matrix3::from(rows).transpose(),
            None => Matrix3::identity(),
        }
    }

    /// Convert a point into the coordinates of the filling universe
    pub fn to_local(&self, point: [f64; 3]) -> [f64; 3] {
        let t = Vector3::from(self.translation.unwrap_or_default());
        (self.rotation_matrix().transpose() * (Vector3::from(point) - t)).into()
    }

    /// Whether the cell region contains the point
    pub fn contains(&self, point: [f64; 3], surfaces: &IndexMap<SurfaceId, Surface>) -> bool {
        match &self.region {
            Some(region) => region.contains(point, surfaces),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    fn quarter_turn() -> Matrix3 {
        *nalgebra::Rotation3::from_axis_angle(&Vector3::z_axis(), FRAC_PI_2).matrix()
    }

    #[test]
    fn rotation_is_stored_row_major() {
        let mut cell = Cell::new(1, "c", "0", Fill::Universe("u".into()), None);
        cell.rotate_fill(&quarter_turn());
        let rows = cell.rotation.unwrap();
        assert_relative_eq!(rows[0][1], -1.0, epsilon = 1e-12);
        assert_relative_eq!(rows[1][0], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn placement_order_matters() {
        // translate then rotate moves the offset with the rotation
        let mut cell = Cell::new(1, "c", "0", Fill::Universe("u".into()), None);
        cell.translate_fill([1.0, 0.0, 0.0]);
        cell.rotate_fill(&quarter_turn());
        let t = cell.translation.unwrap();
        assert_relative_eq!(t[0], 0.0, epsilon = 1e-12);
        assert_relative_eq!(t[1], 1.0, epsilon = 1e-12);

        // rotate then translate leaves it alone
        let mut cell = Cell::new(1, "c", "0", Fill::Universe("u".into()), None);
        cell.rotate_fill(&quarter_turn());
        cell.translate_fill([1.0, 0.0, 0.0]);
        assert_eq!(cell.translation, Some([1.0, 0.0, 0.0]));
    }

    #[test]
    fn local_coordinates_undo_placement() {
        let mut cell = Cell::new(1, "c", "0", Fill::Universe("u".into()), None);
        cell.rotate_fill(&quarter_turn());
        cell.translate_fill([10.0, 0.0, 0.0]);
        // local (1, 0, 0) sits at global (10, 1, 0)
        let local = cell.to_local([10.0, 1.0, 0.0]);
        assert_relative_eq!(local[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(local[1], 0.0, epsilon = 1e-12);
    }
}
