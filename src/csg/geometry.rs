// internal modules
use crate::csg::cell::{Cell, Fill};
use crate::csg::material::MaterialLibrary;
use crate::csg::surface::{Surface, SurfaceId};
use crate::csg::universe::Universe;
use crate::error::{Entity, Error, Result};
use crate::utils::*;

// external crates
use indexmap::IndexMap;
use log::trace;
use serde::Serialize;

/// Universe nesting deeper than this is treated as a cycle
const MAX_DEPTH: usize = 64;

/// Complete translated geometry
///
/// Owns every surface, cell, and universe produced by a translation, plus the
/// materials the cells were resolved against. The root universe is the one
/// named by the `set root` card, `0` by default.
#[derive(Debug, Clone, Serialize)]
pub struct Geometry {
    pub root: String,
    pub surfaces: IndexMap<SurfaceId, Surface>,
    pub cells: IndexMap<String, Cell>,
    pub universes: IndexMap<String, Universe>,
    pub materials: MaterialLibrary,
}

impl Geometry {
    /// The universe everything else hangs off
    pub fn root_universe(&self) -> Option<&Universe> {
        self.universes.get(&self.root)
    }

    /// Check every reference in the object graph resolves
    ///
    /// The translator only produces valid geometries, but anything built or
    /// modified by hand should be checked before export.
    pub fn validate(&self) -> Result<()> {
        let unresolved = |entity, name: String| Error::UnresolvedReference { entity, name };

        if self.root_universe().is_none() {
            return Err(unresolved(Entity::Universe, self.root.clone()));
        }

        for cell in self.cells.values() {
            trace!("Validating cell {}", cell.name);
            if !self.universes.contains_key(&cell.universe) {
                return Err(unresolved(Entity::Universe, cell.universe.clone()));
            }

            match &cell.fill {
                Fill::Material(name) if !self.materials.contains(name) => {
                    return Err(unresolved(Entity::Material, name.clone()))
                }
                Fill::Universe(name) if !self.universes.contains_key(name) => {
                    return Err(unresolved(Entity::Universe, name.clone()))
                }
                _ => (),
            }

            if let Some(region) = &cell.region {
                if let Some(id) = region
                    .surface_ids()
                    .into_iter()
                    .find(|id| !self.surfaces.contains_key(id))
                {
                    return Err(unresolved(Entity::Surface, f!("id {id} in cell {}", cell.name)));
                }
            }
        }

        for universe in self.universes.values() {
            let Some(lattice) = &universe.lattice else {
                continue;
            };
            if let Some(name) = lattice
                .universes
                .iter()
                .flatten()
                .find(|name| !self.universes.contains_key(name.as_str()))
            {
                return Err(unresolved(Entity::Universe, name.clone()));
            }
        }

        Ok(())
    }

    /// Deepest cell containing a global point
    ///
    /// Walks down from the root universe through universe fills and lattices,
    /// converting the point into local coordinates at each level.
    pub fn find_cell(&self, point: [f64; 3]) -> Option<&Cell> {
        let mut universe = self.root_universe()?;
        let mut point = point;

        for _ in 0..MAX_DEPTH {
            if let Some(lattice) = &universe.lattice {
                let element = lattice.element_at(point)?;
                point = lattice.to_local(point);
                universe = self.universes.get(lattice.universe(element)?)?;
                continue;
            }

            let cell = universe
                .cells
                .iter()
                .filter_map(|name| self.cells.get(name))
                .find(|cell| cell.contains(point, &self.surfaces))?;

            match &cell.fill {
                Fill::Universe(name) => {
                    point = cell.to_local(point);
                    universe = self.universes.get(name)?;
                }
                _ => return Some(cell),
            }
        }

        None
    }

    /// Cells whose fill is a given material
    pub fn cells_with_material<'a>(&'a self, material: &'a str) -> impl Iterator<Item = &'a Cell> {
        self.cells
            .values()
            .filter(move |c| matches!(&c.fill, Fill::Material(m) if m == material))
    }
}
