// internal modules
use crate::csg::{
    BoundaryType, Cell, Geometry, MaterialLibrary, Surface, SurfaceId, SurfaceKind, Universe,
};
use crate::error::{Entity, Error, Result};
use crate::translate::surface::CompositeSurface;
use crate::utils::*;

// standard library
use std::collections::{HashMap, HashSet};

// external crates
use indexmap::IndexMap;
use log::{trace, warn};

/// What a Serpent surface name resolves to
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEntry {
    /// Single surface in the surface table
    Primitive(SurfaceId),
    /// Several surfaces whose intersection is the inside
    Composite(CompositeSurface),
    /// The `inf` sentinel, all of space
    Infinite,
}

/// All state built up while translating one geometry
///
/// Every builder takes this by `&mut`, nothing is global. Names are unique
/// within each namespace while ids are allocated on registration.
#[derive(Debug, Clone)]
pub struct TranslationContext {
    entries: IndexMap<String, SurfaceEntry>,
    pub(crate) surfaces: IndexMap<SurfaceId, Surface>,
    pub(crate) cells: IndexMap<String, Cell>,
    pub(crate) universes: IndexMap<String, Universe>,
    pub(crate) materials: MaterialLibrary,
    pub(crate) boundaries: Vec<BoundaryType>,
    pub(crate) root: String,
    cell_ids: HashSet<u32>,
    universe_ids: HashSet<u32>,
    /// Surface copies made for a transformed cell, and the cell that owns them
    cell_clones: HashMap<SurfaceId, String>,
}

impl TranslationContext {
    /// Empty context resolving cell materials against `materials`
    pub fn new(materials: MaterialLibrary) -> Self {
        Self {
            entries: IndexMap::new(),
            surfaces: IndexMap::new(),
            cells: IndexMap::new(),
            universes: IndexMap::new(),
            materials,
            boundaries: vec![BoundaryType::Vacuum],
            root: "0".to_string(),
            cell_ids: HashSet::new(),
            universe_ids: HashSet::new(),
            cell_clones: HashMap::new(),
        }
    }

    /// Name of the root universe
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Boundary types from `set bc`, vacuum if none were given
    pub fn boundaries(&self) -> &[BoundaryType] {
        &self.boundaries
    }

    pub fn surface_entry(&self, name: &str) -> Option<&SurfaceEntry> {
        self.entries.get(name)
    }

    /// Primitive surface registered under a Serpent name
    pub fn surface(&self, name: &str) -> Option<&Surface> {
        match self.entries.get(name)? {
            SurfaceEntry::Primitive(id) => self.surfaces.get(id),
            _ => None,
        }
    }

    pub fn surfaces(&self) -> &IndexMap<SurfaceId, Surface> {
        &self.surfaces
    }

    pub fn cell(&self, name: &str) -> Option<&Cell> {
        self.cells.get(name)
    }

    pub fn universe(&self, name: &str) -> Option<&Universe> {
        self.universes.get(name)
    }

    /// Surface ids a name stands for, every face of a composite
    pub(crate) fn surface_ids_of(&self, name: &str) -> Vec<SurfaceId> {
        match self.entries.get(name) {
            Some(SurfaceEntry::Primitive(id)) => vec![*id],
            Some(SurfaceEntry::Composite(composite)) => composite.faces(),
            _ => Vec::new(),
        }
    }

    /// Fail if the Serpent surface name is already taken
    pub(crate) fn check_surface_name(&self, name: &str) -> Result<()> {
        match self.entries.contains_key(name) {
            true => Err(Error::DuplicateName {
                entity: Entity::Surface,
                name: name.to_string(),
            }),
            false => Ok(()),
        }
    }

    /// Bind a Serpent surface name to its entry
    pub(crate) fn add_surface_entry(&mut self, name: &str, entry: SurfaceEntry) -> Result<()> {
        self.check_surface_name(name)?;
        trace!("Surface {name} -> {entry:?}");
        self.entries.insert(name.to_string(), entry);
        Ok(())
    }

    /// Add a primitive surface to the surface table under a fresh id
    pub(crate) fn register_surface(&mut self, name: &str, kind: SurfaceKind) -> SurfaceId {
        let id = allocate_id(name, |id| self.surfaces.contains_key(&id));
        self.surfaces.insert(id, Surface::new(id, name, kind));
        id
    }

    /// Copy an existing surface under a fresh id, returning the new id
    pub(crate) fn clone_surface(&mut self, id: SurfaceId) -> Option<SurfaceId> {
        let mut surface = self.surfaces.get(&id)?.clone();
        let name = f!("{}_{}", surface.name, self.surfaces.len());
        surface.id = allocate_id(&name, |id| self.surfaces.contains_key(&id));
        surface.name = name;
        let new_id = surface.id;
        self.surfaces.insert(new_id, surface);
        Some(new_id)
    }

    /// Copy a surface for the sole use of one cell
    pub(crate) fn clone_surface_for_cell(&mut self, id: SurfaceId, cell: &str) -> Option<SurfaceId> {
        let copy = self.clone_surface(id)?;
        self.cell_clones.insert(copy, cell.to_string());
        Some(copy)
    }

    /// Whether a surface is a copy already owned by the cell
    pub(crate) fn owns_clone(&self, cell: &str, id: SurfaceId) -> bool {
        self.cell_clones.get(&id).is_some_and(|owner| owner == cell)
    }

    /// Fresh cell id for a cell name
    pub(crate) fn allocate_cell_id(&mut self, name: &str) -> u32 {
        let id = allocate_id(name, |id| self.cell_ids.contains(&id));
        self.cell_ids.insert(id);
        id
    }

    /// Universe of a name, created empty if it has not been seen yet
    pub fn get_or_create_universe(&mut self, name: &str) -> &mut Universe {
        let ids = &mut self.universe_ids;
        self.universes.entry(name.to_string()).or_insert_with(|| {
            let id = allocate_id(name, |id| ids.contains(&id));
            ids.insert(id);
            trace!("Created universe {name} with id {id}");
            Universe::new(id, name)
        })
    }

    /// Add a cell name to a universe, creating the universe if needed
    pub fn add_cell_name_to_universe(&mut self, universe: &str, cell: &str) {
        self.get_or_create_universe(universe)
            .cells
            .push(cell.to_string());
    }

    /// Add a finished cell, its universe membership included
    pub(crate) fn add_cell(&mut self, cell: Cell) -> Result<()> {
        if self.cells.contains_key(&cell.name) {
            return Err(Error::DuplicateName {
                entity: Entity::Cell,
                name: cell.name,
            });
        }
        // a universe holds either cells or a lattice
        if self
            .universes
            .get(&cell.universe)
            .is_some_and(|u| u.lattice.is_some())
        {
            return Err(Error::DuplicateName {
                entity: Entity::Universe,
                name: cell.universe,
            });
        }
        self.add_cell_name_to_universe(&cell.universe, &cell.name);
        self.cells.insert(cell.name.clone(), cell);
        Ok(())
    }

    /// Final geometry, checked for dangling references
    pub fn into_geometry(self) -> Result<Geometry> {
        for universe in self.universes.values().filter(|u| u.is_placeholder()) {
            warn!("Universe {} is referenced but never declared", universe.name);
        }

        let geometry = Geometry {
            root: self.root,
            surfaces: self.surfaces,
            cells: self.cells,
            universes: self.universes,
            materials: self.materials,
        };
        geometry.validate()?;
        Ok(geometry)
    }
}

/// First free id at or after the stable id of a name
fn allocate_id(name: &str, taken: impl Fn(u32) -> bool) -> u32 {
    let mut id = stable_id(name).max(1);
    while taken(id) {
        id = id % MAX_ID + 1;
    }
    id
}
