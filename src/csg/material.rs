// internal modules
use crate::utils::stable_id;

// external crates
use indexmap::IndexMap;
use serde::Serialize;

/// Resolved material, only the identity matters to the geometry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Material {
    pub id: u32,
    pub name: String,
}

impl Material {
    pub fn new(id: u32, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
        }
    }
}

/// Materials available to cell cards, keyed by name
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MaterialLibrary {
    materials: IndexMap<String, Material>,
}

impl MaterialLibrary {
    pub fn new() -> Self {
        Default::default()
    }

    /// Library from bare names, ids derived with [stable_id]
    ///
    /// ```rust
    /// # use geoport::csg::MaterialLibrary;
    /// let library = MaterialLibrary::from_names(["fuel", "10"]);
    /// assert_eq!(library.get("10").unwrap().id, 10);
    /// ```
    pub fn from_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let mut library = Self::new();
        for name in names {
            library.insert(Material::new(stable_id(name), name));
        }
        library
    }

    /// Add a material, replacing any with the same name
    pub fn insert(&mut self, material: Material) {
        self.materials.insert(material.name.clone(), material);
    }

    pub fn get(&self, name: &str) -> Option<&Material> {
        self.materials.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.materials.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Material> {
        self.materials.values()
    }
}

impl FromIterator<Material> for MaterialLibrary {
    fn from_iter<I: IntoIterator<Item = Material>>(iter: I) -> Self {
        let mut library = Self::new();
        iter.into_iter().for_each(|m| library.insert(m));
        library
    }
}
