// internal modules
use crate::csg::{Material, MaterialLibrary};
use crate::readers::parsers;
use crate::utils::*;

// standard library
use std::path::Path;

// external crates
use anyhow::{anyhow, Context, Result};
use log::{debug, trace};

/// Reader for the material identities in an OpenMC `materials.xml`
///
/// Only the `id` and `name` attributes of each `<material>` element are
/// kept. A material without a name is known by its id.
#[derive(Debug, Default)]
pub struct MaterialsReader {
    library: MaterialLibrary,
}

impl MaterialsReader {
    /// Just calls Default::default(), nothing special to be initialised
    pub fn new() -> Self {
        Default::default()
    }

    /// Collect every material of the file
    pub fn parse(&mut self, path: &Path) -> Result<MaterialLibrary> {
        let content = std::fs::read_to_string(path)
            .with_context(|| f!("Could not open {}", path.display()))?;
        self.parse_str(&content)
            .with_context(|| f!("Failed to read materials from {}", path.display()))?;
        debug!("Found {} materials in {}", self.library.len(), path.display());
        Ok(std::mem::take(&mut self.library))
    }

    /// Collect every material element of an XML document
    fn parse_str(&mut self, content: &str) -> Result<()> {
        const TAG: &str = "<material";

        let mut rest = content;
        while let Some(start) = rest.find(TAG) {
            rest = &rest[start..];
            match parsers::xml_element_attributes("material", rest) {
                Ok((remaining, attributes)) => {
                    self.add_material(&attributes)?;
                    rest = remaining;
                }
                // <materials> and friends
                Err(_) => rest = &rest[TAG.len()..],
            }
        }
        Ok(())
    }

    fn add_material(&mut self, attributes: &[(&str, &str)]) -> Result<()> {
        let value = |key: &str| attributes.iter().find(|(k, _)| *k == key).map(|(_, v)| *v);

        let id = value("id").ok_or_else(|| anyhow!("Material without an id"))?;
        let id: u32 = id
            .trim()
            .parse()
            .map_err(|_| anyhow!("Failed to parse material id \"{id}\""))?;
        let name = value("name").unwrap_or_default().trim();
        let name = match name.is_empty() {
            true => id.to_string(),
            false => name.to_string(),
        };

        trace!("Material {name} with id {id}");
        self.library.insert(Material::new(id, &name));
        Ok(())
    }
}
