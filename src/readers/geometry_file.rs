// internal modules
use crate::csg::{Geometry, MaterialLibrary};
use crate::readers::parsers;
use crate::translate::translate_lines;
use crate::utils::*;

// standard library
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

// external crates
use anyhow::{anyhow, bail, Context, Result};
use kdam::{Bar, BarBuilder, BarExt};
use log::{debug, info, trace};

/// Reader for Serpent geometry input files
///
/// Collects every line of the input, following `include` cards relative to
/// the file that contains them, then translates the lot into a [Geometry].
///
/// Example:
/// ```ignore
///     let mut reader = GeometryReader::new();
///     reader.set_root("core");
///     let geometry = reader.parse(Path::new("core.inp"), materials).unwrap();
/// ```
#[derive(Debug)]
pub struct GeometryReader {
    /// Lines of the input with includes expanded in place
    lines: Vec<String>,
    /// Root universe overriding any `set root` card
    root: Option<String>,
    /// Files currently being read, to catch circular includes
    include_stack: Vec<PathBuf>,
    /// Disable progress bar?
    disable_progress: bool,
}

impl Default for GeometryReader {
    fn default() -> Self {
        Self {
            lines: Vec::new(),
            root: None,
            include_stack: Vec::new(),
            disable_progress: false,
        }
    }
}

impl GeometryReader {
    /// Just calls Default::default(), nothing special to be initialised
    pub fn new() -> Self {
        Default::default()
    }

    /// Read and translate a geometry, resolving cell materials in `materials`
    pub fn parse(&mut self, path: &Path, materials: MaterialLibrary) -> Result<Geometry> {
        let mut progress_bar = self.init_progress_bar()?;
        if !self.disable_progress {
            progress_bar.refresh()?;
        };

        self.read_lines(path, &mut progress_bar)?;
        info!("Read {} lines from {}", self.lines.len(), path.display());

        let mut lines = std::mem::take(&mut self.lines);
        if let Some(root) = &self.root {
            debug!("Root universe set to {root}");
            lines.push(f!("set root {root}"));
        }

        translate_lines(&lines, materials)
            .with_context(|| f!("Failed to translate {}", path.display()))
    }

    /// Use a different root universe to the one in the file
    pub fn set_root(&mut self, root: &str) {
        self.root = Some(root.to_string());
    }

    /// Do not print the tqdm progress indicators
    pub fn disable_progress(&mut self) {
        debug!("Progress bar disabled");
        self.disable_progress = true;
    }

    /// Collect the lines of a file, expanding any includes
    fn read_lines(&mut self, path: &Path, progress_bar: &mut Bar) -> Result<()> {
        let canonical = path
            .canonicalize()
            .with_context(|| f!("Could not open {}", path.display()))?;
        if self.include_stack.contains(&canonical) {
            bail!("{} includes itself", path.display());
        }
        self.include_stack.push(canonical);

        let file = File::open(path).with_context(|| f!("Could not open {}", path.display()))?;
        let reader = BufReader::new(file);
        debug!("Reading {}", path.display());

        for line in reader.lines() {
            progress_bar.update(1)?;
            let line = line?;

            let include = parsers::include_path(parsers::strip_comment(&line))
                .ok()
                .map(|(_, include)| PathBuf::from(include));

            match include {
                Some(include) => {
                    let include = match path.parent() {
                        Some(dir) => dir.join(include),
                        None => include,
                    };
                    trace!("Including {}", include.display());
                    self.read_lines(&include, progress_bar)
                        .with_context(|| f!("Failed to include from {}", path.display()))?;
                }
                None => self.lines.push(line),
            }
        }

        self.include_stack.pop();
        Ok(())
    }

    /// Initialise the progress bar, if wanted
    fn init_progress_bar(&self) -> Result<Bar> {
        BarBuilder::default()
            .delay(0.0)
            .unit(" lines")
            .unit_scale(true)
            .disable(self.disable_progress)
            .build()
            .map_err(|e| anyhow!("Could not create progress bar: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csg::Fill;
    use std::fs;

    /// Scratch directory unique to a test
    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(f!("geoport-{name}-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn follows_includes() {
        let dir = scratch("include");
        fs::write(dir.join("surfaces.inp"), "surf pin cyl 0 0 1\n").unwrap();
        fs::write(
            dir.join("main.inp"),
            "include \"surfaces.inp\"\ncell 1 core fuel -pin\ncell 2 core outside pin\n",
        )
        .unwrap();

        let mut reader = GeometryReader::new();
        reader.disable_progress();
        reader.set_root("core");
        let geometry = reader
            .parse(&dir.join("main.inp"), MaterialLibrary::from_names(["fuel"]))
            .unwrap();

        assert_eq!(geometry.root, "core");
        assert_eq!(geometry.surfaces.len(), 1);
        let cell = geometry.find_cell([0.0, 0.0, 0.0]).unwrap();
        assert_eq!(cell.fill, Fill::Material("fuel".into()));
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn rejects_circular_includes() {
        let dir = scratch("circular");
        fs::write(dir.join("a.inp"), "include \"b.inp\"\n").unwrap();
        fs::write(dir.join("b.inp"), "include \"a.inp\"\n").unwrap();

        let mut reader = GeometryReader::new();
        reader.disable_progress();
        let result = reader.parse(&dir.join("a.inp"), MaterialLibrary::new());
        assert!(result.is_err());
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn missing_file_is_an_error() {
        let mut reader = GeometryReader::new();
        reader.disable_progress();
        let result = reader.parse(Path::new("does/not/exist.inp"), MaterialLibrary::new());
        assert!(result.is_err());
    }
}
