//! Command line tool to convert Serpent geometry to OpenMC
//!
//! Reads a Serpent 2 geometry input, following any `include` cards, and
//! writes the equivalent OpenMC `geometry.xml`.
//!
//! Cell materials are resolved by name against the materials of an existing
//! OpenMC `materials.xml`, so that the ids line up between the two files.
//!
//! # Usage
//!
//! ```text
//! Usage: sss2omc <geometry> <materials> [options]
//! ```
//!
//! Help is printed with the `-h` flag, and `--help` will show examples, default
//! values, examples, and any important behaviour.
//!
//! ## Options
//!
//! By default the result is written to `geometry.xml` in the current
//! directory, with the root universe taken from the `set root` card.
//!
//! ### > How to change the output file
//!
//! ```bash
//! # Write to a different location
//! sss2omc core.inp materials.xml --output model/geometry.xml
//! ```
//!
//! ### > How to translate only part of a model
//!
//! Any universe can be used as the root, which is handy for checking a single
//! assembly or pin.
//!
//! ```bash
//! # Treat the 'assembly' universe as the root
//! sss2omc core.inp materials.xml --root assembly
//! ```
//!
//! ### > How to inspect the translation
//!
//! The translated structures can also be dumped to JSON.
//!
//! ```bash
//! # Also write geometry.json next to the xml
//! sss2omc core.inp materials.xml --json geometry.json
//! ```
//!

// standard libraries
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

// crate modules
use geoport::csg::{Geometry, MaterialLibrary};
use geoport::readers::GeometryReader;
use geoport::utils::f;
use geoport::{read_openmc_materials, write_geometry};

// external crates
use anyhow::{Context, Result};
use clap::{arg, Parser};
use log::*;

#[doc(hidden)]
fn main() -> Result<()> {
    // set up the command line interface and match arguments
    let cli: Cli = Cli::parse();

    // set up logging (+2 to make 'Info' the default)
    let verbosity = cli.verbose as usize + 2;
    logging_init(verbosity, cli.quiet)?;

    info!("Reading materials from \"{}\"", cli.materials);
    let materials = read_openmc_materials(&cli.materials)?;
    debug!("  - {} materials available", materials.len());

    info!("Translating \"{}\"", cli.geometry);
    let geometry = translate(&cli, materials)?;
    summarise(&geometry);

    info!("Writing \"{}\"", cli.output);
    write_geometry(&geometry, &cli.output)?;

    if let Some(path) = &cli.json {
        info!("Writing \"{path}\"");
        write_json(&geometry, path)?;
    }

    Ok(())
}

/// Convert a Serpent geometry to an OpenMC geometry.xml
///
/// Surfaces, cells, universes, lattices, and transformations are translated
/// from the Serpent input. Files pulled in with `include` cards are read
/// relative to the file that includes them.
///
/// Materials are looked up by name in the OpenMC materials.xml. Any cell
/// referencing a material that is not in the file is an error.
///
/// Composite Serpent surfaces (sqc, rect, hexxc, hexyc, cube, cuboid) become
/// sets of planes, and the surfaces of 'outside' cells take the boundary
/// conditions of the 'set bc' card.
///
/// Examples
/// --------
///
///  Typical use
///     $ sss2omc core.inp materials.xml
///
///  Change the output file
///     $ sss2omc core.inp materials.xml --output model/geometry.xml
///
///  Translate everything below a different root universe
///     $ sss2omc core.inp materials.xml --root assembly
///
///  Also dump the translated structures to JSON
///     $ sss2omc core.inp materials.xml --json geometry.json
///
#[doc(hidden)]
#[derive(Parser)]
#[command(
    verbatim_doc_comment,
    arg_required_else_help(true),
    before_help(banner()),
    after_help("Typical use: sss2omc core.inp materials.xml\n\nNOTE: --help shows more detail and examples"),
    term_width(70),
    hide_possible_values(true),
    override_usage("sss2omc <geometry> <materials> [options]")
)]
struct Cli {
    // * Positional
    /// Path to input Serpent geometry
    #[arg(name = "geometry")]
    geometry: String,

    /// Path to OpenMC materials.xml
    #[arg(name = "materials")]
    materials: String,

    /// Output file ('geometry.xml' default)
    #[arg(help_heading("Output options"))]
    #[arg(short, long)]
    #[arg(value_name = "path")]
    #[arg(default_value = "geometry.xml")]
    output: String,

    /// Also write the translated geometry as JSON
    ///
    /// Every surface, cell, universe, and lattice is written out with both
    /// the Serpent name and the OpenMC id. Useful for tracking down where a
    /// name ended up.
    #[arg(help_heading("Output options"))]
    #[arg(long)]
    #[arg(value_name = "path")]
    json: Option<String>,

    /// Name of the root universe
    ///
    /// Overrides any 'set root' card in the input. Serpent uses universe '0'
    /// when neither is given.
    #[arg(help_heading("Translation options"))]
    #[arg(short, long)]
    #[arg(value_name = "name")]
    root: Option<String>,

    // * Flags
    /// Verbose logging (-v, -vv)
    ///
    /// If specified, the default log level of INFO is increased to DEBUG (-v)
    /// or TRACE (-vv). Errors and Warnings are always logged unless in quiet
    /// (-q) mode.
    #[arg(short, long)]
    #[arg(action = clap::ArgAction::Count)]
    verbose: u8,

    /// Supress all log output (overrules --verbose)
    #[arg(short, long)]
    quiet: bool,
}

/// Sets up logging at runtime to allow for multiple verbosity levels
#[doc(hidden)]
fn logging_init(verbosity: usize, quiet: bool) -> Result<()> {
    stderrlog::new()
        .modules(vec![module_path!(), "geoport"])
        .quiet(quiet)
        .verbosity(verbosity)
        .show_level(false)
        .color(stderrlog::ColorChoice::Never)
        .timestamp(stderrlog::Timestamp::Off)
        .init()
        .context("Failed to initialise logging")
}

/// Creates a banner for the command line
#[doc(hidden)]
fn banner() -> String {
    let mut s = f!("{:-<1$}\n", "", 70);
    s += &f!("{:^70}\n", "Geoport :: Sss2Omc");
    s += &f!("{:-<1$}", "", 70);
    s
}

#[doc(hidden)]
/// Read the geometry with the reader options from the command line
fn translate(cli: &Cli, materials: MaterialLibrary) -> Result<Geometry> {
    let mut reader = GeometryReader::new();
    if let Some(root) = &cli.root {
        reader.set_root(root);
    }
    if cli.quiet {
        reader.disable_progress();
    }

    reader.parse(Path::new(&cli.geometry), materials)
}

#[doc(hidden)]
/// Quick overview of what was translated
fn summarise(geometry: &Geometry) {
    let lattices = geometry
        .universes
        .values()
        .filter(|u| u.lattice.is_some())
        .count();

    info!("  - root universe: {}", geometry.root);
    info!("  - {} surfaces", geometry.surfaces.len());
    info!("  - {} cells", geometry.cells.len());
    info!("  - {} universes", geometry.universes.len() - lattices);
    info!("  - {lattices} lattices");
}

#[doc(hidden)]
/// Pretty printed JSON of the full geometry
fn write_json(geometry: &Geometry, path: &str) -> Result<()> {
    let file = File::create(path).with_context(|| f!("Unable to create {path}"))?;
    trace!("New bufwriter for {path}");
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, geometry)?;
    writer.flush()?;
    Ok(())
}
