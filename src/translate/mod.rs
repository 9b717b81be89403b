//! Serpent cards to OpenMC constructive solid geometry
//!
//! # Overview
//!
//! Translation happens in two steps. First every line is classified into a
//! [Card] of some [CardKind], with comments dropped and multi-line lattices
//! joined. Then the cards are handed to their builders in phases, so that a
//! card never has to come after the things it refers to in the file:
//!
//! | Phase | Cards                                   |
//! | ----- | --------------------------------------- |
//! | 0     | `set bc`, `set root`                    |
//! | 1     | `surf`                                  |
//! | 2     | `cell` and `lat`, in file order         |
//! | 3     | `trans`, in file order                  |
//!
//! All state lives in a single [TranslationContext] and the first error
//! aborts the translation.
//!
//! ```rust
//! # use geoport::csg::{Fill, MaterialLibrary};
//! # use geoport::translate::translate_lines;
//! let lines = [
//!     "cell 1 0 fuel -pin",
//!     "cell 2 0 outside pin",
//!     "surf pin cyl 0.0 0.0 0.4",
//! ];
//! let geometry = translate_lines(&lines, MaterialLibrary::from_names(["fuel"])).unwrap();
//!
//! let cell = geometry.find_cell([0.1, 0.0, 0.0]).unwrap();
//! assert_eq!(cell.fill, Fill::Material("fuel".into()));
//! ```

// Split into subfiles for development, but anything important is re-exported
mod boundary;
mod card;
mod cell;
mod context;
mod lattice;
mod surface;
mod transform;

#[doc(inline)]
pub use crate::translate::boundary::boundary_types;

#[doc(inline)]
pub use crate::translate::card::{classify, Card, CardKind};

#[doc(inline)]
pub use crate::translate::context::{SurfaceEntry, TranslationContext};

#[doc(inline)]
pub use crate::translate::surface::{
    plane_from_points, CompositeSurface, CuboidFaces, HexOrientation, HexPrismFaces,
    RectPrismFaces,
};

#[doc(inline)]
pub use crate::translate::transform::{Rotation, TransformOp, TransformTarget, Transformation};

// internal modules
use crate::csg::{Geometry, MaterialLibrary};
use crate::error::Result;

// external crates
use log::{debug, trace};

/// Signature shared by every card builder
type Handler = fn(&mut TranslationContext, &Card) -> Result<()>;

/// Number of dispatch phases
const PHASES: usize = 4;

/// Phase and builder for a kind of card
fn dispatch(kind: CardKind) -> Option<(usize, Handler)> {
    match kind {
        CardKind::BoundaryCondition => Some((0, boundary::set_boundaries as Handler)),
        CardKind::Root => Some((0, boundary::set_root as Handler)),
        CardKind::Surface => Some((1, surface::build_surface as Handler)),
        CardKind::CellMaterial | CardKind::CellFill | CardKind::CellOutside => {
            Some((2, cell::build_cell as Handler))
        }
        CardKind::Lattice => Some((2, lattice::build_lattice as Handler)),
        CardKind::Transformation => Some((3, transform::apply_transformation as Handler)),
        CardKind::Unrecognized => None,
    }
}

/// Run every card through its builder, phase by phase
///
/// Errors are tagged with the line of the card that caused them.
pub fn translate_cards(ctx: &mut TranslationContext, cards: &[Card]) -> Result<()> {
    for phase in 0..PHASES {
        for card in cards {
            let Some((card_phase, handler)) = dispatch(card.kind) else {
                continue;
            };
            if card_phase != phase {
                continue;
            }
            trace!("Line {}: {:?}", card.line, card.kind);
            handler(ctx, card).map_err(|e| e.at_line(card.line))?;
        }
    }
    Ok(())
}

/// Translate the lines of a Serpent geometry
///
/// `materials` holds every material a cell card may name. The result has
/// been checked for dangling references.
pub fn translate_lines<S: AsRef<str>>(lines: &[S], materials: MaterialLibrary) -> Result<Geometry> {
    let cards = classify(lines);
    debug!("Classified {} lines into {} cards", lines.len(), cards.len());

    let mut ctx = TranslationContext::new(materials);
    translate_cards(&mut ctx, &cards)?;
    ctx.into_geometry()
}
