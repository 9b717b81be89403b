// internal modules
use crate::csg::{BoundaryType, Surface};
use crate::error::{Entity, Error, Result};
use crate::readers::parsers;
use crate::translate::card::Card;
use crate::translate::context::TranslationContext;

// external crates
use log::debug;

/// Boundary types for the tokens of a `set bc` card
///
/// ```rust
/// # use geoport::csg::BoundaryType;
/// # use geoport::translate::boundary_types;
/// let types = boundary_types(&["2", "black"]).unwrap();
/// assert_eq!(types, vec![BoundaryType::Reflective, BoundaryType::Vacuum]);
/// ```
pub fn boundary_types(tokens: &[&str]) -> Result<Vec<BoundaryType>> {
    if tokens.len() > 3 {
        return Err(Error::TooManyBoundaryConditions(tokens.len()));
    }

    tokens
        .iter()
        .map(|token| match *token {
            "1" | "black" => Ok(BoundaryType::Vacuum),
            "2" | "reflective" => Ok(BoundaryType::Reflective),
            "3" | "periodic" => Ok(BoundaryType::Periodic),
            other => Err(Error::InvalidBoundaryType(other.to_string())),
        })
        .collect()
}

/// Boundary type an outside cell gives one of its surfaces
///
/// A single entry applies everywhere. Otherwise the entries are per axis and
/// only axis planes pick their own, every other surface takes the first.
pub(crate) fn boundary_for(surface: &Surface, boundaries: &[BoundaryType]) -> BoundaryType {
    let first = boundaries.first().copied().unwrap_or(BoundaryType::Vacuum);
    match boundaries.len() {
        0 | 1 => first,
        _ => surface
            .plane_axis()
            .and_then(|axis| boundaries.get(axis).copied())
            .unwrap_or(first),
    }
}

/// Handler for `set bc` cards
pub(crate) fn set_boundaries(ctx: &mut TranslationContext, card: &Card) -> Result<()> {
    let (_, tokens) = parsers::boundary_card(&card.text)
        .map_err(|_| Error::InvalidBoundaryType(card.text.clone()))?;
    ctx.boundaries = boundary_types(&tokens)?;
    debug!("Boundary conditions {:?}", ctx.boundaries);
    Ok(())
}

/// Handler for `set root` cards
pub(crate) fn set_root(ctx: &mut TranslationContext, card: &Card) -> Result<()> {
    let (_, root) =
        parsers::root_card(&card.text).map_err(|_| Error::UnresolvedReference {
            entity: Entity::Universe,
            name: card.text.clone(),
        })?;
    ctx.root = root.to_string();
    debug!("Root universe {root}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csg::SurfaceKind;
    use rstest::rstest;

    #[rstest]
    #[case(&["1"], vec![BoundaryType::Vacuum])]
    #[case(&["reflective", "3"], vec![BoundaryType::Reflective, BoundaryType::Periodic])]
    #[case(&["2", "2", "1"], vec![BoundaryType::Reflective, BoundaryType::Reflective, BoundaryType::Vacuum])]
    fn maps_tokens(#[case] tokens: &[&str], #[case] expected: Vec<BoundaryType>) {
        assert_eq!(boundary_types(tokens).unwrap(), expected);
    }

    #[test]
    fn rejects_bad_tokens() {
        assert!(matches!(
            boundary_types(&["white"]),
            Err(Error::InvalidBoundaryType(t)) if t == "white"
        ));
        assert!(matches!(
            boundary_types(&["1", "1", "1", "1"]),
            Err(Error::TooManyBoundaryConditions(4))
        ));
    }

    #[rstest]
    #[case(SurfaceKind::XPlane { x0: 0.0 }, BoundaryType::Reflective)]
    #[case(SurfaceKind::YPlane { y0: 0.0 }, BoundaryType::Periodic)]
    #[case(SurfaceKind::ZPlane { z0: 0.0 }, BoundaryType::Vacuum)]
    #[case(SurfaceKind::Sphere { x0: 0.0, y0: 0.0, z0: 0.0, r: 1.0 }, BoundaryType::Reflective)]
    fn per_axis_boundaries(#[case] kind: SurfaceKind, #[case] expected: BoundaryType) {
        let surface = Surface::new(1, "s", kind);
        let boundaries = [
            BoundaryType::Reflective,
            BoundaryType::Periodic,
            BoundaryType::Vacuum,
        ];
        assert_eq!(boundary_for(&surface, &boundaries), expected);
        assert_eq!(boundary_for(&surface, &boundaries[2..]), BoundaryType::Vacuum);
    }

    #[test]
    fn two_entries_leave_z_planes_on_the_first() {
        let surface = Surface::new(1, "s", SurfaceKind::ZPlane { z0: 0.0 });
        let boundaries = [BoundaryType::Periodic, BoundaryType::Reflective];
        assert_eq!(boundary_for(&surface, &boundaries), BoundaryType::Periodic);
    }
}
