// internal modules
use crate::csg::{Cell, Fill, Region};
use crate::error::{Entity, Error, Result};
use crate::readers::parsers::{self, CellFillSpec, ExpressionToken};
use crate::translate::boundary::boundary_for;
use crate::translate::card::Card;
use crate::translate::context::{SurfaceEntry, TranslationContext};
use crate::utils::*;

// external crates
use log::{debug, trace};

/// Serpent's reserved name for an empty material
const VOID: &str = "void";

/// Handler for all three kinds of `cell` card
///
/// The fill is resolved before anything is registered, so a cell with an
/// unknown material leaves the context untouched.
pub(crate) fn build_cell(ctx: &mut TranslationContext, card: &Card) -> Result<()> {
    let (_, head) = parsers::cell_card(&card.text)
        .map_err(|_| Error::ErroneousCellCard(card.text.clone()))?;

    let fill = resolve_fill(ctx, &head.name, &head.universe, head.fill)?;

    if ctx.cells.contains_key(&head.name) {
        return Err(Error::DuplicateName {
            entity: Entity::Cell,
            name: head.name,
        });
    }

    let (_, tokens) = parsers::cell_expression(&head.expression).map_err(|_| {
        Error::ErroneousCellCard(f!(
            "cannot read the surfaces of cell {}: \"{}\"",
            head.name,
            head.expression
        ))
    })?;

    if tokens.is_empty() {
        return Err(Error::ErroneousCellCard(f!("cell {} has no surfaces", head.name)));
    }

    let region = match (is_whole_space(ctx, &tokens), &fill) {
        (true, Fill::Outside) => {
            return Err(Error::ErroneousCellCard(f!(
                "outside cell {} cannot cover all of space",
                head.name
            )))
        }
        (true, _) => None,
        (false, fill) => {
            if *fill == Fill::Outside {
                assign_boundaries(ctx, &tokens);
            }
            let expression = substitute(ctx, &head.name, &tokens)?;
            trace!("Cell {} region \"{}\"", head.name, expression);
            Some(Region::from_expression(&expression)?)
        }
    };

    if let Fill::Universe(name) = &fill {
        ctx.get_or_create_universe(name);
    }

    debug!("Cell {} in universe {} filled with {:?}", head.name, head.universe, fill);
    let id = ctx.allocate_cell_id(&head.name);
    ctx.add_cell(Cell::new(id, &head.name, &head.universe, fill, region))
}

/// Typed fill of a cell, checked against what is already known
fn resolve_fill(
    ctx: &TranslationContext,
    cell: &str,
    universe: &str,
    spec: CellFillSpec,
) -> Result<Fill> {
    match spec {
        CellFillSpec::Material(name) if name == VOID => Ok(Fill::Void),
        CellFillSpec::Material(name) => match ctx.materials.contains(&name) {
            true => Ok(Fill::Material(name)),
            false => Err(Error::UnresolvedReference {
                entity: Entity::Material,
                name,
            }),
        },
        CellFillSpec::Universe(name) if name == ctx.root || name == universe => {
            Err(Error::ErroneousCellCard(f!(
                "cell {cell} in universe {universe} cannot be filled with universe {name}"
            )))
        }
        CellFillSpec::Universe(name) => Ok(Fill::Universe(name)),
        CellFillSpec::Outside => Ok(Fill::Outside),
    }
}

/// Expression is nothing but the `inf` surface
fn is_whole_space(ctx: &TranslationContext, tokens: &[ExpressionToken]) -> bool {
    match tokens {
        [ExpressionToken::Surface { name, .. }] => {
            matches!(ctx.surface_entry(name), Some(SurfaceEntry::Infinite))
        }
        _ => false,
    }
}

/// Give every surface bounding an outside cell its boundary type
fn assign_boundaries(ctx: &mut TranslationContext, tokens: &[ExpressionToken]) {
    let boundaries = ctx.boundaries.clone();
    for token in tokens {
        let ExpressionToken::Surface { name, .. } = token else {
            continue;
        };
        for id in ctx.surface_ids_of(name) {
            if let Some(surface) = ctx.surfaces.get_mut(&id) {
                surface.boundary = boundary_for(surface, &boundaries);
                trace!("Surface {} is {}", surface.name, surface.boundary);
            }
        }
    }
}

/// Rewrite a Serpent surface expression in terms of surface ids
///
/// Composite names expand to their inside half-spaces, negated when the
/// outside is asked for.
fn substitute(ctx: &TranslationContext, cell: &str, tokens: &[ExpressionToken]) -> Result<String> {
    let mut parts = Vec::with_capacity(tokens.len());
    for token in tokens {
        let part = match *token {
            ExpressionToken::Open => "(".to_string(),
            ExpressionToken::Close => ")".to_string(),
            ExpressionToken::Union => "|".to_string(),
            ExpressionToken::Complement => "~".to_string(),
            ExpressionToken::Surface { negative, name } => match ctx.surface_entry(name) {
                Some(SurfaceEntry::Primitive(id)) => match negative {
                    true => f!("-{id}"),
                    false => f!("+{id}"),
                },
                Some(SurfaceEntry::Composite(composite)) => match negative {
                    true => f!("({})", composite.region()),
                    false => f!("~({})", composite.region()),
                },
                Some(SurfaceEntry::Infinite) => {
                    return Err(Error::ErroneousCellCard(f!(
                        "cell {cell} uses inf alongside other surfaces"
                    )))
                }
                None => {
                    return Err(Error::UnresolvedReference {
                        entity: Entity::Surface,
                        name: name.to_string(),
                    })
                }
            },
        };
        parts.push(part);
    }
    Ok(parts.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csg::{BoundaryType, MaterialLibrary};
    use crate::translate::boundary::set_boundaries;
    use crate::translate::card::{classify, CardKind};
    use crate::translate::surface::build_surface;
    use rstest::rstest;

    /// Surfaces first, then everything else in order
    fn build(lines: &[&str]) -> Result<TranslationContext> {
        let materials = MaterialLibrary::from_names(["M1", "fuel", "water"]);
        let mut ctx = TranslationContext::new(materials);
        let cards = classify(lines);
        for card in cards.iter().filter(|c| c.kind == CardKind::BoundaryCondition) {
            set_boundaries(&mut ctx, card)?;
        }
        for card in cards.iter().filter(|c| c.kind == CardKind::Surface) {
            build_surface(&mut ctx, card)?;
        }
        for card in cards.iter().filter(|c| c.kind.is_cell()) {
            build_cell(&mut ctx, card)?;
        }
        Ok(ctx)
    }

    #[test]
    fn material_cell_intersection() {
        let ctx = build(&["surf S1 sph 0 0 0 1", "surf S2 px 0", "cell C1 U1 M1 -S1 S2"]).unwrap();
        let cell = ctx.cell("C1").unwrap();
        let s1 = ctx.surface("S1").unwrap().id;
        let s2 = ctx.surface("S2").unwrap().id;
        assert_eq!(cell.fill, Fill::Material("M1".into()));
        assert_eq!(cell.universe, "U1");
        assert_eq!(
            cell.region,
            Some(Region::Intersection(vec![
                Region::negative(s1),
                Region::positive(s2)
            ]))
        );
        assert_eq!(ctx.universe("U1").unwrap().cells, vec!["C1"]);
    }

    #[test]
    fn unknown_material_registers_nothing() {
        let error = build(&["surf S1 sph 0 0 0 1", "cell C1 U1 lead -S1"]).unwrap_err();
        assert!(matches!(
            error,
            Error::UnresolvedReference { entity: Entity::Material, ref name } if name == "lead"
        ));

        let mut ctx = build(&["surf S1 sph 0 0 0 1"]).unwrap();
        let cards = classify(&["cell C1 U1 lead -S1"]);
        assert!(build_cell(&mut ctx, &cards[0]).is_err());
        assert!(ctx.universe("U1").is_none());
        assert!(ctx.cell("C1").is_none());
    }

    #[test]
    fn fill_creates_placeholder_universe() {
        let ctx = build(&["surf S1 sph 0 0 0 1", "cell C1 0 fill pin -S1"]).unwrap();
        assert_eq!(ctx.cell("C1").unwrap().fill, Fill::Universe("pin".into()));
        assert!(ctx.universe("pin").unwrap().is_placeholder());
    }

    #[test]
    fn inf_material_cell_covers_everything() {
        let ctx = build(&["surf all inf", "cell w 1 water all", "cell v 2 void all"]).unwrap();
        assert_eq!(ctx.cell("w").unwrap().region, None);
        assert_eq!(ctx.cell("v").unwrap().fill, Fill::Void);
    }

    #[test]
    fn composite_names_expand() {
        let ctx = build(&[
            "surf box sqc 0 0 5",
            "surf pin cyl 0 0 1",
            "cell in 0 fuel -box pin",
            "cell out 0 outside box",
        ])
        .unwrap();

        let inside = ctx.cell("in").unwrap();
        assert!(inside.contains([3.0, 0.0, 0.0], ctx.surfaces()));
        assert!(!inside.contains([0.5, 0.0, 0.0], ctx.surfaces()));
        assert!(!inside.contains([6.0, 0.0, 0.0], ctx.surfaces()));

        let outside = ctx.cell("out").unwrap();
        assert!(outside.contains([6.0, 0.0, 0.0], ctx.surfaces()));
        assert!(!outside.contains([3.0, 0.0, 0.0], ctx.surfaces()));
    }

    #[test]
    fn serpent_operators_translate() {
        let ctx = build(&[
            "surf 1 px 0",
            "surf 2 px 1",
            "surf 3 py 0",
            "cell c 0 fuel (1 -2) : #3",
        ])
        .unwrap();
        let cell = ctx.cell("c").unwrap();
        assert_eq!(cell.region.as_ref().unwrap().to_string(), "+1 -2 | ~(+3)");
        assert!(cell.contains([0.5, 5.0, 0.0], ctx.surfaces()));
        assert!(cell.contains([5.0, -1.0, 0.0], ctx.surfaces()));
        assert!(!cell.contains([5.0, 1.0, 0.0], ctx.surfaces()));
    }

    #[test]
    fn outside_cell_sets_boundaries_per_axis() {
        let ctx = build(&[
            "set bc 2 2 1",
            "surf x1 px -1",
            "surf x2 px 1",
            "surf y1 py -1",
            "surf y2 py 1",
            "surf z1 pz -1",
            "surf z2 pz 1",
            "surf c cyl 0 0 5",
            "cell out 0 outside -x1 : x2 : -y1 : y2 : -z1 : z2 : c",
        ])
        .unwrap();
        let boundary = |name: &str| ctx.surface(name).unwrap().boundary;
        assert_eq!(boundary("x1"), BoundaryType::Reflective);
        assert_eq!(boundary("y2"), BoundaryType::Reflective);
        assert_eq!(boundary("z1"), BoundaryType::Vacuum);
        assert_eq!(boundary("c"), BoundaryType::Reflective);
    }

    #[test]
    fn single_boundary_applies_to_composite_faces() {
        let ctx = build(&["surf box hexxc 0 0 5", "cell out 0 outside box"]).unwrap();
        assert!(ctx
            .surfaces()
            .values()
            .all(|s| s.boundary == BoundaryType::Vacuum));
    }

    #[test]
    fn interior_surfaces_stay_transmissive() {
        let ctx = build(&[
            "surf in sph 0 0 0 1",
            "surf out sph 0 0 0 2",
            "cell a 0 fuel -in",
            "cell b 0 water in -out",
            "cell c 0 outside out",
        ])
        .unwrap();
        assert_eq!(ctx.surface("in").unwrap().boundary, BoundaryType::Transmission);
        assert_eq!(ctx.surface("out").unwrap().boundary, BoundaryType::Vacuum);
    }

    #[rstest]
    #[case("cell c 0 fuel -missing")]
    #[case("cell c 0 fuel")]
    #[case("cell c 0 fuel -s1 & s2")]
    #[case("cell c 0 fuel (-s1")]
    #[case("cell c 0 fuel -s1 all")]
    #[case("cell c 0 outside all")]
    #[case("cell c 0 fill 0 -s1")]
    #[case("cell c u1 fill u1 -s1")]
    fn rejects_bad_cells(#[case] line: &str) {
        assert!(build(&["surf s1 sph 0 0 0 1", "surf all inf", line]).is_err());
    }

    #[test]
    fn duplicate_cells_are_rejected() {
        let error = build(&["surf s1 sph 0 0 0 1", "cell c 0 fuel -s1", "cell c 0 water s1"])
            .unwrap_err();
        assert!(matches!(error, Error::DuplicateName { entity: Entity::Cell, .. }));
    }
}
