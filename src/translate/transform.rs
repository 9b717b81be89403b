// internal modules
use crate::csg::{Fill, Matrix3, Surface, SurfaceId};
use crate::error::{Entity, Error, Result};
use crate::readers::parsers::{self, TransformCard};
use crate::translate::card::Card;
use crate::translate::context::{SurfaceEntry, TranslationContext};
use crate::utils::*;

// standard library
use std::collections::HashMap;

// external crates
use log::{debug, trace};
use nalgebra::Rotation3;
use serde::Serialize;

/// Rotation as given on a `trans` card
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Rotation {
    /// Degrees about x, y, and z, applied in that order
    Angles([f64; 3]),
    /// Row-major rotation matrix
    Matrix([[f64; 3]; 3]),
}

impl Rotation {
    /// Rotation matrix acting on column vectors
    ///
    /// ```rust
    /// # use geoport::translate::Rotation;
    /// # use approx::assert_relative_eq;
    /// let r = Rotation::Angles([0.0, 0.0, 90.0]).matrix();
    /// assert_relative_eq!(r[(1, 0)], 1.0, epsilon = 1e-12);
    /// ```
    pub fn matrix(&self) -> Matrix3 {
        match self {
            Rotation::Angles([x, y, z]) => {
                Rotation3::from_euler_angles(x.to_radians(), y.to_radians(), z.to_radians())
                    .into_inner()
            }
            Rotation::Matrix(rows) => Matrix3::from(*rows).transpose(),
        }
    }
}

/// What a `trans` card moves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TransformTarget {
    /// `S`, a single surface
    Surface,
    /// `U`, every cell declared in a universe
    UniverseCells,
}

/// One step of a transformation
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum TransformOp {
    Translate([f64; 3]),
    Rotate(Rotation),
}

/// Parsed `trans` card, steps in the order they are applied
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transformation {
    pub target: TransformTarget,
    pub name: String,
    pub ops: Vec<TransformOp>,
}

impl Transformation {
    /// Interpret the numbers of a `trans` card
    ///
    /// Three numbers are a translation. Seven add rotation angles and thirteen
    /// a rotation matrix, both followed by the order flag where `1` rotates
    /// first and `2` translates first.
    pub fn from_card(card: &TransformCard) -> Result<Self> {
        let target = match card.target {
            'S' => TransformTarget::Surface,
            'U' => TransformTarget::UniverseCells,
            other => {
                return Err(Error::ErroneousTransformTarget {
                    target: f!("{other} {}", card.name),
                    reason: "only surface (S) and universe (U) transformations are supported"
                        .to_string(),
                })
            }
        };

        let a = &card.args;
        let erroneous = |reason: String| Error::ErroneousTransformCard(f!("{}: {reason}", card.name));

        let ops = match a.len() {
            3 => vec![TransformOp::Translate([a[0], a[1], a[2]])],
            7 | 13 => {
                let translate = TransformOp::Translate([a[0], a[1], a[2]]);
                let rotation = match a.len() {
                    7 => Rotation::Angles([a[3], a[4], a[5]]),
                    _ => {
                        let rows = [[a[3], a[4], a[5]], [a[6], a[7], a[8]], [a[9], a[10], a[11]]];
                        check_orthonormal(&Matrix3::from(rows).transpose())
                            .map_err(|_| erroneous("rotation matrix is not orthonormal".into()))?;
                        Rotation::Matrix(rows)
                    }
                };
                let rotate = TransformOp::Rotate(rotation);
                match a[a.len() - 1] {
                    ord if ord == 1.0 => vec![rotate, translate],
                    ord if ord == 2.0 => vec![translate, rotate],
                    ord => return Err(erroneous(f!("{ord} is not a valid order, use 1 or 2"))),
                }
            }
            n => return Err(erroneous(f!("expected 3, 7 or 13 numbers, found {n}"))),
        };

        Ok(Self {
            target,
            name: card.name.clone(),
            ops,
        })
    }

    /// Apply to the surfaces or cells of a context
    pub fn apply(&self, ctx: &mut TranslationContext) -> Result<()> {
        match self.target {
            TransformTarget::Surface => self.apply_to_surface(ctx),
            TransformTarget::UniverseCells => self.apply_to_universe(ctx),
        }
    }

    fn apply_to_surface(&self, ctx: &mut TranslationContext) -> Result<()> {
        let id = match ctx.surface_entry(&self.name) {
            Some(SurfaceEntry::Primitive(id)) => *id,
            Some(_) => {
                return Err(Error::ErroneousTransformTarget {
                    target: f!("surface {}", self.name),
                    reason: "composite and inf surfaces cannot be transformed".to_string(),
                })
            }
            None => {
                return Err(Error::UnresolvedReference {
                    entity: Entity::Surface,
                    name: self.name.clone(),
                })
            }
        };
        self.move_surface(ctx, id)
    }

    fn apply_to_universe(&self, ctx: &mut TranslationContext) -> Result<()> {
        let universe = ctx
            .universe(&self.name)
            .ok_or_else(|| Error::UnresolvedReference {
                entity: Entity::Universe,
                name: self.name.clone(),
            })?;

        if universe.cells.is_empty() {
            return Err(Error::ErroneousTransformTarget {
                target: f!("universe {}", self.name),
                reason: "universe has no cells".to_string(),
            });
        }

        for cell in universe.cells.clone() {
            self.apply_to_cell(ctx, &cell)?;
        }
        Ok(())
    }

    /// Move a filling universe, or a copy of the surfaces bounding the cell
    fn apply_to_cell(&self, ctx: &mut TranslationContext, name: &str) -> Result<()> {
        let Some(cell) = ctx.cells.get_mut(name) else {
            return Ok(());
        };

        if let Fill::Universe(_) = cell.fill {
            for op in &self.ops {
                match op {
                    TransformOp::Translate(t) => cell.translate_fill(*t),
                    TransformOp::Rotate(r) => cell.rotate_fill(&r.matrix()),
                }
            }
            trace!("Cell {name} fill placed at {:?}", cell.translation);
            return Ok(());
        }

        let Some(ids) = cell.region.as_ref().map(|r| r.surface_ids()) else {
            return Err(Error::ErroneousTransformTarget {
                target: f!("cell {name}"),
                reason: "cell has neither a region nor a universe to move".to_string(),
            });
        };

        // surfaces may bound other cells, so move copies
        let mut moved: HashMap<SurfaceId, SurfaceId> = HashMap::new();
        for id in ids {
            if ctx.owns_clone(name, id) {
                self.move_surface(ctx, id)?;
                continue;
            }
            let copy = ctx
                .clone_surface_for_cell(id, name)
                .ok_or_else(|| Error::UnresolvedReference {
                    entity: Entity::Surface,
                    name: f!("id {id} in cell {name}"),
                })?;
            self.move_surface(ctx, copy)?;
            moved.insert(id, copy);
        }

        if let Some(region) = ctx.cells.get_mut(name).and_then(|c| c.region.as_mut()) {
            region.remap(&moved);
        }
        Ok(())
    }

    fn move_surface(&self, ctx: &mut TranslationContext, id: SurfaceId) -> Result<()> {
        let Some(surface) = ctx.surfaces.get_mut(&id) else {
            return Ok(());
        };
        for op in &self.ops {
            apply_op(surface, op)?;
        }
        Ok(())
    }
}

fn apply_op(surface: &mut Surface, op: &TransformOp) -> Result<()> {
    match op {
        TransformOp::Translate(t) => surface.translate(*t),
        TransformOp::Rotate(r) => surface.rotate(&r.matrix())?,
    }
    Ok(())
}

/// `R R^T = I` within a tolerance loose enough for printed matrices
fn check_orthonormal(r: &Matrix3) -> std::result::Result<(), ()> {
    match (r * r.transpose() - Matrix3::identity()).norm() < 1e-4 {
        true => Ok(()),
        false => Err(()),
    }
}

/// Handler for `trans` cards
pub(crate) fn apply_transformation(ctx: &mut TranslationContext, card: &Card) -> Result<()> {
    let (_, parsed) = parsers::transform_card(&card.text)
        .map_err(|_| Error::ErroneousTransformCard(card.text.clone()))?;
    let transformation = Transformation::from_card(&parsed)?;
    debug!(
        "Transforming {:?} {} with {:?}",
        transformation.target, transformation.name, transformation.ops
    );
    transformation.apply(ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csg::{MaterialLibrary, SurfaceKind};
    use crate::translate::translate_cards;
    use crate::translate::card::classify;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn build(lines: &[&str]) -> Result<TranslationContext> {
        let mut ctx = TranslationContext::new(MaterialLibrary::from_names(["fuel"]));
        translate_cards(&mut ctx, &classify(lines))?;
        Ok(ctx)
    }

    fn card(text: &str) -> TransformCard {
        parsers::transform_card(text).unwrap().1
    }

    #[rstest]
    #[case("trans S s 1 2 3", 1)]
    #[case("trans S s 1 2 3 0 0 90 1", 2)]
    #[case("trans U u 1 2 3 1 0 0 0 1 0 0 0 1 2", 2)]
    fn counts_operations(#[case] text: &str, #[case] ops: usize) {
        assert_eq!(Transformation::from_card(&card(text)).unwrap().ops.len(), ops);
    }

    #[test]
    fn order_flag_sets_sequence() {
        let first = Transformation::from_card(&card("trans S s 1 2 3 0 0 90 1")).unwrap();
        assert!(matches!(first.ops[0], TransformOp::Rotate(_)));
        let second = Transformation::from_card(&card("trans S s 1 2 3 0 0 90 2")).unwrap();
        assert!(matches!(second.ops[0], TransformOp::Translate(_)));
    }

    #[rstest]
    #[case("trans S s 1 2")]
    #[case("trans S s 1 2 3 4")]
    #[case("trans S s 1 2 3 0 0 90 3")]
    #[case("trans S s 1 2 3 2 0 0 0 1 0 0 0 1 1")]
    fn rejects_erroneous_cards(#[case] text: &str) {
        let error = Transformation::from_card(&card(text)).unwrap_err();
        assert!(matches!(error, Error::ErroneousTransformCard(_)), "{error:?}");
    }

    #[test]
    fn rejects_other_targets() {
        let error = Transformation::from_card(&card("trans L lat 1 2 3")).unwrap_err();
        assert!(matches!(error, Error::ErroneousTransformTarget { .. }));
    }

    #[test]
    fn angles_compose_x_then_y_then_z() {
        let r = Rotation::Angles([90.0, 0.0, 90.0]).matrix();
        // x -> x -> y, y -> z -> z
        let x = r * crate::csg::Vector3::x();
        let y = r * crate::csg::Vector3::y();
        assert_relative_eq!(x, crate::csg::Vector3::y(), epsilon = 1e-12);
        assert_relative_eq!(y, crate::csg::Vector3::z(), epsilon = 1e-12);
    }

    #[test]
    fn translates_surface_in_place() {
        let ctx = build(&["surf s sph 0 0 0 1", "trans S s 1 2 3"]).unwrap();
        assert_eq!(
            ctx.surface("s").unwrap().kind,
            SurfaceKind::Sphere { x0: 1.0, y0: 2.0, z0: 3.0, r: 1.0 }
        );
    }

    #[test]
    fn rotates_then_translates_surface() {
        let ctx = build(&["surf s px 1", "trans S s 0 0 5 0 0 90 1"]).unwrap();
        match ctx.surface("s").unwrap().kind {
            SurfaceKind::YPlane { y0 } => assert_relative_eq!(y0, 1.0, epsilon = 1e-12),
            ref other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn fill_cells_accumulate_placement() {
        let ctx = build(&[
            "surf s sph 0 0 0 10",
            "cell c 0 fill pin -s",
            "cell p pin fuel -s",
            "trans U 0 1 0 0",
            "trans U 0 0 0 0 0 0 90 1",
        ])
        .unwrap();
        let cell = ctx.cell("c").unwrap();
        let t = cell.translation.unwrap();
        assert_relative_eq!(t[0], 0.0, epsilon = 1e-12);
        assert_relative_eq!(t[1], 1.0, epsilon = 1e-12);
        assert!(cell.rotation.is_some());
        assert_eq!(cell.region.as_ref().unwrap().surface_ids(), vec![ctx.surface("s").unwrap().id]);
    }

    #[test]
    fn material_cells_move_copies_of_their_surfaces() {
        let ctx = build(&[
            "surf s sph 0 0 0 1",
            "cell a u fuel -s",
            "cell b 0 fuel -s",
            "trans U u 5 0 0",
        ])
        .unwrap();
        assert!(ctx.cell("a").unwrap().contains([5.5, 0.0, 0.0], ctx.surfaces()));
        assert!(!ctx.cell("a").unwrap().contains([0.0, 0.0, 0.0], ctx.surfaces()));
        assert!(ctx.cell("b").unwrap().contains([0.0, 0.0, 0.0], ctx.surfaces()));
        assert_eq!(ctx.surfaces().len(), 2);
    }

    #[test]
    fn repeated_moves_reuse_the_copies() {
        let ctx = build(&[
            "surf s sph 0 0 0 1",
            "cell a u fuel -s",
            "cell b 0 fuel -s",
            "trans U u 5 0 0",
            "trans U u 0 5 0",
        ])
        .unwrap();
        assert_eq!(ctx.surfaces().len(), 2);
        assert!(ctx.cell("a").unwrap().contains([5.0, 5.5, 0.0], ctx.surfaces()));
        assert!(!ctx.cell("a").unwrap().contains([5.5, 0.0, 0.0], ctx.surfaces()));
        assert!(ctx.cell("b").unwrap().contains([0.0, 0.0, 0.0], ctx.surfaces()));
    }

    #[test]
    fn inf_cells_have_nothing_to_move() {
        let error = build(&["surf all inf", "cell a u fuel all", "trans U u 1 0 0"]).unwrap_err();
        assert!(matches!(error.inner(), Error::ErroneousTransformTarget { .. }));
    }

    #[test]
    fn composite_surfaces_cannot_move() {
        let error = build(&["surf b sqc 0 0 1", "trans S b 1 0 0"]).unwrap_err();
        assert!(matches!(error.inner(), Error::ErroneousTransformTarget { .. }));
    }
}
