// internal modules
use crate::csg::{Halfspace, Region, Side, SurfaceId, SurfaceKind, Vector3};
use crate::error::{Error, Result};
use crate::readers::parsers::{self, SurfaceCard};
use crate::translate::card::Card;
use crate::translate::context::{SurfaceEntry, TranslationContext};
use crate::utils::*;

// external crates
use log::debug;
use serde::Serialize;

/// Unit normal at +60 degrees to the x axis
const N60: [f64; 2] = [0.5, 0.866_025_403_784_438_6];
/// Unit normal at +30 degrees to the x axis
const N30: [f64; 2] = [0.866_025_403_784_438_6, 0.5];

/// Faces of a square or rectangular prism, inside is `+left -right +bottom -top`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RectPrismFaces {
    pub left: SurfaceId,
    pub right: SurfaceId,
    pub bottom: SurfaceId,
    pub top: SurfaceId,
}

/// Which pair of hexagon faces is normal to a coordinate axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HexOrientation {
    /// `hexxc`, first two faces are x-planes
    FlatX,
    /// `hexyc`, first two faces are y-planes
    FlatY,
}

/// Six faces of a hexagonal prism in creation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HexPrismFaces {
    pub orientation: HexOrientation,
    pub faces: [SurfaceId; 6],
}

/// Faces of an axis-aligned box, ordered `xmin xmax ymin zmin ymax zmax`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CuboidFaces {
    pub xmin: SurfaceId,
    pub xmax: SurfaceId,
    pub ymin: SurfaceId,
    pub zmin: SurfaceId,
    pub ymax: SurfaceId,
    pub zmax: SurfaceId,
}

/// Serpent surface built from several primitive faces
///
/// The inside of a composite is the intersection of one side of each face.
/// Cell expressions refer to it by name and get the whole sub-expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CompositeSurface {
    RectPrism(RectPrismFaces),
    HexPrism(HexPrismFaces),
    Cuboid(CuboidFaces),
}

impl CompositeSurface {
    /// Face ids in creation order
    pub fn faces(&self) -> Vec<SurfaceId> {
        self.inside().iter().map(|h| h.surface).collect()
    }

    /// Half-spaces whose intersection is the inside of the prism
    pub fn inside(&self) -> Vec<Halfspace> {
        use Side::{Negative as N, Positive as P};
        let signed: Vec<(SurfaceId, Side)> = match self {
            CompositeSurface::RectPrism(f) => {
                vec![(f.left, P), (f.right, N), (f.bottom, P), (f.top, N)]
            }
            CompositeSurface::HexPrism(h) => {
                let sides = match h.orientation {
                    HexOrientation::FlatX => [P, N, P, P, N, N],
                    HexOrientation::FlatY => [P, N, P, N, N, P],
                };
                h.faces.iter().copied().zip(sides).collect()
            }
            CompositeSurface::Cuboid(f) => vec![
                (f.xmin, P),
                (f.xmax, N),
                (f.ymin, P),
                (f.zmin, P),
                (f.ymax, N),
                (f.zmax, N),
            ],
        };
        signed
            .into_iter()
            .map(|(surface, side)| Halfspace { surface, side })
            .collect()
    }

    /// Inside as a region
    pub fn region(&self) -> Region {
        Region::Intersection(self.inside().into_iter().map(Region::Halfspace).collect())
    }
}

/// Implicit plane `ax + by + cz + d = 0` through three points
///
/// The normal is `(p2 - p1) x (p3 - p1)` and `d = n.(-p1)`.
///
/// ```rust
/// # use geoport::translate::plane_from_points;
/// let [a, b, c, d] = plane_from_points([1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]);
/// assert_eq!([a, b, c, d], [1.0, 1.0, 1.0, -1.0]);
/// ```
pub fn plane_from_points(p1: [f64; 3], p2: [f64; 3], p3: [f64; 3]) -> [f64; 4] {
    let (p1, p2, p3) = (Vector3::from(p1), Vector3::from(p2), Vector3::from(p3));
    let n = (p2 - p1).cross(&(p3 - p1));
    [n.x, n.y, n.z, n.dot(&(-p1))]
}

/// Handler for `surf` cards
pub(crate) fn build_surface(ctx: &mut TranslationContext, card: &Card) -> Result<()> {
    let (_, surf) = parsers::surface_card(&card.text)
        .map_err(|_| Error::ErroneousSurfaceCard(card.text.clone()))?;
    ctx.check_surface_name(&surf.name)?;

    let entry = match surf.kind.as_str() {
        "inf" => {
            params::<0>(&surf)?;
            SurfaceEntry::Infinite
        }
        "sqc" | "rect" | "hexxc" | "hexyc" | "cube" | "cuboid" => {
            SurfaceEntry::Composite(build_composite(ctx, &surf)?)
        }
        _ => {
            let kind = primitive_kind(&surf)?;
            SurfaceEntry::Primitive(ctx.register_surface(&surf.name, kind))
        }
    };

    debug!("Surface {} ({})", surf.name, surf.kind);
    ctx.add_surface_entry(&surf.name, entry)
}

/// Parameters of a card as a fixed size array
fn params<const N: usize>(card: &SurfaceCard) -> Result<[f64; N]> {
    card.params
        .as_slice()
        .try_into()
        .map_err(|_| Error::InvalidSurfaceParameters {
            name: card.name.clone(),
            kind: card.kind.clone(),
            expected: N.to_string(),
            found: card.params.len(),
        })
}

/// Surface kind of a card describing a single surface
fn primitive_kind(card: &SurfaceCard) -> Result<SurfaceKind> {
    use SurfaceKind::*;

    let kind = match card.kind.as_str() {
        "px" => {
            let [x0] = params(card)?;
            XPlane { x0 }
        }
        "py" => {
            let [y0] = params(card)?;
            YPlane { y0 }
        }
        "pz" => {
            let [z0] = params(card)?;
            ZPlane { z0 }
        }
        "plane" => plane(card)?,
        "cylx" => {
            let [y0, z0, r] = params(card)?;
            XCylinder { y0, z0, r }
        }
        "cyly" => {
            let [x0, z0, r] = params(card)?;
            YCylinder { x0, z0, r }
        }
        "cylz" | "cyl" => {
            let [x0, y0, r] = params(card)?;
            ZCylinder { x0, y0, r }
        }
        "cylv" => {
            let [x1, y1, z1, x2, y2, z2, r] = params(card)?;
            Cylinder {
                p1: [x1, y1, z1],
                p2: [x2, y2, z2],
                r,
            }
        }
        "sph" => {
            let [x0, y0, z0, r] = params(card)?;
            Sphere { x0, y0, z0, r }
        }
        "cone" => {
            let [x0, y0, z0, r, h] = params(card)?;
            if h == 0.0 {
                return Err(Error::ErroneousSurfaceCard(f!(
                    "cone {} has zero height",
                    card.name
                )));
            }
            ZCone {
                x0,
                y0,
                z0: z0 + h,
                r2: (r / h).powi(2),
            }
        }
        "quadratic" => Quadric {
            coeffs: params(card)?,
        },
        "torx" => {
            let [x0, y0, z0, a, b, c] = params(card)?;
            XTorus { x0, y0, z0, a, b, c }
        }
        "tory" => {
            let [x0, y0, z0, a, b, c] = params(card)?;
            YTorus { x0, y0, z0, a, b, c }
        }
        "torz" => {
            let [x0, y0, z0, a, b, c] = params(card)?;
            ZTorus { x0, y0, z0, a, b, c }
        }
        _ => {
            return Err(Error::UnsupportedSurfaceKind {
                name: card.name.clone(),
                kind: card.kind.clone(),
            })
        }
    };
    Ok(kind)
}

/// General plane from coefficients or three points
fn plane(card: &SurfaceCard) -> Result<SurfaceKind> {
    let p = &card.params;
    match p.len() {
        4 => Ok(SurfaceKind::Plane {
            a: p[0],
            b: p[1],
            c: p[2],
            d: p[3],
        }),
        9 => {
            let [a, b, c, d] = plane_from_points(
                [p[0], p[1], p[2]],
                [p[3], p[4], p[5]],
                [p[6], p[7], p[8]],
            );
            if a == 0.0 && b == 0.0 && c == 0.0 {
                return Err(Error::ErroneousSurfaceCard(f!(
                    "plane {} is defined by collinear points",
                    card.name
                )));
            }
            Ok(SurfaceKind::Plane { a, b, c, d: -d })
        }
        found => Err(Error::InvalidSurfaceParameters {
            name: card.name.clone(),
            kind: card.kind.clone(),
            expected: "4 or 9".to_string(),
            found,
        }),
    }
}

/// Register the faces of a composite surface
///
/// Faces are named `{name}_sub_{i}` and are all in the surface table before
/// the composite itself is returned.
fn build_composite(ctx: &mut TranslationContext, card: &SurfaceCard) -> Result<CompositeSurface> {
    use SurfaceKind::*;

    let degenerate = |reason: &str| Error::ErroneousCompositeSurface {
        name: card.name.clone(),
        reason: reason.to_string(),
    };

    let kinds: Vec<SurfaceKind> = match card.kind.as_str() {
        "sqc" | "rect" => {
            let [xmin, xmax, ymin, ymax] = match card.kind.as_str() {
                "sqc" => {
                    let [x0, y0, d] = params(card)?;
                    [x0 - d, x0 + d, y0 - d, y0 + d]
                }
                _ => params(card)?,
            };
            if xmin >= xmax || ymin >= ymax {
                return Err(degenerate("prism has no positive width"));
            }
            vec![
                XPlane { x0: xmin },
                XPlane { x0: xmax },
                YPlane { y0: ymin },
                YPlane { y0: ymax },
            ]
        }
        "hexxc" | "hexyc" => {
            let [x0, y0, d] = params(card)?;
            if d <= 0.0 {
                return Err(degenerate("hexagon apothem must be positive"));
            }
            let plane = |n: [f64; 2], offset: f64| Plane {
                a: n[0],
                b: n[1],
                c: 0.0,
                d: n[0] * x0 + n[1] * y0 + offset,
            };
            let n60 = N60;
            let nm60 = [N60[0], -N60[1]];
            let n30 = N30;
            let nm30 = [N30[0], -N30[1]];
            match card.kind.as_str() {
                "hexxc" => vec![
                    XPlane { x0: x0 - d },
                    XPlane { x0: x0 + d },
                    plane(n60, -d),
                    plane(nm60, -d),
                    plane(n60, d),
                    plane(nm60, d),
                ],
                _ => vec![
                    YPlane { y0: y0 - d },
                    YPlane { y0: y0 + d },
                    plane(n30, -d),
                    plane(n30, d),
                    plane(nm30, d),
                    plane(nm30, -d),
                ],
            }
        }
        _ => {
            let [xmin, xmax, ymin, ymax, zmin, zmax] = match card.kind.as_str() {
                "cube" => {
                    let [x0, y0, z0, d] = params(card)?;
                    [x0 - d, x0 + d, y0 - d, y0 + d, z0 - d, z0 + d]
                }
                _ => params(card)?,
            };
            if xmin >= xmax || ymin >= ymax || zmin >= zmax {
                return Err(degenerate("cuboid has no positive width"));
            }
            vec![
                XPlane { x0: xmin },
                XPlane { x0: xmax },
                YPlane { y0: ymin },
                ZPlane { z0: zmin },
                YPlane { y0: ymax },
                ZPlane { z0: zmax },
            ]
        }
    };

    let ids: Vec<SurfaceId> = kinds
        .into_iter()
        .enumerate()
        .map(|(i, kind)| ctx.register_surface(&f!("{}_sub_{i}", card.name), kind))
        .collect();

    let composite = match (card.kind.as_str(), ids.as_slice()) {
        ("sqc" | "rect", &[left, right, bottom, top]) => {
            CompositeSurface::RectPrism(RectPrismFaces {
                left,
                right,
                bottom,
                top,
            })
        }
        ("hexxc", &[a, b, c, d, e, f]) => CompositeSurface::HexPrism(HexPrismFaces {
            orientation: HexOrientation::FlatX,
            faces: [a, b, c, d, e, f],
        }),
        ("hexyc", &[a, b, c, d, e, f]) => CompositeSurface::HexPrism(HexPrismFaces {
            orientation: HexOrientation::FlatY,
            faces: [a, b, c, d, e, f],
        }),
        (_, &[xmin, xmax, ymin, zmin, ymax, zmax]) => CompositeSurface::Cuboid(CuboidFaces {
            xmin,
            xmax,
            ymin,
            zmin,
            ymax,
            zmax,
        }),
        _ => return Err(degenerate("unexpected number of faces")),
    };
    Ok(composite)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csg::MaterialLibrary;
    use crate::translate::card::classify;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn context_with(lines: &[&str]) -> Result<TranslationContext> {
        let mut ctx = TranslationContext::new(MaterialLibrary::new());
        for card in classify(lines) {
            build_surface(&mut ctx, &card)?;
        }
        Ok(ctx)
    }

    fn composite(ctx: &TranslationContext, name: &str) -> CompositeSurface {
        match ctx.surface_entry(name) {
            Some(SurfaceEntry::Composite(c)) => *c,
            other => panic!("{name} is not a composite: {other:?}"),
        }
    }

    #[rstest]
    #[case("surf s px 1.5", vec![1.5])]
    #[case("surf s cyl 1 2 3", vec![1.0, 2.0, 3.0])]
    #[case("surf s cylx 1 2 3", vec![1.0, 2.0, 3.0])]
    #[case("surf s sph 1 2 3 4", vec![1.0, 2.0, 3.0, 4.0])]
    #[case("surf s plane 1 2 3 4", vec![1.0, 2.0, 3.0, 4.0])]
    #[case("surf s torz 0 0 1 5 1 1", vec![0.0, 0.0, 1.0, 5.0, 1.0, 1.0])]
    #[case("surf s cylv 0 0 0 0 0 1 2", vec![0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 2.0])]
    fn keeps_primitive_parameters(#[case] line: &str, #[case] expected: Vec<f64>) {
        let ctx = context_with(&[line]).unwrap();
        assert_eq!(ctx.surface("s").unwrap().kind.coefficients(), expected);
    }

    #[test]
    fn integer_names_are_used_as_ids() {
        let ctx = context_with(&["surf 12 px 0", "surf fuel cyl 0 0 1"]).unwrap();
        assert_eq!(ctx.surface("12").unwrap().id, 12);
        assert_eq!(ctx.surface("fuel").unwrap().id, stable_id("fuel"));
    }

    #[test]
    fn taken_ids_fall_through_to_the_next_free_one() {
        let ctx = context_with(&["surf 3 px 0", "surf a sqc 0 0 1"]).unwrap();
        let faces = composite(&ctx, "a").faces();
        assert_eq!(faces.len(), 4);
        assert!(!faces.contains(&3));
    }

    #[test]
    fn three_point_plane() {
        let n = plane_from_points([1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]);
        let scale = n[0];
        for (value, expected) in n.iter().zip([1.0, 1.0, 1.0, -1.0]) {
            assert_relative_eq!(*value, expected * scale);
        }

        let ctx = context_with(&["surf p plane 1 0 0 0 1 0 0 0 1"]).unwrap();
        let surface = ctx.surface("p").unwrap();
        assert_relative_eq!(surface.evaluate([1.0, 0.0, 0.0]), 0.0);
        assert!(surface.evaluate([0.0, 0.0, 0.0]) < 0.0);
    }

    #[test]
    fn cone_apex_and_slope() {
        let ctx = context_with(&["surf c cone 0 0 1 2 4"]).unwrap();
        match ctx.surface("c").unwrap().kind {
            SurfaceKind::ZCone { z0, r2, .. } => {
                assert_eq!(z0, 5.0);
                assert_eq!(r2, 0.25);
            }
            ref other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn square_prism_has_four_faces() {
        let ctx = context_with(&["surf s1 sqc 0 0 5"]).unwrap();
        let region = composite(&ctx, "s1").region();
        assert_eq!(region.surface_ids().len(), 4);
        assert!(ctx.surfaces().values().any(|s| s.name == "s1_sub_3"));
        assert!(region.contains([0.0, 0.0, 0.0], ctx.surfaces()));
        assert!(!region.contains([6.0, 0.0, 0.0], ctx.surfaces()));
    }

    #[rstest]
    #[case("hexxc", [0.9, 0.0, 0.0], [0.0, 1.2, 0.0])]
    #[case("hexyc", [0.0, 0.9, 0.0], [1.2, 0.0, 0.0])]
    fn hexagons_follow_their_flats(
        #[case] kind: &str,
        #[case] inside: [f64; 3],
        #[case] outside: [f64; 3],
    ) {
        // apothem 1, corners at distance 2/sqrt(3) along the other axis
        let ctx = context_with(&[&f!("surf h {kind} 0 0 1")]).unwrap();
        let region = composite(&ctx, "h").region();
        assert!(region.contains([0.0, 0.0, 0.0], ctx.surfaces()));
        assert!(region.contains(inside, ctx.surfaces()));
        assert!(!region.contains(outside, ctx.surfaces()));
        assert!(!region.contains([-1.5, -1.5, 0.0], ctx.surfaces()));
    }

    #[test]
    fn cube_is_a_cuboid() {
        let ctx = context_with(&["surf b cube 0 0 0 1"]).unwrap();
        let region = composite(&ctx, "b").region();
        assert!(region.contains([0.5, -0.5, 0.9], ctx.surfaces()));
        assert!(!region.contains([0.5, -0.5, 1.1], ctx.surfaces()));
    }

    #[rstest]
    #[case("surf s px", "InvalidSurfaceParameters")]
    #[case("surf s sph 0 0 1", "InvalidSurfaceParameters")]
    #[case("surf s plane 1 2", "InvalidSurfaceParameters")]
    #[case("surf s dodecahedron 1", "UnsupportedSurfaceKind")]
    #[case("surf s sqc 0 0 -1", "ErroneousCompositeSurface")]
    #[case("surf s hexyc 0 0 0", "ErroneousCompositeSurface")]
    #[case("surf s rect 1 0 0 1", "ErroneousCompositeSurface")]
    #[case("surf s px one", "ErroneousSurfaceCard")]
    fn rejects_bad_surfaces(#[case] line: &str, #[case] variant: &str) {
        let error = context_with(&[line]).unwrap_err();
        assert!(f!("{error:?}").starts_with(variant), "{error:?}");
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let error = context_with(&["surf s px 0", "surf s py 0"]).unwrap_err();
        assert!(matches!(error, Error::DuplicateName { .. }));
    }

    #[test]
    fn inf_is_a_sentinel() {
        let ctx = context_with(&["surf all inf"]).unwrap();
        assert_eq!(ctx.surface_entry("all"), Some(&SurfaceEntry::Infinite));
        assert!(ctx.surfaces().is_empty());
    }
}
