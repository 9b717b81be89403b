//! Boolean regions over signed surface half-spaces
//!
//! Regions are written and read using the OpenMC expression syntax:
//!
//! | Syntax   | Meaning                            |
//! | -------- | ---------------------------------- |
//! | `-7`     | negative half-space of surface 7   |
//! | `+7`, `7`| positive half-space of surface 7   |
//! | `a b`    | intersection (also `a & b`)        |
//! | `a \| b` | union                              |
//! | `~a`     | complement                         |
//! | `( )`    | grouping                           |
//!
//! Complement binds tightest, then intersection, then union.

// internal modules
use crate::csg::surface::{Surface, SurfaceId};
use crate::error::{Error, Result};
use crate::readers::parsers;
use crate::utils::*;

// standard library
use std::collections::HashMap;

// external crates
use indexmap::IndexMap;
use itertools::Itertools;
use serde::Serialize;

/// Side of a surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Side {
    Negative,
    Positive,
}

impl Side {
    pub fn flipped(&self) -> Self {
        match self {
            Side::Negative => Side::Positive,
            Side::Positive => Side::Negative,
        }
    }

    fn symbol(&self) -> char {
        match self {
            Side::Negative => '-',
            Side::Positive => '+',
        }
    }
}

/// One side of one surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Halfspace {
    pub surface: SurfaceId,
    pub side: Side,
}

/// CSG expression tree
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Region {
    Halfspace(Halfspace),
    Intersection(Vec<Region>),
    Union(Vec<Region>),
    Complement(Box<Region>),
}

impl Region {
    /// Inside (`-`) of a surface
    pub fn negative(surface: SurfaceId) -> Self {
        Region::Halfspace(Halfspace {
            surface,
            side: Side::Negative,
        })
    }

    /// Outside (`+`) of a surface
    pub fn positive(surface: SurfaceId) -> Self {
        Region::Halfspace(Halfspace {
            surface,
            side: Side::Positive,
        })
    }

    /// Parse an OpenMC style region expression
    ///
    /// ```rust
    /// # use geoport::csg::Region;
    /// let region = Region::from_expression("-1 +2 | ~(3)").unwrap();
    /// assert_eq!(region.surface_ids(), vec![1, 2, 3]);
    /// ```
    pub fn from_expression(expression: &str) -> Result<Self> {
        let (_, region) = parsers::region_expression(expression).map_err(|e| {
            let reason = match e {
                nom::Err::Error(e) | nom::Err::Failure(e) => {
                    f!("cannot read from \"{}\"", e.input.trim())
                }
                nom::Err::Incomplete(_) => "expression ends early".to_string(),
            };
            Error::InvalidRegionExpression {
                expression: expression.to_string(),
                reason,
            }
        })?;
        Ok(region)
    }

    /// Every surface id referenced, in order of first appearance
    pub fn surface_ids(&self) -> Vec<SurfaceId> {
        let mut ids = Vec::new();
        self.collect_ids(&mut ids);
        ids.into_iter().unique().collect()
    }

    fn collect_ids(&self, ids: &mut Vec<SurfaceId>) {
        match self {
            Region::Halfspace(h) => ids.push(h.surface),
            Region::Intersection(nodes) | Region::Union(nodes) => {
                nodes.iter().for_each(|n| n.collect_ids(ids))
            }
            Region::Complement(node) => node.collect_ids(ids),
        }
    }

    /// Point containment against a surface table
    ///
    /// Surfaces missing from the table never contain the point.
    pub fn contains(&self, point: [f64; 3], surfaces: &IndexMap<SurfaceId, Surface>) -> bool {
        match self {
            Region::Halfspace(h) => match surfaces.get(&h.surface) {
                Some(s) => {
                    let value = s.evaluate(point);
                    match h.side {
                        Side::Negative => value < 0.0,
                        Side::Positive => value >= 0.0,
                    }
                }
                None => false,
            },
            Region::Intersection(nodes) => nodes.iter().all(|n| n.contains(point, surfaces)),
            Region::Union(nodes) => nodes.iter().any(|n| n.contains(point, surfaces)),
            Region::Complement(node) => !node.contains(point, surfaces),
        }
    }

    /// Point every half-space at a replacement surface, where one is given
    pub fn remap(&mut self, map: &HashMap<SurfaceId, SurfaceId>) {
        match self {
            Region::Halfspace(h) => {
                if let Some(&id) = map.get(&h.surface) {
                    h.surface = id;
                }
            }
            Region::Intersection(nodes) | Region::Union(nodes) => {
                nodes.iter_mut().for_each(|n| n.remap(map))
            }
            Region::Complement(node) => node.remap(map),
        }
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Region::Halfspace(h) => write!(f, "{}{}", h.side.symbol(), h.surface),
            Region::Intersection(nodes) => {
                let s = nodes
                    .iter()
                    .map(|n| match n {
                        Region::Union(_) | Region::Intersection(_) => f!("({n})"),
                        _ => f!("{n}"),
                    })
                    .join(" ");
                write!(f, "{s}")
            }
            Region::Union(nodes) => {
                let s = nodes
                    .iter()
                    .map(|n| match n {
                        Region::Union(_) => f!("({n})"),
                        _ => f!("{n}"),
                    })
                    .join(" | ");
                write!(f, "{s}")
            }
            Region::Complement(node) => write!(f, "~({node})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csg::SurfaceKind;
    use rstest::rstest;

    fn n(id: SurfaceId) -> Region {
        Region::negative(id)
    }

    fn p(id: SurfaceId) -> Region {
        Region::positive(id)
    }

    #[test]
    fn adjacency_is_intersection() {
        let region = Region::from_expression("-1 +2").unwrap();
        assert_eq!(region, Region::Intersection(vec![n(1), p(2)]));
    }

    #[test]
    fn unsigned_id_is_positive() {
        assert_eq!(Region::from_expression("12").unwrap(), p(12));
    }

    #[test]
    fn intersection_binds_tighter_than_union() {
        let region = Region::from_expression("-1 2 | -3").unwrap();
        assert_eq!(
            region,
            Region::Union(vec![Region::Intersection(vec![n(1), p(2)]), n(3)])
        );
    }

    #[test]
    fn complement_applies_to_group() {
        let region = Region::from_expression("-4 ~(+1 -2)").unwrap();
        assert_eq!(
            region,
            Region::Intersection(vec![
                n(4),
                Region::Complement(Box::new(Region::Intersection(vec![p(1), n(2)])))
            ])
        );
    }

    #[rstest]
    #[case("")]
    #[case("(-1 2")]
    #[case("-1 )")]
    #[case("-a")]
    #[case("-1 | | 2")]
    #[case("~")]
    fn rejects_malformed(#[case] expression: &str) {
        assert!(matches!(
            Region::from_expression(expression),
            Err(Error::InvalidRegionExpression { .. })
        ));
    }

    #[rstest]
    #[case("-1 +2")]
    #[case("(-1 +2) | -3")]
    #[case("~(-1 | +2) -3")]
    fn display_parses_back(#[case] expression: &str) {
        let region = Region::from_expression(expression).unwrap();
        let again = Region::from_expression(&region.to_string()).unwrap();
        assert_eq!(region, again);
    }

    #[test]
    fn containment_follows_signs() {
        let mut surfaces = IndexMap::new();
        surfaces.insert(1, Surface::new(1, "s", SurfaceKind::Sphere { x0: 0.0, y0: 0.0, z0: 0.0, r: 2.0 }));
        surfaces.insert(2, Surface::new(2, "p", SurfaceKind::XPlane { x0: 0.0 }));

        let region = Region::from_expression("-1 +2").unwrap();
        assert!(region.contains([1.0, 0.0, 0.0], &surfaces));
        assert!(!region.contains([-1.0, 0.0, 0.0], &surfaces));
        assert!(!region.contains([3.0, 0.0, 0.0], &surfaces));

        let outside = Region::from_expression("~(-1 +2)").unwrap();
        assert!(outside.contains([-1.0, 0.0, 0.0], &surfaces));
    }

    #[test]
    fn remap_replaces_ids() {
        let mut region = Region::from_expression("-1 (+2 | -1)").unwrap();
        region.remap(&HashMap::from([(1, 10)]));
        assert_eq!(region.surface_ids(), vec![10, 2]);
    }
}
