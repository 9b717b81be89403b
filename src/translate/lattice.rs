// internal modules
use crate::csg::{Lattice, LatticeKind};
use crate::error::{Entity, Error, Result};
use crate::readers::parsers::{self, LatticeCard};
use crate::translate::card::Card;
use crate::translate::context::TranslationContext;
use crate::utils::*;

// external crates
use itertools::Itertools;
use log::debug;

/// Number of values between the lattice type and the universe names
fn header_len(kind: u8) -> Option<usize> {
    match kind {
        1 | 6 => Some(5),
        11 => Some(9),
        _ => None,
    }
}

/// Positions of the element counts within the header
fn count_positions(kind: u8) -> &'static [usize] {
    match kind {
        11 => &[3, 4, 5],
        _ => &[2, 3],
    }
}

/// Universe names a lattice card still needs from continuation lines
pub(crate) fn missing_names(text: &str) -> usize {
    let Ok((_, card)) = parsers::lattice_card(text) else {
        return 0;
    };
    let Some(header) = header_len(card.kind) else {
        return 0;
    };
    // counts too large to hold are left for the builder to reject
    count_positions(card.kind)
        .iter()
        .try_fold(1usize, |total, &i| {
            total.checked_mul(card.args.get(i)?.parse::<usize>().ok()?)
        })
        .and_then(|total| total.checked_add(header))
        .map_or(0, |needed| needed.saturating_sub(card.args.len()))
}

/// Handler for `lat` cards
///
/// Builds the lattice, registers it on the universe of the same name, and
/// makes sure every universe it references exists.
pub(crate) fn build_lattice(ctx: &mut TranslationContext, card: &Card) -> Result<()> {
    let (_, lat) = parsers::lattice_card(&card.text).map_err(|_| Error::ErroneousLatticeCard {
        name: card.text.split_whitespace().nth(1).unwrap_or_default().to_string(),
        reason: "could not read the card".to_string(),
    })?;

    let lattice = lattice_from_card(&lat)?;

    for name in lattice.universes.iter().flatten().unique() {
        ctx.get_or_create_universe(name);
    }

    let universe = ctx.get_or_create_universe(&lat.name);
    if !universe.is_placeholder() {
        return Err(Error::DuplicateName {
            entity: Entity::Universe,
            name: lat.name.clone(),
        });
    }

    debug!(
        "Lattice {} type {} with {}x{} elements",
        lat.name, lat.kind, lattice.dimension[0], lattice.dimension[1]
    );
    universe.lattice = Some(lattice);
    Ok(())
}

/// Lattice geometry and universe array of a card
fn lattice_from_card(lat: &LatticeCard) -> Result<Lattice> {
    let erroneous = |reason: String| Error::ErroneousLatticeCard {
        name: lat.name.clone(),
        reason,
    };

    let kind = match lat.kind {
        1 => LatticeKind::Square,
        6 => LatticeKind::SquareInfinite,
        11 => LatticeKind::Cuboidal,
        kind => {
            return Err(Error::UnsupportedLatticeKind {
                name: lat.name.clone(),
                kind,
            })
        }
    };

    let header = header_len(lat.kind).unwrap_or_default();
    if lat.args.len() < header {
        return Err(erroneous(f!(
            "expected {header} values before the universe names, found {}",
            lat.args.len()
        )));
    }

    let number = |i: usize| {
        lat.args[i]
            .parse::<f64>()
            .map_err(|_| erroneous(f!("\"{}\" is not a number", lat.args[i])))
    };
    let count = |i: usize| match lat.args[i].parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(erroneous(f!(
            "\"{}\" is not a positive element count",
            lat.args[i]
        ))),
    };

    let center = [number(0)?, number(1)?];
    let (dimension, pitch) = match kind {
        LatticeKind::Cuboidal => {
            if count(5)? != 1 {
                return Err(erroneous("only single layer cuboidal lattices are supported".into()));
            }
            ([count(3)?, count(4)?], [number(6)?, number(7)?])
        }
        _ => {
            let p = number(4)?;
            ([count(2)?, count(3)?], [p, p])
        }
    };

    if pitch.iter().any(|p| *p <= 0.0) {
        return Err(erroneous("pitch must be positive".into()));
    }

    let [nx, ny] = dimension;
    let elements = nx
        .checked_mul(ny)
        .ok_or_else(|| erroneous(f!("{nx}x{ny} elements is too many")))?;
    let names = &lat.args[header..];
    if names.len() != elements {
        return Err(erroneous(f!(
            "expected {elements} universe names, found {}",
            names.len()
        )));
    }

    // Serpent lists rows top down, stored bottom up
    let universes = names.chunks(nx).rev().map(|row| row.to_vec()).collect();

    Ok(Lattice {
        kind,
        center,
        origin: [nx as f64 * 0.5 * pitch[0], ny as f64 * 0.5 * pitch[1]],
        pitch,
        dimension,
        universes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csg::MaterialLibrary;
    use crate::translate::card::classify;
    use crate::translate::translate_lines;
    use rstest::rstest;

    fn build(lines: &[&str]) -> Result<TranslationContext> {
        let mut ctx = TranslationContext::new(MaterialLibrary::new());
        for card in classify(lines) {
            build_lattice(&mut ctx, &card)?;
        }
        Ok(ctx)
    }

    #[test]
    fn rows_are_stored_bottom_up() {
        let ctx = build(&["lat L 1 0 0 2 2 10 A B C D"]).unwrap();
        let lattice = ctx.universe("L").unwrap().lattice.as_ref().unwrap();
        assert_eq!(lattice.universes[0], vec!["C", "D"]);
        assert_eq!(lattice.universes[1], vec!["A", "B"]);
        assert_eq!(lattice.origin, [10.0, 10.0]);
        assert_eq!(lattice.lower_left(), [-10.0, -10.0]);
        for name in ["A", "B", "C", "D"] {
            assert!(ctx.universe(name).unwrap().is_placeholder());
        }
    }

    #[test]
    fn names_on_continuation_lines() {
        let ctx = build(&["lat L 6 1 2 3 1 1.5", "u1 u2", "u1"]).unwrap();
        let lattice = ctx.universe("L").unwrap().lattice.as_ref().unwrap();
        assert_eq!(lattice.kind, LatticeKind::SquareInfinite);
        assert_eq!(lattice.universes, vec![vec!["u1", "u2", "u1"]]);
        assert_eq!(lattice.center, [1.0, 2.0]);
        assert_eq!(lattice.origin, [2.25, 0.75]);
    }

    #[test]
    fn single_layer_cuboidal() {
        let ctx = build(&["lat C 11 0 0 0 2 1 1 1.0 2.0 5.0 a b"]).unwrap();
        let lattice = ctx.universe("C").unwrap().lattice.as_ref().unwrap();
        assert_eq!(lattice.pitch, [1.0, 2.0]);
        assert_eq!(lattice.dimension, [2, 1]);
    }

    #[rstest]
    #[case(2)]
    #[case(3)]
    #[case(4)]
    #[case(7)]
    #[case(8)]
    #[case(9)]
    #[case(12)]
    #[case(13)]
    #[case(14)]
    fn rejects_unsupported_kinds(#[case] kind: u8) {
        let error = build(&[&f!("lat L {kind} 0 0 1 1 1 A")]).unwrap_err();
        assert!(matches!(error, Error::UnsupportedLatticeKind { kind: k, .. } if k == kind));
    }

    #[rstest]
    #[case("lat L 1 0 0 2 2 10 A B C")]
    #[case("lat L 1 0 0 2 2 10 A B C D E")]
    #[case("lat L 1 0 0 0 2 10")]
    #[case("lat L 1 0 0 1 1 -1 A")]
    #[case("lat L 11 0 0 0 1 1 2 1 1 1 A B")]
    fn rejects_erroneous_cards(#[case] line: &str) {
        let error = build(&[line]).unwrap_err();
        assert!(matches!(error, Error::ErroneousLatticeCard { .. }), "{error:?}");
    }

    #[test]
    fn huge_counts_are_erroneous() {
        let line = "lat L 1 0 0 4294967296 4294967296 1";
        assert_eq!(missing_names(line), 0);
        let error = build(&[line]).unwrap_err();
        assert!(matches!(error, Error::ErroneousLatticeCard { .. }), "{error:?}");
    }

    #[rstest]
    #[case(&["lat L 1 0 0 1 1 1 A", "cell c L fuel -s"])]
    #[case(&["cell c L fuel -s", "lat L 1 0 0 1 1 1 A"])]
    fn lattice_and_cells_cannot_share_a_universe(#[case] cards: &[&str]) {
        let mut lines = vec!["surf s sph 0 0 0 1", "cell a A fuel -s", "cell o 0 outside s"];
        lines.extend_from_slice(cards);
        let error = translate_lines(&lines, MaterialLibrary::from_names(["fuel"])).unwrap_err();
        assert!(
            matches!(error.inner(), Error::DuplicateName { entity: Entity::Universe, name } if name == "L"),
            "{error:?}"
        );
    }

    #[test]
    fn lattice_universe_must_be_new() {
        let mut ctx = TranslationContext::new(MaterialLibrary::new());
        ctx.add_cell_name_to_universe("L", "c1");
        let cards = classify(&["lat L 1 0 0 1 1 1 A"]);
        let error = build_lattice(&mut ctx, &cards[0]).unwrap_err();
        assert!(matches!(error, Error::DuplicateName { .. }));
    }
}
