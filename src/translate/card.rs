// internal modules
use crate::readers::parsers::{self, CellFillSpec};
use crate::translate::lattice;

// external crates
use log::trace;

/// Every card type the translator knows how to dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CardKind {
    Surface,
    CellMaterial,
    CellFill,
    CellOutside,
    Lattice,
    Transformation,
    BoundaryCondition,
    Root,
    Unrecognized,
}

impl CardKind {
    /// Any of the three `cell` card shapes
    pub fn is_cell(&self) -> bool {
        matches!(
            self,
            CardKind::CellMaterial | CardKind::CellFill | CardKind::CellOutside
        )
    }
}

/// A classified input card
///
/// The text has its comment removed and, for lattices, any continuation lines
/// appended so that every card is a single line.
#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    /// 1-based line number the card starts on
    pub line: usize,
    pub kind: CardKind,
    pub text: String,
}

/// Kind of a single comment-free line
fn card_kind(text: &str) -> CardKind {
    if parsers::is_surface_card(text) {
        CardKind::Surface
    } else if parsers::is_cell_card(text) {
        // malformed cells are left for the cell builder to report
        match parsers::cell_card(text) {
            Ok((_, cell)) => match cell.fill {
                CellFillSpec::Universe(_) => CardKind::CellFill,
                CellFillSpec::Outside => CardKind::CellOutside,
                CellFillSpec::Material(_) => CardKind::CellMaterial,
            },
            Err(_) => CardKind::CellMaterial,
        }
    } else if parsers::is_lattice_card(text) {
        CardKind::Lattice
    } else if parsers::is_transform_card(text) {
        CardKind::Transformation
    } else if parsers::is_boundary_card(text) {
        CardKind::BoundaryCondition
    } else if parsers::is_root_card(text) {
        CardKind::Root
    } else {
        CardKind::Unrecognized
    }
}

/// Classify every line of a geometry
///
/// Blank and comment-only lines produce no card at all. Lattice cards absorb
/// following lines of bare universe names until they hold as many names as
/// their dimensions ask for.
///
/// ```rust
/// # use geoport::translate::{classify, CardKind};
/// let lines = ["% pin cell", "surf 1 cyl 0 0 1", "cell 1 0 fuel -1", "", "cell 2 0 outside 1"];
/// let kinds: Vec<CardKind> = classify(&lines).iter().map(|c| c.kind).collect();
/// assert_eq!(kinds, vec![CardKind::Surface, CardKind::CellMaterial, CardKind::CellOutside]);
/// ```
pub fn classify<S: AsRef<str>>(lines: &[S]) -> Vec<Card> {
    let mut cards: Vec<Card> = Vec::new();
    let mut missing_names: usize = 0;

    for (i, raw) in lines.iter().enumerate() {
        let text = parsers::strip_comment(raw.as_ref());
        if text.is_empty() {
            continue;
        }

        if missing_names > 0 && parsers::is_lattice_continuation(text) {
            if let Some(card) = cards.last_mut() {
                card.text.push(' ');
                card.text.push_str(text);
                missing_names = missing_names.saturating_sub(text.split_whitespace().count());
                continue;
            }
        }

        let kind = card_kind(text);
        missing_names = match kind {
            CardKind::Lattice => lattice::missing_names(text),
            _ => 0,
        };

        if kind == CardKind::Unrecognized {
            trace!("Line {}: skipping \"{}\"", i + 1, text);
        }

        cards.push(Card {
            line: i + 1,
            kind,
            text: text.to_string(),
        });
    }

    cards
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("surf s1 sph 0 0 0 1", CardKind::Surface)]
    #[case("cell c1 u1 fuel -s1", CardKind::CellMaterial)]
    #[case("cell c1 u1 fill u2 -s1", CardKind::CellFill)]
    #[case("cell c1 0 outside s1", CardKind::CellOutside)]
    #[case("lat L 1 0 0 1 1 1.0 A", CardKind::Lattice)]
    #[case("trans U u1 0 0 1", CardKind::Transformation)]
    #[case("set bc 1", CardKind::BoundaryCondition)]
    #[case("set root core", CardKind::Root)]
    #[case("set pop 1000 50 10", CardKind::Unrecognized)]
    #[case("mat fuel -10.4", CardKind::Unrecognized)]
    #[case("transport", CardKind::Unrecognized)]
    fn classifies_single_lines(#[case] line: &str, #[case] kind: CardKind) {
        let cards = classify(&[line]);
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].kind, kind);
    }

    #[test]
    fn strips_comments_before_matching() {
        let cards = classify(&["cell c1 u1 fuel -s1 % fill u2"]);
        assert_eq!(cards[0].kind, CardKind::CellMaterial);
        assert_eq!(cards[0].text, "cell c1 u1 fuel -s1");
    }

    #[test]
    fn lattice_absorbs_continuation_lines() {
        let lines = [
            "lat L 1 0 0 2 2 10",
            "A B % top",
            "",
            "C D",
            "E F",
            "cell 1 0 fill L -1",
        ];
        let cards = classify(&lines);
        assert_eq!(cards.len(), 3);
        assert_eq!(cards[0].text, "lat L 1 0 0 2 2 10 A B C D");
        assert_eq!(cards[1].kind, CardKind::Unrecognized);
        assert_eq!(cards[1].line, 5);
        assert_eq!(cards[2].kind, CardKind::CellFill);
    }
}
