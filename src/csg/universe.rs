// external crates
use serde::Serialize;

/// Serpent lattice types that can be expressed as OpenMC rectangular lattices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LatticeKind {
    /// Type 1, finite square lattice
    Square,
    /// Type 6, same as [LatticeKind::Square] but repeated infinitely
    SquareInfinite,
    /// Type 11, cuboidal lattice restricted to a single layer
    Cuboidal,
}

impl LatticeKind {
    /// Serpent type number
    pub fn code(&self) -> u8 {
        match self {
            LatticeKind::Square => 1,
            LatticeKind::SquareInfinite => 6,
            LatticeKind::Cuboidal => 11,
        }
    }
}

/// Regular 2D grid of universes
///
/// The universe array is stored bottom row first, `universes[row][col]`, so
/// that increasing indices follow increasing coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Lattice {
    pub kind: LatticeKind,
    /// Centre of the lattice as given on the card
    pub center: [f64; 2],
    /// Half extent per axis, `N * 0.5 * pitch`
    pub origin: [f64; 2],
    pub pitch: [f64; 2],
    /// Element counts `[Nx, Ny]`
    pub dimension: [usize; 2],
    pub universes: Vec<Vec<String>>,
}

impl Lattice {
    /// Bottom left corner of the lattice
    pub fn lower_left(&self) -> [f64; 2] {
        [
            self.center[0] - self.origin[0],
            self.center[1] - self.origin[1],
        ]
    }

    /// Element `(col, row)` containing the point
    ///
    /// Infinite lattices wrap around, finite ones return `None` outside.
    pub fn element_at(&self, point: [f64; 3]) -> Option<(usize, usize)> {
        let ll = self.lower_left();
        let mut index = [0usize; 2];
        for axis in 0..2 {
            let n = self.dimension[axis] as f64;
            let mut i = ((point[axis] - ll[axis]) / self.pitch[axis]).floor();
            if self.kind == LatticeKind::SquareInfinite {
                i = i.rem_euclid(n);
            } else if i < 0.0 || i >= n {
                return None;
            }
            index[axis] = i as usize;
        }
        Some((index[0], index[1]))
    }

    /// Point relative to the centre of the element containing it
    pub fn to_local(&self, point: [f64; 3]) -> [f64; 3] {
        let ll = self.lower_left();
        let local = |axis: usize| {
            (point[axis] - ll[axis]).rem_euclid(self.pitch[axis]) - 0.5 * self.pitch[axis]
        };
        [local(0), local(1), point[2]]
    }

    /// Universe name at element `(col, row)`
    pub fn universe(&self, (col, row): (usize, usize)) -> Option<&str> {
        self.universes.get(row)?.get(col).map(String::as_str)
    }
}

/// Named collection of cells, or a lattice
///
/// Universes can be referenced before anything is declared in them, so a
/// freshly created universe is an empty placeholder until cells or a lattice
/// card arrive.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Universe {
    pub id: u32,
    pub name: String,
    /// Member cell names in declaration order
    pub cells: Vec<String>,
    pub lattice: Option<Lattice>,
}

impl Universe {
    pub fn new(id: u32, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            cells: Vec::new(),
            lattice: None,
        }
    }

    /// Nothing has been declared in the universe yet
    pub fn is_placeholder(&self) -> bool {
        self.cells.is_empty() && self.lattice.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn two_by_two() -> Lattice {
        Lattice {
            kind: LatticeKind::Square,
            center: [0.0, 0.0],
            origin: [10.0, 10.0],
            pitch: [10.0, 10.0],
            dimension: [2, 2],
            universes: vec![
                vec!["C".into(), "D".into()],
                vec!["A".into(), "B".into()],
            ],
        }
    }

    #[rstest]
    #[case([-5.0, -5.0, 0.0], Some((0, 0)))]
    #[case([5.0, -5.0, 0.0], Some((1, 0)))]
    #[case([-5.0, 5.0, 0.0], Some((0, 1)))]
    #[case([25.0, 0.0, 0.0], None)]
    fn locates_elements(#[case] point: [f64; 3], #[case] expected: Option<(usize, usize)>) {
        assert_eq!(two_by_two().element_at(point), expected);
    }

    #[test]
    fn local_point_is_relative_to_element_centre() {
        let lattice = two_by_two();
        assert_eq!(lattice.to_local([6.0, -4.0, 3.0]), [1.0, 1.0, 3.0]);
        assert_eq!(lattice.universe((1, 0)), Some("D"));
    }

    #[test]
    fn infinite_lattice_wraps() {
        let mut lattice = two_by_two();
        lattice.kind = LatticeKind::SquareInfinite;
        assert_eq!(lattice.element_at([25.0, 0.0, 0.0]), Some((1, 1)));
    }
}
