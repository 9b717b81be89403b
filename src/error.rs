//! Error types for the translation core
//!
//! Every variant is fatal to the current translation. There is no partial
//! success mode, so a failed card means nothing should be exported.

use thiserror::Error;

/// Namespaces that names are registered under
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Surface,
    Cell,
    Universe,
    Material,
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let s = match self {
            Entity::Surface => "surface",
            Entity::Cell => "cell",
            Entity::Universe => "universe",
            Entity::Material => "material",
        };
        write!(f, "{s}")
    }
}

/// Everything that can go wrong while translating a geometry
#[derive(Debug, Error)]
pub enum Error {
    #[error("surfaces of type \"{kind}\" are not supported (surface {name})")]
    UnsupportedSurfaceKind { name: String, kind: String },

    #[error("erroneous surface card: {0}")]
    ErroneousSurfaceCard(String),

    #[error("surface {name} of type \"{kind}\" expects {expected} parameters, found {found}")]
    InvalidSurfaceParameters {
        name: String,
        kind: String,
        expected: String,
        found: usize,
    },

    #[error("type {kind} lattices are not supported (lattice {name})")]
    UnsupportedLatticeKind { name: String, kind: u8 },

    #[error("erroneous lattice card for {name}: {reason}")]
    ErroneousLatticeCard { name: String, reason: String },

    #[error("erroneous cell card: {0}")]
    ErroneousCellCard(String),

    #[error("reference to undeclared {entity} \"{name}\"")]
    UnresolvedReference { entity: Entity, name: String },

    #[error("erroneous composite surface {name}: {reason}")]
    ErroneousCompositeSurface { name: String, reason: String },

    #[error("boundary type \"{0}\" is invalid")]
    InvalidBoundaryType(String),

    #[error("{0} boundary conditions given, at most one per axis is allowed")]
    TooManyBoundaryConditions(usize),

    #[error("cannot transform {target}: {reason}")]
    ErroneousTransformTarget { target: String, reason: String },

    #[error("erroneous transformation card: {0}")]
    ErroneousTransformCard(String),

    #[error("invalid region expression \"{expression}\": {reason}")]
    InvalidRegionExpression { expression: String, reason: String },

    #[error("{entity} \"{name}\" is declared more than once")]
    DuplicateName { entity: Entity, name: String },

    #[error("line {line}: {source}")]
    AtLine {
        line: usize,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// The underlying error without any line information
    pub fn inner(&self) -> &Error {
        match self {
            Error::AtLine { source, .. } => source.inner(),
            e => e,
        }
    }

    /// Attach the 1-based line number of the card that failed
    pub fn at_line(self, line: usize) -> Self {
        match self {
            Error::AtLine { .. } => self,
            e => Error::AtLine {
                line,
                source: Box::new(e),
            },
        }
    }
}

/// Convenience alias for results using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;
