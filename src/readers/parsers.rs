//! nom parsers for Serpent geometry cards and OpenMC material elements
//!
//! Every card parser expects a line that has already had its `%` comment
//! removed and leading whitespace trimmed. Each returns the typed content of
//! the card, leaving interpretation of the values to the translator.

// internal modules
use crate::csg::{Halfspace, Region, Side};

// external crates
use nom::branch::alt;
use nom::bytes::complete::{tag, take_till, take_while1};
use nom::character::complete::{char, digit1, multispace0, one_of, satisfy, space0, space1};
use nom::combinator::{eof, map, map_res, opt, peek, rest};
use nom::multi::{many0, many1, separated_list1};
use nom::number::complete::double;
use nom::sequence::{delimited, pair, preceded, separated_pair, terminated, tuple};
use nom::IResult;

/// Token of the surface expression at the end of a cell card
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpressionToken<'a> {
    Open,
    Close,
    /// `:`
    Union,
    /// `#`
    Complement,
    /// Surface name with an optional sign, unsigned means positive
    Surface { negative: bool, name: &'a str },
}

/// Card keywords that can never start a lattice continuation line
const KEYWORDS: [&str; 24] = [
    "cell", "surf", "lat", "set", "trans", "mat", "mix", "include", "pin", "solid", "dtrans",
    "ftrans", "ltrans", "strans", "utrans", "therm", "det", "plot", "mesh", "src", "nest", "div",
    "dep", "ene",
];

/// Head and parameters of a `surf` card
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceCard {
    pub name: String,
    pub kind: String,
    pub params: Vec<f64>,
}

/// Third word of a `cell` card
#[derive(Debug, Clone, PartialEq)]
pub enum CellFillSpec {
    Material(String),
    Universe(String),
    Outside,
}

/// Head of a `cell` card and the raw surface expression that follows it
#[derive(Debug, Clone, PartialEq)]
pub struct CellCard {
    pub name: String,
    pub universe: String,
    pub fill: CellFillSpec,
    pub expression: String,
}

/// `lat` card with the remaining arguments left as text
#[derive(Debug, Clone, PartialEq)]
pub struct LatticeCard {
    pub name: String,
    pub kind: u8,
    pub args: Vec<String>,
}

/// `trans` card
#[derive(Debug, Clone, PartialEq)]
pub struct TransformCard {
    pub target: char,
    pub name: String,
    pub args: Vec<f64>,
}

/// Drop everything from the first `%` onwards and trim the result
///
/// ```rust
/// # use geoport::readers::parsers::strip_comment;
/// assert_eq!(strip_comment("  surf 1 px 0.0 % left side"), "surf 1 px 0.0");
/// assert_eq!(strip_comment("% only a comment"), "");
/// ```
pub fn strip_comment(line: &str) -> &str {
    match line.find('%') {
        Some(i) => line[..i].trim(),
        None => line.trim(),
    }
}

/// Serpent names: letters, digits, underscores, and dots
fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.'
}

/// Any Serpent name
pub fn name(i: &str) -> IResult<&str, &str> {
    take_while1(is_name_char)(i)
}

/// First whitespace separated word
pub fn first_word(i: &str) -> IResult<&str, &str> {
    take_till(|c: char| c.is_whitespace())(i)
}

/// Keyword followed by whitespace
fn keyword<'a>(word: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    terminated(tag(word), space1)
}

/// Keyword ending the line or followed by whitespace
fn last_keyword<'a>(word: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    terminated(tag(word), peek(alt((space1, eof))))
}

/// Whitespace separated numbers up to the end of the line
fn numbers(i: &str) -> IResult<&str, Vec<f64>> {
    terminated(many0(preceded(space1, double)), tuple((space0, eof)))(i)
}

/// Quick check for the start of a `surf` card
pub fn is_surface_card(i: &str) -> bool {
    tuple((keyword("surf"), name, space1, name))(i).is_ok()
}

/// Quick check for the start of a `cell` card
pub fn is_cell_card(i: &str) -> bool {
    keyword("cell")(i).is_ok()
}

/// Quick check for the start of a `lat` card
pub fn is_lattice_card(i: &str) -> bool {
    keyword("lat")(i).is_ok()
}

/// Quick check for the start of a `trans` card
pub fn is_transform_card(i: &str) -> bool {
    keyword("trans")(i).is_ok()
}

/// Quick check for a `set bc` card
pub fn is_boundary_card(i: &str) -> bool {
    tuple((keyword("set"), keyword("bc")))(i).is_ok()
}

/// Quick check for a `set root` card
pub fn is_root_card(i: &str) -> bool {
    tuple((keyword("set"), keyword("root")))(i).is_ok()
}

/// `surf <name> <kind> [params...]`
pub fn surface_card(i: &str) -> IResult<&str, SurfaceCard> {
    map(
        tuple((
            keyword("surf"),
            name,
            space1,
            take_while1(|c: char| c.is_ascii_alphabetic()),
            numbers,
        )),
        |(_, name, _, kind, params)| SurfaceCard {
            name: name.to_string(),
            kind: kind.to_string(),
            params,
        },
    )(i)
}

/// Fill part of a cell card, `fill <u>`, `outside`, or a material name
fn cell_fill(i: &str) -> IResult<&str, CellFillSpec> {
    alt((
        map(preceded(keyword("fill"), name), |u: &str| {
            CellFillSpec::Universe(u.to_string())
        }),
        map(last_keyword("outside"), |_| CellFillSpec::Outside),
        map(terminated(name, peek(alt((space1, eof)))), |m: &str| {
            CellFillSpec::Material(m.to_string())
        }),
    ))(i)
}

/// `cell <name> <universe> <fill> <surface expression>`
pub fn cell_card(i: &str) -> IResult<&str, CellCard> {
    map(
        tuple((
            keyword("cell"),
            name,
            space1,
            name,
            space1,
            cell_fill,
            rest,
        )),
        |(_, name, _, universe, _, fill, expression)| CellCard {
            name: name.to_string(),
            universe: universe.to_string(),
            fill,
            expression: expression.trim().to_string(),
        },
    )(i)
}

/// Single token of a cell surface expression
fn expression_token(i: &str) -> IResult<&str, ExpressionToken> {
    preceded(
        space0,
        alt((
            map(char('('), |_| ExpressionToken::Open),
            map(char(')'), |_| ExpressionToken::Close),
            map(char(':'), |_| ExpressionToken::Union),
            map(char('#'), |_| ExpressionToken::Complement),
            map(pair(opt(one_of("+-")), name), |(sign, name)| {
                ExpressionToken::Surface {
                    negative: sign == Some('-'),
                    name,
                }
            }),
        )),
    )(i)
}

/// Whole surface expression, `-s1 s2 : #(s3 -s4)`
///
/// ```rust
/// # use geoport::readers::parsers::{cell_expression, ExpressionToken};
/// let (_, tokens) = cell_expression("-s1 : #s2").unwrap();
/// assert_eq!(tokens[1], ExpressionToken::Union);
/// assert_eq!(tokens[3], ExpressionToken::Surface { negative: false, name: "s2" });
/// ```
pub fn cell_expression(i: &str) -> IResult<&str, Vec<ExpressionToken>> {
    terminated(many0(expression_token), tuple((space0, eof)))(i)
}

/// `lat <name> <type> [args...]`
pub fn lattice_card(i: &str) -> IResult<&str, LatticeCard> {
    map(
        tuple((
            keyword("lat"),
            name,
            space1,
            map_res(digit1, str::parse::<u8>),
            many0(preceded(space1, take_while1(|c: char| !c.is_whitespace()))),
            space0,
            eof,
        )),
        |(_, name, _, kind, args, _, _)| LatticeCard {
            name: name.to_string(),
            kind,
            args: args.into_iter().map(String::from).collect(),
        },
    )(i)
}

/// `trans <S|U|...> <name> [numbers...]`
pub fn transform_card(i: &str) -> IResult<&str, TransformCard> {
    map(
        tuple((
            keyword("trans"),
            satisfy(|c| c.is_ascii_alphabetic()),
            space1,
            name,
            numbers,
        )),
        |(_, target, _, name, args)| TransformCard {
            target,
            name: name.to_string(),
            args,
        },
    )(i)
}

/// `set bc <tokens...>`
pub fn boundary_card(i: &str) -> IResult<&str, Vec<&str>> {
    preceded(
        tuple((keyword("set"), tag("bc"))),
        terminated(
            many1(preceded(space1, take_while1(|c: char| !c.is_whitespace()))),
            tuple((space0, eof)),
        ),
    )(i)
}

/// `set root <name>`
pub fn root_card(i: &str) -> IResult<&str, &str> {
    delimited(
        tuple((keyword("set"), keyword("root"))),
        name,
        tuple((space0, eof)),
    )(i)
}

/// Line containing only universe names, as used by multi-line lattices
///
/// ```rust
/// # use geoport::readers::parsers::is_lattice_continuation;
/// assert!(is_lattice_continuation("f1 f1 g2"));
/// assert!(!is_lattice_continuation("cell 1 0 fuel -1"));
/// assert!(!is_lattice_continuation(""));
/// ```
pub fn is_lattice_continuation(i: &str) -> bool {
    let mut words = i.split_whitespace().peekable();
    match words.peek() {
        None => false,
        Some(first) if KEYWORDS.contains(first) => false,
        Some(_) => words.all(|w| w.chars().all(is_name_char)),
    }
}

/// `include "path"`
pub fn include_path(i: &str) -> IResult<&str, &str> {
    preceded(
        keyword("include"),
        alt((
            delimited(char('"'), take_till(|c| c == '"'), char('"')),
            take_while1(|c: char| !c.is_whitespace()),
        )),
    )(i)
}

/// Signed surface id of an OpenMC region, unsigned means positive
fn halfspace(i: &str) -> IResult<&str, Region> {
    map(
        pair(opt(one_of("+-")), nom::character::complete::u32),
        |(sign, surface)| {
            let side = match sign {
                Some('-') => Side::Negative,
                _ => Side::Positive,
            };
            Region::Halfspace(Halfspace { surface, side })
        },
    )(i)
}

/// Half-space or parenthesised group
fn region_primary(i: &str) -> IResult<&str, Region> {
    preceded(
        multispace0,
        alt((
            halfspace,
            delimited(char('('), region_union, preceded(multispace0, char(')'))),
        )),
    )(i)
}

/// `~` binds tightest
fn region_complement(i: &str) -> IResult<&str, Region> {
    alt((
        map(
            preceded(pair(multispace0, char('~')), region_complement),
            |region| Region::Complement(Box::new(region)),
        ),
        region_primary,
    ))(i)
}

/// Adjacent or `&` joined operands
fn region_intersection(i: &str) -> IResult<&str, Region> {
    map(
        pair(
            region_complement,
            many0(preceded(opt(pair(multispace0, char('&'))), region_complement)),
        ),
        |(first, others)| match others.is_empty() {
            true => first,
            false => Region::Intersection(std::iter::once(first).chain(others).collect()),
        },
    )(i)
}

/// `|` binds loosest
fn region_union(i: &str) -> IResult<&str, Region> {
    map(
        separated_list1(pair(multispace0, char('|')), region_intersection),
        |mut nodes| match nodes.len() {
            1 => nodes.remove(0),
            _ => Region::Union(nodes),
        },
    )(i)
}

/// Complete OpenMC region expression
///
/// Complement binds tightest, then intersection, then union.
///
/// ```rust
/// # use geoport::csg::Region;
/// # use geoport::readers::parsers::region_expression;
/// let (_, region) = region_expression("-1 2 | ~3").unwrap();
/// assert!(matches!(region, Region::Union(ref nodes) if nodes.len() == 2));
/// ```
pub fn region_expression(i: &str) -> IResult<&str, Region> {
    terminated(region_union, pair(multispace0, eof))(i)
}

/// Single `key="value"` attribute of an XML element
fn xml_attribute(i: &str) -> IResult<&str, (&str, &str)> {
    preceded(
        multispace0,
        separated_pair(
            take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_' || c == '-'),
            delimited(multispace0, char('='), multispace0),
            alt((
                delimited(char('"'), take_till(|c| c == '"'), char('"')),
                delimited(char('\''), take_till(|c| c == '\''), char('\'')),
            )),
        ),
    )(i)
}

/// Attributes of an element starting at `<tag`
///
/// ```rust
/// # use geoport::readers::parsers::xml_element_attributes;
/// let (_, attrs) = xml_element_attributes("material", "<material id=\"3\" name='fuel'>").unwrap();
/// assert_eq!(attrs, vec![("id", "3"), ("name", "fuel")]);
/// ```
pub fn xml_element_attributes<'a>(
    element: &'static str,
    i: &'a str,
) -> IResult<&'a str, Vec<(&'a str, &'a str)>> {
    delimited(
        tuple((char('<'), tag(element), peek(satisfy(|c| c.is_whitespace() || c == '>' || c == '/')))),
        many0(xml_attribute),
        tuple((multispace0, alt((tag("/>"), tag(">"))))),
    )(i)
}
