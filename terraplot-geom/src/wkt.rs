//! Well-known-text parser and serializer.
//!
//! # Parsing
//!
//! The text is tokenized on `,` `(` `)` and whitespace, with each
//! delimiter kept as its own token (whitespace runs collapse, parens and
//! commas stay distinguishable). The grammar is recursive:
//!
//! ```text
//! Geometry := Type CoordinateList
//!           | Type Ring+
//!           | Type '(' Geometry (',' Geometry)* ')'
//! ```
//!
//! dispatched by keyword: POINT, LINESTRING and MULTIPOINT read a flat
//! coordinate list; POLYGON and MULTILINESTRING read one or more
//! parenthesized rings; MULTIPOLYGON and GEOMETRYCOLLECTION recurse. The
//! `EMPTY` keyword anywhere a coordinate list is expected yields a
//! zero-count geometry. MULTIPOINT accepts both `x y` and `(x y)` element
//! forms, mixed freely.
//!
//! # Serializing
//!
//! The serializer walks the packed array with the same recursion. An
//! `add_type` flag suppresses the repeated keyword when recursing into
//! elements of a multi-geometry whose type is implied by the container —
//! except GEOMETRYCOLLECTION, whose elements always carry their own
//! keyword. Each recursive call returns the next unread array index so the
//! caller can continue past a consumed sub-geometry.

use crate::error::{GeomResult, GeometryError};
use crate::types::{format_scalar, Geometry, GeometryType, Scalar, LINETO, MOVETO};

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Parse well-known text into a geometry value.
pub fn parse_wkt(wkt: &str) -> GeomResult<Geometry> {
    let tokens = tokenize(wkt);
    if tokens.is_empty() {
        return Err(GeometryError::invalid_text("empty geometry string"));
    }
    let mut parser = WktParser {
        source: wkt,
        tokens,
        pos: 0,
    };
    // Safe over-allocation: every value the parser writes is paid for by
    // at least one source token.
    let mut out = Vec::with_capacity(parser.tokens.len() + 1);
    parser.parse_geometry(&mut out)?;
    if let Some(extra) = parser.peek() {
        return Err(parser.err(format!("unexpected `{extra}` after geometry")));
    }
    Geometry::from_packed(out)
}

/// Serialize a packed geometry array to well-known text.
#[must_use]
pub(crate) fn format_wkt(coords: &[Scalar]) -> String {
    let mut out = String::new();
    write_geometry(coords, 0, true, &mut out);
    out
}

// ---------------------------------------------------------------------------
// Tokenizer
// ---------------------------------------------------------------------------

const fn is_delimiter(b: u8) -> bool {
    matches!(b, b',' | b'(' | b')')
}

const fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n')
}

/// Split on `,()` and whitespace, keeping each paren/comma as a token.
fn tokenize(wkt: &str) -> Vec<&str> {
    let bytes = wkt.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        if is_space(bytes[i]) {
            i += 1;
        } else if is_delimiter(bytes[i]) {
            tokens.push(&wkt[i..=i]);
            i += 1;
        } else {
            let start = i;
            while i < bytes.len() && !is_space(bytes[i]) && !is_delimiter(bytes[i]) {
                i += 1;
            }
            tokens.push(&wkt[start..i]);
        }
    }
    tokens
}

// ---------------------------------------------------------------------------
// Recursive-descent parser
// ---------------------------------------------------------------------------

/// Does this token start a coordinate (digit, `-`, or `.`)?
fn starts_coordinate(token: &str) -> bool {
    token
        .as_bytes()
        .first()
        .is_some_and(|b| b.is_ascii_digit() || *b == b'-' || *b == b'.')
}

struct WktParser<'a> {
    source: &'a str,
    tokens: Vec<&'a str>,
    pos: usize,
}

impl<'a> WktParser<'a> {
    /// Tokens are returned with the source's lifetime, so an error message
    /// can still be built from `self` while one is held.
    fn peek(&self) -> Option<&'a str> {
        self.tokens.get(self.pos).copied()
    }

    fn next(&mut self) -> Option<&'a str> {
        let tok = self.tokens.get(self.pos).copied();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn err(&self, detail: impl Into<String>) -> GeometryError {
        GeometryError::invalid_text(format!("{} in `{}`", detail.into(), self.source))
    }

    fn expect_open(&mut self) -> GeomResult<()> {
        match self.next() {
            Some("(") => Ok(()),
            Some(tok) => Err(self.err(format!("expected `(`, found `{tok}`"))),
            None => Err(self.err("unexpected end of geometry")),
        }
    }

    /// Consume a leading `EMPTY` keyword, if present.
    fn take_empty(&mut self) -> bool {
        if self.peek().is_some_and(|t| t.eq_ignore_ascii_case("EMPTY")) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn number(&self, token: &str) -> GeomResult<Scalar> {
        token
            .parse::<Scalar>()
            .map_err(|_| self.err(format!("malformed coordinate `{token}`")))
    }

    /// Parse one geometry, dispatching on its keyword, appending its
    /// packed form to `out`.
    fn parse_geometry(&mut self, out: &mut Vec<Scalar>) -> GeomResult<()> {
        let Some(keyword) = self.next() else {
            return Err(self.err("missing geometry keyword"));
        };
        let upper = keyword.to_ascii_uppercase();
        match upper.as_str() {
            "POINT" => self.parse_coordinate_list(GeometryType::Point, out),
            "LINESTRING" => self.parse_coordinate_list(GeometryType::LineString, out),
            "MULTIPOINT" => self.parse_multipoint(out),
            "POLYGON" => self.parse_rings(GeometryType::Polygon, out),
            "MULTILINESTRING" => self.parse_rings(GeometryType::MultiLineString, out),
            "MULTIPOLYGON" => self.parse_sub_geometries(GeometryType::MultiPolygon, out),
            "GEOMETRYCOLLECTION" => {
                self.parse_sub_geometries(GeometryType::GeometryCollection, out)
            }
            _ => Err(self.err(format!("unknown geometry keyword `{keyword}`"))),
        }
    }

    /// `(x y, x y, ...)` — a flat coordinate list for POINT or LINESTRING.
    fn parse_coordinate_list(&mut self, ty: GeometryType, out: &mut Vec<Scalar>) -> GeomResult<()> {
        out.push(ty.code());
        let count_slot = out.len();
        out.push(0.0);
        if self.take_empty() {
            return Ok(());
        }
        self.expect_open()?;
        let count = self.parse_pairs(out)?;
        out[count_slot] = count as Scalar;
        Ok(())
    }

    /// Read `x y` pairs separated by commas, through the closing paren.
    /// The first pair gets MOVETO, the rest LINETO. Returns the pair count.
    fn parse_pairs(&mut self, out: &mut Vec<Scalar>) -> GeomResult<usize> {
        let mut count = 0;
        loop {
            let Some(tok) = self.next() else {
                return Err(self.err("unmatched `(`"));
            };
            if !starts_coordinate(tok) {
                return Err(self.err(format!("expected coordinate, found `{tok}`")));
            }
            let x = self.number(tok)?;
            let y = match self.next() {
                Some(y_tok) if starts_coordinate(y_tok) => self.number(y_tok)?,
                Some(other) => {
                    return Err(self.err(format!("X coordinate {x} has no Y, found `{other}`")));
                }
                None => return Err(self.err(format!("X coordinate {x} has no Y"))),
            };
            out.push(if count == 0 { MOVETO } else { LINETO });
            out.push(x);
            out.push(y);
            count += 1;

            match self.next() {
                Some(",") => {}
                Some(")") => break,
                Some(other) => {
                    return Err(self.err(format!("expected `,` or `)`, found `{other}`")));
                }
                None => return Err(self.err("unmatched `(`")),
            }
        }
        Ok(count)
    }

    /// MULTIPOINT body: `(x y, ...)` or `((x y), ...)`, mixed freely.
    /// Each pair becomes a nested POINT sub-geometry.
    fn parse_multipoint(&mut self, out: &mut Vec<Scalar>) -> GeomResult<()> {
        out.push(GeometryType::MultiPoint.code());
        let count_slot = out.len();
        out.push(0.0);
        if self.take_empty() {
            return Ok(());
        }
        self.expect_open()?;
        let mut count = 0;
        loop {
            // Tolerate the nested-parenthesized element form.
            let nested = self.peek() == Some("(");
            if nested {
                self.pos += 1;
            }
            let Some(tok) = self.next() else {
                return Err(self.err("unmatched `(`"));
            };
            if !starts_coordinate(tok) {
                return Err(self.err(format!("expected coordinate, found `{tok}`")));
            }
            let x = self.number(tok)?;
            let y = match self.next() {
                Some(y_tok) if starts_coordinate(y_tok) => self.number(y_tok)?,
                Some(other) => {
                    return Err(self.err(format!("X coordinate {x} has no Y, found `{other}`")));
                }
                None => return Err(self.err(format!("X coordinate {x} has no Y"))),
            };
            if nested {
                match self.next() {
                    Some(")") => {}
                    _ => return Err(self.err("unmatched `(` in MULTIPOINT element")),
                }
            }
            out.push(GeometryType::Point.code());
            out.push(1.0);
            out.push(MOVETO);
            out.push(x);
            out.push(y);
            count += 1;

            match self.next() {
                Some(",") => {}
                Some(")") => break,
                Some(other) => {
                    return Err(self.err(format!("expected `,` or `)`, found `{other}`")));
                }
                None => return Err(self.err("unmatched `(`")),
            }
        }
        out[count_slot] = count as Scalar;
        Ok(())
    }

    /// `((x y, ...), (x y, ...))` — one or more parenthesized rings.
    ///
    /// For POLYGON the rings share one flat record (`count` = total
    /// vertices, each ring opening with MOVETO). For MULTILINESTRING each
    /// ring becomes its own LINESTRING-tagged sub-geometry.
    fn parse_rings(&mut self, ty: GeometryType, out: &mut Vec<Scalar>) -> GeomResult<()> {
        out.push(ty.code());
        let count_slot = out.len();
        out.push(0.0);
        if self.take_empty() {
            return Ok(());
        }
        self.expect_open()?;
        let mut count = 0;
        loop {
            if ty == GeometryType::Polygon {
                self.expect_open()?;
                count += self.parse_pairs(out)?;
            } else {
                out.push(GeometryType::LineString.code());
                let sub_count_slot = out.len();
                out.push(0.0);
                self.expect_open()?;
                let n = self.parse_pairs(out)?;
                out[sub_count_slot] = n as Scalar;
                count += 1;
            }
            match self.next() {
                Some(",") => {}
                Some(")") => break,
                Some(other) => {
                    return Err(self.err(format!("expected `,` or `)`, found `{other}`")));
                }
                None => return Err(self.err("unmatched `(`")),
            }
        }
        out[count_slot] = count as Scalar;
        Ok(())
    }

    /// `(<geometry>, <geometry>, ...)` — recursive sub-geometries for
    /// MULTIPOLYGON (keyword-less polygons) and GEOMETRYCOLLECTION
    /// (keyword-carrying elements).
    fn parse_sub_geometries(&mut self, ty: GeometryType, out: &mut Vec<Scalar>) -> GeomResult<()> {
        out.push(ty.code());
        let count_slot = out.len();
        out.push(0.0);
        if self.take_empty() {
            return Ok(());
        }
        self.expect_open()?;
        let mut count = 0;
        loop {
            if ty == GeometryType::MultiPolygon {
                self.parse_rings(GeometryType::Polygon, out)?;
            } else {
                self.parse_geometry(out)?;
            }
            count += 1;
            match self.next() {
                Some(",") => {}
                Some(")") => break,
                Some(other) => {
                    return Err(self.err(format!("expected `,` or `)`, found `{other}`")));
                }
                None => return Err(self.err("unmatched `(`")),
            }
        }
        out[count_slot] = count as Scalar;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Recursive serializer
// ---------------------------------------------------------------------------

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn count_at(coords: &[Scalar], at: usize) -> usize {
    coords.get(at).copied().unwrap_or(0.0) as usize
}

/// Write the geometry record starting at `at`; return the next unread
/// index. `add_type` suppresses the keyword for container-implied
/// sub-geometries.
fn write_geometry(coords: &[Scalar], at: usize, add_type: bool, out: &mut String) -> usize {
    let Some(ty) = coords.get(at).copied().and_then(GeometryType::from_code) else {
        return coords.len();
    };
    let count = count_at(coords, at + 1);

    if add_type {
        out.push_str(ty.wkt_keyword());
        out.push(' ');
    }
    if count == 0 {
        out.push_str("EMPTY");
        return at + 2;
    }

    match ty {
        GeometryType::Point | GeometryType::LineString => {
            write_coordinate_list(coords, at + 2, count, out)
        }
        GeometryType::Polygon => write_rings(coords, at + 2, count, out),
        GeometryType::MultiPoint | GeometryType::MultiLineString | GeometryType::MultiPolygon => {
            write_sub_geometries(coords, at + 2, count, false, out)
        }
        GeometryType::GeometryCollection => write_sub_geometries(coords, at + 2, count, true, out),
    }
}

fn write_pair(coords: &[Scalar], at: usize, out: &mut String) {
    let x = coords.get(at).copied().unwrap_or(0.0);
    let y = coords.get(at + 1).copied().unwrap_or(0.0);
    out.push_str(&format_scalar(x));
    out.push(' ');
    out.push_str(&format_scalar(y));
}

fn write_coordinate_list(coords: &[Scalar], at: usize, count: usize, out: &mut String) -> usize {
    out.push('(');
    for i in 0..count {
        if i > 0 {
            out.push_str(", ");
        }
        write_pair(coords, at + 3 * i + 1, out);
    }
    out.push(')');
    at + 3 * count
}

/// Polygon body: an extra paren level per ring, switching ring on MOVETO.
fn write_rings(coords: &[Scalar], at: usize, count: usize, out: &mut String) -> usize {
    out.push('(');
    for i in 0..count {
        let op = coords.get(at + 3 * i).copied().unwrap_or(LINETO);
        if i == 0 {
            out.push('(');
        } else if op == MOVETO {
            out.push_str("), (");
        } else {
            out.push_str(", ");
        }
        write_pair(coords, at + 3 * i + 1, out);
    }
    out.push_str("))");
    at + 3 * count
}

fn write_sub_geometries(
    coords: &[Scalar],
    mut at: usize,
    count: usize,
    add_type: bool,
    out: &mut String,
) -> usize {
    out.push('(');
    for i in 0..count {
        if i > 0 {
            out.push_str(", ");
        }
        at = write_geometry(coords, at, add_type, out);
    }
    out.push(')');
    at
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
#[expect(
    clippy::float_cmp,
    reason = "exact float comparisons are intentional in tests"
)]
mod tests {
    use super::*;
    use crate::error::GeometryErrorKind;

    fn packed(wkt: &str) -> Vec<Scalar> {
        parse_wkt(wkt).unwrap().coords().to_vec()
    }

    fn round_trip(wkt: &str) -> String {
        parse_wkt(wkt).unwrap().to_wkt()
    }

    // -- parsing --

    #[test]
    fn point() {
        assert_eq!(packed("POINT (10 20)"), vec![1.0, 1.0, 0.0, 10.0, 20.0]);
    }

    #[test]
    fn point_negative_and_decimal() {
        assert_eq!(
            packed("POINT (-1.5 .25)"),
            vec![1.0, 1.0, 0.0, -1.5, 0.25]
        );
    }

    #[test]
    fn point_empty() {
        assert_eq!(packed("POINT EMPTY"), vec![1.0, 0.0]);
    }

    #[test]
    fn linestring() {
        assert_eq!(
            packed("LINESTRING (0 0, 10 10, 20 0)"),
            vec![2.0, 3.0, 0.0, 0.0, 0.0, 1.0, 10.0, 10.0, 1.0, 20.0, 0.0]
        );
    }

    #[test]
    fn polygon_single_ring() {
        assert_eq!(
            packed("POLYGON ((0 0, 4 0, 4 4, 0 0))"),
            vec![
                3.0, 4.0, //
                0.0, 0.0, 0.0, //
                1.0, 4.0, 0.0, //
                1.0, 4.0, 4.0, //
                1.0, 0.0, 0.0,
            ]
        );
    }

    #[test]
    fn polygon_with_hole_marks_second_ring_moveto() {
        let c = packed("POLYGON ((0 0, 9 0, 9 9, 0 0), (2 2, 3 2, 3 3, 2 2))");
        assert_eq!(c[1], 8.0, "total vertex count across rings");
        assert_eq!(c[2], MOVETO);
        assert_eq!(c[14], MOVETO, "second ring starts with MOVETO");
        assert_eq!(c[17], LINETO);
    }

    #[test]
    fn polygon_empty() {
        assert_eq!(packed("POLYGON EMPTY"), vec![3.0, 0.0]);
    }

    #[test]
    fn multipoint_bare_form() {
        assert_eq!(
            packed("MULTIPOINT (1 2, 3 4)"),
            vec![
                4.0, 2.0, //
                1.0, 1.0, 0.0, 1.0, 2.0, //
                1.0, 1.0, 0.0, 3.0, 4.0,
            ]
        );
    }

    #[test]
    fn multipoint_nested_form() {
        assert_eq!(packed("MULTIPOINT ((1 2), (3 4))"), packed("MULTIPOINT (1 2, 3 4)"));
    }

    #[test]
    fn multipoint_mixed_forms() {
        assert_eq!(packed("MULTIPOINT ((1 2), 3 4)"), packed("MULTIPOINT (1 2, 3 4)"));
    }

    #[test]
    fn multilinestring_tags_each_part_as_linestring() {
        assert_eq!(
            packed("MULTILINESTRING ((0 0, 1 1), (2 2, 3 3))"),
            vec![
                5.0, 2.0, //
                2.0, 2.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, //
                2.0, 2.0, 0.0, 2.0, 2.0, 1.0, 3.0, 3.0,
            ]
        );
    }

    #[test]
    fn multipolygon() {
        assert_eq!(
            packed("MULTIPOLYGON (((0 0, 1 0, 1 1, 0 0)))"),
            vec![
                6.0, 1.0, //
                3.0, 4.0, //
                0.0, 0.0, 0.0, //
                1.0, 1.0, 0.0, //
                1.0, 1.0, 1.0, //
                1.0, 0.0, 0.0,
            ]
        );
    }

    #[test]
    fn geometry_collection() {
        assert_eq!(
            packed("GEOMETRYCOLLECTION (POINT (1 2), LINESTRING (0 0, 5 5))"),
            vec![
                7.0, 2.0, //
                1.0, 1.0, 0.0, 1.0, 2.0, //
                2.0, 2.0, 0.0, 0.0, 0.0, 1.0, 5.0, 5.0,
            ]
        );
    }

    #[test]
    fn geometry_collection_empty() {
        assert_eq!(packed("GEOMETRYCOLLECTION EMPTY"), vec![7.0, 0.0]);
    }

    #[test]
    fn lowercase_keywords_accepted() {
        assert_eq!(packed("point (10 20)"), vec![1.0, 1.0, 0.0, 10.0, 20.0]);
    }

    // -- parse errors --

    #[test]
    fn unknown_keyword_rejected() {
        let err = parse_wkt("TRIANGLE (0 0, 1 1, 2 0)").unwrap_err();
        assert_eq!(err.kind, GeometryErrorKind::InvalidText);
        assert!(err.message.contains("TRIANGLE"), "message: {}", err.message);
    }

    #[test]
    fn dangling_x_rejected() {
        let err = parse_wkt("POINT (10)").unwrap_err();
        assert!(err.message.contains("no Y"), "message: {}", err.message);
    }

    #[test]
    fn unmatched_paren_rejected() {
        assert!(parse_wkt("LINESTRING (0 0, 1 1").is_err());
    }

    #[test]
    fn malformed_number_rejected() {
        assert!(parse_wkt("POINT (10 2x0)").is_err());
    }

    #[test]
    fn trailing_tokens_rejected() {
        assert!(parse_wkt("POINT (1 2) POINT (3 4)").is_err());
    }

    #[test]
    fn empty_string_rejected() {
        assert!(parse_wkt("").is_err());
        assert!(parse_wkt("   ").is_err());
    }

    // -- serializing --

    #[test]
    fn point_round_trip() {
        assert_eq!(round_trip("POINT (10 20)"), "POINT (10 20)");
    }

    #[test]
    fn empty_round_trips() {
        assert_eq!(round_trip("POINT EMPTY"), "POINT EMPTY");
        assert_eq!(round_trip("POLYGON EMPTY"), "POLYGON EMPTY");
        assert_eq!(
            round_trip("GEOMETRYCOLLECTION EMPTY"),
            "GEOMETRYCOLLECTION EMPTY"
        );
    }

    #[test]
    fn linestring_round_trip() {
        assert_eq!(
            round_trip("LINESTRING (0 0, 10 10, 20 0)"),
            "LINESTRING (0 0, 10 10, 20 0)"
        );
    }

    #[test]
    fn polygon_round_trip_preserves_rings() {
        assert_eq!(
            round_trip("POLYGON ((0 0, 9 0, 9 9, 0 0), (2 2, 3 2, 3 3, 2 2))"),
            "POLYGON ((0 0, 9 0, 9 9, 0 0), (2 2, 3 2, 3 3, 2 2))"
        );
    }

    #[test]
    fn multipoint_serializes_nested_form() {
        assert_eq!(
            round_trip("MULTIPOINT (1 2, 3 4)"),
            "MULTIPOINT ((1 2), (3 4))"
        );
    }

    #[test]
    fn multilinestring_round_trip() {
        assert_eq!(
            round_trip("MULTILINESTRING ((0 0, 1 1), (2 2, 3 3))"),
            "MULTILINESTRING ((0 0, 1 1), (2 2, 3 3))"
        );
    }

    #[test]
    fn multipolygon_round_trip() {
        assert_eq!(
            round_trip("MULTIPOLYGON (((0 0, 1 0, 1 1, 0 0)), ((5 5, 6 5, 6 6, 5 5)))"),
            "MULTIPOLYGON (((0 0, 1 0, 1 1, 0 0)), ((5 5, 6 5, 6 6, 5 5)))"
        );
    }

    #[test]
    fn collection_elements_keep_their_keywords() {
        assert_eq!(
            round_trip("GEOMETRYCOLLECTION (POINT (1 2), LINESTRING (0 0, 5 5))"),
            "GEOMETRYCOLLECTION (POINT (1 2), LINESTRING (0 0, 5 5))"
        );
    }

    #[test]
    fn collection_nesting_two_subtypes_round_trips() {
        let wkt = "GEOMETRYCOLLECTION (MULTIPOINT ((1 2), (3 4)), POLYGON ((0 0, 1 0, 1 1, 0 0)))";
        assert_eq!(round_trip(wkt), wkt);
        // and parse(serialize(g)) == g
        let g = parse_wkt(wkt).unwrap();
        assert_eq!(parse_wkt(&g.to_wkt()).unwrap(), g);
    }

    #[test]
    fn fractional_coordinates_survive() {
        assert_eq!(round_trip("POINT (1.5 -2.25)"), "POINT (1.5 -2.25)");
    }
}
