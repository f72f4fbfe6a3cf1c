//! GeoJSON serializer for packed geometry arrays.
//!
//! Simple types emit `{"type": "<Name>", "coordinates": [...]}`, with
//! `null` coordinates for an empty geometry. GEOMETRYCOLLECTION emits
//! `{"type": "GeometryCollection", "geometries": [...]}` and no
//! "coordinates" member; its elements always carry their own type tag.
//!
//! The document is built with `serde_json` (the `preserve_order` feature
//! keeps `type` ahead of `coordinates`). Every recursive helper returns
//! the next unread array index so the caller continues past a consumed
//! sub-geometry.

use serde_json::{json, Value as Json};

use crate::types::{GeometryType, Scalar};

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Serialize a packed geometry array to a GeoJSON geometry object.
#[must_use]
pub(crate) fn format_geojson(coords: &[Scalar]) -> String {
    let (value, _) = geometry_object(coords, 0);
    value.to_string()
}

// ---------------------------------------------------------------------------
// Recursive traversal
// ---------------------------------------------------------------------------

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn count_at(coords: &[Scalar], at: usize) -> usize {
    coords.get(at).copied().unwrap_or(0.0) as usize
}

/// Build the full GeoJSON object for the record at `at`; return it and the
/// next unread index.
fn geometry_object(coords: &[Scalar], at: usize) -> (Json, usize) {
    let Some(ty) = coords.get(at).copied().and_then(GeometryType::from_code) else {
        return (Json::Null, coords.len());
    };
    if ty == GeometryType::GeometryCollection {
        let count = count_at(coords, at + 1);
        let mut members = Vec::with_capacity(count);
        let mut next = at + 2;
        for _ in 0..count {
            let (member, after) = geometry_object(coords, next);
            members.push(member);
            next = after;
        }
        return (
            json!({ "type": "GeometryCollection", "geometries": members }),
            next,
        );
    }

    let (c, next) = coordinates_value(coords, at);
    (json!({ "type": ty.geojson_name(), "coordinates": c }), next)
}

/// Build the "coordinates" member for the record at `at`; return it and
/// the next unread index. Empty geometries yield `null`.
fn coordinates_value(coords: &[Scalar], at: usize) -> (Json, usize) {
    let Some(ty) = coords.get(at).copied().and_then(GeometryType::from_code) else {
        return (Json::Null, coords.len());
    };
    let count = count_at(coords, at + 1);
    let body = at + 2;
    if count == 0 {
        return (Json::Null, body);
    }

    match ty {
        GeometryType::Point => (pair(coords, body), body + 3),
        GeometryType::LineString => (pair_list(coords, body, count), body + 3 * count),
        GeometryType::Polygon => (rings(coords, body, count), body + 3 * count),
        GeometryType::MultiPoint
        | GeometryType::MultiLineString
        | GeometryType::MultiPolygon
        | GeometryType::GeometryCollection => {
            let mut members = Vec::with_capacity(count);
            let mut next = body;
            for _ in 0..count {
                let (member, after) = coordinates_value(coords, next);
                members.push(member);
                next = after;
            }
            (Json::Array(members), next)
        }
    }
}

/// `[x, y]` for the pair whose segment op is at `at`.
fn pair(coords: &[Scalar], at: usize) -> Json {
    let x = coords.get(at + 1).copied().unwrap_or(0.0);
    let y = coords.get(at + 2).copied().unwrap_or(0.0);
    json!([x, y])
}

/// `[[x, y], ...]` for `count` consecutive pairs.
fn pair_list(coords: &[Scalar], at: usize, count: usize) -> Json {
    Json::Array((0..count).map(|i| pair(coords, at + 3 * i)).collect())
}

/// `[[[x, y], ...], ...]` — one array per ring, split on MOVETO.
fn rings(coords: &[Scalar], at: usize, count: usize) -> Json {
    let mut all = Vec::new();
    let mut ring = Vec::new();
    for i in 0..count {
        let op = coords.get(at + 3 * i).copied().unwrap_or(1.0);
        if op == crate::types::MOVETO && !ring.is_empty() {
            all.push(Json::Array(std::mem::take(&mut ring)));
        }
        ring.push(pair(coords, at + 3 * i));
    }
    if !ring.is_empty() {
        all.push(Json::Array(ring));
    }
    Json::Array(all)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use crate::wkt::parse_wkt;

    fn geojson(wkt: &str) -> String {
        parse_wkt(wkt).unwrap().to_geojson()
    }

    #[test]
    fn point() {
        assert_eq!(
            geojson("POINT (10 20)"),
            r#"{"type":"Point","coordinates":[10.0,20.0]}"#
        );
    }

    #[test]
    fn empty_polygon_has_null_coordinates() {
        assert_eq!(
            geojson("POLYGON EMPTY"),
            r#"{"type":"Polygon","coordinates":null}"#
        );
    }

    #[test]
    fn linestring() {
        assert_eq!(
            geojson("LINESTRING (0 0, 10 10)"),
            r#"{"type":"LineString","coordinates":[[0.0,0.0],[10.0,10.0]]}"#
        );
    }

    #[test]
    fn polygon_rings_split_on_moveto() {
        assert_eq!(
            geojson("POLYGON ((0 0, 4 0, 4 4, 0 0), (1 1, 2 1, 2 2, 1 1))"),
            concat!(
                r#"{"type":"Polygon","coordinates":"#,
                r#"[[[0.0,0.0],[4.0,0.0],[4.0,4.0],[0.0,0.0]],"#,
                r#"[[1.0,1.0],[2.0,1.0],[2.0,2.0],[1.0,1.0]]]}"#
            )
        );
    }

    #[test]
    fn multipoint() {
        assert_eq!(
            geojson("MULTIPOINT (1 2, 3 4)"),
            r#"{"type":"MultiPoint","coordinates":[[1.0,2.0],[3.0,4.0]]}"#
        );
    }

    #[test]
    fn multilinestring() {
        assert_eq!(
            geojson("MULTILINESTRING ((0 0, 1 1), (2 2, 3 3))"),
            concat!(
                r#"{"type":"MultiLineString","coordinates":"#,
                r#"[[[0.0,0.0],[1.0,1.0]],[[2.0,2.0],[3.0,3.0]]]}"#
            )
        );
    }

    #[test]
    fn multipolygon() {
        assert_eq!(
            geojson("MULTIPOLYGON (((0 0, 1 0, 1 1, 0 0)))"),
            concat!(
                r#"{"type":"MultiPolygon","coordinates":"#,
                r#"[[[[0.0,0.0],[1.0,0.0],[1.0,1.0],[0.0,0.0]]]]}"#
            )
        );
    }

    #[test]
    fn geometry_collection_members_carry_their_own_type() {
        assert_eq!(
            geojson("GEOMETRYCOLLECTION (POINT (1 2), LINESTRING (0 0, 5 5))"),
            concat!(
                r#"{"type":"GeometryCollection","geometries":["#,
                r#"{"type":"Point","coordinates":[1.0,2.0]},"#,
                r#"{"type":"LineString","coordinates":[[0.0,0.0],[5.0,5.0]]}]}"#
            )
        );
    }

    #[test]
    fn empty_collection() {
        assert_eq!(
            geojson("GEOMETRYCOLLECTION EMPTY"),
            r#"{"type":"GeometryCollection","geometries":[]}"#
        );
    }

    #[test]
    fn fractional_coordinates() {
        assert_eq!(
            geojson("POINT (1.5 -2.25)"),
            r#"{"type":"Point","coordinates":[1.5,-2.25]}"#
        );
    }
}
