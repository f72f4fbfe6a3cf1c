//! Geometry model for the Terraplot map-plotting engine.
//!
//! Geometries are stored as a single packed `f64` array shared by every
//! subtype (point, line, polygon, their multi forms, and collections).
//! The codecs in this crate — WKT parse/serialize, GeoJSON serialize,
//! bounding box, affine transform — are matched recursive traversals over
//! that one layout.

pub mod bbox;
pub mod error;
pub mod geojson;
pub mod transform;
pub mod types;
pub mod wkt;

pub use bbox::Rect;
pub use error::{GeomResult, GeometryError, GeometryErrorKind};
pub use transform::Transform;
pub use types::{Geometry, GeometryType, Scalar};
