//! A minimal, well-understood WKT reader for the four supported
//! variants. Full-file ingestion lives behind [`crate::io::GeometryReader`];
//! this module implements the single-shape `set-from-well-known-text`
//! operation of §4.6.

use super::{DataType, Shape};
use crate::error::Status;

fn parse_coords(body: &str) -> Result<Vec<(f64, f64)>, Status> {
    let body = body.trim().trim_start_matches('(').trim_end_matches(')');
    body.split(',')
        .map(|pair| {
            let mut it = pair.split_whitespace();
            let x: f64 = it
                .next()
                .ok_or(Status::InvalidGeometry)?
                .parse()
                .map_err(|_| Status::InvalidGeometry)?;
            let y: f64 = it
                .next()
                .ok_or(Status::InvalidGeometry)?
                .parse()
                .map_err(|_| Status::InvalidGeometry)?;
            Ok((x, y))
        })
        .collect()
}

/// Strip one layer of balanced parens around a WKT body, e.g. turn
/// `((1 2, 3 4))` for POLYGON into `1 2, 3 4`.
fn inner_ring(body: &str) -> &str {
    let body = body.trim();
    let body = body.strip_prefix('(').unwrap_or(body);
    body.strip_suffix(')').unwrap_or(body)
}

pub fn parse(id: u64, text: &str) -> Result<Shape, Status> {
    let text = text.trim();
    let (tag, rest) = text.split_once('(').ok_or(Status::InvalidGeometry)?;
    let tag = tag.trim().to_ascii_uppercase();
    let body = format!("({rest}");

    let (data_type, verts): (DataType, Vec<(f64, f64)>) = match tag.as_str() {
        "POINT" => (DataType::Point, parse_coords(&body)?),
        "LINESTRING" => (DataType::LineString, parse_coords(&body)?),
        "POLYGON" => (DataType::Polygon, parse_coords(inner_ring(body.trim()))?),
        "RECTANGLE" | "ENVELOPE" => (DataType::Rectangle, parse_coords(&body)?),
        _ => return Err(Status::InvalidDataType),
    };

    if verts.is_empty() {
        return Err(Status::InvalidGeometry);
    }

    let mut shape = Shape::new_empty(id, data_type);
    for (x, y) in verts {
        shape.append_vertex(x, y);
    }
    // A closed polygon ring whose last vertex duplicates the first is
    // stored without the duplicate; ring closure is implicit (see
    // `predicates::ring_segments`).
    if shape.data_type == DataType::Polygon && shape.vertices.len() > 1 {
        let first = shape.vertices[0];
        let last = *shape.vertices.last().unwrap();
        if (first.0 - last.0).abs() < 1e-12 && (first.1 - last.1).abs() < 1e-12 {
            shape.vertices.pop();
        }
    }
    shape.compute_mbr()?;
    Ok(shape)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_point() {
        let s = parse(1, "POINT (3 4)").unwrap();
        assert_eq!(s.data_type, DataType::Point);
        assert_eq!(s.vertices, vec![(3.0, 4.0)]);
    }

    #[test]
    fn parses_polygon_drops_closing_duplicate() {
        let s = parse(1, "POLYGON ((0 0, 10 0, 10 10, 0 10, 0 0))").unwrap();
        assert_eq!(s.data_type, DataType::Polygon);
        assert_eq!(s.vertices.len(), 4);
    }

    #[test]
    fn rejects_unknown_tag() {
        assert!(matches!(parse(1, "BLOB (1 2)"), Err(Status::InvalidDataType)));
    }
}
