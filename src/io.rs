//! Full-file geometry ingestion (§6 "WKT/CSV ingestion"): a thin,
//! swappable boundary over the single-shape parsers in
//! [`crate::geometry::wkt`]. Binary ingestion reuses the Batch wire
//! layout directly and lives in [`crate::partition::batch`].

use std::fs;
use std::path::Path;

use crate::dataset::FileType;
use crate::error::Status;
use crate::geometry::{wkt, DataType, Shape};

/// Reads every record out of a geometry file into owned `Shape`s.
/// `read_all` assigns each record a sequential id starting at zero
/// within the file; callers that need globally unique ids remap
/// afterwards.
pub trait GeometryReader {
    fn read_all(&self, path: &Path, data_type: DataType) -> Result<Vec<Shape>, Status>;
}

pub struct WktReader;

impl GeometryReader for WktReader {
    fn read_all(&self, path: &Path, _data_type: DataType) -> Result<Vec<Shape>, Status> {
        let text = fs::read_to_string(path).map_err(|e| Status::Io(e.to_string()))?;
        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .enumerate()
            .map(|(i, line)| wkt::parse(i as u64, line))
            .collect()
    }
}

/// `id,x,y` for points; `id,x0,y0;x1,y1;...` for the other data types
/// (§6 "WKT/CSV ingestion"). Rectangles are encoded as their two
/// corner points, `id,xMin,yMin;xMax,yMax`.
pub struct CsvReader;

impl GeometryReader for CsvReader {
    fn read_all(&self, path: &Path, data_type: DataType) -> Result<Vec<Shape>, Status> {
        let text = fs::read_to_string(path).map_err(|e| Status::Io(e.to_string()))?;
        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| parse_csv_line(line, data_type))
            .collect()
    }
}

fn parse_csv_line(line: &str, data_type: DataType) -> Result<Shape, Status> {
    let (id_str, rest) = line.split_once(',').ok_or(Status::InvalidGeometry)?;
    let id: u64 = id_str.trim().parse().map_err(|_| Status::InvalidGeometry)?;

    let mut shape = Shape::new_empty(id, data_type);
    for vertex in rest.split(';') {
        let (x_str, y_str) = vertex.split_once(',').ok_or(Status::InvalidGeometry)?;
        let x: f64 = x_str.trim().parse().map_err(|_| Status::InvalidGeometry)?;
        let y: f64 = y_str.trim().parse().map_err(|_| Status::InvalidGeometry)?;
        shape.append_vertex(x, y);
    }
    if shape.vertices.is_empty() {
        return Err(Status::InvalidGeometry);
    }
    shape.compute_mbr()?;
    Ok(shape)
}

/// Resolve the reader for a configured [`FileType`]. `Binary` has no
/// file-reader realization here: it is read off the wire as a `Batch`,
/// never as a standalone file.
pub fn reader_for(file_type: FileType) -> Result<Box<dyn GeometryReader>, Status> {
    match file_type {
        FileType::Wkt => Ok(Box::new(WktReader)),
        FileType::Csv => Ok(Box::new(CsvReader)),
        FileType::Binary => Err(Status::UnsupportedCombination(
            "binary files are read as Batch streams, not GeometryReader::read_all".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn wkt_reader_parses_one_shape_per_line() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "POINT (1 2)").unwrap();
        writeln!(file, "POINT (3 4)").unwrap();
        let shapes = WktReader.read_all(file.path(), DataType::Point).unwrap();
        assert_eq!(shapes.len(), 2);
        assert_eq!(shapes[1].vertices[0], (3.0, 4.0));
    }

    #[test]
    fn csv_reader_parses_points() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "7,1.5,2.5").unwrap();
        let shapes = CsvReader.read_all(file.path(), DataType::Point).unwrap();
        assert_eq!(shapes.len(), 1);
        assert_eq!(shapes[0].id, 7);
        assert_eq!(shapes[0].vertices, vec![(1.5, 2.5)]);
    }

    #[test]
    fn csv_reader_parses_multi_vertex_rows() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "1,0,0;10,0;10,10;0,10").unwrap();
        let shapes = CsvReader.read_all(file.path(), DataType::Polygon).unwrap();
        assert_eq!(shapes[0].vertices.len(), 4);
    }

    #[test]
    fn binary_file_type_has_no_reader() {
        assert!(reader_for(FileType::Binary).is_err());
    }
}
