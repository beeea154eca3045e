//! The Batch wire format (§4.4, §6): the unit the partitioning engine
//! streams to a worker's Agent. An empty batch is the end-of-stream
//! sentinel.

use crate::error::Status;
use crate::geometry::{Class, DataType, Shape};

fn data_type_tag(dt: DataType) -> i32 {
    match dt {
        DataType::Point => 0,
        DataType::LineString => 1,
        DataType::Rectangle => 2,
        DataType::Polygon => 3,
    }
}

fn data_type_from_tag(tag: i32) -> Result<DataType, Status> {
    match tag {
        0 => Ok(DataType::Point),
        1 => Ok(DataType::LineString),
        2 => Ok(DataType::Rectangle),
        3 => Ok(DataType::Polygon),
        _ => Err(Status::InvalidDataType),
    }
}

fn class_tag(c: Class) -> i32 {
    match c {
        Class::A => 0,
        Class::B => 1,
        Class::C => 2,
        Class::D => 3,
    }
}

fn class_from_tag(tag: i32) -> Result<Class, Status> {
    match tag {
        0 => Ok(Class::A),
        1 => Ok(Class::B),
        2 => Ok(Class::C),
        3 => Ok(Class::D),
        _ => Err(Status::InvalidPartition(format!("unknown two-layer class tag {tag}"))),
    }
}

/// One object's record inside a Batch: id, its partition assignments,
/// and its vertex coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchObject {
    pub rec_id: u64,
    pub partitions: Vec<(i32, Class)>,
    pub coords: Vec<(f64, f64)>,
}

impl BatchObject {
    pub fn from_shape(shape: &Shape) -> Self {
        BatchObject {
            rec_id: shape.id,
            partitions: shape.partitions.clone(),
            coords: shape.serialize_vertices().to_vec(),
        }
    }
}

/// A per-worker flush unit (§4.4). `objects` empty means end-of-stream.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub data_type: DataType,
    pub objects: Vec<BatchObject>,
}

impl Batch {
    pub fn new(data_type: DataType, objects: Vec<BatchObject>) -> Self {
        Batch { data_type, objects }
    }

    /// The end-of-stream sentinel: an empty batch of the given type.
    pub fn end_of_stream(data_type: DataType) -> Self {
        Batch {
            data_type,
            objects: Vec::new(),
        }
    }

    pub fn is_end_of_stream(&self) -> bool {
        self.objects.is_empty()
    }

    /// serialise into the exact flat layout of §6's Batch payload.
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&data_type_tag(self.data_type).to_le_bytes());
        buf.extend_from_slice(&(self.objects.len() as u64).to_le_bytes());
        for obj in &self.objects {
            buf.extend_from_slice(&obj.rec_id.to_le_bytes());
            buf.extend_from_slice(&(obj.partitions.len() as i32).to_le_bytes());
            for &(cell_id, class) in &obj.partitions {
                buf.extend_from_slice(&cell_id.to_le_bytes());
                buf.extend_from_slice(&class_tag(class).to_le_bytes());
            }
            buf.extend_from_slice(&(obj.coords.len() as i32).to_le_bytes());
            for &(x, y) in &obj.coords {
                buf.extend_from_slice(&x.to_le_bytes());
                buf.extend_from_slice(&y.to_le_bytes());
            }
        }
        buf
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Self, Status> {
        let mut cur = Cursor::new(bytes);
        let data_type = data_type_from_tag(cur.read_i32()?)?;
        let object_count = cur.read_u64()?;
        let mut objects = Vec::with_capacity(object_count as usize);
        for _ in 0..object_count {
            let rec_id = cur.read_u64()?;
            let partition_count = cur.read_i32()?;
            let mut partitions = Vec::with_capacity(partition_count.max(0) as usize);
            for _ in 0..partition_count {
                let cell_id = cur.read_i32()?;
                let class = class_from_tag(cur.read_i32()?)?;
                partitions.push((cell_id, class));
            }
            let vertex_count = cur.read_i32()?;
            let mut coords = Vec::with_capacity(vertex_count.max(0) as usize);
            for _ in 0..vertex_count {
                let x = cur.read_f64()?;
                let y = cur.read_f64()?;
                coords.push((x, y));
            }
            objects.push(BatchObject { rec_id, partitions, coords });
        }
        Ok(Batch { data_type, objects })
    }
}

/// A minimal cursor over a byte slice, just enough for the fixed
/// little-endian primitives the Batch layout uses.
struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Cursor { bytes, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], Status> {
        if self.pos + n > self.bytes.len() {
            return Err(Status::Io("truncated batch payload".into()));
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn read_i32(&mut self) -> Result<i32, Status> {
        Ok(i32::from_le_bytes(self.take(4)?.try_into().unwrap()))
    }

    fn read_u64(&mut self) -> Result<u64, Status> {
        Ok(u64::from_le_bytes(self.take(8)?.try_into().unwrap()))
    }

    fn read_f64(&mut self) -> Result<f64, Status> {
        Ok(f64::from_le_bytes(self.take(8)?.try_into().unwrap()))
    }
}
