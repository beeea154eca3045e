//! The message envelope and tag taxonomy (§4.1, §6). The envelope is
//! the one thing every transport binding (in-process channels here, a
//! socket elsewhere) must agree on.

use crate::error::Status;

/// The closed tag enum (§6): instruction tags carry no payload, data
/// tags carry a request payload, response tags carry ACK/NACK/result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    // Instruction tags
    Fin,
    PartitionInit,
    LoadDataset,
    BuildIndex,
    Unload,
    // Data tags
    SysInfo,
    DatasetMetadata,
    PrepareDataset,
    BatchPoint,
    BatchLineString,
    BatchRectangle,
    BatchPolygon,
    AprilCreate,
    GlobalDataspace,
    Query,
    QueryBatchRange,
    QueryBatchKnn,
    // Response tags
    Ack,
    Nack,
    DatasetIndex,
    QueryResult,
    QueryBatchResult,
}

impl Tag {
    fn discriminant(self) -> i32 {
        match self {
            Tag::Fin => 0,
            Tag::PartitionInit => 1,
            Tag::LoadDataset => 2,
            Tag::BuildIndex => 3,
            Tag::Unload => 4,
            Tag::SysInfo => 10,
            Tag::DatasetMetadata => 11,
            Tag::PrepareDataset => 12,
            Tag::BatchPoint => 13,
            Tag::BatchLineString => 14,
            Tag::BatchRectangle => 15,
            Tag::BatchPolygon => 16,
            Tag::AprilCreate => 17,
            Tag::GlobalDataspace => 18,
            Tag::Query => 19,
            Tag::QueryBatchRange => 20,
            Tag::QueryBatchKnn => 21,
            Tag::Ack => 30,
            Tag::Nack => 31,
            Tag::DatasetIndex => 32,
            Tag::QueryResult => 33,
            Tag::QueryBatchResult => 34,
        }
    }

    fn from_discriminant(d: i32) -> Result<Self, Status> {
        Ok(match d {
            0 => Tag::Fin,
            1 => Tag::PartitionInit,
            2 => Tag::LoadDataset,
            3 => Tag::BuildIndex,
            4 => Tag::Unload,
            10 => Tag::SysInfo,
            11 => Tag::DatasetMetadata,
            12 => Tag::PrepareDataset,
            13 => Tag::BatchPoint,
            14 => Tag::BatchLineString,
            15 => Tag::BatchRectangle,
            16 => Tag::BatchPolygon,
            17 => Tag::AprilCreate,
            18 => Tag::GlobalDataspace,
            19 => Tag::Query,
            20 => Tag::QueryBatchRange,
            21 => Tag::QueryBatchKnn,
            30 => Tag::Ack,
            31 => Tag::Nack,
            32 => Tag::DatasetIndex,
            33 => Tag::QueryResult,
            34 => Tag::QueryBatchResult,
            _ => return Err(Status::Communication(format!("unknown tag discriminant {d}"))),
        })
    }

    pub fn is_response(self) -> bool {
        matches!(
            self,
            Tag::Ack | Tag::Nack | Tag::DatasetIndex | Tag::QueryResult | Tag::QueryBatchResult
        )
    }
}

/// `{sourceRank, tag, payload-length, payload-bytes}` (§4.1).
#[derive(Debug, Clone)]
pub struct Envelope {
    pub source_rank: u32,
    pub tag: Tag,
    pub payload: Vec<u8>,
}

impl Envelope {
    pub fn new(source_rank: u32, tag: Tag, payload: Vec<u8>) -> Self {
        Envelope { source_rank, tag, payload }
    }

    pub fn ack(source_rank: u32) -> Self {
        Envelope::new(source_rank, Tag::Ack, Vec::new())
    }

    pub fn nack(source_rank: u32, status: &Status) -> Self {
        Envelope::new(source_rank, Tag::Nack, status.to_string().into_bytes())
    }

    pub fn fin(source_rank: u32) -> Self {
        Envelope::new(source_rank, Tag::Fin, Vec::new())
    }

    /// `tag:int32, length:int32, bytes...` (§6 wire protocol), with
    /// `sourceRank` prefixed for the in-process transport's own
    /// bookkeeping (real deployments would derive it from the socket).
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(12 + self.payload.len());
        buf.extend_from_slice(&self.source_rank.to_le_bytes());
        buf.extend_from_slice(&self.tag.discriminant().to_le_bytes());
        buf.extend_from_slice(&(self.payload.len() as i32).to_le_bytes());
        buf.extend_from_slice(&self.payload);
        buf
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Self, Status> {
        if bytes.len() < 12 {
            return Err(Status::Communication("envelope too short".into()));
        }
        let source_rank = u32::from_le_bytes(bytes[0..4].try_into().unwrap());
        let tag = Tag::from_discriminant(i32::from_le_bytes(bytes[4..8].try_into().unwrap()))?;
        let len = i32::from_le_bytes(bytes[8..12].try_into().unwrap()) as usize;
        let payload = bytes.get(12..12 + len).ok_or_else(|| Status::Communication("truncated envelope payload".into()))?;
        Ok(Envelope {
            source_rank,
            tag,
            payload: payload.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_round_trips() {
        let e = Envelope::new(2, Tag::Query, vec![1, 2, 3, 4]);
        let bytes = e.serialize();
        let back = Envelope::deserialize(&bytes).unwrap();
        assert_eq!(back.source_rank, 2);
        assert_eq!(back.tag, Tag::Query);
        assert_eq!(back.payload, vec![1, 2, 3, 4]);
    }

    #[test]
    fn nack_carries_the_status_message() {
        let status = Status::InvalidGeometry;
        let e = Envelope::nack(1, &status);
        assert_eq!(e.tag, Tag::Nack);
        assert!(!e.payload.is_empty());
    }
}
