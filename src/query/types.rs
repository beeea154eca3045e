//! Query and QueryResult discriminated unions (§3).

use crate::geometry::{Mbr, Predicate};

/// The eight boolean topology predicates plus the two that need more
/// than a single bit of output (§3 Query predicates).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryPredicate {
    Topology(Predicate),
    FindRelation,
    Distance,
}

/// The fixed order topology counters/collections are reported in
/// (`TopologyCount`/`TopologyCollect`, §3 QueryResult).
pub const TOPOLOGY_ORDER: [Predicate; 8] = [
    Predicate::Intersects,
    Predicate::Disjoint,
    Predicate::Inside,
    Predicate::Contains,
    Predicate::Covers,
    Predicate::CoveredBy,
    Predicate::Meet,
    Predicate::Equal,
];

pub fn topology_index(p: Predicate) -> usize {
    TOPOLOGY_ORDER.iter().position(|&q| q == p).expect("exhaustive TOPOLOGY_ORDER")
}

/// How a query wants its matches summarised (§3 Query).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultType {
    Count,
    Collect,
    Knn,
}

/// The discriminated Query union (§3).
#[derive(Debug, Clone)]
pub enum Query {
    Range {
        query_id: u32,
        dataset_id: u64,
        window: Mbr,
        result_type: ResultType,
    },
    Join {
        query_id: u32,
        r_dataset_id: u64,
        s_dataset_id: u64,
        predicate: QueryPredicate,
        result_type: ResultType,
    },
    Knn {
        query_id: u32,
        dataset_id: u64,
        point: (f64, f64),
        k: usize,
    },
}

impl Query {
    pub fn query_id(&self) -> u32 {
        match self {
            Query::Range { query_id, .. } => *query_id,
            Query::Join { query_id, .. } => *query_id,
            Query::Knn { query_id, .. } => *query_id,
        }
    }
}

/// A bounded max-heap entry for kNN results: ordered by distance so
/// the heap's peek is always the farthest of the current top-k.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KnnHit {
    pub distance: f64,
    pub object_id: u64,
}

impl Eq for KnnHit {}

impl Ord for KnnHit {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.distance
            .partial_cmp(&other.distance)
            .unwrap_or(std::cmp::Ordering::Equal)
    }
}

impl PartialOrd for KnnHit {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// The polymorphic QueryResult union (§3). `Topology*` variants are
/// always full eight-slot arrays/vectors indexed by [`TOPOLOGY_ORDER`].
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    Count(u64),
    CollectIds(Vec<u64>),
    CollectPairs(Vec<(u64, u64)>),
    TopologyCount([u64; 8]),
    TopologyCollect([Vec<(u64, u64)>; 8]),
    Knn(Vec<KnnHit>),
}

impl QueryResult {
    pub fn empty_for(result_type: ResultType, predicate: Option<QueryPredicate>) -> Self {
        match (result_type, predicate) {
            (ResultType::Count, Some(QueryPredicate::FindRelation)) => QueryResult::TopologyCount([0; 8]),
            (ResultType::Count, _) => QueryResult::Count(0),
            (ResultType::Collect, Some(QueryPredicate::FindRelation)) => {
                QueryResult::TopologyCollect(Default::default())
            }
            (ResultType::Collect, _) => QueryResult::CollectPairs(Vec::new()),
            (ResultType::Knn, _) => QueryResult::Knn(Vec::new()),
        }
    }

    /// serialise into the QUERY_RESULT/QUERY_BATCH_RESULT wire payload
    /// (§6): a variant tag followed by the variant's own flat layout.
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        match self {
            QueryResult::Count(n) => {
                buf.extend_from_slice(&0i32.to_le_bytes());
                buf.extend_from_slice(&n.to_le_bytes());
            }
            QueryResult::CollectIds(ids) => {
                buf.extend_from_slice(&1i32.to_le_bytes());
                write_u64_seq(&mut buf, ids.iter().copied());
            }
            QueryResult::CollectPairs(pairs) => {
                buf.extend_from_slice(&2i32.to_le_bytes());
                write_pair_seq(&mut buf, pairs.iter().copied());
            }
            QueryResult::TopologyCount(counts) => {
                buf.extend_from_slice(&3i32.to_le_bytes());
                for &n in counts {
                    buf.extend_from_slice(&n.to_le_bytes());
                }
            }
            QueryResult::TopologyCollect(slots) => {
                buf.extend_from_slice(&4i32.to_le_bytes());
                for slot in slots {
                    write_pair_seq(&mut buf, slot.iter().copied());
                }
            }
            QueryResult::Knn(hits) => {
                buf.extend_from_slice(&5i32.to_le_bytes());
                buf.extend_from_slice(&(hits.len() as u64).to_le_bytes());
                for hit in hits {
                    buf.extend_from_slice(&hit.distance.to_le_bytes());
                    buf.extend_from_slice(&hit.object_id.to_le_bytes());
                }
            }
        }
        buf
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Self, crate::error::Status> {
        let mut cur = Cursor::new(bytes);
        let tag = cur.read_i32()?;
        Ok(match tag {
            0 => QueryResult::Count(cur.read_u64()?),
            1 => QueryResult::CollectIds(read_u64_seq(&mut cur)?),
            2 => QueryResult::CollectPairs(read_pair_seq(&mut cur)?),
            3 => {
                let mut counts = [0u64; 8];
                for slot in &mut counts {
                    *slot = cur.read_u64()?;
                }
                QueryResult::TopologyCount(counts)
            }
            4 => {
                let mut slots: [Vec<(u64, u64)>; 8] = Default::default();
                for slot in &mut slots {
                    *slot = read_pair_seq(&mut cur)?;
                }
                QueryResult::TopologyCollect(slots)
            }
            5 => {
                let count = cur.read_u64()?;
                let mut hits = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    let distance = cur.read_f64()?;
                    let object_id = cur.read_u64()?;
                    hits.push(KnnHit { distance, object_id });
                }
                QueryResult::Knn(hits)
            }
            _ => return Err(crate::error::Status::InvalidResultType),
        })
    }
}

fn write_u64_seq(buf: &mut Vec<u8>, items: impl ExactSizeIterator<Item = u64>) {
    buf.extend_from_slice(&(items.len() as u64).to_le_bytes());
    for item in items {
        buf.extend_from_slice(&item.to_le_bytes());
    }
}

fn write_pair_seq(buf: &mut Vec<u8>, items: impl ExactSizeIterator<Item = (u64, u64)>) {
    buf.extend_from_slice(&(items.len() as u64).to_le_bytes());
    for (a, b) in items {
        buf.extend_from_slice(&a.to_le_bytes());
        buf.extend_from_slice(&b.to_le_bytes());
    }
}

fn read_u64_seq(cur: &mut Cursor) -> Result<Vec<u64>, crate::error::Status> {
    let count = cur.read_u64()?;
    let mut out = Vec::with_capacity(count as usize);
    for _ in 0..count {
        out.push(cur.read_u64()?);
    }
    Ok(out)
}

fn read_pair_seq(cur: &mut Cursor) -> Result<Vec<(u64, u64)>, crate::error::Status> {
    let count = cur.read_u64()?;
    let mut out = Vec::with_capacity(count as usize);
    for _ in 0..count {
        out.push((cur.read_u64()?, cur.read_u64()?));
    }
    Ok(out)
}

/// A minimal cursor over a byte slice, mirroring
/// [`crate::partition::batch`]'s primitive reader.
struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Cursor { bytes, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], crate::error::Status> {
        if self.pos + n > self.bytes.len() {
            return Err(crate::error::Status::Io("truncated query result payload".into()));
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn read_i32(&mut self) -> Result<i32, crate::error::Status> {
        Ok(i32::from_le_bytes(self.take(4)?.try_into().unwrap()))
    }

    fn read_u64(&mut self) -> Result<u64, crate::error::Status> {
        Ok(u64::from_le_bytes(self.take(8)?.try_into().unwrap()))
    }

    fn read_f64(&mut self) -> Result<f64, crate::error::Status> {
        Ok(f64::from_le_bytes(self.take(8)?.try_into().unwrap()))
    }
}
