//! The Agent role (§4.1): the worker that actually holds geometry and
//! performs the CPU-bound work — partition ingest, index build, APRIL
//! generation, query evaluation.

use std::collections::HashMap;

use tracing::{info, warn};

use crate::dataset::{Dataset, FileType};
use crate::error::Status;
use crate::geometry::{DataType, Mbr, Shape};
use crate::partition::Grid;
use crate::query::{eval_join, eval_knn, eval_range, EvalOptions, EvalOutcome, Query};

/// The operations an Agent can be asked to perform, one variant per
/// instruction/data tag that actually reaches an Agent (§4.1, §6).
/// This is the in-process realization of those tag-keyed payloads;
/// the wire-format [`crate::control::message::Envelope`] carries the
/// control-flow signaling (ACK/NACK/FIN) that genuinely crosses a
/// transport boundary (see DESIGN.md).
#[derive(Debug, Clone)]
pub enum AgentOp {
    PrepareDataset {
        internal_id: u64,
        nickname: String,
        data_type: DataType,
        file_type: FileType,
        path: String,
        dataspace: Mbr,
    },
    Partition {
        internal_id: u64,
        grid: Grid,
        shapes: Vec<Shape>,
    },
    Load {
        internal_id: u64,
        shapes: Vec<Shape>,
    },
    BuildIndex {
        internal_id: u64,
    },
    Query {
        query: Query,
        opts: EvalOptions,
    },
    Unload {
        internal_id: u64,
    },
    Fin,
}

#[derive(Debug, Clone)]
pub enum AgentReply {
    Ack,
    Eval(EvalOutcome),
    Fin,
}

/// One Agent's local state: the datasets it currently holds.
pub struct Agent {
    pub rank: u32,
    datasets: HashMap<u64, Dataset>,
}

impl Agent {
    pub fn new(rank: u32) -> Self {
        Agent {
            rank,
            datasets: HashMap::new(),
        }
    }

    pub fn dataset(&self, internal_id: u64) -> Option<&Dataset> {
        self.datasets.get(&internal_id)
    }

    /// Apply one operation, returning a reply or the `Status` that
    /// becomes a NACK at the Controller (§4.1 Failure semantics,
    /// §7 Propagation).
    pub fn apply(&mut self, op: AgentOp) -> Result<AgentReply, Status> {
        match op {
            AgentOp::PrepareDataset {
                internal_id,
                nickname,
                data_type,
                file_type,
                path,
                dataspace,
            } => {
                self.datasets.insert(
                    internal_id,
                    Dataset::prepare(internal_id, nickname, data_type, file_type, path, dataspace),
                );
                Ok(AgentReply::Ack)
            }
            AgentOp::Partition { internal_id, grid, shapes } => {
                let ds = self
                    .datasets
                    .get_mut(&internal_id)
                    .ok_or(Status::UnknownDataset(internal_id))?;
                ds.partition(&grid, shapes)?;
                Ok(AgentReply::Ack)
            }
            AgentOp::Load { internal_id, shapes } => {
                let ds = self
                    .datasets
                    .get_mut(&internal_id)
                    .ok_or(Status::UnknownDataset(internal_id))?;
                ds.load(shapes)?;
                Ok(AgentReply::Ack)
            }
            AgentOp::BuildIndex { internal_id } => {
                let ds = self
                    .datasets
                    .get_mut(&internal_id)
                    .ok_or(Status::UnknownDataset(internal_id))?;
                ds.build_index()?;
                Ok(AgentReply::Ack)
            }
            AgentOp::Query { query, opts } => {
                let outcome = match &query {
                    Query::Range {
                        dataset_id,
                        window,
                        result_type,
                        ..
                    } => {
                        let ds = self.datasets.get(dataset_id).ok_or(Status::UnknownDataset(*dataset_id))?;
                        eval_range(ds, window, *result_type)?
                    }
                    Query::Join {
                        r_dataset_id,
                        s_dataset_id,
                        predicate,
                        result_type,
                        ..
                    } => {
                        let r = self.datasets.get(r_dataset_id).ok_or(Status::UnknownDataset(*r_dataset_id))?;
                        let s = self.datasets.get(s_dataset_id).ok_or(Status::UnknownDataset(*s_dataset_id))?;
                        eval_join(r, s, *predicate, *result_type, opts)?
                    }
                    Query::Knn { dataset_id, point, k, .. } => {
                        let ds = self.datasets.get(dataset_id).ok_or(Status::UnknownDataset(*dataset_id))?;
                        eval_knn(ds, *point, *k)
                    }
                };
                Ok(AgentReply::Eval(outcome))
            }
            AgentOp::Unload { internal_id } => {
                if let Some(ds) = self.datasets.get_mut(&internal_id) {
                    ds.unload();
                }
                self.datasets.remove(&internal_id);
                Ok(AgentReply::Ack)
            }
            AgentOp::Fin => {
                info!(rank = self.rank, "agent releasing all datasets on FIN");
                self.datasets.clear();
                Ok(AgentReply::Fin)
            }
        }
    }

    /// Apply an operation, logging and swallowing the error for the
    /// per-pair/best-effort cases §7 calls out (termination NACKs are
    /// logged, not propagated).
    pub fn apply_best_effort(&mut self, op: AgentOp) {
        if let Err(status) = self.apply(op) {
            warn!(rank = self.rank, error = %status, "operation failed during best-effort phase");
        }
    }
}
