//! The Host Controller role (§4.1): the Driver's sole gateway and the
//! cluster's coordinator. Owns a local Agent for its own rank plus one
//! link per Worker Controller, and drives the three-phase
//! request/fan-out/gather protocol.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::JoinHandle;

use tracing::{info, warn};

use crate::control::agent::{Agent, AgentOp, AgentReply};
use crate::control::worker_controller::{spawn, WorkReply, WorkRequest, WorkerLink};
use crate::error::Status;
use crate::geometry::Shape;
use crate::partition::Grid;
use crate::query::{merge, EvalOptions, EvalOutcome, Query, QueryResult, Targets};

struct WorkerHandle {
    rank: u32,
    link: WorkerLink,
    join: JoinHandle<()>,
}

/// The Host's own coordinator state: a local Agent for rank 0 and a
/// link to every Worker Controller for ranks `1..world_size`.
pub struct HostController {
    local_agent: Agent,
    workers: Vec<WorkerHandle>,
    next_request_id: AtomicU64,
}

impl HostController {
    /// Start the cluster: the Host's own Agent plus one thread-backed
    /// Worker Controller per remaining rank.
    pub fn start(world_size: u32) -> Self {
        let workers = (1..world_size)
            .map(|rank| {
                let (link, join) = spawn(rank);
                WorkerHandle { rank, link, join }
            })
            .collect();
        HostController {
            local_agent: Agent::new(0),
            workers,
            next_request_id: AtomicU64::new(0),
        }
    }

    fn request_id(&self) -> u64 {
        self.next_request_id.fetch_add(1, Ordering::Relaxed)
    }

    fn worker_ranks(&self) -> Vec<u32> {
        self.workers.iter().map(|w| w.rank).collect()
    }

    /// Send `op` (resolved per-rank by `make_op`) to every worker in
    /// `targets`, apply the rank-0 copy to the local Agent if it's
    /// targeted, then gather every reply. First NACK wins — the rest
    /// of the gather still drains (so no worker is left blocked on a
    /// full reply channel) but the error returned is the first one
    /// observed (§4.1 "Concurrent fan-out").
    fn fan_out<F>(&mut self, targets: &Targets, mut make_op: F) -> Result<Vec<(u32, AgentReply)>, Status>
    where
        F: FnMut(u32) -> AgentOp,
    {
        let wanted: Vec<u32> = match targets {
            Targets::All => std::iter::once(0).chain(self.worker_ranks()).collect(),
            Targets::Ranks(ranks) => ranks.clone(),
        };

        let mut sent_to = Vec::new();
        for worker in self.workers.iter() {
            if !wanted.contains(&worker.rank) {
                continue;
            }
            let request_id = self.request_id();
            if worker
                .link
                .tx
                .send(WorkRequest { request_id, op: make_op(worker.rank) })
                .is_err()
            {
                return Err(Status::Communication(format!("worker {} link closed", worker.rank)));
            }
            sent_to.push(worker.rank);
        }

        let mut local_reply = None;
        if wanted.contains(&0) {
            local_reply = Some((0u32, self.local_agent.apply(make_op(0))));
        }

        let mut replies = Vec::new();
        let mut first_error: Option<Status> = None;
        for worker in self.workers.iter() {
            if !sent_to.contains(&worker.rank) {
                continue;
            }
            match worker.link.rx.recv() {
                Ok(WorkReply { result, source_rank, .. }) => match result {
                    Ok(reply) => replies.push((source_rank, reply)),
                    Err(status) => {
                        if first_error.is_none() {
                            first_error = Some(status);
                        }
                    }
                },
                Err(_) => {
                    if first_error.is_none() {
                        first_error = Some(Status::Communication(format!("worker {} link closed", worker.rank)));
                    }
                }
            }
        }

        if let Some((rank, local_result)) = local_reply {
            match local_result {
                Ok(reply) => replies.push((rank, reply)),
                Err(status) => {
                    if first_error.is_none() {
                        first_error = Some(status);
                    }
                }
            }
        }

        match first_error {
            Some(status) => Err(status),
            None => Ok(replies),
        }
    }

    pub fn prepare_dataset(
        &mut self,
        internal_id: u64,
        nickname: &str,
        data_type: crate::geometry::DataType,
        file_type: crate::dataset::FileType,
        path: &str,
        dataspace: crate::geometry::Mbr,
    ) -> Result<(), Status> {
        self.fan_out(&Targets::All, |_rank| AgentOp::PrepareDataset {
            internal_id,
            nickname: nickname.to_string(),
            data_type,
            file_type,
            path: path.to_string(),
            dataspace,
        })?;
        Ok(())
    }

    /// Broadcast a per-worker partition batch. `per_rank` is the
    /// already-classified, already-owner-assigned shape set produced
    /// by [`crate::partition::distribute`]; ranks absent from the map
    /// simply receive an empty batch.
    pub fn partition(&mut self, internal_id: u64, grid: &Grid, mut per_rank: HashMap<u32, Vec<Shape>>) -> Result<(), Status> {
        let grid = grid.clone();
        self.fan_out(&Targets::All, move |rank| AgentOp::Partition {
            internal_id,
            grid: grid.clone(),
            shapes: per_rank.remove(&rank).unwrap_or_default(),
        })?;
        Ok(())
    }

    pub fn build_index(&mut self, internal_id: u64) -> Result<(), Status> {
        self.fan_out(&Targets::All, |_rank| AgentOp::BuildIndex { internal_id })?;
        Ok(())
    }

    pub fn unload(&mut self, internal_id: u64) -> Result<(), Status> {
        self.fan_out(&Targets::All, |_rank| AgentOp::Unload { internal_id })?;
        Ok(())
    }

    /// Dispatch a query to `targets`, evaluate/gather, and merge every
    /// participant's partial `EvalOutcome` into one `QueryResult`
    /// (§4.5 "Merge").
    pub fn query(&mut self, query: Query, opts: EvalOptions, targets: Targets) -> Result<QueryResult, Status> {
        let k = match &query {
            Query::Knn { k, .. } => Some(*k),
            _ => None,
        };
        let replies = self.fan_out(&targets, move |_rank| AgentOp::Query {
            query: query.clone(),
            opts,
        })?;

        let mut merged: Option<QueryResult> = None;
        for (_, reply) in replies {
            let EvalOutcome { result, .. } = match reply {
                AgentReply::Eval(outcome) => outcome,
                _ => return Err(Status::InvalidQueryType),
            };
            merged = Some(match merged {
                None => result,
                Some(acc) => merge(acc, result, k)?,
            });
        }
        merged.ok_or(Status::InvalidQueryType)
    }

    /// FIN (§4.1 "Termination"): broadcast, join every worker thread,
    /// release the local Agent's state. NACKs during termination are
    /// logged, never propagated.
    pub fn finalize(mut self) {
        for worker in &self.workers {
            let request_id = self.request_id();
            if worker.link.tx.send(WorkRequest { request_id, op: AgentOp::Fin }).is_err() {
                warn!(rank = worker.rank, "could not deliver FIN, worker already gone");
                continue;
            }
            match worker.link.rx.recv() {
                Ok(WorkReply { result: Err(status), .. }) => {
                    warn!(rank = worker.rank, error = %status, "NACK during termination, ignored");
                }
                Err(_) => warn!(rank = worker.rank, "no FIN reply, worker already gone"),
                _ => {}
            }
        }
        self.local_agent.apply_best_effort(AgentOp::Fin);
        for worker in self.workers.drain(..) {
            if worker.join.join().is_err() {
                warn!(rank = worker.rank, "worker controller thread panicked during shutdown");
            }
        }
        info!("host controller finalized, all workers joined");
    }
}
