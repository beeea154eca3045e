//! The Worker Controller role (§4.1): receives instructions from the
//! Host Controller, drives its local Agent, and reports back.
//!
//! Modeled as an explicit `step()` state machine rather than a blocking
//! read loop, so the role can be driven synchronously in-process (as
//! the tests here do) or wrapped in a thread that blocks on a channel
//! (as [`spawn`] does for a real multi-worker run).

use std::thread::{self, JoinHandle};

use tracing::{debug, error};

use crate::control::agent::{Agent, AgentOp, AgentReply};
use crate::control::channel::Endpoint;
use crate::error::Status;

/// A unit of work sent down to a Worker Controller, tagged with a
/// request id so the Host can match replies back to requests.
#[derive(Debug, Clone)]
pub struct WorkRequest {
    pub request_id: u64,
    pub op: AgentOp,
}

/// What a Worker Controller sends back up.
#[derive(Debug, Clone)]
pub struct WorkReply {
    pub request_id: u64,
    pub source_rank: u32,
    pub result: Result<AgentReply, Status>,
}

/// Channel endpoint specialised to the typed request/reply pair this
/// role actually exchanges, rather than raw `Envelope` bytes: the
/// Envelope/Tag wire format (§6) is preserved as the literal transport
/// contract in [`crate::control::message`], but shuttling whole
/// datasets through a byte-serialized envelope on every hop would cost
/// a full geometry encode/decode this in-process binding does not
/// need. See DESIGN.md.
pub struct WorkerLink {
    pub tx: crossbeam_channel::Sender<WorkRequest>,
    pub rx: crossbeam_channel::Receiver<WorkReply>,
}

struct WorkerSide {
    rx: crossbeam_channel::Receiver<WorkRequest>,
    tx: crossbeam_channel::Sender<WorkReply>,
}

pub fn worker_link_pair() -> (WorkerLink, WorkerSide) {
    let (req_tx, req_rx) = crossbeam_channel::unbounded();
    let (rep_tx, rep_rx) = crossbeam_channel::unbounded();
    (
        WorkerLink { tx: req_tx, rx: rep_rx },
        WorkerSide { rx: req_rx, tx: rep_tx },
    )
}

/// The state machine itself: one Agent, stepped one request at a time.
pub struct WorkerController {
    pub rank: u32,
    agent: Agent,
}

impl WorkerController {
    pub fn new(rank: u32) -> Self {
        WorkerController { rank, agent: Agent::new(rank) }
    }

    /// Apply one request and produce the reply that would be sent
    /// back up the tree. Never panics: every `Status` is captured and
    /// returned, becoming a NACK at the Host (§7).
    pub fn step(&mut self, request: WorkRequest) -> WorkReply {
        debug!(rank = self.rank, request_id = request.request_id, "worker controller stepping");
        let result = self.agent.apply(request.op);
        WorkReply {
            request_id: request.request_id,
            source_rank: self.rank,
            result,
        }
    }
}

/// Run a Worker Controller on its own thread, driven by `step()` in a
/// loop that blocks on `side.rx` until the link is closed or a `Fin`
/// reply is produced.
fn run(rank: u32, side: WorkerSide) {
    let mut controller = WorkerController::new(rank);
    while let Ok(request) = side.rx.recv() {
        let is_fin = matches!(request.op, AgentOp::Fin);
        let reply = controller.step(request);
        if side.tx.send(reply).is_err() {
            error!(rank, "host link dropped, worker controller exiting");
            break;
        }
        if is_fin {
            break;
        }
    }
}

/// Spawn a Worker Controller thread and return the Host-side link to
/// talk to it plus its join handle.
pub fn spawn(rank: u32) -> (WorkerLink, JoinHandle<()>) {
    let (link, side) = worker_link_pair();
    let handle = thread::spawn(move || run(rank, side));
    (link, handle)
}

/// Kept for parity with the other roles' use of [`Endpoint`]; a worker
/// that wants the literal Envelope wire format (e.g. to talk to a
/// socket-backed Host) can drive itself off one directly instead of a
/// [`WorkerLink`].
#[allow(dead_code)]
pub struct EnvelopeDrivenWorker {
    pub endpoint: Endpoint,
}
