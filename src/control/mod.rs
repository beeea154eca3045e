//! The control plane (§4.1): Driver, Host Controller, Worker
//! Controller × N and Agent × N, connected by three logical channels.

pub mod agent;
pub mod channel;
pub mod driver;
pub mod host;
pub mod message;
pub mod worker_controller;

pub use agent::{Agent, AgentOp, AgentReply};
pub use driver::Driver;
pub use host::HostController;
pub use message::{Envelope, Tag};
pub use worker_controller::WorkerController;
