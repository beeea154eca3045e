//! Query dispatch and result aggregation (§4.5): packaging a Query,
//! routing it to workers, evaluating it locally, and merging partials.

pub mod dispatch;
pub mod eval;
pub mod merge;
pub mod types;

pub use dispatch::{targets_for, Targets};
pub use eval::{eval_join, eval_knn, eval_range, evaluate_local, EvalOptions, EvalOutcome, EvalTimings};
pub use merge::merge;
pub use types::{topology_index, KnnHit, Query, QueryPredicate, QueryResult, ResultType, TOPOLOGY_ORDER};
