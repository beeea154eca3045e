//! Process-wide state (§4.9): one `Runtime` built at process entry,
//! threaded by reference into every operation. No other module-level
//! mutable globals exist.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::info_span;

use crate::config::Config;

/// Bundles the validated `Config`, an atomic id generator shared by
/// datasets and queries, and the root tracing span every operation's
/// spans nest under.
pub struct Runtime {
    pub config: Config,
    next_id: AtomicU64,
    pub root_span: tracing::Span,
}

impl Runtime {
    pub fn new(config: Config) -> Self {
        Runtime {
            config,
            next_id: AtomicU64::new(0),
            root_span: info_span!("sqed"),
        }
    }

    /// Allocate the next cluster-wide unique id, used for both
    /// dataset ids and query ids (§3 Dataset.internalId, Query.queryId).
    pub fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_monotonically_unique() {
        let runtime = Runtime::new(Config::default());
        let a = runtime.next_id();
        let b = runtime.next_id();
        assert_ne!(a, b);
    }
}
