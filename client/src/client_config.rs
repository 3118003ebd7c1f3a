use std::default::Default;

/// Contains Config properties which will be used by a Client
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Log dropped snapshots and calls at warn level instead of debug
    pub warn_on_drop: bool,
    /// Upper bound on follow-up calls queued by method bodies while
    /// handling a single invocation
    pub max_chained_calls: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            warn_on_drop: true,
            max_chained_calls: 16,
        }
    }
}
