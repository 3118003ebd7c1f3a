use std::default::Default;

/// Contains Config properties which will be used by the Server
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Drop Server-target invocations sent by a client that does not own
    /// the addressed instance
    pub validate_invoker_ownership: bool,
    /// Upper bound on follow-up calls queued by method bodies while
    /// handling a single invocation
    pub max_chained_calls: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            validate_invoker_ownership: true,
            max_chained_calls: 16,
        }
    }
}
