use crate::{types::Context, value::Value};

/// A follow-up call queued by a method body, addressed to the same instance
#[derive(Clone, Debug, PartialEq)]
pub struct QueuedCall {
    pub method: &'static str,
    pub args: Vec<Value>,
}

/// Handed to every remote-callable method body. Bodies can read the process
/// Context and queue further calls on their own instance, e.g. a server-side
/// chat handler re-broadcasting the message to every client.
pub struct RpcOutbox {
    context: Context,
    calls: Vec<QueuedCall>,
}

impl RpcOutbox {
    pub fn new(context: Context) -> Self {
        Self {
            context,
            calls: Vec::new(),
        }
    }

    pub fn context(&self) -> Context {
        self.context
    }

    pub fn send(&mut self, method: &'static str, args: Vec<Value>) {
        self.calls.push(QueuedCall { method, args });
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    pub fn take_calls(&mut self) -> Vec<QueuedCall> {
        std::mem::take(&mut self.calls)
    }
}
