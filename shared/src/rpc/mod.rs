pub mod dispatch;
pub mod invocation;
pub mod outbox;
