use crate::{
    protocol::error::ProtocolError,
    registry::{
        descriptor::{ReplicaDescriptor, Target},
        replicable::Replicate,
    },
    rpc::{invocation::RpcInvocation, outbox::RpcOutbox},
    types::Context,
};

/// Why an invocation was dropped without running
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DropReason {
    /// The addressed instance no longer exists
    InstanceMissing,
    /// A Client-target call reached a process that does not possess the instance,
    /// or a Server-target call came from a peer that does not own it
    NotOwner,
    /// The call travelled in a direction its Target does not allow
    WrongDirection,
    /// A Client-target call was raised for an instance no client owns
    NoOwner,
}

/// Where an invocation has to go, decided from its Target and the two roles
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    /// Run the body in this process
    Execute,
    /// Client side: send the invocation to the server instead of running it
    ForwardToServer,
    /// Server side: send the invocation to the client owning the instance
    SendToOwner,
    /// Server side: send the invocation to every client replicating the instance
    Broadcast,
    Reject(DropReason),
}

/// Result of dispatching one invocation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatchOutcome {
    Executed,
    ForwardToServer,
    SendToOwner,
    Broadcast,
    Dropped(DropReason),
}

impl DispatchOutcome {
    pub fn was_executed(&self) -> bool {
        *self == DispatchOutcome::Executed
    }
}

/// Applies the Target contract.
///
/// `context` is this process's role. `origin` is the role that raised the
/// call: the local role for calls made in this process, the sender's role for
/// received ones. `possessed` only matters on a client and tells whether this
/// client is the instance's owner.
///
/// Multicast bodies never run on the server; the server only fans them out.
pub fn route(target: Target, context: Context, origin: Context, possessed: bool) -> Route {
    match (target, context, origin) {
        (Target::Server, Context::Server, _) => Route::Execute,
        (Target::Server, Context::Client, Context::Client) => Route::ForwardToServer,
        (Target::Server, Context::Client, Context::Server) => {
            Route::Reject(DropReason::WrongDirection)
        }

        (Target::Client, Context::Server, Context::Server) => Route::SendToOwner,
        (Target::Client, Context::Server, Context::Client) => {
            Route::Reject(DropReason::WrongDirection)
        }
        (Target::Client, Context::Client, _) => {
            if possessed {
                Route::Execute
            } else {
                Route::Reject(DropReason::NotOwner)
            }
        }

        (Target::Multicast, Context::Server, Context::Server) => Route::Broadcast,
        (Target::Multicast, Context::Client, Context::Server) => Route::Execute,
        (Target::Multicast, _, Context::Client) => Route::Reject(DropReason::WrongDirection),
    }
}

/// Resolves the invocation's method, checks its arguments and routes it.
/// When the route says to execute here, runs the body on `instance`.
///
/// Unknown ordinals and bad arguments are protocol errors. A missing
/// instance is not an error: the call is dropped.
pub fn dispatch(
    descriptor: &dyn ReplicaDescriptor,
    invocation: &RpcInvocation,
    instance: Option<&mut dyn Replicate>,
    context: Context,
    origin: Context,
    possessed: bool,
    outbox: &mut RpcOutbox,
) -> Result<DispatchOutcome, ProtocolError> {
    let target = descriptor.invocation_target(invocation)?;

    let outcome = match route(target, context, origin, possessed) {
        Route::Execute => {
            let Some(instance) = instance else {
                return Ok(DispatchOutcome::Dropped(DropReason::InstanceMissing));
            };
            descriptor.invoke_on_instance(invocation, instance, outbox)?;
            DispatchOutcome::Executed
        }
        Route::ForwardToServer => DispatchOutcome::ForwardToServer,
        Route::SendToOwner => DispatchOutcome::SendToOwner,
        Route::Broadcast => DispatchOutcome::Broadcast,
        Route::Reject(reason) => DispatchOutcome::Dropped(reason),
    };
    Ok(outcome)
}
