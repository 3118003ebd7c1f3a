use std::{collections::VecDeque, sync::Arc};

use log::{log, warn, Level};

use replica_shared::{
    dispatch, ConfigError, Context, DispatchOutcome, DropReason, InstanceId, NetId, Payload,
    Protocol, ProtocolError, QueuedCall, ReceiveEvent, Recipient, ReplicaDescriptor, ReplicaError,
    ReplicationMessage, RpcInvocation, RpcOutbox, Snapshot, Transport, Value, WorldMutType,
};

use crate::ClientConfig;

/// Client side of replication. Applies incoming snapshots to the local
/// replicas and routes remote calls: calls raised here that target the
/// server are forwarded to it, calls arriving from the server run here when
/// their Target allows it.
pub struct ReplicaClient {
    config: ClientConfig,
    protocol: Protocol,
}

impl ReplicaClient {
    /// Create a new Client. Locks the Protocol if it is not locked yet, which
    /// builds every registered descriptor.
    pub fn new<P: Into<Protocol>>(config: ClientConfig, protocol: P) -> Result<Self, ConfigError> {
        let mut protocol: Protocol = protocol.into();
        if !protocol.is_locked() {
            protocol.try_lock()?;
        }
        Ok(Self { config, protocol })
    }

    pub fn context(&self) -> Context {
        Context::Client
    }

    pub fn protocol(&self) -> &Protocol {
        &self.protocol
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Handles one message received from the server. Snapshots are written
    /// into the addressed replica, invocations go through dispatch. Errors
    /// are logged and returned, and the message is dropped.
    pub fn receive<W: WorldMutType, T: Transport>(
        &mut self,
        bytes: &[u8],
        world: &mut W,
        transport: &mut T,
    ) -> Result<ReceiveEvent, ProtocolError> {
        let result = self.receive_inner(bytes, world, transport);
        if let Err(error) = &result {
            warn!("Client Error: dropping message from server: {}", error);
        }
        result
    }

    fn receive_inner<W: WorldMutType, T: Transport>(
        &mut self,
        bytes: &[u8],
        world: &mut W,
        transport: &mut T,
    ) -> Result<ReceiveEvent, ProtocolError> {
        let ReplicationMessage {
            net_id,
            instance,
            payload,
        } = ReplicationMessage::from_bytes(bytes)?;
        let descriptor = self.protocol.descriptor(net_id)?.clone();

        match payload {
            Payload::Snapshot(snapshot) => {
                self.apply_snapshot(world, net_id, &descriptor, instance, &snapshot)
            }
            Payload::Invocation(invocation) => {
                let outcome = self.dispatch_invocation(
                    world,
                    transport,
                    &descriptor,
                    net_id,
                    instance,
                    &invocation,
                    Context::Server,
                )?;
                Ok(ReceiveEvent::Invoked {
                    net_id,
                    instance,
                    method: invocation.method(),
                    outcome,
                })
            }
        }
    }

    fn apply_snapshot<W: WorldMutType>(
        &self,
        world: &mut W,
        net_id: NetId,
        descriptor: &Arc<dyn ReplicaDescriptor>,
        instance: InstanceId,
        snapshot: &Snapshot,
    ) -> Result<ReceiveEvent, ProtocolError> {
        let Some(replica) = world.instance_mut(&instance) else {
            log!(
                self.drop_level(),
                "Dropping snapshot for missing {} {:?}",
                descriptor.type_name(),
                instance
            );
            return Ok(ReceiveEvent::Dropped {
                net_id,
                instance,
                reason: DropReason::InstanceMissing,
            });
        };

        descriptor.apply_to_instance(snapshot, replica)?;
        Ok(ReceiveEvent::Applied { net_id, instance })
    }

    /// Raises a remote call on `instance` from client code. Server-target
    /// calls are sent to the server, Client-target calls run here if this
    /// client possesses the instance. Multicast calls can only be raised by
    /// the server and are dropped.
    pub fn send_rpc<W: WorldMutType, T: Transport>(
        &mut self,
        world: &mut W,
        transport: &mut T,
        instance: InstanceId,
        method: &str,
        args: Vec<Value>,
    ) -> Result<DispatchOutcome, ReplicaError> {
        let Some(found) = world.instance(&instance) else {
            log!(
                self.drop_level(),
                "Dropping call to `{}` on missing instance {:?}",
                method,
                instance
            );
            return Ok(DispatchOutcome::Dropped(DropReason::InstanceMissing));
        };
        let (net_id, descriptor) = self.protocol.descriptor_of_instance(found)?;
        let descriptor = descriptor.clone();
        let invocation = descriptor.build_invocation(method, args)?;

        let outcome = self.dispatch_invocation(
            world,
            transport,
            &descriptor,
            net_id,
            instance,
            &invocation,
            Context::Client,
        )?;
        Ok(outcome)
    }

    #[allow(clippy::too_many_arguments)]
    fn dispatch_invocation<W: WorldMutType, T: Transport>(
        &self,
        world: &mut W,
        transport: &mut T,
        descriptor: &Arc<dyn ReplicaDescriptor>,
        net_id: NetId,
        instance: InstanceId,
        invocation: &RpcInvocation,
        origin: Context,
    ) -> Result<DispatchOutcome, ProtocolError> {
        let mut queue = VecDeque::new();
        let outcome = self.dispatch_one(
            world, transport, descriptor, net_id, instance, invocation, origin, &mut queue,
        )?;

        // follow-up calls are raised by this client
        let mut chained = 0;
        while let Some(call) = queue.pop_front() {
            if chained == self.config.max_chained_calls {
                warn!(
                    "Client Error: dropping {} chained calls on {:?}, limit of {} reached",
                    queue.len() + 1,
                    instance,
                    self.config.max_chained_calls
                );
                break;
            }
            chained += 1;

            let result = descriptor
                .build_invocation(call.method, call.args)
                .map_err(ReplicaError::from)
                .and_then(|follow_up| {
                    self.dispatch_one(
                        world,
                        transport,
                        descriptor,
                        net_id,
                        instance,
                        &follow_up,
                        Context::Client,
                        &mut queue,
                    )
                    .map_err(ReplicaError::from)
                });
            if let Err(error) = result {
                warn!("Client Error: dropping chained call: {}", error);
            }
        }

        Ok(outcome)
    }

    #[allow(clippy::too_many_arguments)]
    fn dispatch_one<W: WorldMutType, T: Transport>(
        &self,
        world: &mut W,
        transport: &mut T,
        descriptor: &Arc<dyn ReplicaDescriptor>,
        net_id: NetId,
        instance: InstanceId,
        invocation: &RpcInvocation,
        origin: Context,
        queue: &mut VecDeque<QueuedCall>,
    ) -> Result<DispatchOutcome, ProtocolError> {
        let possessed = world.is_possessed(&instance);
        let mut outbox = RpcOutbox::new(Context::Client);
        let outcome = dispatch(
            descriptor.as_ref(),
            invocation,
            world.instance_mut(&instance),
            Context::Client,
            origin,
            possessed,
            &mut outbox,
        )?;
        queue.extend(outbox.take_calls());

        match outcome {
            DispatchOutcome::ForwardToServer => {
                let message = ReplicationMessage::invocation(net_id, instance, invocation.clone());
                if transport.send(Recipient::Server, &message.to_bytes()).is_err() {
                    warn!("Client Error: transport refused call for the server");
                }
            }
            DispatchOutcome::Dropped(reason) => {
                log!(
                    self.drop_level(),
                    "Dropped call {} on {:?}: {:?}",
                    invocation.method(),
                    instance,
                    reason
                );
            }
            _ => {}
        }
        Ok(outcome)
    }

    fn drop_level(&self) -> Level {
        if self.config.warn_on_drop {
            Level::Warn
        } else {
            Level::Debug
        }
    }
}
