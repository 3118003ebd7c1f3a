use std::{
    collections::{HashMap, HashSet, VecDeque},
    sync::Arc,
    time::Duration,
};

use log::{debug, warn};

use replica_shared::{
    dispatch, ConfigError, Context, DispatchOutcome, DropReason, InstanceId, NetId, Payload,
    PeerId, Protocol, ProtocolError, QueuedCall, ReceiveEvent, Recipient, ReplicaDescriptor,
    ReplicaError, ReplicationMessage, RpcInvocation, RpcOutbox, Snapshot, Target, Transport, Value,
    WorldMutType, WorldRefType,
};

use crate::{tick_timer::TickTimer, ServerConfig};

/// Owns the authoritative side of replication. Every tick it diffs each live
/// instance against what was last sent and ships the changes; it also routes
/// remote calls raised locally or received from clients.
pub struct ReplicaServer {
    config: ServerConfig,
    protocol: Protocol,
    tick_timer: TickTimer,
    last_sent: HashMap<InstanceId, (NetId, Snapshot)>,
}

struct LiveInstance {
    net_id: NetId,
    id: InstanceId,
    full: Snapshot,
    always_replicated: bool,
}

impl ReplicaServer {
    /// Create a new Server. Locks the Protocol if it is not locked yet, which
    /// builds every registered descriptor.
    pub fn new<P: Into<Protocol>>(config: ServerConfig, protocol: P) -> Result<Self, ConfigError> {
        let mut protocol: Protocol = protocol.into();
        if !protocol.is_locked() {
            protocol.try_lock()?;
        }
        let tick_timer = TickTimer::new(protocol.tick_interval);

        Ok(Self {
            config,
            protocol,
            tick_timer,
            last_sent: HashMap::new(),
        })
    }

    pub fn context(&self) -> Context {
        Context::Server
    }

    pub fn protocol(&self) -> &Protocol {
        &self.protocol
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Advances the tick timer. Returns true when it is time to call
    /// [`send_all_updates`](Self::send_all_updates).
    pub fn update(&mut self, delta: Duration) -> bool {
        self.tick_timer.update(delta)
    }

    pub fn current_tick(&self) -> u64 {
        self.tick_timer.current_tick()
    }

    // Replication

    /// Sends a snapshot of every live instance of every registered kind.
    ///
    /// The first message for an instance carries every field; after that only
    /// the fields that changed since the last send. Instances with nothing
    /// changed are skipped unless they are always-replicated, in which case
    /// an empty update still goes out so the client's post-apply hook runs.
    ///
    /// The diff base of an instance only moves forward once its update was
    /// handed to the transport. A refused send leaves it in place, so the
    /// next tick carries the same changes again.
    ///
    /// Returns the number of messages handed to the transport.
    pub fn send_all_updates<W: WorldRefType, T: Transport>(
        &mut self,
        world: &W,
        transport: &mut T,
    ) -> usize {
        let mut seen = HashSet::new();
        let mut sent = 0;

        for live in self.live_snapshots(world) {
            seen.insert(live.id);

            let update = match self.last_sent.get(&live.id) {
                Some((last_net_id, last)) if *last_net_id == live.net_id => {
                    last.diff(&live.full).unwrap_or_else(|_| live.full.clone())
                }
                _ => live.full.clone(),
            };

            if !update.is_empty() || live.always_replicated {
                let message = ReplicationMessage::snapshot(live.net_id, live.id, update);
                if !send(transport, Recipient::Replicating(live.id), &message) {
                    continue;
                }
                sent += 1;
            }
            self.last_sent.insert(live.id, (live.net_id, live.full));
        }

        self.last_sent.retain(|id, _| seen.contains(id));
        sent
    }

    /// Sends a full snapshot of every live instance to `peer` alone, for a
    /// client that starts replicating after earlier ticks went out. Diff
    /// bases kept for other clients are left untouched.
    ///
    /// Returns the number of messages handed to the transport.
    pub fn send_full_to<W: WorldRefType, T: Transport>(
        &self,
        peer: PeerId,
        world: &W,
        transport: &mut T,
    ) -> usize {
        let mut sent = 0;
        for live in self.live_snapshots(world) {
            let message = ReplicationMessage::snapshot(live.net_id, live.id, live.full);
            if send(transport, Recipient::Client(peer), &message) {
                sent += 1;
            }
        }
        debug!("Sent {} full snapshots to {:?}", sent, peer);
        sent
    }

    /// Full snapshots of every live instance, in registration order of kinds
    fn live_snapshots<W: WorldRefType>(&self, world: &W) -> Vec<LiveInstance> {
        let mut output = Vec::new();

        for net_id in self.protocol.replica_kinds.net_ids() {
            let Some(type_id) = self.protocol.replica_kinds.type_id(net_id) else {
                continue;
            };
            let descriptor = match self.protocol.descriptor(net_id) {
                Ok(descriptor) => descriptor,
                Err(error) => {
                    warn!("Server Error: {}", error);
                    continue;
                }
            };

            for id in world.instances_of(type_id) {
                let Some(instance) = world.instance(&id) else {
                    continue;
                };
                match descriptor.snapshot_instance(instance) {
                    Ok(full) => output.push(LiveInstance {
                        net_id,
                        id,
                        full,
                        always_replicated: instance.is_always_replicated(),
                    }),
                    Err(error) => {
                        warn!("Server Error: cannot snapshot {:?}: {}", id, error);
                    }
                }
            }
        }

        output
    }

    /// Forgets what was last sent for `instance`, so a respawned instance
    /// with the same id starts over with a full snapshot
    pub fn despawn(&mut self, instance: &InstanceId) {
        self.last_sent.remove(instance);
    }

    // Remote calls

    /// Raises a remote call on `instance` from server code and routes it:
    /// Server-target calls run here, Client-target calls go to the owning
    /// client, Multicast calls go to every client replicating the instance.
    ///
    /// A missing instance drops the call without an error.
    pub fn send_rpc<W: WorldMutType, T: Transport>(
        &mut self,
        world: &mut W,
        transport: &mut T,
        instance: InstanceId,
        method: &str,
        args: Vec<Value>,
    ) -> Result<DispatchOutcome, ReplicaError> {
        let Some(found) = world.instance(&instance) else {
            debug!("Dropping call to `{}` on missing instance {:?}", method, instance);
            return Ok(DispatchOutcome::Dropped(DropReason::InstanceMissing));
        };
        let (net_id, descriptor) = self.protocol.descriptor_of_instance(found)?;
        let descriptor = descriptor.clone();
        let invocation = descriptor.build_invocation(method, args)?;

        let outcome = self.dispatch_invocation(
            world,
            transport,
            net_id,
            &descriptor,
            instance,
            &invocation,
            Context::Server,
            None,
        )?;
        Ok(outcome)
    }

    /// Handles one message received from `peer`. Clients may only send
    /// invocations; anything else is a protocol error. Errors are logged and
    /// returned, and the message is dropped.
    pub fn receive<W: WorldMutType, T: Transport>(
        &mut self,
        peer: PeerId,
        bytes: &[u8],
        world: &mut W,
        transport: &mut T,
    ) -> Result<ReceiveEvent, ProtocolError> {
        let result = self.receive_inner(peer, bytes, world, transport);
        if let Err(error) = &result {
            warn!("Server Error: dropping message from {:?}: {}", peer, error);
        }
        result
    }

    fn receive_inner<W: WorldMutType, T: Transport>(
        &mut self,
        peer: PeerId,
        bytes: &[u8],
        world: &mut W,
        transport: &mut T,
    ) -> Result<ReceiveEvent, ProtocolError> {
        let ReplicationMessage {
            net_id,
            instance,
            payload,
        } = ReplicationMessage::from_bytes(bytes)?;

        let invocation = match payload {
            Payload::Invocation(invocation) => invocation,
            Payload::Snapshot(_) => {
                return Err(ProtocolError::UnexpectedMessage {
                    context: Context::Server,
                    message: "snapshot",
                });
            }
        };

        let descriptor = self.protocol.descriptor(net_id)?.clone();
        let outcome = self.dispatch_invocation(
            world,
            transport,
            net_id,
            &descriptor,
            instance,
            &invocation,
            Context::Client,
            Some(peer),
        )?;

        Ok(ReceiveEvent::Invoked {
            net_id,
            instance,
            method: invocation.method(),
            outcome,
        })
    }

    /// Dispatches one invocation, delivers it if it has to travel, then runs
    /// the follow-up calls its body queued
    #[allow(clippy::too_many_arguments)]
    fn dispatch_invocation<W: WorldMutType, T: Transport>(
        &self,
        world: &mut W,
        transport: &mut T,
        net_id: NetId,
        descriptor: &Arc<dyn ReplicaDescriptor>,
        instance: InstanceId,
        invocation: &RpcInvocation,
        origin: Context,
        sender: Option<PeerId>,
    ) -> Result<DispatchOutcome, ProtocolError> {
        let mut queue = VecDeque::new();
        let outcome = self.dispatch_one(
            world, transport, net_id, descriptor, instance, invocation, origin, sender, &mut queue,
        )?;

        // follow-up calls are raised by server code, so they take the server's origin
        let mut chained = 0;
        while let Some(call) = queue.pop_front() {
            if chained == self.config.max_chained_calls {
                warn!(
                    "Server Error: dropping {} chained calls on {:?}, limit of {} reached",
                    queue.len() + 1,
                    instance,
                    self.config.max_chained_calls
                );
                break;
            }
            chained += 1;

            let follow_up = match descriptor.build_invocation(call.method, call.args) {
                Ok(follow_up) => follow_up,
                Err(error) => {
                    warn!("Server Error: dropping chained call: {}", error);
                    continue;
                }
            };
            if let Err(error) = self.dispatch_one(
                world,
                transport,
                net_id,
                descriptor,
                instance,
                &follow_up,
                Context::Server,
                None,
                &mut queue,
            ) {
                warn!("Server Error: dropping chained call: {}", error);
            }
        }

        Ok(outcome)
    }

    #[allow(clippy::too_many_arguments)]
    fn dispatch_one<W: WorldMutType, T: Transport>(
        &self,
        world: &mut W,
        transport: &mut T,
        net_id: NetId,
        descriptor: &Arc<dyn ReplicaDescriptor>,
        instance: InstanceId,
        invocation: &RpcInvocation,
        origin: Context,
        sender: Option<PeerId>,
        queue: &mut VecDeque<QueuedCall>,
    ) -> Result<DispatchOutcome, ProtocolError> {
        if origin == Context::Client
            && self.config.validate_invoker_ownership
            && descriptor.invocation_target(invocation)? == Target::Server
            && world.has_instance(&instance)
            && world.owner(&instance) != sender
        {
            debug!(
                "Dropping call {} on {:?} from {:?}, which does not own it",
                invocation.method(),
                instance,
                sender
            );
            return Ok(DispatchOutcome::Dropped(DropReason::NotOwner));
        }

        let mut outbox = RpcOutbox::new(Context::Server);
        let outcome = dispatch(
            descriptor.as_ref(),
            invocation,
            world.instance_mut(&instance),
            Context::Server,
            origin,
            false,
            &mut outbox,
        )?;
        queue.extend(outbox.take_calls());

        let message = || ReplicationMessage::invocation(net_id, instance, invocation.clone());
        let outcome = match outcome {
            DispatchOutcome::SendToOwner => match world.owner(&instance) {
                Some(owner) => {
                    send(transport, Recipient::Client(owner), &message());
                    DispatchOutcome::SendToOwner
                }
                None => DispatchOutcome::Dropped(DropReason::NoOwner),
            },
            DispatchOutcome::Broadcast => {
                if world.has_instance(&instance) {
                    send(transport, Recipient::Replicating(instance), &message());
                    DispatchOutcome::Broadcast
                } else {
                    DispatchOutcome::Dropped(DropReason::InstanceMissing)
                }
            }
            other => other,
        };

        if let DispatchOutcome::Dropped(reason) = outcome {
            debug!(
                "Dropped call {} on {:?}: {:?}",
                invocation.method(),
                instance,
                reason
            );
        }
        Ok(outcome)
    }
}

/// Encodes and hands `message` to the transport, logging failures
fn send<T: Transport>(transport: &mut T, recipient: Recipient, message: &ReplicationMessage) -> bool {
    match transport.send(recipient, &message.to_bytes()) {
        Ok(()) => true,
        Err(_) => {
            warn!("Server Error: transport refused message for {:?}", recipient);
            false
        }
    }
}
