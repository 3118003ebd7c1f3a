use crate::{
    protocol::error::ProtocolError,
    registry::{error::LookupError, replicable::Replicable, replicable::Replicate},
    rpc::{invocation::RpcInvocation, outbox::RpcOutbox},
    snapshot::{diff_mask::DiffMask, snapshot::Snapshot},
    types::MethodOrdinal,
    value::{Value, ValueKind},
};

/// Declared access level of a replicated field
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Visibility {
    Public,
    Protected,
    Private,
}

impl Visibility {
    /// Replicated fields must be at least protected
    pub fn is_replicable(self) -> bool {
        self != Visibility::Private
    }
}

/// Which process runs the body of a remote-callable method
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Target {
    /// Runs on the server only. Clients calling it send it to the server.
    Server,
    /// Runs only on the client that owns the instance, never on the server
    Client,
    /// Raised by the server, runs on every client replicating the instance
    Multicast,
}

pub(crate) type FieldGetter<T> = Box<dyn Fn(&T) -> Value + Send + Sync>;
pub(crate) type FieldSetter<T> = Box<dyn Fn(&mut T, Value) -> bool + Send + Sync>;
pub(crate) type MethodBody<T> = Box<dyn Fn(&mut T, &[Value], &mut RpcOutbox) + Send + Sync>;

/// One replicated field of `T`
pub struct FieldSlot<T> {
    pub(crate) ordinal: usize,
    pub(crate) name: &'static str,
    pub(crate) kind: ValueKind,
    pub(crate) visibility: Visibility,
    pub(crate) declared_on: &'static str,
    pub(crate) get: FieldGetter<T>,
    pub(crate) set: FieldSetter<T>,
}

impl<T> FieldSlot<T> {
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// Type that declared the field, which is a base type for inherited slots
    pub fn declared_on(&self) -> &'static str {
        self.declared_on
    }

    pub fn read(&self, instance: &T) -> Value {
        (self.get)(instance)
    }

    /// Returns false, leaving the field untouched, if `value` is of the wrong kind
    pub fn write(&self, instance: &mut T, value: Value) -> bool {
        (self.set)(instance, value)
    }
}

/// One remote-callable method of `T`
pub struct MethodSlot<T> {
    pub(crate) ordinal: usize,
    pub(crate) name: &'static str,
    pub(crate) target: Target,
    pub(crate) params: Vec<ValueKind>,
    pub(crate) declared_on: &'static str,
    pub(crate) body: MethodBody<T>,
}

impl<T> MethodSlot<T> {
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn target(&self) -> Target {
        self.target
    }

    pub fn params(&self) -> &[ValueKind] {
        &self.params
    }

    pub fn declared_on(&self) -> &'static str {
        self.declared_on
    }

    fn argument_mismatch(&self, args: &[Value]) -> Option<ArgumentMismatch> {
        if args.len() != self.params.len() {
            return Some(ArgumentMismatch::Count {
                expected: self.params.len(),
                actual: args.len(),
            });
        }
        self.params
            .iter()
            .zip(args)
            .enumerate()
            .find(|(_, (expected, arg))| arg.kind() != **expected)
            .map(|(index, (expected, arg))| ArgumentMismatch::Kind {
                index,
                expected: *expected,
                actual: arg.kind(),
            })
    }
}

enum ArgumentMismatch {
    Count { expected: usize, actual: usize },
    Kind { index: usize, expected: ValueKind, actual: ValueKind },
}

/// Per-type table of replicated fields and remote-callable methods, built
/// once from [`Replicable::describe`] and immutable afterwards. Fields are
/// ordered base-first, then in declaration order; methods in declaration
/// order. Ordinals are indices into these lists.
pub struct TypeDescriptor<T> {
    type_name: &'static str,
    fields: Vec<FieldSlot<T>>,
    methods: Vec<MethodSlot<T>>,
}

impl<T: Replicable> TypeDescriptor<T> {
    pub(crate) fn new(
        type_name: &'static str,
        fields: Vec<FieldSlot<T>>,
        methods: Vec<MethodSlot<T>>,
    ) -> Self {
        Self {
            type_name,
            fields,
            methods,
        }
    }

    pub(crate) fn into_slots(self) -> (Vec<FieldSlot<T>>, Vec<MethodSlot<T>>) {
        (self.fields, self.methods)
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    pub fn method_count(&self) -> usize {
        self.methods.len()
    }

    pub fn fields(&self) -> &[FieldSlot<T>] {
        &self.fields
    }

    pub fn methods(&self) -> &[MethodSlot<T>] {
        &self.methods
    }

    pub fn field(&self, ordinal: usize) -> Result<&FieldSlot<T>, LookupError> {
        self.fields
            .get(ordinal)
            .ok_or(LookupError::FieldOutOfRange {
                type_name: self.type_name,
                ordinal,
                field_count: self.fields.len(),
            })
    }

    pub fn method(&self, ordinal: usize) -> Result<&MethodSlot<T>, LookupError> {
        self.methods
            .get(ordinal)
            .ok_or(LookupError::MethodOutOfRange {
                type_name: self.type_name,
                ordinal,
                method_count: self.methods.len(),
            })
    }

    pub fn get_field_ordinal(&self, name: &str) -> Result<usize, LookupError> {
        self.fields
            .iter()
            .position(|slot| slot.name == name)
            .ok_or_else(|| LookupError::UnknownField {
                type_name: self.type_name,
                name: name.to_string(),
            })
    }

    pub fn get_method_ordinal(&self, name: &str) -> Result<MethodOrdinal, LookupError> {
        let Some(slot) = self.methods.iter().find(|slot| slot.name == name) else {
            return Err(LookupError::UnknownMethod {
                type_name: self.type_name,
                name: name.to_string(),
            });
        };
        // the builder caps the method count at the ordinal width
        Ok(slot.ordinal as MethodOrdinal)
    }

    // Snapshots

    /// Reads every field in ordinal order; the presence mask is fully set
    pub fn snapshot_full(&self, instance: &T) -> Snapshot {
        Snapshot::full(self.fields.iter().map(|slot| slot.read(instance)).collect())
    }

    /// Checks an incoming snapshot against this descriptor without touching
    /// any instance
    pub fn check_snapshot(&self, snapshot: &Snapshot) -> Result<(), ProtocolError> {
        let expected_bytes = DiffMask::for_fields(self.fields.len()).byte_number();
        if snapshot.mask().byte_number() != expected_bytes {
            return Err(ProtocolError::MaskLengthMismatch {
                type_name: self.type_name,
                expected_bytes,
                actual_bytes: snapshot.mask().byte_number(),
            });
        }
        for (ordinal, value) in snapshot.iter() {
            let Some(slot) = self.fields.get(ordinal) else {
                return Err(ProtocolError::FieldOutOfRange {
                    type_name: self.type_name,
                    ordinal,
                    field_count: self.fields.len(),
                });
            };
            if value.kind() != slot.kind {
                return Err(ProtocolError::ValueKindMismatch {
                    type_name: self.type_name,
                    field: slot.name,
                    expected: slot.kind,
                    actual: value.kind(),
                });
            }
        }
        Ok(())
    }

    /// Writes every present value into `instance` in ascending ordinal order,
    /// leaving absent fields untouched, then runs the post-apply hook. The
    /// whole snapshot is validated first, so a rejected snapshot writes nothing.
    pub fn apply(&self, snapshot: &Snapshot, instance: &mut T) -> Result<(), ProtocolError> {
        self.check_snapshot(snapshot)?;
        for (ordinal, value) in snapshot.iter() {
            self.fields[ordinal].write(instance, value.clone());
        }
        instance.on_post_apply();
        Ok(())
    }

    // Invocations

    pub fn build_invocation(
        &self,
        name: &str,
        args: Vec<Value>,
    ) -> Result<RpcInvocation, LookupError> {
        let ordinal = self.get_method_ordinal(name)?;
        let slot = &self.methods[usize::from(ordinal)];
        match slot.argument_mismatch(&args) {
            None => Ok(RpcInvocation::new(ordinal, args)),
            Some(ArgumentMismatch::Count { expected, actual }) => Err(LookupError::ArgumentCount {
                type_name: self.type_name,
                method: slot.name,
                expected,
                actual,
            }),
            Some(ArgumentMismatch::Kind {
                index,
                expected,
                actual,
            }) => Err(LookupError::ArgumentKind {
                type_name: self.type_name,
                method: slot.name,
                index,
                expected,
                actual,
            }),
        }
    }

    /// Resolves an incoming invocation's method and checks its arguments
    pub fn check_invocation(
        &self,
        invocation: &RpcInvocation,
    ) -> Result<&MethodSlot<T>, ProtocolError> {
        let Some(slot) = self.methods.get(usize::from(invocation.method())) else {
            return Err(ProtocolError::UnknownMethod {
                type_name: self.type_name,
                ordinal: invocation.method(),
                method_count: self.methods.len(),
            });
        };
        match slot.argument_mismatch(invocation.args()) {
            None => Ok(slot),
            Some(ArgumentMismatch::Count { expected, actual }) => {
                Err(ProtocolError::ArgumentCount {
                    type_name: self.type_name,
                    method: slot.name,
                    expected,
                    actual,
                })
            }
            Some(ArgumentMismatch::Kind {
                index,
                expected,
                actual,
            }) => Err(ProtocolError::ArgumentKind {
                type_name: self.type_name,
                method: slot.name,
                index,
                expected,
                actual,
            }),
        }
    }

    /// Runs the method body unconditionally. Target policy is enforced by
    /// the dispatcher, not here.
    pub fn invoke(
        &self,
        invocation: &RpcInvocation,
        instance: &mut T,
        outbox: &mut RpcOutbox,
    ) -> Result<(), ProtocolError> {
        let slot = self.check_invocation(invocation)?;
        (slot.body)(instance, invocation.args(), outbox);
        Ok(())
    }

    fn downcast<'i>(&self, instance: &'i dyn Replicate) -> Option<&'i T> {
        instance.as_any().downcast_ref::<T>()
    }

    fn downcast_mut<'i>(&self, instance: &'i mut dyn Replicate) -> Option<&'i mut T> {
        instance.as_any_mut().downcast_mut::<T>()
    }
}

/// Object-safe view of a [`TypeDescriptor`], for code that only knows a
/// type through its Protocol net id
pub trait ReplicaDescriptor: Send + Sync {
    fn type_name(&self) -> &'static str;
    fn field_count(&self) -> usize;
    fn method_count(&self) -> usize;
    fn get_method_ordinal(&self, name: &str) -> Result<MethodOrdinal, LookupError>;
    fn build_invocation(&self, name: &str, args: Vec<Value>)
        -> Result<RpcInvocation, LookupError>;
    /// Resolves the invocation's Target, checking ordinal and arguments
    fn invocation_target(&self, invocation: &RpcInvocation) -> Result<Target, ProtocolError>;
    fn snapshot_instance(&self, instance: &dyn Replicate) -> Result<Snapshot, LookupError>;
    fn apply_to_instance(
        &self,
        snapshot: &Snapshot,
        instance: &mut dyn Replicate,
    ) -> Result<(), ProtocolError>;
    fn invoke_on_instance(
        &self,
        invocation: &RpcInvocation,
        instance: &mut dyn Replicate,
        outbox: &mut RpcOutbox,
    ) -> Result<(), ProtocolError>;
}

impl<T: Replicable> ReplicaDescriptor for TypeDescriptor<T> {
    fn type_name(&self) -> &'static str {
        self.type_name
    }

    fn field_count(&self) -> usize {
        self.fields.len()
    }

    fn method_count(&self) -> usize {
        self.methods.len()
    }

    fn get_method_ordinal(&self, name: &str) -> Result<MethodOrdinal, LookupError> {
        TypeDescriptor::get_method_ordinal(self, name)
    }

    fn build_invocation(
        &self,
        name: &str,
        args: Vec<Value>,
    ) -> Result<RpcInvocation, LookupError> {
        TypeDescriptor::build_invocation(self, name, args)
    }

    fn invocation_target(&self, invocation: &RpcInvocation) -> Result<Target, ProtocolError> {
        self.check_invocation(invocation).map(MethodSlot::target)
    }

    fn snapshot_instance(&self, instance: &dyn Replicate) -> Result<Snapshot, LookupError> {
        let Some(typed) = self.downcast(instance) else {
            return Err(LookupError::WrongInstanceType {
                expected: self.type_name,
                actual: instance.type_name(),
            });
        };
        Ok(self.snapshot_full(typed))
    }

    fn apply_to_instance(
        &self,
        snapshot: &Snapshot,
        instance: &mut dyn Replicate,
    ) -> Result<(), ProtocolError> {
        let actual = instance.type_name();
        let Some(typed) = self.downcast_mut(instance) else {
            return Err(ProtocolError::KindMismatch {
                expected: self.type_name,
                actual,
            });
        };
        self.apply(snapshot, typed)
    }

    fn invoke_on_instance(
        &self,
        invocation: &RpcInvocation,
        instance: &mut dyn Replicate,
        outbox: &mut RpcOutbox,
    ) -> Result<(), ProtocolError> {
        let actual = instance.type_name();
        let Some(typed) = self.downcast_mut(instance) else {
            return Err(ProtocolError::KindMismatch {
                expected: self.type_name,
                actual,
            });
        };
        self.invoke(invocation, typed, outbox)
    }
}
