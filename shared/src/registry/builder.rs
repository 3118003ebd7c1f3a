use std::any::type_name;

use crate::{
    registry::{
        descriptor::{FieldSlot, MethodSlot, Target, TypeDescriptor, Visibility},
        error::ConfigError,
        replicable::Replicable,
    },
    rpc::outbox::RpcOutbox,
    types::MethodOrdinal,
    value::{ReplicatedField, Value, ValueKind},
};

/// Collects the replicated fields and remote-callable methods of `T`, in
/// the order they are declared. Handed to [`Replicable::describe`].
///
/// The first configuration error is kept and reported by the registry when
/// the descriptor is built; later declarations are ignored.
pub struct DescriptorBuilder<T> {
    type_name: &'static str,
    fields: Vec<FieldSlot<T>>,
    methods: Vec<MethodSlot<T>>,
    declared_own_slots: bool,
    error: Option<ConfigError>,
}

impl<T: Replicable> DescriptorBuilder<T> {
    pub(crate) fn new() -> Self {
        Self {
            type_name: type_name::<T>(),
            fields: Vec::new(),
            methods: Vec::new(),
            declared_own_slots: false,
            error: None,
        }
    }

    /// Runs `T::describe` and returns the finished descriptor
    pub(crate) fn build() -> Result<TypeDescriptor<T>, ConfigError> {
        let mut builder = Self::new();
        T::describe(&mut builder);
        builder.finish()
    }

    /// Pulls in every field and method of base type `B`, reached through
    /// `view` / `view_mut`. Base slots take the lowest ordinals, so this must
    /// be called before any `field` or `method` of `T`.
    pub fn inherit<B: Replicable>(
        &mut self,
        view: fn(&T) -> &B,
        view_mut: fn(&mut T) -> &mut B,
    ) -> &mut Self {
        if self.error.is_some() {
            return self;
        }
        if self.declared_own_slots {
            self.error = Some(ConfigError::BaseAfterOwnSlots {
                type_name: self.type_name,
                base: type_name::<B>(),
            });
            return self;
        }

        let base = match DescriptorBuilder::<B>::build() {
            Ok(base) => base,
            Err(error) => {
                self.error = Some(error);
                return self;
            }
        };
        let (base_fields, base_methods) = base.into_slots();

        for slot in base_fields {
            let FieldSlot {
                name,
                kind,
                visibility,
                declared_on,
                get,
                set,
                ..
            } = slot;
            self.push_field(FieldSlot {
                ordinal: self.fields.len(),
                name,
                kind,
                visibility,
                declared_on,
                get: Box::new(move |instance: &T| get(view(instance))),
                set: Box::new(move |instance: &mut T, value| set(view_mut(instance), value)),
            });
        }
        for slot in base_methods {
            let MethodSlot {
                name,
                target,
                params,
                declared_on,
                body,
                ..
            } = slot;
            self.push_method(MethodSlot {
                ordinal: self.methods.len(),
                name,
                target,
                params,
                declared_on,
                body: Box::new(move |instance: &mut T, args: &[Value], outbox: &mut RpcOutbox| {
                    body(view_mut(instance), args, outbox)
                }),
            });
        }
        self
    }

    /// Declares a replicated field. Its ordinal is its position among all
    /// fields of `T`, counting inherited ones first.
    pub fn field<F: ReplicatedField>(
        &mut self,
        name: &'static str,
        visibility: Visibility,
        get: fn(&T) -> &F,
        get_mut: fn(&mut T) -> &mut F,
    ) -> &mut Self {
        self.declared_own_slots = true;
        if self.error.is_some() {
            return self;
        }
        if !visibility.is_replicable() {
            self.error = Some(ConfigError::PrivateReplicatedField {
                type_name: self.type_name,
                field: name,
            });
            return self;
        }

        self.push_field(FieldSlot {
            ordinal: self.fields.len(),
            name,
            kind: F::KIND,
            visibility,
            declared_on: self.type_name,
            get: Box::new(move |instance: &T| get(instance).to_value()),
            set: Box::new(move |instance: &mut T, value| match F::from_value(value) {
                Some(value) => {
                    *get_mut(instance) = value;
                    true
                }
                None => false,
            }),
        });
        self
    }

    /// Declares a remote-callable method. `params` fixes the argument kinds
    /// checked on both ends before `body` runs.
    pub fn method(
        &mut self,
        name: &'static str,
        target: Target,
        params: &[ValueKind],
        body: fn(&mut T, &[Value], &mut RpcOutbox),
    ) -> &mut Self {
        self.declared_own_slots = true;
        if self.error.is_some() {
            return self;
        }

        self.push_method(MethodSlot {
            ordinal: self.methods.len(),
            name,
            target,
            params: params.to_vec(),
            declared_on: self.type_name,
            body: Box::new(body),
        });
        self
    }

    fn push_field(&mut self, slot: FieldSlot<T>) {
        if self.error.is_some() {
            return;
        }
        if self.fields.iter().any(|field| field.name == slot.name) {
            self.error = Some(ConfigError::DuplicateField {
                type_name: self.type_name,
                field: slot.name,
            });
            return;
        }
        self.fields.push(slot);
    }

    fn push_method(&mut self, slot: MethodSlot<T>) {
        if self.error.is_some() {
            return;
        }
        if self.methods.iter().any(|method| method.name == slot.name) {
            self.error = Some(ConfigError::DuplicateMethod {
                type_name: self.type_name,
                method: slot.name,
            });
            return;
        }
        self.methods.push(slot);
    }

    pub(crate) fn finish(self) -> Result<TypeDescriptor<T>, ConfigError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        // ordinals travel as u16 on the wire
        let limit = usize::from(MethodOrdinal::MAX) + 1;
        if self.fields.len() > limit {
            return Err(ConfigError::TooManySlots {
                type_name: self.type_name,
                slot: "field",
                count: self.fields.len(),
            });
        }
        if self.methods.len() > limit {
            return Err(ConfigError::TooManySlots {
                type_name: self.type_name,
                slot: "method",
                count: self.methods.len(),
            });
        }
        Ok(TypeDescriptor::new(self.type_name, self.fields, self.methods))
    }
}
