use std::any::Any;

use crate::registry::builder::DescriptorBuilder;

/// Implemented by every object type that takes part in replication.
///
/// `describe` is the single source of truth for the type's replicated
/// fields and remote-callable methods. Both peers build their descriptors
/// from it, so the order of declarations there is the wire order.
///
/// ```ignore
/// impl Replicable for SimpleBullet {
///     fn describe(builder: &mut DescriptorBuilder<Self>) {
///         builder
///             .field("age", Visibility::Protected, |b| &b.age, |b| &mut b.age)
///             .field("move_direction", Visibility::Protected, |b| &b.move_direction, |b| &mut b.move_direction);
///     }
/// }
/// ```
pub trait Replicable: Any + Send + Sync + Sized {
    fn describe(builder: &mut DescriptorBuilder<Self>);

    /// Runs after an incoming snapshot or diff has been written into `self`
    fn on_post_apply(&mut self) {}

    /// Instances returning true receive an update every replication tick,
    /// even when none of their fields changed, so `on_post_apply` fires
    /// each tick (e.g. to reset interpolation targets)
    fn always_replicate(&self) -> bool {
        false
    }
}

/// Object-safe view of a [`Replicable`], used wherever the concrete type is
/// only known through the Protocol
pub trait Replicate: Any + Send + Sync {
    fn type_name(&self) -> &'static str;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn post_apply(&mut self);
    fn is_always_replicated(&self) -> bool;
}

impl<T: Replicable> Replicate for T {
    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn post_apply(&mut self) {
        self.on_post_apply();
    }

    fn is_always_replicated(&self) -> bool {
        self.always_replicate()
    }
}
