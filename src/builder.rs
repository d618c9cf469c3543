//! Binding Registry Builder
//!
//! Accumulation phase of the two-phase lifecycle: bindings are collected
//! here, then [`freeze`](ContainerBuilder::freeze) consumes the builder and
//! produces the immutable [`Container`]. The builder is single-owner state;
//! it is `Send` but offers only `&mut` mutation, so confinement during
//! accumulation is enforced by the borrow checker.
//!
//! Conflict policy: a key may hold at most one *declared* binding.
//! Re-registering the identical binding (`Arc` identity) is a tolerated
//! no-op so that modules can be installed more than once. Bindings copied
//! in by [`merge_from`](ContainerBuilder::merge_from) are *inherited* and
//! stay overridable by later declarations or later merges — that makes
//! extension composable, with precedence controlled by call order.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::binding::{Binding, CacheSlot};
use crate::container::Container;
use crate::error::{Error, Result};
use crate::key::{Bind, Key};
use crate::module::Module;

struct Slot {
    binding: Arc<Binding>,
    inherited: bool,
}

/// Mutable accumulator of bindings, frozen into a [`Container`]
#[derive(Default)]
pub struct ContainerBuilder {
    slots: HashMap<Key, Slot>,
}

impl ContainerBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a binding under its key
    ///
    /// Fails with [`Error::Conflict`] if the key already holds a different
    /// declared binding. Registering the identical binding again is a
    /// no-op; registering over an inherited binding overrides it.
    pub fn register(&mut self, binding: Arc<Binding>) -> Result<()> {
        self.insert(binding, false)
    }

    /// Copy all bindings of an already-frozen container into this builder
    ///
    /// The copies are marked inherited: later `register` calls may
    /// override them, while bindings already declared here conflict with
    /// differing merged-in ones. Caller-controlled call order is the
    /// precedence mechanism.
    pub fn merge_from(&mut self, container: &Container) -> Result<()> {
        debug!(bindings = container.len(), "merging container into builder");
        for binding in container.bindings() {
            self.insert(Arc::clone(binding), true)?;
        }
        Ok(())
    }

    /// Replay a module's declarations into this builder
    pub fn install(&mut self, module: &dyn Module) -> Result<()> {
        debug!(module = module.name(), "installing module");
        module.apply(self)
    }

    /// Number of accumulated bindings
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no bindings have been accumulated
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Freeze into an immutable container
    ///
    /// Consumes the builder; the container owns an independent snapshot
    /// and no further mutation is possible.
    pub fn freeze(self) -> Container {
        debug!(bindings = self.slots.len(), "freezing container");
        Container::from_map(
            self.slots
                .into_iter()
                .map(|(key, slot)| (key, slot.binding))
                .collect(),
        )
    }

    fn insert(&mut self, binding: Arc<Binding>, inherited: bool) -> Result<()> {
        let key = binding.key().clone();
        match self.slots.entry(key) {
            Entry::Vacant(entry) => {
                debug!(key = %entry.key(), inherited, "registered binding");
                entry.insert(Slot { binding, inherited });
                Ok(())
            }
            Entry::Occupied(mut entry) => {
                if Arc::ptr_eq(&entry.get().binding, &binding) {
                    // Idempotent re-registration, e.g. a module installed
                    // twice replaying the same bindings
                    trace!(key = %entry.key(), "identical binding re-registered");
                    Ok(())
                } else if entry.get().inherited {
                    debug!(key = %entry.key(), "overriding inherited binding");
                    entry.insert(Slot { binding, inherited });
                    Ok(())
                } else {
                    Err(Error::Conflict {
                        key: entry.key().clone(),
                    })
                }
            }
        }
    }

    // Typed registration sugar. Thin adapters over `register`; the
    // matching typed accessors live on `Container`.

    /// Register an untagged provider for `T`
    pub fn provide<T, F>(&mut self, recipe: F) -> Result<()>
    where
        T: Send + Sync + 'static,
        F: Fn(&Container) -> Result<T> + Send + Sync + 'static,
    {
        self.register(Binding::provider(Bind::new::<T>(), recipe))
    }

    /// Register a tagged provider for `T`
    pub fn provide_tagged<T, F>(&mut self, tag: &'static str, recipe: F) -> Result<()>
    where
        T: Send + Sync + 'static,
        F: Fn(&Container) -> Result<T> + Send + Sync + 'static,
    {
        self.register(Binding::provider(Bind::tagged::<T>(tag), recipe))
    }

    /// Register an untagged provider for `T` with a cache hook
    pub fn provide_cached<T, F>(&mut self, cache: Arc<dyn CacheSlot>, recipe: F) -> Result<()>
    where
        T: Send + Sync + 'static,
        F: Fn(&Container) -> Result<T> + Send + Sync + 'static,
    {
        self.register(Binding::provider_with(Bind::new::<T>(), Some(cache), recipe))
    }

    /// Register a tagged provider for `T` with a cache hook
    pub fn provide_tagged_cached<T, F>(
        &mut self,
        tag: &'static str,
        cache: Arc<dyn CacheSlot>,
        recipe: F,
    ) -> Result<()>
    where
        T: Send + Sync + 'static,
        F: Fn(&Container) -> Result<T> + Send + Sync + 'static,
    {
        self.register(Binding::provider_with(
            Bind::tagged::<T>(tag),
            Some(cache),
            recipe,
        ))
    }

    /// Register an untagged factory for `T` taking an argument of type `A`
    pub fn factory<T, A, F>(&mut self, recipe: F) -> Result<()>
    where
        T: Send + Sync + 'static,
        A: 'static,
        F: Fn(&Container, A) -> Result<T> + Send + Sync + 'static,
    {
        self.register(Binding::factory(Bind::new::<T>(), recipe))
    }

    /// Register a tagged factory for `T` taking an argument of type `A`
    pub fn factory_tagged<T, A, F>(&mut self, tag: &'static str, recipe: F) -> Result<()>
    where
        T: Send + Sync + 'static,
        A: 'static,
        F: Fn(&Container, A) -> Result<T> + Send + Sync + 'static,
    {
        self.register(Binding::factory(Bind::tagged::<T>(tag), recipe))
    }

    /// Register an untagged factory for `T` with a cache hook
    pub fn factory_cached<T, A, F>(&mut self, cache: Arc<dyn CacheSlot>, recipe: F) -> Result<()>
    where
        T: Send + Sync + 'static,
        A: 'static,
        F: Fn(&Container, A) -> Result<T> + Send + Sync + 'static,
    {
        self.register(Binding::factory_with(Bind::new::<T>(), Some(cache), recipe))
    }

    /// Register a tagged factory for `T` with a cache hook
    pub fn factory_tagged_cached<T, A, F>(
        &mut self,
        tag: &'static str,
        cache: Arc<dyn CacheSlot>,
        recipe: F,
    ) -> Result<()>
    where
        T: Send + Sync + 'static,
        A: 'static,
        F: Fn(&Container, A) -> Result<T> + Send + Sync + 'static,
    {
        self.register(Binding::factory_with(
            Bind::tagged::<T>(tag),
            Some(cache),
            recipe,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Engine(&'static str);

    fn engine_binding(name: &'static str) -> Arc<Binding> {
        Binding::provider(Bind::new::<Engine>(), move |_| Ok(Engine(name)))
    }

    #[test]
    fn test_conflicting_registration_fails() {
        let mut builder = ContainerBuilder::new();
        builder.register(engine_binding("v8")).unwrap();
        let err = builder.register(engine_binding("spider")).unwrap_err();
        let expected = Key::provider(Bind::new::<Engine>());
        assert!(matches!(err, Error::Conflict { key } if key == expected));
        assert_eq!(builder.len(), 1);
    }

    #[test]
    fn test_identical_binding_re_registration_is_idempotent() {
        let binding = engine_binding("v8");
        let mut builder = ContainerBuilder::new();
        builder.register(Arc::clone(&binding)).unwrap();
        builder.register(binding).unwrap();
        assert_eq!(builder.len(), 1);
    }

    #[test]
    fn test_register_after_merge_overrides() {
        let mut base = ContainerBuilder::new();
        base.register(engine_binding("v8")).unwrap();
        let base = base.freeze();

        let mut extended = ContainerBuilder::new();
        extended.merge_from(&base).unwrap();
        extended.register(engine_binding("spider")).unwrap();
        let container = extended.freeze();

        assert_eq!(*container.get::<Engine>().unwrap(), Engine("spider"));
    }

    #[test]
    fn test_merge_after_register_conflicts() {
        let mut base = ContainerBuilder::new();
        base.register(engine_binding("v8")).unwrap();
        let base = base.freeze();

        let mut extended = ContainerBuilder::new();
        extended.register(engine_binding("spider")).unwrap();
        let err = extended.merge_from(&base).unwrap_err();
        assert!(matches!(err, Error::Conflict { .. }));
    }

    #[test]
    fn test_later_merge_overrides_earlier_merge() {
        let mut first = ContainerBuilder::new();
        first.register(engine_binding("v8")).unwrap();
        let first = first.freeze();

        let mut second = ContainerBuilder::new();
        second.register(engine_binding("spider")).unwrap();
        let second = second.freeze();

        let mut combined = ContainerBuilder::new();
        combined.merge_from(&first).unwrap();
        combined.merge_from(&second).unwrap();
        let container = combined.freeze();

        assert_eq!(*container.get::<Engine>().unwrap(), Engine("spider"));
    }

    #[test]
    fn test_merging_the_same_container_twice_is_idempotent() {
        let mut base = ContainerBuilder::new();
        base.register(engine_binding("v8")).unwrap();
        let base = base.freeze();

        let mut builder = ContainerBuilder::new();
        builder.merge_from(&base).unwrap();
        builder.merge_from(&base).unwrap();
        assert_eq!(builder.len(), 1);
    }
}
