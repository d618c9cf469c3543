//! Resolution Engine
//!
//! The frozen, queryable side of the registry. A [`Container`] is an
//! immutable key-to-binding map produced by
//! [`ContainerBuilder::freeze`](crate::builder::ContainerBuilder::freeze);
//! it is cheaply cloneable and may be shared across threads without
//! synchronization because nothing mutates it after freezing.
//!
//! Lookups return a [`Producer`], a callable that runs the binding's recipe
//! under cycle protection: every in-progress key is tracked on a
//! thread-local resolution stack, and a key re-entering its own resolution
//! fails with [`Error::DependencyLoop`] carrying the offending sequence.
//! The stack is per-thread, so independent call trees running concurrently
//! never trigger cycle detection against each other.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::binding::{Argument, Binding, Value};
use crate::error::{Error, Result};
use crate::key::{Bind, Key};
use crate::token::NoArg;

thread_local! {
    /// Keys currently being resolved on this thread, outermost first
    static RESOLUTION_STACK: RefCell<Vec<Key>> = const { RefCell::new(Vec::new()) };
}

/// RAII entry on the resolution stack; pops on drop, success or failure
struct StackGuard;

impl StackGuard {
    fn push(key: &Key) -> Result<Self> {
        RESOLUTION_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            if let Some(pos) = stack.iter().position(|held| held == key) {
                let cycle: Vec<Key> = stack[pos..].to_vec();
                debug_assert_eq!(cycle.first(), Some(key));
                return Err(Error::DependencyLoop { cycle });
            }
            stack.push(key.clone());
            Ok(Self)
        })
    }
}

impl Drop for StackGuard {
    fn drop(&mut self) {
        RESOLUTION_STACK.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

/// Immutable, shareable registry of bindings
///
/// Construct-once, read-many: built by freezing a
/// [`ContainerBuilder`](crate::builder::ContainerBuilder), then queried by
/// key. Cloning is cheap (the binding map is behind an `Arc`).
#[derive(Clone)]
pub struct Container {
    bindings: Arc<HashMap<Key, Arc<Binding>>>,
}

impl Container {
    pub(crate) fn from_map(bindings: HashMap<Key, Arc<Binding>>) -> Self {
        Self {
            bindings: Arc::new(bindings),
        }
    }

    /// Look up the producer for `key`; `None` if nothing is registered
    pub fn lookup(&self, key: &Key) -> Option<Producer> {
        let binding = self.bindings.get(key)?;
        trace!(key = %key, "lookup hit");
        Some(Producer {
            container: self.clone(),
            binding: Arc::clone(binding),
        })
    }

    /// Look up the producer for `key`, failing with [`Error::NotFound`]
    /// when nothing is registered
    pub fn lookup_required(&self, key: &Key) -> Result<Producer> {
        self.lookup(key).ok_or_else(|| Error::NotFound {
            key: key.clone(),
        })
    }

    /// Whether a binding is registered for `key`
    pub fn contains(&self, key: &Key) -> bool {
        self.bindings.contains_key(key)
    }

    /// All registered keys, in unspecified order; invokes no recipe
    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.bindings.keys()
    }

    /// All registered bindings, in unspecified order; invokes no recipe
    pub fn bindings(&self) -> impl Iterator<Item = &Arc<Binding>> {
        self.bindings.values()
    }

    /// Number of registered bindings
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Whether no bindings are registered
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    // Typed convenience layer over `lookup`/`lookup_required`. These pair
    // with the typed registration sugar on the builder; the untyped core
    // above is the actual engine surface.

    /// Resolve an untagged provider binding for `T`
    pub fn get<T: Send + Sync + 'static>(&self) -> Result<Arc<T>> {
        self.resolve_provider(Bind::new::<T>())
    }

    /// Resolve a tagged provider binding for `T`
    pub fn get_tagged<T: Send + Sync + 'static>(&self, tag: &'static str) -> Result<Arc<T>> {
        self.resolve_provider(Bind::tagged::<T>(tag))
    }

    /// Resolve an untagged factory binding for `T` with argument `arg`
    pub fn get_with<T, A>(&self, arg: A) -> Result<Arc<T>>
    where
        T: Send + Sync + 'static,
        A: 'static,
    {
        self.resolve_factory(Bind::new::<T>(), arg)
    }

    /// Resolve a tagged factory binding for `T` with argument `arg`
    pub fn get_tagged_with<T, A>(&self, tag: &'static str, arg: A) -> Result<Arc<T>>
    where
        T: Send + Sync + 'static,
        A: 'static,
    {
        self.resolve_factory(Bind::tagged::<T>(tag), arg)
    }

    /// Resolve an untagged provider binding for `T`, `None` when absent
    ///
    /// Resolution failures other than absence (cycles, recipe errors) still
    /// propagate. The same holds for the other `try_*` variants.
    pub fn try_get<T: Send + Sync + 'static>(&self) -> Result<Option<Arc<T>>> {
        self.try_resolve_provider(Bind::new::<T>())
    }

    /// Resolve a tagged provider binding for `T`, `None` when absent
    pub fn try_get_tagged<T: Send + Sync + 'static>(
        &self,
        tag: &'static str,
    ) -> Result<Option<Arc<T>>> {
        self.try_resolve_provider(Bind::tagged::<T>(tag))
    }

    /// Resolve an untagged factory binding for `T`, `None` when absent
    pub fn try_get_with<T, A>(&self, arg: A) -> Result<Option<Arc<T>>>
    where
        T: Send + Sync + 'static,
        A: 'static,
    {
        self.try_resolve_factory(Bind::new::<T>(), arg)
    }

    /// Resolve a tagged factory binding for `T`, `None` when absent
    pub fn try_get_tagged_with<T, A>(&self, tag: &'static str, arg: A) -> Result<Option<Arc<T>>>
    where
        T: Send + Sync + 'static,
        A: 'static,
    {
        self.try_resolve_factory(Bind::tagged::<T>(tag), arg)
    }

    fn resolve_provider<T: Send + Sync + 'static>(&self, bind: Bind) -> Result<Arc<T>> {
        let key = Key::provider(bind);
        let value = self.lookup_required(&key)?.invoke(Box::new(NoArg))?;
        downcast_value::<T>(value, &key)
    }

    fn resolve_factory<T, A>(&self, bind: Bind, arg: A) -> Result<Arc<T>>
    where
        T: Send + Sync + 'static,
        A: 'static,
    {
        let key = Key::factory::<A>(bind);
        let value = self.lookup_required(&key)?.invoke(Box::new(arg))?;
        downcast_value::<T>(value, &key)
    }

    fn try_resolve_provider<T: Send + Sync + 'static>(&self, bind: Bind) -> Result<Option<Arc<T>>> {
        let key = Key::provider(bind);
        match self.lookup(&key) {
            None => Ok(None),
            Some(producer) => {
                let value = producer.invoke(Box::new(NoArg))?;
                downcast_value::<T>(value, &key).map(Some)
            }
        }
    }

    fn try_resolve_factory<T, A>(&self, bind: Bind, arg: A) -> Result<Option<Arc<T>>>
    where
        T: Send + Sync + 'static,
        A: 'static,
    {
        let key = Key::factory::<A>(bind);
        match self.lookup(&key) {
            None => Ok(None),
            Some(producer) => {
                let value = producer.invoke(Box::new(arg))?;
                downcast_value::<T>(value, &key).map(Some)
            }
        }
    }
}

fn downcast_value<T: Send + Sync + 'static>(value: Value, key: &Key) -> Result<Arc<T>> {
    value.downcast::<T>().map_err(|_| Error::WrongType {
        key: key.clone(),
        expected: std::any::type_name::<T>(),
    })
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Deterministic listing without invoking any recipe
        let mut keys: Vec<String> = self.bindings.keys().map(ToString::to_string).collect();
        keys.sort_unstable();
        f.debug_struct("Container").field("keys", &keys).finish()
    }
}

/// Callable handle for one registered binding
///
/// Obtained from [`Container::lookup`]; invoking it runs the cycle-checked
/// construction path. Providers take the [`NoArg`] sentinel as argument
/// (or use [`Producer::call`]).
#[derive(Clone)]
pub struct Producer {
    container: Container,
    binding: Arc<Binding>,
}

impl Producer {
    /// The key this producer resolves
    pub fn key(&self) -> &Key {
        self.binding.key()
    }

    /// Run the construction path with a type-erased argument
    ///
    /// The key is held on the resolution stack for the full duration,
    /// including the cache check, so nested cycle detection stays correct;
    /// it is popped unconditionally on exit, so a failed branch never
    /// poisons cycle detection for sibling resolutions.
    pub fn invoke(&self, argument: Argument) -> Result<Value> {
        let key = self.binding.key();
        let _guard = StackGuard::push(key)?;

        if let Some(cache) = self.binding.cache() {
            if let Some(value) = cache.try_get() {
                trace!(key = %key, "cache hit");
                return Ok(value);
            }
        }

        trace!(key = %key, "producing");
        let value = (self.binding.recipe())(&self.container, argument)?;

        if let Some(cache) = self.binding.cache() {
            cache.put(value.clone());
        }
        Ok(value)
    }

    /// Invoke a provider binding (no caller-supplied argument)
    pub fn call(&self) -> Result<Value> {
        self.invoke(Box::new(NoArg))
    }

    /// Invoke and downcast to the concrete product type
    pub fn invoke_as<T: Send + Sync + 'static>(&self, argument: Argument) -> Result<Arc<T>> {
        let value = self.invoke(argument)?;
        downcast_value::<T>(value, self.binding.key())
    }
}

impl fmt::Debug for Producer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Producer")
            .field("key", &self.binding.key().to_string())
            .finish_non_exhaustive()
    }
}
