//! Bindings
//!
//! A [`Binding`] pairs a [`Key`] with the recipe that constructs its value
//! and an optional cache hook. Bindings are always handled as
//! `Arc<Binding>`; pointer identity is what makes re-registering the same
//! binding (for example via a module installed twice) idempotent.

use std::any::{Any, type_name};
use std::fmt;
use std::sync::Arc;

use crate::container::Container;
use crate::error::{Error, Result};
use crate::key::{Bind, Key};

/// Type-erased product of a recipe
pub type Value = Arc<dyn Any + Send + Sync>;

/// Type-erased factory argument
pub type Argument = Box<dyn Any>;

/// Type-erased construction function
///
/// Receives the container so it can perform nested lookups; the container
/// map is immutable, so recipes can read other entries but never mutate
/// the registry.
pub type Recipe = Arc<dyn Fn(&Container, Argument) -> Result<Value> + Send + Sync>;

/// Cache hook consulted by the resolution engine around recipe invocation
///
/// Implemented by scope collaborators (singleton, request-scoped, ...).
/// The engine's contract is minimal: it calls [`try_get`](Self::try_get)
/// before running the recipe and offers the produced value via
/// [`put`](Self::put) afterwards. Eviction, expiry, and multiplicity
/// policy belong entirely to the implementation; concurrent callers may
/// race to compute candidate values, and the slot decides which write wins.
pub trait CacheSlot: Send + Sync {
    /// Return the cached value, if one is held
    fn try_get(&self) -> Option<Value>;

    /// Offer a freshly produced value for storage
    fn put(&self, value: Value);
}

/// A registered construction recipe with its key and optional cache hook
pub struct Binding {
    key: Key,
    recipe: Recipe,
    cache: Option<Arc<dyn CacheSlot>>,
}

impl Binding {
    /// Create a binding from an already type-erased recipe
    pub fn new(key: Key, recipe: Recipe, cache: Option<Arc<dyn CacheSlot>>) -> Arc<Self> {
        Arc::new(Self { key, recipe, cache })
    }

    /// Provider binding: constructs a `T` with no caller-supplied argument
    pub fn provider<T, F>(bind: Bind, recipe: F) -> Arc<Self>
    where
        T: Send + Sync + 'static,
        F: Fn(&Container) -> Result<T> + Send + Sync + 'static,
    {
        Self::provider_with(bind, None, recipe)
    }

    /// Provider binding with a cache hook
    pub fn provider_with<T, F>(
        bind: Bind,
        cache: Option<Arc<dyn CacheSlot>>,
        recipe: F,
    ) -> Arc<Self>
    where
        T: Send + Sync + 'static,
        F: Fn(&Container) -> Result<T> + Send + Sync + 'static,
    {
        let key = Key::provider(bind);
        let erased: Recipe =
            Arc::new(move |container, _arg| Ok(Arc::new(recipe(container)?) as Value));
        Self::new(key, erased, cache)
    }

    /// Factory binding: constructs a `T` from an argument of type `A`
    pub fn factory<T, A, F>(bind: Bind, recipe: F) -> Arc<Self>
    where
        T: Send + Sync + 'static,
        A: 'static,
        F: Fn(&Container, A) -> Result<T> + Send + Sync + 'static,
    {
        Self::factory_with(bind, None, recipe)
    }

    /// Factory binding with a cache hook
    pub fn factory_with<T, A, F>(
        bind: Bind,
        cache: Option<Arc<dyn CacheSlot>>,
        recipe: F,
    ) -> Arc<Self>
    where
        T: Send + Sync + 'static,
        A: 'static,
        F: Fn(&Container, A) -> Result<T> + Send + Sync + 'static,
    {
        let key = Key::factory::<A>(bind);
        let key_for_recipe = key.clone();
        let erased: Recipe = Arc::new(move |container, arg| {
            let arg = arg.downcast::<A>().map_err(|_| Error::WrongType {
                key: key_for_recipe.clone(),
                expected: type_name::<A>(),
            })?;
            Ok(Arc::new(recipe(container, *arg)?) as Value)
        });
        Self::new(key, erased, cache)
    }

    /// The key this binding registers under
    pub fn key(&self) -> &Key {
        &self.key
    }

    /// Whether a cache hook is attached
    pub fn is_cached(&self) -> bool {
        self.cache.is_some()
    }

    pub(crate) fn recipe(&self) -> &Recipe {
        &self.recipe
    }

    pub(crate) fn cache(&self) -> Option<&Arc<dyn CacheSlot>> {
        self.cache.as_ref()
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("key", &self.key.to_string())
            .field("cached", &self.is_cached())
            .finish_non_exhaustive()
    }
}
