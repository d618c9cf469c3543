//! Binding registry and resolution engine for runtime dependency injection
//!
//! `bindery` maps an abstract request — "give me a `T`, optionally tagged,
//! optionally parameterized by an argument `A`" — to a concrete
//! construction recipe, resolves it on demand, and detects illegal circular
//! dependencies.
//!
//! ## Lifecycle
//!
//! Bindings accumulate in a [`ContainerBuilder`] (single-owner, mutable),
//! which [`freeze`](ContainerBuilder::freeze)s into an immutable
//! [`Container`] that can be shared across threads and queried by [`Key`].
//! A lookup yields a [`Producer`]; invoking it runs the recipe under cycle
//! protection, consulting the binding's optional [`CacheSlot`] hook so
//! scope collaborators can reuse values without the engine knowing their
//! policy.
//!
//! ## Example
//!
//! ```rust
//! use bindery::{ContainerBuilder, Result};
//!
//! #[derive(Debug, PartialEq)]
//! struct Engine(&'static str);
//!
//! struct Car {
//!     engine: &'static str,
//! }
//!
//! fn main() -> Result<()> {
//!     let mut builder = ContainerBuilder::new();
//!     builder.provide::<Engine, _>(|_| Ok(Engine("V8")))?;
//!     builder.provide::<Car, _>(|cx| {
//!         let engine = cx.get::<Engine>()?;
//!         Ok(Car { engine: engine.0 })
//!     })?;
//!
//!     let container = builder.freeze();
//!     let car = container.get::<Car>()?;
//!     assert_eq!(car.engine, "V8");
//!     Ok(())
//! }
//! ```
//!
//! ## Failure semantics
//!
//! - [`Error::Conflict`]: build time, two distinct bindings for one key
//!   (re-registering the identical binding is a tolerated no-op).
//! - [`Error::NotFound`]: required lookup of an unregistered key; the
//!   non-required [`Container::lookup`] returns `None` instead.
//! - [`Error::DependencyLoop`]: a recipe requested its own key, directly or
//!   transitively, while already being produced; carries the offending key
//!   sequence.
//! - Recipe errors propagate unchanged; the engine never wraps or retries.

pub mod binding;
pub mod builder;
pub mod container;
pub mod error;
pub mod key;
pub mod module;
pub mod token;

pub use binding::{Argument, Binding, CacheSlot, Recipe, Value};
pub use builder::ContainerBuilder;
pub use container::{Container, Producer};
pub use error::{Error, Result};
pub use key::{Bind, Key};
pub use module::{BindingModule, Module};
pub use token::{NoArg, TypeToken};
