//! Modules
//!
//! A module is a named, replayable bundle of builder mutations, letting the
//! same declarations be installed into multiple builders. Modules hold no
//! mutable state; `apply` is a declaration script.

use std::sync::Arc;

use crate::binding::Binding;
use crate::builder::ContainerBuilder;
use crate::error::Result;

/// Reusable bundle of binding declarations
pub trait Module: Send + Sync {
    /// Module name, for logs and diagnostics
    fn name(&self) -> &str;

    /// Replay this module's declarations into the builder
    fn apply(&self, builder: &mut ContainerBuilder) -> Result<()>;
}

/// Stock [`Module`]: a named set of prebuilt bindings
///
/// The bindings are constructed once, when the module is assembled, and
/// every `apply` replays the same `Arc`s. Installing the module into the
/// same builder twice is therefore a no-op the second time, per the
/// builder's identical-binding tolerance.
pub struct BindingModule {
    name: String,
    bindings: Vec<Arc<Binding>>,
}

impl BindingModule {
    /// Create an empty module
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bindings: Vec::new(),
        }
    }

    /// Add a binding, builder-style
    #[must_use]
    pub fn with(mut self, binding: Arc<Binding>) -> Self {
        self.bindings.push(binding);
        self
    }

    /// Add a binding in place
    pub fn push(&mut self, binding: Arc<Binding>) {
        self.bindings.push(binding);
    }

    /// Number of bindings this module declares
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Whether this module declares no bindings
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl Module for BindingModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, builder: &mut ContainerBuilder) -> Result<()> {
        for binding in &self.bindings {
            builder.register(Arc::clone(binding))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::Bind;

    #[derive(Debug, PartialEq)]
    struct Engine(&'static str);
    #[derive(Debug, PartialEq)]
    struct Wheel(u8);

    fn drivetrain() -> BindingModule {
        BindingModule::new("drivetrain")
            .with(Binding::provider(Bind::new::<Engine>(), |_| Ok(Engine("v8"))))
            .with(Binding::provider(Bind::new::<Wheel>(), |_| Ok(Wheel(4))))
    }

    #[test]
    fn test_module_installs_all_bindings() {
        let module = drivetrain();
        let mut builder = ContainerBuilder::new();
        builder.install(&module).unwrap();
        let container = builder.freeze();
        assert_eq!(*container.get::<Engine>().unwrap(), Engine("v8"));
        assert_eq!(*container.get::<Wheel>().unwrap(), Wheel(4));
    }

    #[test]
    fn test_double_install_is_idempotent() {
        let module = drivetrain();
        let mut builder = ContainerBuilder::new();
        builder.install(&module).unwrap();
        builder.install(&module).unwrap();
        assert_eq!(builder.len(), 2);
    }

    #[test]
    fn test_same_module_installs_into_independent_builders() {
        let module = drivetrain();
        let first = {
            let mut builder = ContainerBuilder::new();
            builder.install(&module).unwrap();
            builder.freeze()
        };
        let second = {
            let mut builder = ContainerBuilder::new();
            builder.install(&module).unwrap();
            builder.freeze()
        };
        assert_eq!(*first.get::<Engine>().unwrap(), Engine("v8"));
        assert_eq!(*second.get::<Engine>().unwrap(), Engine("v8"));
    }
}
