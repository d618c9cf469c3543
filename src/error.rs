//! Error handling types

use crate::key::Key;
use thiserror::Error;

/// Result type alias for operations that can fail
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the binding registry and resolution engine
#[derive(Error, Debug)]
pub enum Error {
    /// Two distinct bindings were registered under the same key
    #[error("conflicting binding for {key}")]
    Conflict {
        /// The key both bindings targeted
        key: Key,
    },

    /// A required lookup found no binding for the key
    #[error("no binding registered for {key}")]
    NotFound {
        /// The key that was looked up
        key: Key,
    },

    /// A key re-entered its own in-progress resolution
    #[error("dependency loop: {}", fmt_cycle(.cycle))]
    DependencyLoop {
        /// The ordered key sequence forming the cycle
        cycle: Vec<Key>,
    },

    /// A typed accessor received a value or argument of the wrong type
    #[error("value for {key} is not a `{expected}`")]
    WrongType {
        /// The key whose binding produced or consumed the mismatch
        key: Key,
        /// Name of the type the caller asked for
        expected: &'static str,
    },

    /// Failure raised by a recipe during construction
    #[error("recipe error: {0}")]
    Recipe(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Create a recipe error from any error source
    pub fn recipe<E>(source: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::Recipe(source.into())
    }
}

fn fmt_cycle(cycle: &[Key]) -> String {
    let mut out = String::new();
    for key in cycle {
        if !out.is_empty() {
            out.push_str(" -> ");
        }
        out.push_str(&key.to_string());
    }
    // Close the loop back to the first key for readability
    if let Some(first) = cycle.first() {
        out.push_str(" -> ");
        out.push_str(&first.to_string());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::Bind;

    #[test]
    fn test_dependency_loop_display_closes_the_cycle() {
        let k1 = Key::provider(Bind::new::<u8>());
        let k2 = Key::provider(Bind::new::<u16>());
        let err = Error::DependencyLoop {
            cycle: vec![k1.clone(), k2],
        };
        let text = err.to_string();
        assert!(text.starts_with("dependency loop: "));
        assert!(text.ends_with(&format!("-> {k1}")));
    }
}
