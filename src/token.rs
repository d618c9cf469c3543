//! Type Tokens
//!
//! A [`TypeToken`] is an opaque, hashable identifier for a Rust type, used
//! as a component of binding keys. Equality and hashing are defined by the
//! underlying [`TypeId`] alone; the type name is carried purely for
//! diagnostics and error messages.

use std::any::{TypeId, type_name};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Opaque identifier for a type
///
/// Obtain one with [`TypeToken::of`]. Tokens for the same type are always
/// equal and hash identically; tokens for distinct types never compare
/// equal, even when their names collide across crates.
#[derive(Debug, Clone, Copy)]
pub struct TypeToken {
    id: TypeId,
    name: &'static str,
}

impl TypeToken {
    /// Create the token for `T`
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    /// Human-readable name of the tokenized type (diagnostics only)
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether this is the no-argument sentinel token
    pub fn is_no_arg(&self) -> bool {
        self.id == TypeId::of::<NoArg>()
    }
}

impl PartialEq for TypeToken {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeToken {}

impl Hash for TypeToken {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for TypeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Strip module paths so keys stay readable in logs and errors
        let short = self.name.rsplit("::").next().unwrap_or(self.name);
        f.write_str(short)
    }
}

/// Sentinel argument type for provider bindings
///
/// Providers take no caller-supplied argument; their keys carry
/// `TypeToken::of::<NoArg>()` as the argument type, and their producers are
/// invoked with a boxed `NoArg` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NoArg;

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of(token: &TypeToken) -> u64 {
        let mut hasher = DefaultHasher::new();
        token.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_tokens_of_same_type_are_equal_and_same_hash() {
        let a = TypeToken::of::<String>();
        let b = TypeToken::of::<String>();
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn test_tokens_of_distinct_types_differ() {
        assert_ne!(TypeToken::of::<u32>(), TypeToken::of::<i32>());
    }

    #[test]
    fn test_no_arg_sentinel_is_recognized() {
        assert!(TypeToken::of::<NoArg>().is_no_arg());
        assert!(!TypeToken::of::<String>().is_no_arg());
    }

    #[test]
    fn test_display_strips_module_path() {
        assert_eq!(TypeToken::of::<String>().to_string(), "String");
    }
}
