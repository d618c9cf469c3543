//! Binding Key Model
//!
//! Value objects identifying a registered construction recipe. A [`Bind`]
//! names the abstract request (type plus optional tag, ignoring argument
//! shape); a [`Key`] completes the identity with the argument type token —
//! the no-argument sentinel for providers, the argument's token for
//! factories. Keys are the unique registration unit: at most one binding
//! per key in a given container.

use std::borrow::Cow;
use std::fmt;

use crate::token::{NoArg, TypeToken};

/// Identity of an abstract request: a type token plus an optional tag
///
/// Two binds are equal iff both the type and the tag are equal; the absent
/// tag is a distinct, single case. Tags distinguish multiple bindings of
/// the same type (for example two database handles).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Bind {
    ty: TypeToken,
    tag: Option<Cow<'static, str>>,
}

impl Bind {
    /// Untagged bind for `T`
    pub fn new<T: ?Sized + 'static>() -> Self {
        Self {
            ty: TypeToken::of::<T>(),
            tag: None,
        }
    }

    /// Tagged bind for `T`
    pub fn tagged<T: ?Sized + 'static>(tag: impl Into<Cow<'static, str>>) -> Self {
        Self {
            ty: TypeToken::of::<T>(),
            tag: Some(tag.into()),
        }
    }

    /// The requested type
    pub fn ty(&self) -> TypeToken {
        self.ty
    }

    /// The tag, if any
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }
}

impl fmt::Display for Bind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.tag {
            Some(tag) => write!(f, "{}@{tag}", self.ty),
            None => write!(f, "{}", self.ty),
        }
    }
}

/// Full identity of a registered recipe: bind plus argument type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Key {
    bind: Bind,
    arg_ty: TypeToken,
}

impl Key {
    /// Key for a provider binding (no caller-supplied argument)
    pub fn provider(bind: Bind) -> Self {
        Self {
            bind,
            arg_ty: TypeToken::of::<NoArg>(),
        }
    }

    /// Key for a factory binding taking an argument of type `A`
    pub fn factory<A: ?Sized + 'static>(bind: Bind) -> Self {
        Self {
            bind,
            arg_ty: TypeToken::of::<A>(),
        }
    }

    /// Key with an explicit argument type token
    pub fn with_arg_token(bind: Bind, arg_ty: TypeToken) -> Self {
        Self { bind, arg_ty }
    }

    /// The abstract request this key registers
    pub fn bind(&self) -> &Bind {
        &self.bind
    }

    /// The argument type token (the [`NoArg`] sentinel for providers)
    pub fn arg_ty(&self) -> TypeToken {
        self.arg_ty
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.arg_ty.is_no_arg() {
            write!(f, "{}", self.bind)
        } else {
            write!(f, "{}({})", self.bind, self.arg_ty)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    struct Engine;

    fn hash_of(key: &Key) -> u64 {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_identical_inputs_yield_equal_same_hash_keys() {
        let a = Key::factory::<String>(Bind::tagged::<Engine>("turbo"));
        let b = Key::factory::<String>(Bind::tagged::<Engine>("turbo"));
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn test_any_differing_field_yields_unequal_keys() {
        let base = Key::factory::<String>(Bind::tagged::<Engine>("turbo"));
        let other_ty = Key::factory::<String>(Bind::tagged::<u32>("turbo"));
        let other_tag = Key::factory::<String>(Bind::tagged::<Engine>("diesel"));
        let no_tag = Key::factory::<String>(Bind::new::<Engine>());
        let other_arg = Key::factory::<u32>(Bind::tagged::<Engine>("turbo"));
        let provider = Key::provider(Bind::tagged::<Engine>("turbo"));
        assert_ne!(base, other_ty);
        assert_ne!(base, other_tag);
        assert_ne!(base, no_tag);
        assert_ne!(base, other_arg);
        assert_ne!(base, provider);
    }

    #[test]
    fn test_owned_and_borrowed_tags_compare_equal() {
        let borrowed = Bind::tagged::<Engine>("turbo");
        let owned = Bind::tagged::<Engine>(String::from("turbo"));
        assert_eq!(borrowed, owned);
    }

    #[test]
    fn test_display_formats() {
        assert_eq!(Key::provider(Bind::new::<Engine>()).to_string(), "Engine");
        assert_eq!(
            Key::factory::<String>(Bind::tagged::<Engine>("turbo")).to_string(),
            "Engine@turbo(String)"
        );
    }
}
