use alloc::collections::BTreeMap;
use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};

use dc_utils::hash::hashbrown;

use crate::Tag;

// -----------------------------------------------------------------------------
// FieldValue

/// A present field, as seen by the resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// A value usable as a discriminator.
    Tag(Tag),
    /// A value that can never be a discriminator, e.g. a float or a nested
    /// object. Holds the kind name used in error messages.
    Other(&'static str),
}

// -----------------------------------------------------------------------------
// FieldSource

/// Raw field access into one structure of the input data.
///
/// Implementations must return `None` only when the field is absent.
/// A field present with a null value is `Some(FieldValue::Tag(Tag::Null))`.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
/// use dc_downcast::{FieldSource, FieldValue, Tag};
///
/// let data = BTreeMap::from([("type", Tag::from("circle"))]);
///
/// assert_eq!(data.field("type"), Some(FieldValue::Tag(Tag::from("circle"))));
/// assert_eq!(data.field("kind"), None);
/// ```
pub trait FieldSource {
    /// Looks up `name`, returning `None` if the structure has no such field.
    fn field(&self, name: &str) -> Option<FieldValue>;
}

impl<T: FieldSource + ?Sized> FieldSource for &T {
    #[inline]
    fn field(&self, name: &str) -> Option<FieldValue> {
        (**self).field(name)
    }
}

/// A structure without fields.
///
/// Useful for a value that is not a map, so only defaults
/// and proxies can supply its discriminator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmptySource;

impl FieldSource for EmptySource {
    #[inline]
    fn field(&self, _: &str) -> Option<FieldValue> {
        None
    }
}

impl<K: Borrow<str> + Ord> FieldSource for BTreeMap<K, Tag> {
    fn field(&self, name: &str) -> Option<FieldValue> {
        self.get(name).cloned().map(FieldValue::Tag)
    }
}

impl<K: Borrow<str> + Hash + Eq, S: BuildHasher> FieldSource for hashbrown::HashMap<K, Tag, S> {
    fn field(&self, name: &str) -> Option<FieldValue> {
        self.get(name).cloned().map(FieldValue::Tag)
    }
}

#[cfg(feature = "std")]
impl<K: Borrow<str> + Hash + Eq, S: BuildHasher> FieldSource for std::collections::HashMap<K, Tag, S> {
    fn field(&self, name: &str) -> Option<FieldValue> {
        self.get(name).cloned().map(FieldValue::Tag)
    }
}

// -----------------------------------------------------------------------------
// Tests
