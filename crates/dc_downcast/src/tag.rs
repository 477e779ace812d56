use alloc::borrow::Cow;
use alloc::string::String;
use core::fmt;

use serde_core::de::{self, Deserialize, Deserializer, Visitor};
use serde_core::{Serialize, Serializer};

// -----------------------------------------------------------------------------
// Tag

/// A discriminator value, used as the lookup key of a supertype's subtype map.
///
/// Tags are compared exactly as stored: `Tag::Int(1)` and `Tag::from("1")`
/// are different keys. Normalize before lookup if the input format
/// mixes representations.
///
/// # Examples
///
/// ```
/// use dc_downcast::Tag;
///
/// assert_eq!(Tag::from("circle"), Tag::Str("circle".into()));
/// assert_eq!(Tag::from(3_u8), Tag::Int(3));
/// assert_ne!(Tag::from(1), Tag::from("1"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tag {
    /// An explicit null, distinct from an absent field.
    Null,
    Bool(bool),
    Int(i128),
    Str(Cow<'static, str>),
}

impl Tag {
    /// Creates a string tag without allocating.
    #[inline]
    pub const fn from_static(s: &'static str) -> Self {
        Self::Str(Cow::Borrowed(s))
    }

    /// Returns the string content of a [`Tag::Str`].
    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the kind of value held, for diagnostics.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "integer",
            Self::Str(_) => "string",
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => fmt::Display::fmt(b, f),
            Self::Int(i) => fmt::Display::fmt(i, f),
            Self::Str(s) => write!(f, "{s:?}"),
        }
    }
}

// -----------------------------------------------------------------------------
// Conversions

impl From<&'static str> for Tag {
    #[inline]
    fn from(value: &'static str) -> Self {
        Self::from_static(value)
    }
}

impl From<String> for Tag {
    #[inline]
    fn from(value: String) -> Self {
        Self::Str(Cow::Owned(value))
    }
}

impl From<Cow<'static, str>> for Tag {
    #[inline]
    fn from(value: Cow<'static, str>) -> Self {
        Self::Str(value)
    }
}

impl From<bool> for Tag {
    #[inline]
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i128> for Tag {
    #[inline]
    fn from(value: i128) -> Self {
        Self::Int(value)
    }
}

impl From<()> for Tag {
    #[inline]
    fn from((): ()) -> Self {
        Self::Null
    }
}

macro_rules! impl_from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Tag {
                #[inline]
                fn from(value: $ty) -> Self {
                    Self::Int(value as i128)
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

// -----------------------------------------------------------------------------
// Serde

impl Serialize for Tag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Int(i) => {
                if let Ok(v) = i64::try_from(*i) {
                    serializer.serialize_i64(v)
                } else if let Ok(v) = u64::try_from(*i) {
                    serializer.serialize_u64(v)
                } else {
                    serializer.serialize_i128(*i)
                }
            }
            Self::Str(s) => serializer.serialize_str(s),
        }
    }
}

struct TagVisitor;

impl<'de> Visitor<'de> for TagVisitor {
    type Value = Tag;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a discriminator tag (null, bool, integer or string)")
    }

    fn visit_unit<E: de::Error>(self) -> Result<Tag, E> {
        Ok(Tag::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<Tag, E> {
        Ok(Tag::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Tag, D::Error> {
        deserializer.deserialize_any(self)
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Tag, E> {
        Ok(Tag::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Tag, E> {
        Ok(Tag::Int(v as i128))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Tag, E> {
        Ok(Tag::Int(v as i128))
    }

    fn visit_i128<E: de::Error>(self, v: i128) -> Result<Tag, E> {
        Ok(Tag::Int(v))
    }

    fn visit_u128<E: de::Error>(self, v: u128) -> Result<Tag, E> {
        match i128::try_from(v) {
            Ok(v) => Ok(Tag::Int(v)),
            Err(_) => Err(E::invalid_value(de::Unexpected::Other("u128"), &self)),
        }
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Tag, E> {
        Ok(Tag::Str(Cow::Owned(v.into())))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Tag, E> {
        Ok(Tag::Str(Cow::Owned(v)))
    }
}

impl<'de> Deserialize<'de> for Tag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(TagVisitor)
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::Tag;
    use alloc::string::ToString;

    #[test]
    fn display() {
        assert_eq!(Tag::Null.to_string(), "null");
        assert_eq!(Tag::from(false).to_string(), "false");
        assert_eq!(Tag::from(-4).to_string(), "-4");
        assert_eq!(Tag::from("zzz").to_string(), "\"zzz\"");
    }

    #[test]
    fn no_normalization() {
        assert_ne!(Tag::from(1), Tag::from("1"));
        assert_ne!(Tag::from(0), Tag::from(false));
        assert_ne!(Tag::Null, Tag::from(""));
        assert_eq!(Tag::from(7_u64), Tag::from(7_i8));
    }

    #[test]
    fn from_json() {
        assert_eq!(serde_json::from_str::<Tag>("null").unwrap(), Tag::Null);
        assert_eq!(serde_json::from_str::<Tag>("true").unwrap(), Tag::Bool(true));
        assert_eq!(serde_json::from_str::<Tag>("-12").unwrap(), Tag::Int(-12));
        assert_eq!(
            serde_json::from_str::<Tag>("\"circle\"").unwrap(),
            Tag::from("circle")
        );
        assert!(serde_json::from_str::<Tag>("1.5").is_err());
        assert!(serde_json::from_str::<Tag>("[1]").is_err());
    }

    #[test]
    fn from_ron() {
        assert_eq!(ron::from_str::<Tag>("\"square\"").unwrap(), Tag::from("square"));
        assert_eq!(ron::from_str::<Tag>("42").unwrap(), Tag::Int(42));
        assert_eq!(ron::from_str::<Tag>("false").unwrap(), Tag::Bool(false));
    }

    #[test]
    fn to_json() {
        assert_eq!(serde_json::to_string(&Tag::Null).unwrap(), "null");
        assert_eq!(serde_json::to_string(&Tag::from(u64::MAX)).unwrap(), "18446744073709551615");
        assert_eq!(serde_json::to_string(&Tag::from("a")).unwrap(), "\"a\"");
    }
}
