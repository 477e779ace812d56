use alloc::boxed::Box;
use core::any::{Any, TypeId};
use core::fmt;

use serde_core::Deserializer;
use serde_core::de::{DeserializeOwned, Error};

type DeserializeFn =
    fn(deserializer: &mut dyn erased_serde::Deserializer) -> Result<Box<dyn Any>, erased_serde::Error>;

fn deserialize_erased<T: Any + DeserializeOwned>(
    deserializer: &mut dyn erased_serde::Deserializer,
) -> Result<Box<dyn Any>, erased_serde::Error> {
    Ok(Box::new(<T as serde_core::Deserialize>::deserialize(deserializer)?))
}

// -----------------------------------------------------------------------------
// SubtypeInfo

/// A concrete type registered under a discriminator value.
///
/// Created with [`SubtypeInfo::of`] when only the identity of the subtype is
/// needed, or [`SubtypeInfo::deserializable`] to also store a type-erased
/// `serde` constructor for it.
///
/// # Examples
///
/// ```
/// use dc_downcast::SubtypeInfo;
/// use serde::Deserialize;
///
/// #[derive(Deserialize, Debug, PartialEq)]
/// struct Circle {
///     radius: f64,
/// }
///
/// let info = SubtypeInfo::deserializable::<Circle>();
/// assert!(info.is::<Circle>());
///
/// let value = serde_json::json!({ "type": "circle", "radius": 2.0 });
/// let circle = info.deserialize(value).unwrap();
///
/// assert_eq!(*circle.downcast::<Circle>().unwrap(), Circle { radius: 2.0 });
/// ```
#[derive(Clone, Copy)]
pub struct SubtypeInfo {
    type_id: TypeId,
    type_name: &'static str,
    deserialize: Option<DeserializeFn>,
}

impl SubtypeInfo {
    /// Describes `T` without a constructor.
    #[inline]
    pub fn of<T: Any>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: core::any::type_name::<T>(),
            deserialize: None,
        }
    }

    /// Describes `T` together with its [`Deserialize`](serde_core::Deserialize) impl.
    #[inline]
    pub fn deserializable<T: Any + DeserializeOwned>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: core::any::type_name::<T>(),
            deserialize: Some(deserialize_erased::<T>),
        }
    }

    #[inline(always)]
    pub const fn type_id(&self) -> TypeId {
        self.type_id
    }

    #[inline(always)]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns `true` if this describes `T`.
    #[inline]
    pub fn is<T: Any>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    /// Returns `true` if a constructor was registered.
    #[inline]
    pub const fn can_deserialize(&self) -> bool {
        self.deserialize.is_some()
    }

    /// Deserializes the subtype, boxed as [`Any`].
    ///
    /// Fails with a custom error of `D` if the subtype was registered
    /// without a constructor.
    pub fn deserialize<'de, D: Deserializer<'de>>(
        &self,
        deserializer: D,
    ) -> Result<Box<dyn Any>, D::Error> {
        let Some(func) = self.deserialize else {
            return Err(<D::Error as Error>::custom(format_args!(
                "subtype `{}` has no registered deserializer",
                self.type_name
            )));
        };
        let mut erased = <dyn erased_serde::Deserializer>::erase(deserializer);
        func(&mut erased).map_err(<D::Error as Error>::custom)
    }
}

impl PartialEq for SubtypeInfo {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for SubtypeInfo {}

impl fmt::Debug for SubtypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubtypeInfo")
            .field("type_name", &self.type_name)
            .field("can_deserialize", &self.can_deserialize())
            .finish()
    }
}

// -----------------------------------------------------------------------------
// Tests
