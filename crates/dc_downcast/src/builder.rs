use alloc::borrow::Cow;
use core::any::{Any, TypeId};

use dc_utils::TypeIdMap;
use serde_core::de::DeserializeOwned;

use crate::registry::supertype_entry;
use crate::{SubtypeInfo, SupertypeMeta, Tag};

// -----------------------------------------------------------------------------
// SupertypeBuilder

/// Chained registration for one supertype, returned by
/// [`DowncastRegistry::supertype`](crate::DowncastRegistry::supertype).
///
/// Each method has the same effect as the registry method of the same name.
/// The descriptor is created by the first of them; a builder dropped
/// without configuration leaves the supertype unconfigured.
///
/// # Example
///
/// ```
/// use dc_downcast::{DowncastRegistry, Tag};
///
/// trait Event {}
/// struct Click;
/// struct Key;
///
/// let mut registry = DowncastRegistry::new();
/// registry
///     .supertype::<dyn Event>()
///     .discriminator_with_default("event", "click")
///     .allow_fallback()
///     .proxy("payload", "event_kind")
///     .subtype::<Click>("click")
///     .subtype::<Key>("key");
///
/// assert_eq!(registry.get_discriminator_field::<dyn Event>(), Some("event"));
/// assert_eq!(registry.get_discriminator_default::<dyn Event>(), Some(&Tag::from("click")));
/// assert_eq!(registry.get_proxy::<dyn Event>("payload"), Some("event_kind"));
/// assert!(registry.allows_fallback::<dyn Event>());
/// ```
pub struct SupertypeBuilder<'a> {
    supertypes: &'a mut TypeIdMap<SupertypeMeta>,
    type_id: TypeId,
    of: fn() -> SupertypeMeta,
}

impl<'a> SupertypeBuilder<'a> {
    #[inline]
    pub(crate) fn new<S: ?Sized + 'static>(supertypes: &'a mut TypeIdMap<SupertypeMeta>) -> Self {
        Self {
            supertypes,
            type_id: TypeId::of::<S>(),
            of: SupertypeMeta::of::<S>,
        }
    }

    fn meta_mut(&mut self) -> &mut SupertypeMeta {
        supertype_entry(self.supertypes, self.type_id, self.of)
    }

    /// Sets the discriminator field, without a default.
    pub fn discriminator(mut self, field: impl Into<Cow<'static, str>>) -> Self {
        self.meta_mut().set_discriminator(field.into(), None);
        self
    }

    /// Sets the discriminator field and the tag used when it is absent.
    pub fn discriminator_with_default(
        mut self,
        field: impl Into<Cow<'static, str>>,
        default: impl Into<Tag>,
    ) -> Self {
        self.meta_mut()
            .set_discriminator(field.into(), Some(default.into()));
        self
    }

    pub fn allow_fallback(mut self) -> Self {
        self.meta_mut().set_allow_fallback();
        self
    }

    /// Reads the tag of field `target` from the enclosing field `source`.
    pub fn proxy(
        mut self,
        target: impl Into<Cow<'static, str>>,
        source: impl Into<Cow<'static, str>>,
    ) -> Self {
        self.meta_mut().insert_proxy(target.into(), source.into());
        self
    }

    pub fn subtype<T: Any>(mut self, tag: impl Into<Tag>) -> Self {
        self.meta_mut()
            .insert_subtype(tag.into(), SubtypeInfo::of::<T>());
        self
    }

    pub fn deserializable_subtype<T: Any + DeserializeOwned>(mut self, tag: impl Into<Tag>) -> Self {
        self.meta_mut()
            .insert_subtype(tag.into(), SubtypeInfo::deserializable::<T>());
        self
    }

    /// The descriptor being configured, `None` until a configuration call.
    #[inline]
    pub fn meta(&self) -> Option<&SupertypeMeta> {
        self.supertypes.get(&self.type_id)
    }
}

// -----------------------------------------------------------------------------
// Tests
