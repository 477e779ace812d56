use alloc::borrow::Cow;
use core::any::TypeId;

use dc_utils::hash::HashMap;
use log::{debug, trace};

use crate::{SubtypeInfo, Tag};

// -----------------------------------------------------------------------------
// SupertypeMeta

/// Downcast configuration attached to one supertype.
///
/// Created lazily by the first registration against the supertype,
/// see [`DowncastRegistry`](crate::DowncastRegistry).
///
/// Unset options keep their own state: a missing default is `None`,
/// while a default explicitly set to null is `Some(Tag::Null)`.
#[derive(Debug, Clone)]
pub struct SupertypeMeta {
    type_id: TypeId,
    type_name: &'static str,
    discriminator_field: Option<Cow<'static, str>>,
    discriminator_default: Option<Tag>,
    allow_fallback: bool,
    discriminator_map: HashMap<Tag, SubtypeInfo>,
    proxy_map: HashMap<Cow<'static, str>, Cow<'static, str>>,
}

impl SupertypeMeta {
    /// Creates an unconfigured descriptor for `S`.
    pub fn of<S: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<S>(),
            type_name: core::any::type_name::<S>(),
            discriminator_field: None,
            discriminator_default: None,
            allow_fallback: false,
            discriminator_map: HashMap::default(),
            proxy_map: HashMap::default(),
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

    /// The input field holding the type tag.
    ///
    /// `None` means downcasting is not configured for this supertype.
    #[inline]
    pub fn discriminator_field(&self) -> Option<&str> {
        self.discriminator_field.as_deref()
    }

    /// The tag assumed when the discriminator field is absent.
    #[inline]
    pub fn discriminator_default(&self) -> Option<&Tag> {
        self.discriminator_default.as_ref()
    }

    #[inline]
    pub fn allows_fallback(&self) -> bool {
        self.allow_fallback
    }

    /// Returns the subtype registered under `tag`.
    #[inline]
    pub fn subtype(&self, tag: &Tag) -> Option<&SubtypeInfo> {
        self.discriminator_map.get(tag)
    }

    /// Returns the field of the enclosing structure whose value
    /// selects the subtype of `target_field`.
    #[inline]
    pub fn proxy(&self, target_field: &str) -> Option<&str> {
        self.proxy_map.get(target_field).map(|source| &**source)
    }

    /// All registered `(tag, subtype)` pairs, in arbitrary order.
    pub fn subtypes(&self) -> impl ExactSizeIterator<Item = (&Tag, &SubtypeInfo)> {
        self.discriminator_map.iter()
    }

    /// All registered `(target_field, source_field)` pairs, in arbitrary order.
    pub fn proxies(&self) -> impl ExactSizeIterator<Item = (&str, &str)> {
        self.proxy_map.iter().map(|(target, source)| (&**target, &**source))
    }

    // -------------------------------------------------------------------------
    // Mutation, shared by the registry and the builder.

    pub(crate) fn set_discriminator(&mut self, field: Cow<'static, str>, default: Option<Tag>) {
        trace!(
            "downcast `{}`: discriminator field `{field}`, default {default:?}",
            self.type_name
        );
        self.discriminator_field = Some(field);
        self.discriminator_default = default;
    }

    pub(crate) fn set_allow_fallback(&mut self) {
        trace!("downcast `{}`: fallback allowed", self.type_name);
        self.allow_fallback = true;
    }

    pub(crate) fn insert_subtype(&mut self, tag: Tag, info: SubtypeInfo) {
        trace!("downcast `{}`: {tag} -> `{}`", self.type_name, info.type_name());
        if let Some(prev) = self.discriminator_map.insert(tag, info) {
            debug!(
                "downcast `{}`: `{}` replaced `{}` for the same tag",
                self.type_name,
                info.type_name(),
                prev.type_name()
            );
        }
    }

    pub(crate) fn insert_proxy(&mut self, target: Cow<'static, str>, source: Cow<'static, str>) {
        trace!(
            "downcast `{}`: field `{target}` reads its tag from `{source}`",
            self.type_name
        );
        self.proxy_map.insert(target, source);
    }
}
