use alloc::borrow::Cow;
use core::any::{Any, TypeId};

use dc_utils::TypeIdMap;
use log::trace;
use serde_core::de::DeserializeOwned;

use crate::{DowncastError, Resolution, Resolver, Site, SubtypeInfo, SupertypeBuilder};
use crate::{SupertypeMeta, Tag};

// -----------------------------------------------------------------------------
// DowncastRegistry

/// Per-supertype downcast configuration.
///
/// Registration happens once at start-up, through the methods below, a
/// [`SupertypeBuilder`], or [`auto_register`](Self::auto_register).
/// Resolution then only needs `&self`, see [`Resolver`].
///
/// A supertype no registration call has touched has no [`SupertypeMeta`];
/// every query on it returns `None` or `false`. Registrations are never
/// rejected: writing the same key twice keeps the last value.
///
/// # Example
///
/// ```
/// use std::collections::BTreeMap;
/// use dc_downcast::{DowncastRegistry, Resolution, Site, Tag};
///
/// trait Shape {}
/// struct Circle;
/// struct Square;
///
/// let mut registry = DowncastRegistry::new();
/// registry.set_discriminator_field::<dyn Shape>("type", None);
/// registry.register_subtype::<dyn Shape, Circle>("circle");
/// registry.register_subtype::<dyn Shape, Square>("square");
///
/// let input = BTreeMap::from([("type", Tag::from("square"))]);
///
/// match registry.resolve::<dyn Shape>(Site::root(&input)).unwrap() {
///     Resolution::Subtype(info) => assert!(info.is::<Square>()),
///     other => panic!("unexpected {other:?}"),
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct DowncastRegistry {
    supertypes: TypeIdMap<SupertypeMeta>,
    #[cfg(feature = "auto_register")]
    auto_registered: bool,
}

impl DowncastRegistry {
    /// Creates an empty registry.
    #[inline]
    pub const fn new() -> Self {
        Self {
            supertypes: TypeIdMap::new(),
            #[cfg(feature = "auto_register")]
            auto_registered: false,
        }
    }

    fn meta_mut<S: ?Sized + 'static>(&mut self) -> &mut SupertypeMeta {
        supertype_entry(&mut self.supertypes, TypeId::of::<S>(), SupertypeMeta::of::<S>)
    }

    // -------------------------------------------------------------------------
    // Registration

    /// Sets the discriminator field of `S` and the tag assumed when the
    /// field is absent, replacing any previous configuration.
    pub fn set_discriminator_field<S: ?Sized + 'static>(
        &mut self,
        field: impl Into<Cow<'static, str>>,
        default: Option<Tag>,
    ) {
        self.meta_mut::<S>().set_discriminator(field.into(), default);
    }

    /// Registers `T` as the subtype of `S` for `tag`.
    ///
    /// A previous subtype for the same tag is replaced.
    pub fn register_subtype<S: ?Sized + 'static, T: Any>(&mut self, tag: impl Into<Tag>) {
        self.register_subtype_info::<S>(tag, SubtypeInfo::of::<T>());
    }

    /// Like [`register_subtype`](Self::register_subtype), also storing
    /// the `serde` constructor of `T`.
    pub fn register_deserializable_subtype<S: ?Sized + 'static, T: Any + DeserializeOwned>(
        &mut self,
        tag: impl Into<Tag>,
    ) {
        self.register_subtype_info::<S>(tag, SubtypeInfo::deserializable::<T>());
    }

    /// Registers a prebuilt [`SubtypeInfo`] for `tag`.
    pub fn register_subtype_info<S: ?Sized + 'static>(
        &mut self,
        tag: impl Into<Tag>,
        info: SubtypeInfo,
    ) {
        self.meta_mut::<S>().insert_subtype(tag.into(), info);
    }

    /// Lets unmatched tags of `S` resolve to [`Resolution::Fallback`].
    pub fn set_allow_fallback<S: ?Sized + 'static>(&mut self) {
        self.meta_mut::<S>().set_allow_fallback();
    }

    /// When `S` is resolved as field `target_field`, read the tag from the
    /// enclosing structure's `source_field` instead.
    pub fn set_proxy<S: ?Sized + 'static>(
        &mut self,
        target_field: impl Into<Cow<'static, str>>,
        source_field: impl Into<Cow<'static, str>>,
    ) {
        self.meta_mut::<S>()
            .insert_proxy(target_field.into(), source_field.into());
    }

    /// Returns a builder registering configuration for `S`.
    ///
    /// The descriptor of `S` is created by the first configuration call
    /// on the builder, not by this method.
    #[inline]
    pub fn supertype<S: ?Sized + 'static>(&mut self) -> SupertypeBuilder<'_> {
        SupertypeBuilder::new::<S>(&mut self.supertypes)
    }

    /// Runs every registration submitted with [`register_downcast!`](crate::register_downcast).
    ///
    /// Returns `true` if static registration works on the current platform.
    /// Later calls return the same result without running the registrations again.
    ///
    /// Requires the `auto_register` feature. Without it, this does nothing
    /// and returns `false`.
    pub fn auto_register(&mut self) -> bool {
        #[cfg(feature = "auto_register")]
        {
            if !self.auto_registered {
                crate::auto_register::register_all(self);
            }
            self.auto_registered
        }
        #[cfg(not(feature = "auto_register"))]
        {
            false
        }
    }

    #[cfg(feature = "auto_register")]
    pub(crate) fn mark_auto_registered(&mut self) {
        self.auto_registered = true;
    }

    // -------------------------------------------------------------------------
    // Queries

    #[inline]
    pub fn get_discriminator_field<S: ?Sized + 'static>(&self) -> Option<&str> {
        self.get_type::<S>()?.discriminator_field()
    }

    #[inline]
    pub fn get_discriminator_default<S: ?Sized + 'static>(&self) -> Option<&Tag> {
        self.get_type::<S>()?.discriminator_default()
    }

    #[inline]
    pub fn resolve_subtype<S: ?Sized + 'static>(&self, tag: &Tag) -> Option<&SubtypeInfo> {
        self.get_type::<S>()?.subtype(tag)
    }

    #[inline]
    pub fn allows_fallback<S: ?Sized + 'static>(&self) -> bool {
        self.get_type::<S>().is_some_and(SupertypeMeta::allows_fallback)
    }

    #[inline]
    pub fn get_proxy<S: ?Sized + 'static>(&self, target_field: &str) -> Option<&str> {
        self.get_type::<S>()?.proxy(target_field)
    }

    /// Resolves the subtype of `S` at `site`, see [`Resolver::resolve`].
    #[inline]
    pub fn resolve<S: ?Sized + 'static>(
        &self,
        site: Site<'_>,
    ) -> Result<Resolution<'_>, DowncastError> {
        Resolver::new(self).resolve::<S>(site)
    }

    // -------------------------------------------------------------------------
    // Descriptors

    /// Whether any configuration was registered for the type.
    #[inline]
    pub fn contains(&self, type_id: TypeId) -> bool {
        self.supertypes.contains(&type_id)
    }

    #[inline]
    pub fn get(&self, type_id: TypeId) -> Option<&SupertypeMeta> {
        self.supertypes.get(&type_id)
    }

    #[inline]
    pub fn get_type<S: ?Sized + 'static>(&self) -> Option<&SupertypeMeta> {
        self.supertypes.get_type::<S>()
    }

    /// Returns an iterator over all descriptors.
    #[inline]
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &SupertypeMeta> {
        self.supertypes.values()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.supertypes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.supertypes.is_empty()
    }

    /// Drops the descriptor of `S`, returning it.
    pub fn remove<S: ?Sized + 'static>(&mut self) -> Option<SupertypeMeta> {
        self.supertypes.remove_type::<S>()
    }

    /// Drops every descriptor.
    ///
    /// Static registrations will run again on the next [`auto_register`](Self::auto_register).
    pub fn clear(&mut self) {
        self.supertypes.clear();
        #[cfg(feature = "auto_register")]
        {
            self.auto_registered = false;
        }
    }
}

/// Returns the descriptor for `type_id`, creating it with `of` if missing.
pub(crate) fn supertype_entry(
    supertypes: &mut TypeIdMap<SupertypeMeta>,
    type_id: TypeId,
    of: fn() -> SupertypeMeta,
) -> &mut SupertypeMeta {
    supertypes.get_or_insert(type_id, || {
        let meta = of();
        trace!("downcast `{}`: descriptor created", meta.type_name());
        meta
    })
}

// -----------------------------------------------------------------------------
// DowncastRegistryArc

#[cfg(feature = "std")]
pub use arc::DowncastRegistryArc;

#[cfg(feature = "std")]
mod arc {
    use alloc::sync::Arc;
    use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

    use super::DowncastRegistry;

    /// A shared [`DowncastRegistry`], for hosts that register while
    /// other threads resolve (e.g. plugin loading).
    ///
    /// One writer at a time; readers see a consistent snapshot.
    #[derive(Clone, Default)]
    pub struct DowncastRegistryArc {
        /// The wrapped [`DowncastRegistry`].
        pub internal: Arc<RwLock<DowncastRegistry>>,
    }

    impl DowncastRegistryArc {
        /// Wraps an existing registry.
        pub fn new(registry: DowncastRegistry) -> Self {
            Self {
                internal: Arc::new(RwLock::new(registry)),
            }
        }

        /// Takes a read lock on the underlying [`DowncastRegistry`].
        pub fn read(&self) -> RwLockReadGuard<'_, DowncastRegistry> {
            self.internal.read().unwrap_or_else(PoisonError::into_inner)
        }

        /// Takes a write lock on the underlying [`DowncastRegistry`].
        pub fn write(&self) -> RwLockWriteGuard<'_, DowncastRegistry> {
            self.internal
                .write()
                .unwrap_or_else(PoisonError::into_inner)
        }
    }

    impl core::fmt::Debug for DowncastRegistryArc {
        fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
            f.debug_list()
                .entries(self.read().iter().map(|meta| meta.type_name()))
                .finish()
        }
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use core::any::TypeId;

    use super::DowncastRegistry;
    use crate::Tag;

    trait Shape {}
    trait Animal {}

    struct Circle;
    struct Square;

    #[test]
    fn unconfigured_supertype() {
        let registry = DowncastRegistry::new();

        assert!(!registry.contains(TypeId::of::<dyn Shape>()));
        assert_eq!(registry.get_discriminator_field::<dyn Shape>(), None);
        assert_eq!(registry.get_discriminator_default::<dyn Shape>(), None);
        assert_eq!(registry.resolve_subtype::<dyn Shape>(&Tag::from("circle")), None);
        assert!(!registry.allows_fallback::<dyn Shape>());
        assert_eq!(registry.get_proxy::<dyn Shape>("payload"), None);
    }

    #[test]
    fn descriptor_created_lazily() {
        let mut registry = DowncastRegistry::new();
        registry.set_proxy::<dyn Shape>("payload", "kind");

        // A descriptor exists, but downcasting is still not configured.
        assert!(registry.contains(TypeId::of::<dyn Shape>()));
        assert_eq!(registry.get_discriminator_field::<dyn Shape>(), None);
        assert_eq!(registry.get_proxy::<dyn Shape>("payload"), Some("kind"));
        assert!(!registry.contains(TypeId::of::<dyn Animal>()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn last_registration_wins() {
        let mut registry = DowncastRegistry::new();
        registry.register_subtype::<dyn Shape, Circle>("a");
        registry.register_subtype::<dyn Shape, Square>("a");

        let info = registry.resolve_subtype::<dyn Shape>(&Tag::from("a")).unwrap();
        assert!(info.is::<Square>());
        assert_eq!(registry.get_type::<dyn Shape>().unwrap().subtypes().len(), 1);
    }

    #[test]
    fn discriminator_field_overwritten() {
        let mut registry = DowncastRegistry::new();
        registry.set_discriminator_field::<dyn Shape>("type", Some(Tag::from("base")));
        registry.set_discriminator_field::<dyn Shape>("kind", None);

        assert_eq!(registry.get_discriminator_field::<dyn Shape>(), Some("kind"));
        assert_eq!(registry.get_discriminator_default::<dyn Shape>(), None);
    }

    #[test]
    fn null_default_is_not_missing() {
        let mut registry = DowncastRegistry::new();
        registry.set_discriminator_field::<dyn Shape>("type", Some(Tag::Null));

        assert_eq!(registry.get_discriminator_default::<dyn Shape>(), Some(&Tag::Null));
    }

    #[test]
    fn tags_not_normalized() {
        let mut registry = DowncastRegistry::new();
        registry.register_subtype::<dyn Shape, Circle>(1);

        assert!(registry.resolve_subtype::<dyn Shape>(&Tag::from(1)).is_some());
        assert!(registry.resolve_subtype::<dyn Shape>(&Tag::from("1")).is_none());
    }

    #[test]
    fn supertypes_are_independent() {
        let mut registry = DowncastRegistry::new();
        registry.set_allow_fallback::<dyn Shape>();
        registry.register_subtype::<dyn Animal, Circle>("circle");

        assert!(registry.allows_fallback::<dyn Shape>());
        assert!(!registry.allows_fallback::<dyn Animal>());
        assert!(registry.resolve_subtype::<dyn Shape>(&Tag::from("circle")).is_none());
    }

    #[test]
    fn teardown() {
        let mut registry = DowncastRegistry::new();
        registry.set_allow_fallback::<dyn Shape>();
        registry.set_allow_fallback::<dyn Animal>();

        assert!(registry.remove::<dyn Shape>().is_some());
        assert!(!registry.allows_fallback::<dyn Shape>());

        registry.clear();
        assert!(registry.is_empty());
    }

    #[cfg(feature = "std")]
    #[test]
    fn shared_registry() {
        use super::DowncastRegistryArc;

        let shared = DowncastRegistryArc::default();
        let writer = shared.clone();

        std::thread::spawn(move || {
            writer.write().register_subtype::<dyn Shape, Circle>("circle");
        })
        .join()
        .unwrap();

        let registry = shared.read();
        assert!(registry.resolve_subtype::<dyn Shape>(&Tag::from("circle")).is_some());
    }
}
