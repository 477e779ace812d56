use alloc::borrow::ToOwned;
use core::any::TypeId;
use core::fmt;

use log::debug;

use crate::{DowncastError, DowncastRegistry, FieldSource, FieldValue, SubtypeInfo, Tag};

// -----------------------------------------------------------------------------
// Site

/// Where the polymorphic value sits in the input.
#[derive(Clone, Copy)]
pub enum Site<'a> {
    /// A value deserialized on its own, e.g. a document root or a list item.
    Root { value: &'a dyn FieldSource },
    /// A value deserialized as field `name` of `enclosing`.
    ///
    /// Enables the proxy lookup for `name`.
    Field {
        name: &'a str,
        enclosing: &'a dyn FieldSource,
        value: &'a dyn FieldSource,
    },
}

impl<'a> Site<'a> {
    #[inline]
    pub const fn root(value: &'a dyn FieldSource) -> Self {
        Self::Root { value }
    }

    #[inline]
    pub const fn field(
        name: &'a str,
        enclosing: &'a dyn FieldSource,
        value: &'a dyn FieldSource,
    ) -> Self {
        Self::Field {
            name,
            enclosing,
            value,
        }
    }

    /// The polymorphic value's own data.
    #[inline]
    pub const fn value(&self) -> &'a dyn FieldSource {
        match *self {
            Self::Root { value } | Self::Field { value, .. } => value,
        }
    }
}

impl fmt::Debug for Site<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root { .. } => f.write_str("Root"),
            Self::Field { name, .. } => f.debug_struct("Field").field("name", name).finish(),
        }
    }
}

// -----------------------------------------------------------------------------
// Resolution

/// Successful outcome of a resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<'r> {
    /// The supertype has no discriminator field. The pipeline decides
    /// whether to build the supertype itself or fail.
    NotConfigured,
    /// Construct this subtype.
    Subtype(&'r SubtypeInfo),
    /// No subtype matches the tag and fallback is allowed:
    /// construct a generic untyped record.
    Fallback(Tag),
}

impl<'r> Resolution<'r> {
    #[inline]
    pub const fn subtype(&self) -> Option<&'r SubtypeInfo> {
        match self {
            Self::Subtype(info) => Some(*info),
            _ => None,
        }
    }

    #[inline]
    pub const fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }

    #[inline]
    pub const fn is_not_configured(&self) -> bool {
        matches!(self, Self::NotConfigured)
    }
}

// -----------------------------------------------------------------------------
// Resolver

/// Read-only view of a [`DowncastRegistry`] that picks the subtype to construct.
///
/// Resolution takes these steps:
///
/// 1. No discriminator field configured: [`Resolution::NotConfigured`].
/// 2. The tag is read from the enclosing structure when the site is a field
///    with a proxy, otherwise from the value under the discriminator field.
/// 3. An absent tag is replaced by the default, or fails with
///    [`DowncastError::MissingDiscriminator`]. A present null is kept as
///    [`Tag::Null`].
/// 4. A registered tag gives [`Resolution::Subtype`].
/// 5. Otherwise [`Resolution::Fallback`] if allowed, else
///    [`DowncastError::UnrecognizedDiscriminator`].
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'r> {
    registry: &'r DowncastRegistry,
}

impl<'r> Resolver<'r> {
    #[inline]
    pub const fn new(registry: &'r DowncastRegistry) -> Self {
        Self { registry }
    }

    /// Resolves the subtype of `S` at `site`.
    #[inline]
    pub fn resolve<S: ?Sized + 'static>(
        &self,
        site: Site<'_>,
    ) -> Result<Resolution<'r>, DowncastError> {
        self.resolve_by_id(TypeId::of::<S>(), site)
    }

    /// Resolves the subtype of the supertype with id `supertype`.
    pub fn resolve_by_id(
        &self,
        supertype: TypeId,
        site: Site<'_>,
    ) -> Result<Resolution<'r>, DowncastError> {
        let Some(meta) = self.registry.get(supertype) else {
            return Ok(Resolution::NotConfigured);
        };
        let Some(discriminator) = meta.discriminator_field() else {
            return Ok(Resolution::NotConfigured);
        };

        let proxied = match site {
            Site::Field {
                name, enclosing, ..
            } => meta.proxy(name).map(|source| (enclosing, source)),
            Site::Root { .. } => None,
        };
        let (source, field) = proxied.unwrap_or((site.value(), discriminator));

        let tag = match source.field(field) {
            Some(FieldValue::Tag(tag)) => tag,
            Some(FieldValue::Other(kind)) => {
                return Err(DowncastError::UnsupportedDiscriminator {
                    supertype: meta.type_name(),
                    field: field.to_owned(),
                    kind,
                });
            }
            None => match meta.discriminator_default() {
                Some(default) => default.clone(),
                None => {
                    return Err(DowncastError::MissingDiscriminator {
                        supertype: meta.type_name(),
                        field: field.to_owned(),
                    });
                }
            },
        };

        if let Some(info) = meta.subtype(&tag) {
            return Ok(Resolution::Subtype(info));
        }

        if meta.allows_fallback() {
            debug!(
                "downcast `{}`: no subtype for {tag}, falling back to a record",
                meta.type_name()
            );
            Ok(Resolution::Fallback(tag))
        } else {
            Err(DowncastError::UnrecognizedDiscriminator {
                supertype: meta.type_name(),
                tag,
            })
        }
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::collections::BTreeMap;
    use alloc::string::ToString;

    use crate::{DowncastError, DowncastRegistry, EmptySource, Resolution, Site, Tag};

    trait Shape {}
    trait Message {}

    struct Base;
    struct Circle;
    struct Ping;
    struct Pong;

    fn fields<const N: usize>(pairs: [(&'static str, Tag); N]) -> BTreeMap<&'static str, Tag> {
        BTreeMap::from(pairs)
    }

    fn shapes() -> DowncastRegistry {
        let mut registry = DowncastRegistry::new();
        registry
            .supertype::<dyn Shape>()
            .discriminator_with_default("type", "base")
            .subtype::<Base>("base")
            .subtype::<Circle>("circle");
        registry
    }

    #[test]
    fn not_configured() {
        let mut registry = DowncastRegistry::new();
        let input = fields([("type", Tag::from("circle"))]);

        let resolution = registry.resolve::<dyn Shape>(Site::root(&input)).unwrap();
        assert!(resolution.is_not_configured());

        // Fallback alone does not configure downcasting.
        registry.set_allow_fallback::<dyn Shape>();
        let resolution = registry.resolve::<dyn Shape>(Site::root(&input)).unwrap();
        assert_eq!(resolution, Resolution::NotConfigured);
    }

    #[test]
    fn registered_tag() {
        let registry = shapes();
        let input = fields([("type", Tag::from("circle"))]);

        let info = registry
            .resolve::<dyn Shape>(Site::root(&input))
            .unwrap()
            .subtype()
            .unwrap();
        assert!(info.is::<Circle>());
    }

    #[test]
    fn default_when_absent() {
        let registry = shapes();

        let resolution = registry.resolve::<dyn Shape>(Site::root(&EmptySource)).unwrap();
        assert!(resolution.subtype().unwrap().is::<Base>());
    }

    #[test]
    fn null_is_not_absent() {
        let mut registry = shapes();
        let input = fields([("type", Tag::Null)]);

        let err = registry.resolve::<dyn Shape>(Site::root(&input)).unwrap_err();
        assert_eq!(
            err,
            DowncastError::UnrecognizedDiscriminator {
                supertype: core::any::type_name::<dyn Shape>(),
                tag: Tag::Null,
            }
        );

        registry.register_subtype::<dyn Shape, Circle>(());
        let resolution = registry.resolve::<dyn Shape>(Site::root(&input)).unwrap();
        assert!(resolution.subtype().unwrap().is::<Circle>());
    }

    #[test]
    fn missing_without_default() {
        let mut registry = DowncastRegistry::new();
        registry.set_discriminator_field::<dyn Message>("type", None);
        registry.register_subtype::<dyn Message, Ping>("ping");

        let err = registry
            .resolve::<dyn Message>(Site::root(&EmptySource))
            .unwrap_err();
        assert!(matches!(
            &err,
            DowncastError::MissingDiscriminator { field, .. } if field == "type"
        ));
        assert_eq!(err.supertype(), core::any::type_name::<dyn Message>());
    }

    #[test]
    fn unrecognized_names_tag_and_supertype() {
        let registry = shapes();
        let input = fields([("type", Tag::from("zzz"))]);

        let err = registry.resolve::<dyn Shape>(Site::root(&input)).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("zzz"));
        assert!(message.contains("Shape"));
    }

    #[test]
    fn fallback_outcome() {
        let mut registry = shapes();
        registry.set_allow_fallback::<dyn Shape>();
        let input = fields([("type", Tag::from("zzz"))]);

        let resolution = registry.resolve::<dyn Shape>(Site::root(&input)).unwrap();
        assert_eq!(resolution, Resolution::Fallback(Tag::from("zzz")));
        assert!(resolution.subtype().is_none());
    }

    #[test]
    fn proxy_reads_enclosing_field() {
        let mut registry = DowncastRegistry::new();
        registry
            .supertype::<dyn Message>()
            .discriminator("type")
            .proxy("payload", "kind")
            .subtype::<Ping>("ping")
            .subtype::<Pong>("pong");

        let enclosing = fields([("kind", Tag::from("pong"))]);
        // The payload's own discriminator field is ignored.
        let payload = fields([("type", Tag::from("ping"))]);

        let resolution = registry
            .resolve::<dyn Message>(Site::field("payload", &enclosing, &payload))
            .unwrap();
        assert!(resolution.subtype().unwrap().is::<Pong>());

        // Other fields of the same supertype read their own data.
        let resolution = registry
            .resolve::<dyn Message>(Site::field("reply", &enclosing, &payload))
            .unwrap();
        assert!(resolution.subtype().unwrap().is::<Ping>());

        // As does the root.
        let resolution = registry.resolve::<dyn Message>(Site::root(&payload)).unwrap();
        assert!(resolution.subtype().unwrap().is::<Ping>());
    }

    #[test]
    fn proxy_source_absent() {
        let mut registry = DowncastRegistry::new();
        registry.set_discriminator_field::<dyn Message>("type", None);
        registry.set_proxy::<dyn Message>("payload", "kind");

        let payload = fields([("type", Tag::from("ping"))]);
        let err = registry
            .resolve::<dyn Message>(Site::field("payload", &EmptySource, &payload))
            .unwrap_err();
        assert!(matches!(
            err,
            DowncastError::MissingDiscriminator { ref field, .. } if field == "kind"
        ));

        registry.set_discriminator_field::<dyn Message>("type", Some(Tag::from("pong")));
        registry.register_subtype::<dyn Message, Pong>("pong");
        let resolution = registry
            .resolve::<dyn Message>(Site::field("payload", &EmptySource, &payload))
            .unwrap();
        assert!(resolution.subtype().unwrap().is::<Pong>());
    }

    #[test]
    fn proxy_without_discriminator_field() {
        let mut registry = DowncastRegistry::new();
        registry.set_proxy::<dyn Message>("payload", "kind");
        registry.register_subtype::<dyn Message, Ping>("ping");

        let enclosing = fields([("kind", Tag::from("ping"))]);
        let resolution = registry
            .resolve::<dyn Message>(Site::field("payload", &enclosing, &EmptySource))
            .unwrap();
        assert!(resolution.is_not_configured());
    }
}
