//! Static registration tables, collected with [`inventory`].
//!
//! Not every platform supports `inventory` (the major ones do). On the
//! others nothing is collected and [`DowncastRegistry::auto_register`]
//! reports `false`.

use crate::DowncastRegistry;

// -----------------------------------------------------------------------------
// DowncastRegistration

/// A registration function submitted with [`register_downcast!`](crate::register_downcast).
///
/// Submissions run in an unspecified order, so two of them writing the
/// same key leave either value in place.
pub struct DowncastRegistration(fn(&mut DowncastRegistry));

impl DowncastRegistration {
    #[inline]
    pub const fn new(func: fn(&mut DowncastRegistry)) -> Self {
        Self(func)
    }
}

inventory::collect!(DowncastRegistration);

// Availability flag, only collected where `inventory` works.
inventory::submit! {
    DowncastRegistration::new(DowncastRegistry::mark_auto_registered)
}

pub(crate) fn register_all(registry: &mut DowncastRegistry) {
    for registration in inventory::iter::<DowncastRegistration> {
        (registration.0)(registry);
    }
}

// -----------------------------------------------------------------------------
// Macro

/// Submits a `fn(&mut DowncastRegistry)` to run on
/// [`DowncastRegistry::auto_register`].
///
/// Without the `auto_register` feature the function is only type checked.
///
/// # Example
///
/// ```
/// use dc_downcast::{DowncastRegistry, Tag};
///
/// trait Shape {}
/// struct Circle;
///
/// fn register_shapes(registry: &mut DowncastRegistry) {
///     registry
///         .supertype::<dyn Shape>()
///         .discriminator("type")
///         .subtype::<Circle>("circle");
/// }
///
/// dc_downcast::register_downcast!(register_shapes);
///
/// fn main() {
///     let mut registry = DowncastRegistry::new();
///     if registry.auto_register() {
///         let info = registry.resolve_subtype::<dyn Shape>(&Tag::from("circle"));
///         assert!(info.unwrap().is::<Circle>());
///     }
/// }
/// ```
#[macro_export]
macro_rules! register_downcast {
    ($func:expr) => {
        $crate::__macro_exports::inventory::submit! {
            $crate::__macro_exports::DowncastRegistration::new($func)
        }
    };
}

// -----------------------------------------------------------------------------
// Tests
