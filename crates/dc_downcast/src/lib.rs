#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![no_std]

// -----------------------------------------------------------------------------
// no_std support

#[cfg(feature = "std")]
extern crate std;

extern crate alloc;

// -----------------------------------------------------------------------------
// Modules

mod builder;
mod error;
mod meta;
mod registry;
mod resolver;
mod source;
mod subtype;
mod tag;

#[cfg(feature = "auto_register")]
mod auto_register;

#[cfg(feature = "json")]
pub mod json;

// -----------------------------------------------------------------------------
// Top-Level exports

pub use builder::SupertypeBuilder;
pub use error::DowncastError;
pub use meta::SupertypeMeta;
pub use registry::DowncastRegistry;
pub use resolver::{Resolution, Resolver, Site};
pub use source::{EmptySource, FieldSource, FieldValue};
pub use subtype::SubtypeInfo;
pub use tag::Tag;

#[cfg(feature = "std")]
pub use registry::DowncastRegistryArc;

#[cfg(feature = "auto_register")]
pub use auto_register::DowncastRegistration;

#[doc(hidden)]
pub mod __macro_exports {
    #[cfg(feature = "auto_register")]
    pub use crate::auto_register::DowncastRegistration;
    #[cfg(feature = "auto_register")]
    pub use inventory;
}

/// Type checks a registration function; `auto_register` is disabled.
#[cfg(not(feature = "auto_register"))]
#[macro_export]
macro_rules! register_downcast {
    ($func:expr) => {
        const _: fn(&mut $crate::DowncastRegistry) = $func;
    };
}
