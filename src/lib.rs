#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![no_std]

pub use dc_downcast as downcast;
pub use dc_utils as utils;
