#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![no_std]

pub use mk_markup as markup;
pub use mk_utils as utils;

pub use mk_markup::{Describe, Descriptor, DescriptorBuilder, MarkupStyle};
