#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![no_std]

pub use uniq_cfg as cfg;
pub use uniq_ptr as ptr;
