#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod action;
pub mod client;
pub mod errors;
pub mod features;
pub mod slice;
pub mod store;
