//! Language vocabulary registries.

pub mod builtins;
pub mod keywords;
pub mod stdlib;
