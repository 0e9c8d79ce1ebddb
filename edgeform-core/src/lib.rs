//! Edgeform Core
//!
//! Core library for a declarative provider that keeps local attribute sets
//! synchronized with entities on a remote edge platform.

pub mod data;
pub mod differ;
pub mod effect;
pub mod identifier;
pub mod interpreter;
pub mod plan;
pub mod provider;
pub mod reconciler;
pub mod resource;
pub mod schema;
pub mod version;
