//! Data-driven skill content and loaders.
//!
//! This crate houses the default skill data and loaders for RON/TOML files:
//! - Skill definitions (RON)
//! - Evolution trees (RON)
//! - Evolution effect catalog (RON)
//! - Skill system configuration (TOML)
//!
//! All loaders deserialize skill-core types directly through their serde
//! support; the embedded copies under `data/` are compiled in so hosts can run
//! without a content directory.

#[cfg(feature = "loaders")]
pub mod loaders;

#[cfg(feature = "loaders")]
pub use loaders::{ConfigLoader, ContentBundle, EvolutionLoader, LoadResult, SkillLoader};
