//! Secondary indexes and uniqueness constraints
//!
//! B-Tree indices over node and relationship properties, plus the unique-key
//! maps that back the loaders' match-or-create lookups.

pub mod manager;
pub mod property_index;

pub use manager::{IndexKind, IndexManager, PropertyIndexKey, RelationshipIndexKey};
pub use property_index::PropertyIndex;
