//! Resolution of symbolic names (tags, correspondents, users, groups,
//! document types) to server-side IDs.
//!
//! # Architecture
//!
//! * [`cache`]: per-kind name → ID cache, populated by one full listing.
//! * [`entity`]: the generic [`EntityResolver`], configured per kind by an
//!   [`EntitySpec`] capability descriptor.
//! * [`permissions`]: group names → `set_permissions` table.

pub mod cache;
pub mod entity;
pub mod permissions;

pub use cache::EntityCache;
pub use entity::{random_color, Creation, EntityResolver, EntitySpec};
pub use permissions::PermissionBuilder;
