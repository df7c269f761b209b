//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod identity;
mod privilege;

pub use identity::{IdentityMapping, InternalUserId};
pub use privilege::{PrivilegeCacheEntry, RoleCode};
