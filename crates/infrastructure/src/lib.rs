//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod http_identity_resolver;
mod http_privilege_directory;
mod in_memory_identity_mapping_repository;
mod in_memory_privilege_cache_store;
mod postgres_identity_mapping_repository;
mod redis_privilege_cache_store;

pub use http_identity_resolver::{HttpIdentityResolver, SERVICE_GROUP};
pub use http_privilege_directory::{HttpPrivilegeDirectory, ROLE_PLACEHOLDER};
pub use in_memory_identity_mapping_repository::InMemoryIdentityMappingRepository;
pub use in_memory_privilege_cache_store::InMemoryPrivilegeCacheStore;
pub use postgres_identity_mapping_repository::PostgresIdentityMappingRepository;
pub use redis_privilege_cache_store::RedisPrivilegeCacheStore;
