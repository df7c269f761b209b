pub mod health;
pub mod hooks;
pub mod identities;
