//! Authorization core: decision objects, the injected data-store
//! capability, and the engine that evaluates role, ownership, and
//! relationship-membership checks. Nothing in this module writes to the
//! store or knows about HTTP; denials are values, not errors.

pub mod datastore;
pub mod decision;
pub mod engine;
pub mod memory;

pub use datastore::{Actor, DataStore, OrderRecord, OrmStore, StoreError, StoreRecord};
pub use decision::{Decision, Denial, DenyCode};
pub use engine::AuthorizationEngine;
pub use memory::MemoryStore;
