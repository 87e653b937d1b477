//! Repository layer over the registry store.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`NotFound`, `AlreadyExists`)
//!   in addition to DB transport errors.

pub mod registry_repo;
