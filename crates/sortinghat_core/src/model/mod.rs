//! Registry domain model.
//!
//! # Responsibility
//! - Define organizations, unique identities, identities and enrollments.
//! - Validate records before they reach persistence.
//!
//! # Invariants
//! - Every identity is owned by exactly one unique identity.
//! - Every enrollment names one unique identity and one organization.

pub mod enrollment;
pub mod identity;
pub mod organization;
pub mod validation;
