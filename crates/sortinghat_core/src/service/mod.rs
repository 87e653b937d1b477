//! Registry use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep commands decoupled from storage details.

pub mod registry_service;
