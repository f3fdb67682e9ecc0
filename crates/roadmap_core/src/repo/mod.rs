//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts for projects and tasks.
//! - Isolate SQLite query details from manager/business orchestration.
//!
//! # Invariants
//! - Repository writes must run model `validate()` before persistence.
//! - Repository APIs return semantic errors (`ProjectNotFound`,
//!   `TaskNotFound`) in addition to DB transport errors.
//! - Multi-row writes run inside one transaction.

pub mod error;
pub mod project_repo;
mod schema;
pub mod task_repo;
