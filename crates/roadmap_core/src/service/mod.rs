//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls and scheduling functions into
//!   use-case level APIs.
//! - Keep CLI layers decoupled from storage details.

pub mod project_manager;
