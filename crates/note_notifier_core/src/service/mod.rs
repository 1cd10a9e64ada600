//! Use-case services.
//!
//! # Responsibility
//! - Orchestrate team lookups and mailer calls into notification use-cases.
//! - Keep host/CLI layers decoupled from storage and mail details.

pub mod notifier;
