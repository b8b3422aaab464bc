//! complaintdesk-core: multi-tenant complaint handling.
//!
//! Complaint lifecycle with SLA deadlines, an append-only audit history,
//! in-app notifications and role-scoped dashboard statistics, over a
//! single SQLite store.

pub mod clock;
pub mod complaint;
pub mod config;
pub mod demo;
pub mod directory;
pub mod error;
pub mod event;
pub mod history;
pub mod name_generator;
pub mod notify;
pub mod rng;
pub mod service;
pub mod sla;
pub mod stats;
pub mod store;
pub mod types;
