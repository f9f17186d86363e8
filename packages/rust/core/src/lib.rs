//! Row selection and reconciliation engine for payment-link notifications.
//!
//! This crate ties the column resolver, eligibility filter, payload builder
//! and reconciliation writer into a single run (see [`coordinator`]), and
//! wraps that run in the authorized trigger boundary (see [`trigger`]).

pub mod columns;
pub mod coordinator;
pub mod eligibility;
pub mod payload;
pub mod reconcile;
pub mod runlog;
pub mod trigger;

pub use columns::{Field, SchemaMap, resolve};
pub use coordinator::{Coordinator, RunConfig};
pub use runlog::RunLog;
pub use trigger::{Invocation, InvocationResponse, Recipients, TriggerHandler};
