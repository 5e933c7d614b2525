//! Gout clinical decision support.
//!
//! Classifies time-ordered lab series into clinical states (AKI trajectory,
//! CKD stage, at-goal urate status) and combines them with a patient's gout
//! history to produce deterministic recommendations: a flare-prophylaxis
//! indication, an AKI status, a reconciled CKD detail record.
//!
//! The crate is pure computation. Persistence, views, and auth live behind
//! the narrow read/write traits in [`aid::types`]: a repository hands in a
//! [`aid::PatientSnapshot`] fetched up front, the engines return an outcome
//! plus a field-scoped error map, and the caller applies the outcome
//! atomically or surfaces the errors.

pub mod aid; // AKI / CKD / Ppx decision engines
pub mod config;
pub mod error;
pub mod labs; // classification helpers, ordered series, reconciler
pub mod models;
