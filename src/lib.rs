//! Paysync - Payment-Event Reconciliation Service
//!
//! Receives asynchronous, at-least-once payment provider notifications,
//! verifies their authenticity, and reconciles durable account and
//! subscription state through idempotent conditional updates.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
