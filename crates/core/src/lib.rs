//! `bioinfer-core` -- domain types shared by the client and CLI crates.
//!
//! Holds the task-polling data model (correlation ids, status records,
//! outcomes), the poll/retry policy, request and result payloads for the
//! hosted inference endpoints, input validation, and readers/writers for
//! the structure and sequence formats those endpoints exchange.
//!
//! This crate performs no network I/O.

pub mod error;
pub mod formats;
pub mod models;
pub mod poll;
pub mod task;
pub mod types;
pub mod validation;
