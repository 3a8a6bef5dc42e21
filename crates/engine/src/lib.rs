//! Core scheduling engine for BirthdayHerald.
//!
//! Decides whether and when a birthday notification is attempted and how
//! failures are retried. The outbound transport lives behind
//! [`herald_common::sender::NotificationSender`]; persistence lives behind
//! the [`store`] traits.

pub mod backoff;
pub mod delivery;
pub mod eligibility;
pub mod scheduler;
pub mod store;
pub mod sweeper;
pub mod ticker;
pub mod user;
