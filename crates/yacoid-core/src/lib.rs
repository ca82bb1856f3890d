//! Core types and trait definitions for the YACOID definition service.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! It owns the moderation state machine ([`lifecycle`]), the rejection ledger
//! ([`ledger`]) and the read-side listing service ([`listing`]); storage and
//! identity resolution are reached through the traits in [`store`] and
//! [`identity`].

pub mod clock;
pub mod definition;
pub mod error;
pub mod identity;
pub mod ledger;
pub mod lifecycle;
pub mod listing;
pub mod source;
pub mod store;

pub use error::{Error, ErrorKind, Result};
