//! Memberly Shared Types and Utilities
//!
//! This crate contains the user model, the user-store abstraction, and
//! database utilities shared across the Memberly platform.

pub mod db;
pub mod error;
pub mod store;
pub mod types;

pub use error::StoreError;
pub use store::{BillingFields, MemoryUserStore, PgUserStore, UserStore, UserUpdate};
pub use types::{NewUser, PublicUser, SubscriptionStatus, User};
