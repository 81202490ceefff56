//! Souk Core - Shared domain types and business rules.
//!
//! This crate provides the types and rules used by every Souk component:
//! - `storefront` - Public JSON API (catalog, cart quotes, store orders)
//! - `admin` - Back-office JSON API (catalog CRUD, order confirmation)
//! - `db` - `PostgreSQL` repositories and transactional order workflows
//! - `cli` - Command-line tools for migrations and seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP. Order pricing and stock checks live here so they can be
//! tested without a database and shared by both services.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, order statuses, money helpers
//! - [`catalog`] - Product types, categories, products and their variants
//! - [`cart`] - Cart lines and normalization
//! - [`pricing`] - Line pricing, totals and cart quotes
//! - [`inventory`] - Stock deduction planning
//! - [`order`] - Orders, line item snapshots and order errors
//! - [`promo`] - Promo codes and validity windows
//! - [`contact`] - Customer contact validation
//! - [`records`] - Delivery areas, reviews and offers

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod contact;
pub mod inventory;
pub mod order;
pub mod pagination;
pub mod pricing;
pub mod promo;
pub mod records;
pub mod types;
pub mod validation;

pub use types::*;
pub use validation::ValidationError;
