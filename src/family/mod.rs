//! Families are the sharing unit: every transaction and recurring rule belongs to one.
//!
//! A family is created the first time its code is used and gains members as new
//! users join with the same code.

mod db;
mod domain;
mod join_endpoint;

pub use db::{create_family_tables, find_family, find_or_create_family, join_family};
pub use domain::{Family, FamilyCode, MAX_FAMILY_MEMBERS, UserName};
pub use join_endpoint::join_family_endpoint;
