//! Domain models for Canopy.
//!
//! Each entity comes as a stored record plus a `Create*` input type, the
//! way the store contract accepts and returns them.

pub mod access;
pub mod account;
pub mod resource;
pub mod role;
pub mod tenant;
