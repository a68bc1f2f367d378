//! # IO Module
//!
//! The interface layer between HTTP clients and the domain logic.
//!
//! Translates incoming REST requests into domain operations and formats
//! domain responses (and errors) for JSON consumption. Everything under
//! here is adapter code: serialization, status code mapping, and routing.
//! No business rules live at this level.

pub mod rest;

pub use rest::*;
