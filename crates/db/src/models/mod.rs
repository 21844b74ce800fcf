//! Row structs and DTOs.
//!
//! Each submodule contains a `FromRow` entity struct matching the database
//! row and, where rows are written by this service, a create DTO.

pub mod processed_image;
pub mod settings;
pub mod user;
