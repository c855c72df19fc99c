//! Lintmap Core Types and Definitions
//!
//! This crate provides the foundational types shared by every Lintmap crate.
//! It includes:
//!
//! - **Geometry**: Points, sizes, boxes and segment intersection ([`geometry`] module)
//! - **Identifiers**: Identity keys of scanned entities ([`identifier::EntityKey`])
//! - **Draw**: End decorations and the logical path-command drawing contract ([`draw`] module)
//! - **Semantic**: Descriptors exchanged with the extraction collaborator ([`semantic`] module)

pub mod draw;
pub mod geometry;
pub mod identifier;
pub mod semantic;
