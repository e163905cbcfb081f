//! Inset Core Types and Definitions
//!
//! This crate provides the foundational types shared by the Inset composite
//! projection engine. It includes:
//!
//! - **Identifiers**: Efficient string-interned identifiers ([`identifier::Id`])
//! - **Geometry**: Geographic and screen-space primitives ([`geometry`] module)
//! - **Streams**: The geometry-stream sink contract ([`stream`] module)
//! - **Projections**: The projection capability contract and the built-in
//!   projection families ([`projection`] module)
//! - **Clipping**: Rectangle clipping of screen-space segments and rings
//!   ([`clip`] module)

pub mod clip;
pub mod geometry;
pub mod identifier;
pub mod projection;
pub mod stream;
