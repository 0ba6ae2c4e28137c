//! Trellis Core Types
//!
//! Foundational types shared by the Trellis graph model and its layout
//! engines:
//!
//! - **Geometry**: points, sizes, bounds and insets ([`geometry`] module)
//! - **Identifiers**: string-interned names ([`identifier::Id`])
//! - **Attributes**: typed per-element attribute maps ([`attribute`] module)

pub mod attribute;
pub mod geometry;
pub mod identifier;
