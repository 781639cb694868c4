//! Trustmap Core Types and Definitions
//!
//! This crate provides the foundational types for reading and drawing
//! threat-model diagrams. It includes:
//!
//! - **Colors**: Color handling with CSS color support ([`color::Color`])
//! - **Geometry**: Points, rectangles and bounding boxes ([`geometry`] module)
//! - **Curves**: Quadratic Bézier math for flows ([`curve`] module)
//! - **Model**: Element kinds, shape and curve records ([`model`] module)
//! - **Draw**: Visual definitions and SVG rendering of elements ([`draw`] module)

pub mod color;
pub mod curve;
pub mod draw;
pub mod geometry;
pub mod model;
