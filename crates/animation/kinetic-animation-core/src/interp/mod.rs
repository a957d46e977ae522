//! Interpolation helpers.
//!
//! Numeric lerps operate on the flat number lists that every `AnimValue`
//! decomposes into; the cubic-bezier solver backs `Ease::CubicBezier`.

pub mod functions;

pub use functions::{accumulate_numbers, bezier_ease_t, lerp_f32, lerp_numbers};
