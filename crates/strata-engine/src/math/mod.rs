//! Row-major matrix and vector math for uniform payloads.
//!
//! All types are `#[repr(C)]` plain data so they can be written straight into a
//! uniform reservation with `bytemuck`.

mod mat;
mod vec;

pub use mat::{INVERT_EPSILON, Mat2, Mat3, Mat4};
pub use vec::{Vec3, Vec4};
