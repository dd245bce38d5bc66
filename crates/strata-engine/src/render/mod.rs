//! GPU rendering glue for the uniform pool.
//!
//! Programs declare per-stage uniform sizes; the pool buffer is bound once per stage
//! with a dynamic offset, and each reservation becomes that offset for a draw.
//!
//! Convention:
//! - group indices follow stage order (vertex, then fragment), skipping stages
//!   without uniforms
//! - each stage's uniform struct sits at binding 0 of its group

mod ctx;
mod pass;
mod program;

pub use ctx::{RenderCtx, RenderTarget};
pub use pass::PassBinder;
pub use program::{ProgramDesc, ShaderProgram, StageBindGroups, StageGroup, UniformLayout};
