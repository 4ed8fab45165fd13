//! Backend-agnostic immediate-mode graphics layer.

pub mod context;
pub mod error;
pub mod frame;
pub mod handle;
pub mod matrix;
pub mod mipmaps;
pub mod pipeline;
pub mod resources;
pub mod vertex;

pub use context::{Gfx, icount};
pub use error::{GfxError, GfxResult};
pub use handle::Handle;
pub use matrix::{MatrixType, calc_z_near, ortho_matrix, perspective_matrix};
pub use pipeline::{DEPTH_BITS, FogMode};
pub use resources::{
    IbRes, IndexBufferId, TextureId, TextureRes, VbRes, VertexBufferId, make_quad_indices,
};
pub use vertex::{PackedCol, VertexColoured, VertexFormat, VertexTextured};
