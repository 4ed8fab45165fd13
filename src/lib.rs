pub mod gfx;
pub mod render;
pub mod stream;
pub mod windowing;

pub use gfx::{Gfx, GfxError, GfxResult};
pub use stream::{Stream, StreamError, StreamResult};
pub use windowing::{App, AppSettings, ClientApp};

pub use ::log;
pub use ::winit;
