use snafu::Snafu;

/// Failures in the graphics layer.
///
/// The engine treats a broken GPU pipeline as unrecoverable: there is
/// no fallback renderer, so the host application is expected to log
/// the error and shut down. It still arrives as a `Result` so the host
/// chooses its own abort strategy instead of the library terminating
/// the process.
#[derive(Debug, Snafu)]
#[snafu(context(suffix(Err)), visibility(pub(crate)))]
pub enum GfxError {
    #[snafu(display("no suitable GPU adapter found: {source}"))]
    AdapterRequest { source: wgpu::RequestAdapterError },
    #[snafu(display("failed to create logical device: {source}"))]
    DeviceRequest { source: wgpu::RequestDeviceError },
    #[snafu(display("failed to create rendering surface: {source}"))]
    SurfaceCreation { source: wgpu::CreateSurfaceError },
    #[snafu(display("failed to acquire backbuffer: {source}"))]
    SurfaceAcquire { source: wgpu::SurfaceError },
    #[snafu(display("rendering surface is occluded"))]
    SurfaceOccluded,
    #[snafu(display("no frame is currently open"))]
    NoActiveFrame,
    #[snafu(display("failed to capture framebuffer: {source}"))]
    Screenshot { source: crate::stream::StreamError },
}

pub type GfxResult<T> = Result<T, GfxError>;
