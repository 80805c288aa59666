//! Window-less device setup.

/// Failure to obtain a GPU for offscreen work.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("no compatible GPU adapter found")]
    NoAdapter,

    #[error("failed to request GPU device: {0}")]
    DeviceRequest(#[from] wgpu::RequestDeviceError),
}

/// Request a device and queue with no surface attached.
pub async fn request_headless_device() -> Result<(wgpu::Device, wgpu::Queue), RenderError> {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::all(),
        ..Default::default()
    });
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        })
        .await
        .map_err(|_| RenderError::NoAdapter)?;

    let info = adapter.get_info();
    log::info!(
        "Selected GPU: {} ({:?}, {:?})",
        info.name,
        info.backend,
        info.device_type
    );

    let device_and_queue = adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: Some("terra-device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            memory_hints: wgpu::MemoryHints::default(),
            experimental_features: wgpu::ExperimentalFeatures::default(),
            trace: wgpu::Trace::Off,
        })
        .await?;
    Ok(device_and_queue)
}

/// Blocking wrapper around [`request_headless_device`].
pub fn request_headless_device_blocking() -> Result<(wgpu::Device, wgpu::Queue), RenderError> {
    pollster::block_on(request_headless_device())
}
