use std::sync::Arc;

use wgpu::{Adapter, Device, DeviceDescriptor, Features, Instance, Limits, Queue, Surface};

use crate::error::MountError;

/// Device and queue shared by the scene passes and the egui renderer.
/// Cloning is cheap (Arc).
#[derive(Clone)]
pub struct GpuContext {
    device: Arc<Device>,
    queue: Arc<Queue>,
}

impl GpuContext {
    /// Acquire a device compatible with `surface`. Also returns the adapter
    /// so the caller can query surface capabilities.
    pub async fn for_surface(instance: &Instance, surface: &Surface<'_>) -> Result<(Self, Adapter), MountError> {
        let adapter = Self::request_adapter(instance, surface).await?;
        let (device, queue) = Self::request_device(&adapter).await?;

        let info = adapter.get_info();
        log::info!("using {} ({:?})", info.name, info.backend);

        Ok((Self::from_parts(device, queue), adapter))
    }

    pub fn from_parts(device: Device, queue: Queue) -> Self {
        Self {
            device: Arc::new(device),
            queue: Arc::new(queue),
        }
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    async fn request_adapter(instance: &Instance, surface: &Surface<'_>) -> Result<Adapter, MountError> {
        instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| MountError::Adapter(format!("{:?}", e)))
    }

    async fn request_device(adapter: &Adapter) -> Result<(Device, Queue), MountError> {
        adapter
            .request_device(&DeviceDescriptor {
                label: Some("Scene Gallery Device"),
                required_features: Features::empty(),
                required_limits: Limits::default().using_resolution(adapter.limits()),
                memory_hints: Default::default(),
                experimental_features: Default::default(),
                trace: Default::default(),
            })
            .await
            .map_err(|e| MountError::Device(e.to_string()))
    }
}
