#![allow(dead_code)]

use std::time::Duration;

use sunflow::{data_structures::texture::Texture, render::RenderTarget};

pub const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
// Keeps rows at the 256 byte copy alignment without padding.
pub const SIZE: u32 = 256;

pub struct Gpu {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
}

/// Open a headless device, or `None` when the machine has no usable adapter.
pub fn gpu() -> Option<Gpu> {
    let _ = env_logger::builder().is_test(true).try_init();
    futures::executor::block_on(async {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let adapter = match instance
            .request_adapter(&wgpu::RequestAdapterOptions::default())
            .await
        {
            Ok(adapter) => adapter,
            Err(e) => {
                eprintln!("Skipping GPU test: {e}");
                return None;
            }
        };
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("test device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_defaults(),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .ok()?;
        Some(Gpu { device, queue })
    })
}

/// Colour and depth attachments that can be read back.
pub struct Offscreen {
    pub color: wgpu::Texture,
    pub color_view: wgpu::TextureView,
    pub depth: Texture,
}

impl Offscreen {
    pub fn new(device: &wgpu::Device) -> Self {
        let color = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("offscreen colour"),
            size: wgpu::Extent3d {
                width: SIZE,
                height: SIZE,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let color_view = color.create_view(&wgpu::TextureViewDescriptor::default());
        let depth = Texture::create_depth_texture(device, [SIZE, SIZE], "offscreen depth");
        Self {
            color,
            color_view,
            depth,
        }
    }

    pub fn target(&self) -> RenderTarget<'_> {
        RenderTarget {
            color: &self.color_view,
            depth: &self.depth.view,
        }
    }

    pub fn read(&self, gpu: &Gpu) -> image::RgbaImage {
        let bytes_per_row = SIZE * 4;
        let output_buffer = gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("readback"),
            size: (bytes_per_row * SIZE) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });
        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("readback encoder"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &self.color,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &output_buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(bytes_per_row),
                    rows_per_image: Some(SIZE),
                },
            },
            wgpu::Extent3d {
                width: SIZE,
                height: SIZE,
                depth_or_array_layers: 1,
            },
        );
        gpu.queue.submit(std::iter::once(encoder.finish()));

        let buffer_slice = output_buffer.slice(..);
        let (tx, rx) = futures_intrusive::channel::shared::oneshot_channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            tx.send(result).unwrap();
        });
        gpu.device
            .poll(wgpu::PollType::Wait {
                submission_index: None,
                timeout: Some(Duration::from_secs(3)),
            })
            .unwrap();
        futures::executor::block_on(rx.receive()).unwrap().unwrap();
        let data = buffer_slice.get_mapped_range().to_vec();
        output_buffer.unmap();
        image::RgbaImage::from_raw(SIZE, SIZE, data).unwrap()
    }
}
