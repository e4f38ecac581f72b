//! Frame rendering.
//!
//! Every frame runs two passes: the key light renders the shadow casters into
//! the shadow map (desktop only), then the main pass clears to the background
//! colour and shades the model. With MSAA the main pass draws into the
//! multisampled target and resolves into the output view.

use std::iter;

use anyhow::Context as _;
#[cfg(not(target_arch = "wasm32"))]
use instant::Duration;

use crate::{
    context::Context,
    data_structures::{
        instance::PlacedInstance,
        model::{DrawModel, Model},
    },
};

/// The displayed model and where it is placed.
#[derive(Debug)]
pub struct Scene {
    pub model: Model,
    pub placement: PlacedInstance,
}

impl Scene {
    pub fn new(device: &wgpu::Device, model: Model) -> Self {
        let placement = PlacedInstance::new(device, Default::default(), "Model Instance Buffer");
        Self { model, placement }
    }

    /// Spins the model around the vertical axis.
    pub fn rotate(&mut self, queue: &wgpu::Queue, angle: cgmath::Rad<f32>) {
        self.placement.instance.rotate_y(angle);
        self.placement.write_to_buffer(queue);
    }
}

/// Records the shadow pass and the main pass into `encoder`.
pub fn encode_frame(
    ctx: &Context,
    scene: Option<&Scene>,
    encoder: &mut wgpu::CommandEncoder,
    output: &wgpu::TextureView,
) {
    if let Some(scene) = scene.filter(|s| ctx.profile.casts_shadows() && s.model.casts_shadow) {
        let mut shadow_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Shadow Pass"),
            color_attachments: &[],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &ctx.light.shadow_map.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
        });
        shadow_pass.set_pipeline(&ctx.pipelines.shadow);
        shadow_pass.set_bind_group(0, &ctx.shadow.bind_group, &[]);
        shadow_pass.set_vertex_buffer(1, scene.placement.buffer.slice(..));
        shadow_pass.draw_model_geometry(&scene.model, 0..1);
    }

    let (view, resolve_target) = match &ctx.msaa_target {
        Some(msaa) => (&msaa.view, Some(output)),
        None => (output, None),
    };
    let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("Render Pass"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view,
            resolve_target,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(ctx.clear_colour),
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        })],
        depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
            view: &ctx.depth_texture.view,
            depth_ops: Some(wgpu::Operations {
                load: wgpu::LoadOp::Clear(1.0),
                store: wgpu::StoreOp::Store,
            }),
            stencil_ops: None,
        }),
        occlusion_query_set: None,
        timestamp_writes: None,
    });

    if let Some(scene) = scene {
        render_pass.set_pipeline(&ctx.pipelines.pbr);
        render_pass.set_bind_group(1, &ctx.camera.bind_group, &[]);
        render_pass.set_bind_group(2, &ctx.light.bind_group, &[]);
        render_pass.set_bind_group(3, &ctx.environment.bind_group, &[]);
        render_pass.set_vertex_buffer(1, scene.placement.buffer.slice(..));
        render_pass.draw_model_instanced(&scene.model, 0..1);
    }
}

/// Draws one frame into the window surface and presents it.
pub fn render_to_surface(ctx: &Context, scene: Option<&Scene>) -> Result<(), wgpu::SurfaceError> {
    let Some(surface) = &ctx.surface else {
        return Ok(());
    };
    let output = surface.get_current_texture()?;
    let view = output
        .texture
        .create_view(&wgpu::TextureViewDescriptor::default());

    let mut encoder = ctx
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Render Encoder"),
        });
    encode_frame(ctx, scene, &mut encoder, &view);
    ctx.queue.submit(iter::once(encoder.finish()));
    output.present();
    Ok(())
}

/// Draws one frame into a texture and reads it back as an image.
pub async fn render_offscreen(ctx: &Context, scene: Option<&Scene>) -> anyhow::Result<image::RgbaImage> {
    let (width, height) = ctx.size();
    let extent = wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    };
    let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Offscreen Output Texture"),
        size: extent,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: ctx.config.format,
        usage: wgpu::TextureUsages::COPY_SRC | wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

    // Rows of a buffer copy have to be aligned to 256 bytes
    let unpadded_bytes_per_row = 4 * width;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    let padded_bytes_per_row = unpadded_bytes_per_row.div_ceil(align) * align;
    let output_buffer = ctx.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Offscreen Readback Buffer"),
        size: (padded_bytes_per_row * height) as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = ctx
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Offscreen Encoder"),
        });
    encode_frame(ctx, scene, &mut encoder, &view);
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            aspect: wgpu::TextureAspect::All,
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &output_buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(padded_bytes_per_row),
                rows_per_image: Some(height),
            },
        },
        extent,
    );
    ctx.queue.submit(iter::once(encoder.finish()));

    let (tx, rx) = futures_intrusive::channel::shared::oneshot_channel();
    let buffer_slice = output_buffer.slice(..);
    buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
        // the receiver only goes away if the caller gave up waiting
        let _ = tx.send(result);
    });
    // the browser drives the queue, a poll only kicks off the callbacks
    #[cfg(target_arch = "wasm32")]
    let poll_type = wgpu::PollType::Poll;
    #[cfg(not(target_arch = "wasm32"))]
    let poll_type = wgpu::PollType::Wait {
        submission_index: None,
        timeout: Some(Duration::from_secs(3)),
    };
    ctx.device
        .poll(poll_type)
        .context("the GPU did not finish the offscreen frame")?;
    rx.receive()
        .await
        .context("the readback buffer was dropped before mapping")?
        .context("could not map the readback buffer")?;

    let data = buffer_slice.get_mapped_range();
    let mut pixels = Vec::with_capacity((unpadded_bytes_per_row * height) as usize);
    for row in data.chunks(padded_bytes_per_row as usize) {
        pixels.extend_from_slice(&row[..unpadded_bytes_per_row as usize]);
    }
    drop(data);
    output_buffer.unmap();

    let mut img = image::RgbaImage::from_raw(width, height, pixels)
        .context("readback size does not match the frame size")?;
    if matches!(
        ctx.config.format,
        wgpu::TextureFormat::Bgra8Unorm | wgpu::TextureFormat::Bgra8UnormSrgb
    ) {
        img.pixels_mut().for_each(|p| p.0.swap(0, 2));
    }
    Ok(img)
}
