//! Rendering system with wgpu pipelines for every scene layer.
//!
//! The scene side hands over a [`FramePlan`]; this module only uploads each
//! layer's uniforms and draws the layers back to front in one pass.

mod fullscreen;
mod points;

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::{Result, VizError};
use crate::params::RenderConfig;
use crate::scene::{
    AuroraUniforms, FramePlan, GalaxyUniforms, Layer, ParticleInstance, RainGlassUniforms,
};

pub use fullscreen::FullscreenPass;
pub use points::PointPass;

/// Pick the surface format; linear (non-sRGB) output keeps raw shader colours
pub fn choose_surface_format(formats: &[wgpu::TextureFormat]) -> Option<wgpu::TextureFormat> {
    formats
        .iter()
        .find(|f| !f.is_srgb())
        .or_else(|| formats.first())
        .copied()
}

/// Fifo when vsync is requested, otherwise the lowest-latency supported mode
pub fn choose_present_mode(vsync: bool, supported: &[wgpu::PresentMode]) -> wgpu::PresentMode {
    if vsync {
        return wgpu::PresentMode::Fifo;
    }
    [wgpu::PresentMode::Mailbox, wgpu::PresentMode::Immediate]
        .into_iter()
        .find(|mode| supported.contains(mode))
        .unwrap_or(wgpu::PresentMode::Fifo)
}

/// Rendering system managing wgpu device, pipelines, and buffers
pub struct RenderSystem {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    galaxy: FullscreenPass,
    rain_glass: FullscreenPass,
    aurora: FullscreenPass,
    particles: PointPass,
}

impl RenderSystem {
    /// Create new rendering system
    pub async fn new(
        window: Arc<winit::window::Window>,
        render_config: &RenderConfig,
        particles: &[ParticleInstance],
    ) -> Result<Self> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        // Surface needs a 'static window, hence the Arc
        let surface = instance
            .create_surface(window)
            .map_err(|e| VizError::Render(format!("Failed to create surface: {}", e)))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| VizError::Render("Failed to find suitable GPU adapter".into()))?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Main Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await
            .map_err(|e| VizError::Render(format!("Failed to request device: {}", e)))?;

        let surface_caps = surface.get_capabilities(&adapter);
        let format = choose_surface_format(&surface_caps.formats)
            .ok_or_else(|| VizError::Render("Surface reports no supported formats".into()))?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: choose_present_mode(render_config.vsync, &surface_caps.present_modes),
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let info = adapter.get_info();
        info!(
            adapter = %info.name,
            backend = ?info.backend,
            format = ?format,
            present_mode = ?config.present_mode,
            "GPU initialized"
        );

        let galaxy = FullscreenPass::new::<GalaxyUniforms>(
            &device,
            format,
            "Galaxy Pass",
            include_str!("../shaders/galaxy.wgsl"),
        );
        let rain_glass = FullscreenPass::new::<RainGlassUniforms>(
            &device,
            format,
            "Rain Glass Pass",
            include_str!("../shaders/rain_glass.wgsl"),
        );
        let aurora = FullscreenPass::new::<AuroraUniforms>(
            &device,
            format,
            "Aurora Pass",
            include_str!("../shaders/aurora.wgsl"),
        );
        let particles = PointPass::new(&device, format, particles);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            galaxy,
            rain_glass,
            aurora,
            particles,
        })
    }

    /// Current surface size in physical pixels
    pub fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    /// Reconfigure the surface if the drawing buffer no longer matches
    pub fn sync_size(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        if (width, height) != self.size() {
            debug!(width, height, "resizing surface");
            self.config.width = width;
            self.config.height = height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    /// Draw one frame; transient surface errors skip the frame
    pub fn render(&mut self, plan: &FramePlan) -> Result<()> {
        if plan.is_skipped() {
            return Ok(());
        }

        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                warn!("surface lost or outdated, reconfiguring");
                self.surface.configure(&self.device, &self.config);
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                debug!("surface timeout, skipping frame");
                return Ok(());
            }
            Err(e) => return Err(VizError::Render(format!("Surface error: {}", e))),
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        for layer in &plan.layers {
            match layer {
                Layer::Galaxy(u) => self.galaxy.write(&self.queue, u),
                Layer::Particles(u) => self.particles.write(&self.queue, u),
                Layer::RainGlass(u) => self.rain_glass.write(&self.queue, u),
                Layer::Aurora(u) => self.aurora.write(&self.queue, u),
            }
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            for layer in &plan.layers {
                match layer {
                    Layer::Galaxy(_) => self.galaxy.draw(&mut render_pass),
                    Layer::Particles(_) => self.particles.draw(&mut render_pass),
                    Layer::RainGlass(_) => self.rain_glass.draw(&mut render_pass),
                    Layer::Aurora(_) => self.aurora.draw(&mut render_pass),
                }
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wgpu::{PresentMode, TextureFormat};

    #[test]
    fn linear_format_preferred() {
        let formats = [TextureFormat::Bgra8UnormSrgb, TextureFormat::Bgra8Unorm];
        assert_eq!(choose_surface_format(&formats), Some(TextureFormat::Bgra8Unorm));
    }

    #[test]
    fn srgb_only_surface_still_renders() {
        let formats = [TextureFormat::Rgba8UnormSrgb];
        assert_eq!(choose_surface_format(&formats), Some(TextureFormat::Rgba8UnormSrgb));
        assert_eq!(choose_surface_format(&[]), None);
    }

    #[test]
    fn present_mode_selection() {
        let all = [PresentMode::Fifo, PresentMode::Immediate, PresentMode::Mailbox];
        assert_eq!(choose_present_mode(true, &all), PresentMode::Fifo);
        assert_eq!(choose_present_mode(false, &all), PresentMode::Mailbox);
        assert_eq!(choose_present_mode(false, &[PresentMode::Fifo]), PresentMode::Fifo);
    }
}
