//! OpenGL context manager backed by `glow`
//!
//! Frame skipping renders into an off-screen FBO (color texture plus an
//! optional depth/stencil renderbuffer) sized to the output resolution.
//! The FBO is rebuilt on every context reset. `release_resources` frees it
//! while the context is still current, ahead of a context loss.
//!
//! The host keeps ownership of the window; presenting goes through the swap
//! callback handed in at construction.

use glow::HasContext;
use host_core::gl::{ContextError, ContextParams, FramebufferTarget, GlContextManager};
use host_core::logging::{log, LogCategory, LogLevel};

struct Offscreen {
    fbo: glow::Framebuffer,
    color_texture: glow::Texture,
    depth_renderbuffer: Option<glow::Renderbuffer>,
}

pub struct GlowContextManager {
    gl: glow::Context,
    width: u32,
    height: u32,
    params: ContextParams,
    offscreen: Option<Offscreen>,
    swap: Box<dyn FnMut()>,
}

impl GlowContextManager {
    pub fn new(gl: glow::Context, width: u32, height: u32, swap: Box<dyn FnMut()>) -> Self {
        Self {
            gl,
            width,
            height,
            params: ContextParams::default(),
            offscreen: None,
            swap,
        }
    }

    /// Create the off-screen target for the current context
    unsafe fn create_offscreen(&self) -> Result<Offscreen, ContextError> {
        let gl = &self.gl;
        let resource = ContextError::Resource;

        let fbo = gl.create_framebuffer().map_err(resource)?;
        gl.bind_framebuffer(glow::FRAMEBUFFER, Some(fbo));

        let color_texture = match gl.create_texture() {
            Ok(texture) => texture,
            Err(err) => {
                gl.bind_framebuffer(glow::FRAMEBUFFER, None);
                gl.delete_framebuffer(fbo);
                return Err(resource(err));
            }
        };
        gl.bind_texture(glow::TEXTURE_2D, Some(color_texture));
        gl.tex_image_2d(
            glow::TEXTURE_2D,
            0,
            glow::RGBA as i32,
            self.width as i32,
            self.height as i32,
            0,
            glow::RGBA,
            glow::UNSIGNED_BYTE,
            None,
        );
        gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, glow::NEAREST as i32);
        gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, glow::NEAREST as i32);
        gl.framebuffer_texture_2d(
            glow::FRAMEBUFFER,
            glow::COLOR_ATTACHMENT0,
            glow::TEXTURE_2D,
            Some(color_texture),
            0,
        );

        let depth_renderbuffer = if self.params.depth || self.params.stencil {
            let (format, attachment) = if self.params.stencil {
                (glow::DEPTH24_STENCIL8, glow::DEPTH_STENCIL_ATTACHMENT)
            } else {
                (glow::DEPTH_COMPONENT16, glow::DEPTH_ATTACHMENT)
            };
            let renderbuffer = match gl.create_renderbuffer() {
                Ok(renderbuffer) => renderbuffer,
                Err(err) => {
                    gl.bind_framebuffer(glow::FRAMEBUFFER, None);
                    gl.bind_texture(glow::TEXTURE_2D, None);
                    gl.delete_texture(color_texture);
                    gl.delete_framebuffer(fbo);
                    return Err(resource(err));
                }
            };
            gl.bind_renderbuffer(glow::RENDERBUFFER, Some(renderbuffer));
            gl.renderbuffer_storage(
                glow::RENDERBUFFER,
                format,
                self.width as i32,
                self.height as i32,
            );
            gl.framebuffer_renderbuffer(
                glow::FRAMEBUFFER,
                attachment,
                glow::RENDERBUFFER,
                Some(renderbuffer),
            );
            Some(renderbuffer)
        } else {
            None
        };

        let status = gl.check_framebuffer_status(glow::FRAMEBUFFER);
        gl.bind_framebuffer(glow::FRAMEBUFFER, None);
        gl.bind_texture(glow::TEXTURE_2D, None);
        gl.bind_renderbuffer(glow::RENDERBUFFER, None);

        let offscreen = Offscreen {
            fbo,
            color_texture,
            depth_renderbuffer,
        };
        if status != glow::FRAMEBUFFER_COMPLETE {
            self.delete_offscreen(offscreen);
            return Err(ContextError::Resource(format!(
                "framebuffer incomplete: status = 0x{:X}",
                status
            )));
        }
        Ok(offscreen)
    }

    unsafe fn delete_offscreen(&self, offscreen: Offscreen) {
        self.gl.delete_framebuffer(offscreen.fbo);
        self.gl.delete_texture(offscreen.color_texture);
        if let Some(renderbuffer) = offscreen.depth_renderbuffer {
            self.gl.delete_renderbuffer(renderbuffer);
        }
    }
}

impl GlContextManager for GlowContextManager {
    fn init_context(&mut self, params: &ContextParams) -> Result<(), ContextError> {
        let version = self.gl.version();
        if version.major < 3 && !version.is_embedded {
            return Err(ContextError::Unsupported(format!(
                "OpenGL {}.{} lacks framebuffer objects",
                version.major, version.minor
            )));
        }
        self.params = *params;
        log(LogCategory::Gfx, LogLevel::Info, || {
            format!(
                "OpenGL {}.{}{} ({})",
                version.major,
                version.minor,
                if version.is_embedded { " ES" } else { "" },
                version.vendor_info
            )
        });
        Ok(())
    }

    fn context_reset(&mut self) -> Result<(), ContextError> {
        // Still held only when no destroy preceded this reset, so the
        // context is the one the target was created in
        self.release_resources();
        self.offscreen = Some(unsafe { self.create_offscreen()? });
        log(LogCategory::Gfx, LogLevel::Debug, || {
            format!("off-screen target {}x{} ready", self.width, self.height)
        });
        Ok(())
    }

    fn setup_state(&mut self) {
        unsafe {
            self.gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
            self.gl.clear_color(0.0, 0.0, 0.0, 1.0);
            self.gl.disable(glow::DITHER);
            self.gl.disable(glow::STENCIL_TEST);
        }
    }

    fn bind(&mut self) {
        unsafe {
            self.gl.viewport(0, 0, self.width as i32, self.height as i32);
            if self.params.depth {
                self.gl.enable(glow::DEPTH_TEST);
            }
        }
    }

    fn unbind(&mut self) {
        unsafe {
            self.gl.bind_framebuffer(glow::FRAMEBUFFER, None);
            self.gl.bind_texture(glow::TEXTURE_2D, None);
            self.gl.use_program(None);
            self.gl.disable(glow::DEPTH_TEST);
        }
    }

    fn bind_framebuffer(&mut self, target: FramebufferTarget) {
        let fbo = match target {
            FramebufferTarget::Default => None,
            FramebufferTarget::Offscreen => self.offscreen.as_ref().map(|o| o.fbo),
        };
        unsafe {
            self.gl.bind_framebuffer(glow::FRAMEBUFFER, fbo);
        }
    }

    fn swap_buffers(&mut self) {
        (self.swap)();
    }

    fn release_resources(&mut self) {
        if let Some(offscreen) = self.offscreen.take() {
            unsafe { self.delete_offscreen(offscreen) };
            log(LogCategory::Gfx, LogLevel::Debug, || {
                "off-screen target released".to_string()
            });
        }
    }
}
