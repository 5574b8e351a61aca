use crate::gfx::{Driver, SamplerFilter, SamplerParam, SamplerWrap, TextureId, TextureTarget};
use glow::HasContext;
use log::debug;
use std::num::NonZeroU32;

// GL_OES_EGL_image_external; not part of glow's core constant set.
const TEXTURE_EXTERNAL_OES: u32 = 0x8D65;

#[inline(always)]
const fn gl_target(target: TextureTarget) -> u32 {
    match target {
        TextureTarget::Texture2D => glow::TEXTURE_2D,
        TextureTarget::External => TEXTURE_EXTERNAL_OES,
        TextureTarget::CubeMap => glow::TEXTURE_CUBE_MAP,
    }
}

#[inline(always)]
const fn gl_wrap(wrap: SamplerWrap) -> u32 {
    match wrap {
        SamplerWrap::Clamp => glow::CLAMP_TO_EDGE,
        SamplerWrap::Repeat => glow::REPEAT,
        SamplerWrap::MirroredRepeat => glow::MIRRORED_REPEAT,
    }
}

#[inline(always)]
const fn gl_filter(filter: SamplerFilter) -> u32 {
    match filter {
        SamplerFilter::Nearest => glow::NEAREST,
        SamplerFilter::Linear => glow::LINEAR,
        SamplerFilter::NearestMipmapNearest => glow::NEAREST_MIPMAP_NEAREST,
        SamplerFilter::LinearMipmapNearest => glow::LINEAR_MIPMAP_NEAREST,
        SamplerFilter::NearestMipmapLinear => glow::NEAREST_MIPMAP_LINEAR,
        SamplerFilter::LinearMipmapLinear => glow::LINEAR_MIPMAP_LINEAR,
    }
}

#[inline(always)]
fn native(id: TextureId) -> Option<glow::NativeTexture> {
    NonZeroU32::new(id).map(glow::NativeTexture)
}

/// Allocates a texture name on `gl`. Storage upload is left to the caller.
pub fn allocate_texture(gl: &glow::Context) -> Result<TextureId, String> {
    let texture = unsafe { gl.create_texture()? };
    debug!("Allocated GL texture {}.", texture.0);
    Ok(texture.0.get())
}

impl Driver for glow::Context {
    fn bind_texture(&self, target: TextureTarget, id: TextureId) {
        unsafe { HasContext::bind_texture(self, gl_target(target), native(id)) }
    }

    fn tex_parameter(&self, target: TextureTarget, param: SamplerParam) {
        let (name, value) = match param {
            SamplerParam::WrapS(wrap) => (glow::TEXTURE_WRAP_S, gl_wrap(wrap)),
            SamplerParam::WrapT(wrap) => (glow::TEXTURE_WRAP_T, gl_wrap(wrap)),
            SamplerParam::MinFilter(filter) => (glow::TEXTURE_MIN_FILTER, gl_filter(filter)),
            SamplerParam::MagFilter(filter) => (glow::TEXTURE_MAG_FILTER, gl_filter(filter)),
        };
        unsafe { HasContext::tex_parameter_i32(self, gl_target(target), name, value as i32) }
    }

    fn delete_texture(&self, id: TextureId) {
        if let Some(texture) = native(id) {
            unsafe { HasContext::delete_texture(self, texture) }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{gl_filter, gl_target, gl_wrap, native};
    use crate::gfx::{SamplerFilter, SamplerWrap, TextureTarget};

    #[test]
    fn enums_map_to_gl_constants() {
        assert_eq!(gl_target(TextureTarget::Texture2D), glow::TEXTURE_2D);
        assert_eq!(gl_target(TextureTarget::External), 0x8D65);
        assert_eq!(gl_wrap(SamplerWrap::Clamp), glow::CLAMP_TO_EDGE);
        assert_eq!(gl_wrap(SamplerWrap::MirroredRepeat), glow::MIRRORED_REPEAT);
        assert_eq!(
            gl_filter(SamplerFilter::LinearMipmapLinear),
            glow::LINEAR_MIPMAP_LINEAR
        );
    }

    #[test]
    fn name_zero_has_no_native_texture() {
        assert!(native(0).is_none());
        assert_eq!(native(7).map(|t| t.0.get()), Some(7));
    }
}
