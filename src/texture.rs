use crate::atlas::UvMapper;
use crate::gfx::{
    Caches, Driver, SamplerFilter, SamplerParam, SamplerWrap, TextureId, TextureTarget,
};
use log::{debug, trace, warn};
use std::num::NonZeroU64;
use std::rc::Weak;

/// How a sampler setter reaches the driver.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SamplerApply {
    /// Bind the texture to `target` before writing parameters.
    pub bind: bool,
    /// Write parameters even when the cached state already matches.
    pub force: bool,
    pub target: TextureTarget,
}

impl SamplerApply {
    pub const fn rebind() -> Self {
        Self {
            bind: true,
            force: false,
            target: TextureTarget::Texture2D,
        }
    }

    pub const fn forced() -> Self {
        Self {
            bind: false,
            force: true,
            target: TextureTarget::Texture2D,
        }
    }

    pub const fn on(mut self, target: TextureTarget) -> Self {
        self.target = target;
        self
    }
}

/// Opaque marker protecting a texture from eviction for one frame.
/// Only compared for equality.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct InUseToken(NonZeroU64);

impl InUseToken {
    pub const fn new(raw: u64) -> Option<Self> {
        match NonZeroU64::new(raw) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    #[inline(always)]
    pub const fn get(self) -> u64 {
        self.0.get()
    }
}

/// Sampler state and release behavior shared by all texture variants.
pub trait TextureOps {
    fn set_wrap_st(&mut self, wrap_s: SamplerWrap, wrap_t: SamplerWrap, apply: SamplerApply);

    fn set_filter_min_mag(&mut self, min: SamplerFilter, mag: SamplerFilter, apply: SamplerApply);

    /// Releases the driver-side texture. Returns whether a delete was issued.
    fn delete_texture(&mut self) -> bool;

    /// Whether this wrapper exclusively owns its driver handle.
    fn owns_handle(&self) -> bool;

    #[inline(always)]
    fn set_wrap(&mut self, wrap: SamplerWrap, apply: SamplerApply) {
        self.set_wrap_st(wrap, wrap, apply);
    }

    #[inline(always)]
    fn set_filter(&mut self, filter: SamplerFilter, apply: SamplerApply) {
        self.set_filter_min_mag(filter, filter, apply);
    }
}

/// A driver texture plus the metadata the texture cache keeps for it.
pub struct Texture<'c, D: Driver> {
    /// Driver name of the texture, `0` while unallocated.
    pub id: TextureId,
    pub width: u32,
    pub height: u32,
    pub blend: bool,
    /// Whether trilinear filtering applies.
    pub mip_map: bool,
    /// Byte size of the source bitmap, `0` if unknown.
    pub bitmap_size: u32,
    /// Delete the driver texture when this wrapper is released.
    pub cleanup: bool,
    pub uv_mapper: Option<Weak<UvMapper>>,
    generation: u32,
    in_use: Option<InUseToken>,

    wrap_s: SamplerWrap,
    wrap_t: SamplerWrap,
    min_filter: SamplerFilter,
    mag_filter: SamplerFilter,
    first_wrap: bool,
    first_filter: bool,

    caches: &'c Caches<D>,
}

impl<'c, D: Driver> Texture<'c, D> {
    pub fn new(caches: &'c Caches<D>) -> Self {
        let config = caches.config();
        Self {
            id: 0,
            width: 0,
            height: 0,
            blend: false,
            mip_map: false,
            bitmap_size: 0,
            cleanup: false,
            uv_mapper: None,
            generation: 0,
            in_use: None,
            wrap_s: config.default_wrap,
            wrap_t: config.default_wrap,
            min_filter: config.default_filter,
            mag_filter: config.default_filter.base(),
            first_wrap: true,
            first_filter: true,
            caches,
        }
    }

    /// A texture wrapping the already allocated driver name `id`.
    pub fn with_id(caches: &'c Caches<D>, id: TextureId, width: u32, height: u32) -> Self {
        Self {
            id,
            width,
            height,
            ..Self::new(caches)
        }
    }

    #[inline(always)]
    pub fn caches(&self) -> &'c Caches<D> {
        self.caches
    }

    #[inline(always)]
    pub fn is_allocated(&self) -> bool {
        self.id != 0
    }

    pub fn wrap(&self) -> (SamplerWrap, SamplerWrap) {
        (self.wrap_s, self.wrap_t)
    }

    pub fn filter(&self) -> (SamplerFilter, SamplerFilter) {
        (self.min_filter, self.mag_filter)
    }

    // --- Generation ---

    #[inline(always)]
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Records that the backing content changed. Saturates instead of wrapping.
    pub fn advance_generation(&mut self) -> u32 {
        self.generation = self.generation.saturating_add(1);
        self.generation
    }

    /// Sets the generation to `generation` unless that would move it backwards.
    pub fn set_generation(&mut self, generation: u32) -> bool {
        if generation < self.generation {
            warn!(
                "Refusing to move texture {} generation back from {} to {generation}.",
                self.id, self.generation
            );
            return false;
        }
        self.generation = generation;
        true
    }

    // --- Eviction marker ---

    #[inline(always)]
    pub fn in_use(&self) -> Option<InUseToken> {
        self.in_use
    }

    #[inline(always)]
    pub fn is_in_use(&self) -> bool {
        self.in_use.is_some()
    }

    pub fn mark_in_use(&mut self, token: InUseToken) {
        self.in_use = Some(token);
    }

    pub fn clear_in_use(&mut self) {
        self.in_use = None;
    }

    pub fn uv_mapper(&self) -> Option<std::rc::Rc<UvMapper>> {
        self.uv_mapper.as_ref().and_then(Weak::upgrade)
    }

    /// Resolves which axes need a driver write, or `None` when the texture is
    /// unallocated and only the cached intent may change.
    fn pending<T: PartialEq>(
        &self,
        first: bool,
        force: bool,
        wants: [(T, T); 2],
    ) -> Option<[bool; 2]> {
        if !self.is_allocated() {
            return None;
        }
        Some(wants.map(|(want, have)| force || first || want != have))
    }
}

impl<D: Driver> TextureOps for Texture<'_, D> {
    fn set_wrap_st(&mut self, wrap_s: SamplerWrap, wrap_t: SamplerWrap, apply: SamplerApply) {
        let Some([s, t]) = self.pending(
            self.first_wrap,
            apply.force,
            [(wrap_s, self.wrap_s), (wrap_t, self.wrap_t)],
        ) else {
            debug!("Texture is unallocated; caching wrap {wrap_s}/{wrap_t} without driver calls.");
            self.wrap_s = wrap_s;
            self.wrap_t = wrap_t;
            return;
        };

        if s || t {
            self.caches.prepare_target(apply.target, self.id, apply.bind);
            if s {
                self.caches.tex_parameter(apply.target, SamplerParam::WrapS(wrap_s));
            }
            if t {
                self.caches.tex_parameter(apply.target, SamplerParam::WrapT(wrap_t));
            }
        } else {
            trace!("Texture {} wrap already {wrap_s}/{wrap_t}.", self.id);
        }

        self.wrap_s = wrap_s;
        self.wrap_t = wrap_t;
        self.first_wrap = false;
    }

    fn set_filter_min_mag(&mut self, min: SamplerFilter, mag: SamplerFilter, apply: SamplerApply) {
        let mag = if mag.is_mipmapped() {
            warn!("Mipmapped filter {mag} is not a magnification filter; using {}.", mag.base());
            mag.base()
        } else {
            mag
        };

        let Some([lo, hi]) = self.pending(
            self.first_filter,
            apply.force,
            [(min, self.min_filter), (mag, self.mag_filter)],
        ) else {
            debug!("Texture is unallocated; caching filter {min}/{mag} without driver calls.");
            self.min_filter = min;
            self.mag_filter = mag;
            return;
        };

        if lo || hi {
            self.caches.prepare_target(apply.target, self.id, apply.bind);
            if lo {
                self.caches.tex_parameter(apply.target, SamplerParam::MinFilter(min));
            }
            if hi {
                self.caches.tex_parameter(apply.target, SamplerParam::MagFilter(mag));
            }
        } else {
            trace!("Texture {} filter already {min}/{mag}.", self.id);
        }

        self.min_filter = min;
        self.mag_filter = mag;
        self.first_filter = false;
    }

    fn delete_texture(&mut self) -> bool {
        if !self.is_allocated() {
            debug!("Ignoring delete of an unallocated texture.");
            return false;
        }
        let id = std::mem::take(&mut self.id);
        // A future allocation starts from unknown driver state.
        self.first_wrap = true;
        self.first_filter = true;
        self.caches.delete_texture(id)
    }

    #[inline(always)]
    fn owns_handle(&self) -> bool {
        self.cleanup
    }
}

/// Clears the eviction marker on every texture at a frame boundary.
/// Returns how many textures were marked.
pub fn reset_in_use<'a, 'c: 'a, D: Driver + 'c>(
    textures: impl IntoIterator<Item = &'a mut Texture<'c, D>>,
) -> usize {
    textures
        .into_iter()
        .filter_map(|t| t.in_use.take())
        .count()
}
