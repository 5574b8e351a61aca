//! Sub-rectangles of one shared texture.
//!
//! Entries forward sampler state to the shared texture so a single state
//! cache describes the driver object, and never delete the shared handle.

use crate::gfx::{Driver, SamplerFilter, SamplerWrap, TextureId};
use crate::texture::{SamplerApply, Texture, TextureOps};
use log::{debug, warn};
use std::cell::RefCell;
use std::rc::Rc;

/// Maps unit texture coordinates into a sub-range of a larger texture.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UvMapper {
    min_u: f32,
    max_u: f32,
    min_v: f32,
    max_v: f32,
}

impl Default for UvMapper {
    fn default() -> Self {
        Self::new(0.0, 1.0, 0.0, 1.0)
    }
}

impl UvMapper {
    pub const fn new(min_u: f32, max_u: f32, min_v: f32, max_v: f32) -> Self {
        Self {
            min_u,
            max_u,
            min_v,
            max_v,
        }
    }

    pub fn is_identity(&self) -> bool {
        self.min_u == 0.0 && self.max_u == 1.0 && self.min_v == 0.0 && self.max_v == 1.0
    }

    #[inline(always)]
    pub fn map(&self, u: f32, v: f32) -> (f32, f32) {
        (
            self.min_u + (self.max_u - self.min_u) * u,
            self.min_v + (self.max_v - self.min_v) * v,
        )
    }

    /// Maps `[u1, v1, u2, v2]` in place.
    pub fn map_rect(&self, rect: &mut [f32; 4]) {
        if self.is_identity() {
            return;
        }
        (rect[0], rect[1]) = self.map(rect[0], rect[1]);
        (rect[2], rect[3]) = self.map(rect[2], rect[3]);
    }
}

/// One shared texture carved into entries.
pub struct TextureAtlas<'c, D: Driver> {
    texture: Rc<RefCell<Texture<'c, D>>>,
    mappers: Vec<Rc<UvMapper>>,
}

impl<'c, D: Driver> TextureAtlas<'c, D> {
    /// Takes ownership of `texture`; the atlas deletes it on [`terminate`].
    ///
    /// [`terminate`]: TextureAtlas::terminate
    pub fn new(mut texture: Texture<'c, D>) -> Self {
        texture.cleanup = true;
        Self {
            texture: Rc::new(RefCell::new(texture)),
            mappers: Vec::new(),
        }
    }

    pub fn id(&self) -> TextureId {
        self.texture.borrow().id
    }

    pub fn size(&self) -> (u32, u32) {
        let tex = self.texture.borrow();
        (tex.width, tex.height)
    }

    pub fn entry_count(&self) -> usize {
        self.mappers.len()
    }

    /// Creates an entry for the `w`x`h` region at (`x`, `y`).
    /// Returns `None` for empty regions or regions outside the atlas.
    pub fn entry(&mut self, x: u32, y: u32, w: u32, h: u32) -> Option<DelegateTexture<'c, D>> {
        let (aw, ah) = self.size();
        let fits = w > 0
            && h > 0
            && x.checked_add(w).is_some_and(|r| r <= aw)
            && y.checked_add(h).is_some_and(|b| b <= ah);
        if !fits {
            warn!("Atlas region {w}x{h} at ({x}, {y}) does not fit a {aw}x{ah} atlas.");
            return None;
        }

        let (aw, ah) = (aw as f32, ah as f32);
        let mapper = Rc::new(UvMapper::new(
            x as f32 / aw,
            (x + w) as f32 / aw,
            y as f32 / ah,
            (y + h) as f32 / ah,
        ));

        // Attributes only; the driver name stays with the shared texture.
        let shared = self.texture.borrow();
        let mut attrs = Texture::with_id(shared.caches(), 0, w, h);
        attrs.blend = shared.blend;
        attrs.mip_map = shared.mip_map;
        attrs.uv_mapper = Some(Rc::downgrade(&mapper));
        drop(shared);

        self.mappers.push(mapper);
        Some(DelegateTexture {
            attrs,
            delegate: Rc::clone(&self.texture),
            attached: true,
        })
    }

    pub fn set_wrap(&self, wrap: SamplerWrap, apply: SamplerApply) {
        self.texture.borrow_mut().set_wrap(wrap, apply);
    }

    pub fn set_filter(&self, filter: SamplerFilter, apply: SamplerApply) {
        self.texture.borrow_mut().set_filter(filter, apply);
    }

    /// Deletes the shared texture and drops every entry's UV mapping.
    /// Entries still alive afterwards refer to a zero handle through the
    /// shared texture.
    pub fn terminate(&mut self) -> bool {
        self.mappers.clear();
        self.texture.borrow_mut().delete_texture()
    }
}

/// An atlas entry: its own attributes, the atlas's sampler state.
///
/// The entry's own [`Texture`] carries attributes only and always has
/// `id == 0`; the driver name is read from the shared texture.
pub struct DelegateTexture<'c, D: Driver> {
    attrs: Texture<'c, D>,
    delegate: Rc<RefCell<Texture<'c, D>>>,
    attached: bool,
}

impl<'c, D: Driver> DelegateTexture<'c, D> {
    #[inline(always)]
    pub fn texture(&self) -> &Texture<'c, D> {
        &self.attrs
    }

    #[inline(always)]
    pub fn texture_mut(&mut self) -> &mut Texture<'c, D> {
        &mut self.attrs
    }

    /// The driver name currently backing this entry, `0` once detached or
    /// after the atlas was terminated.
    pub fn id(&self) -> TextureId {
        if !self.attached {
            return 0;
        }
        self.delegate.borrow().id
    }

    #[inline(always)]
    pub fn is_attached(&self) -> bool {
        self.attached
    }
}

impl<D: Driver> TextureOps for DelegateTexture<'_, D> {
    fn set_wrap_st(&mut self, wrap_s: SamplerWrap, wrap_t: SamplerWrap, apply: SamplerApply) {
        if !self.attached {
            debug!("Atlas entry is detached; ignoring wrap {wrap_s}/{wrap_t}.");
            return;
        }
        self.delegate.borrow_mut().set_wrap_st(wrap_s, wrap_t, apply);
    }

    fn set_filter_min_mag(&mut self, min: SamplerFilter, mag: SamplerFilter, apply: SamplerApply) {
        if !self.attached {
            debug!("Atlas entry is detached; ignoring filter {min}/{mag}.");
            return;
        }
        self.delegate.borrow_mut().set_filter_min_mag(min, mag, apply);
    }

    fn delete_texture(&mut self) -> bool {
        if self.attached {
            debug!(
                "Detaching atlas entry from shared texture {}; the atlas keeps it.",
                self.delegate.borrow().id
            );
            self.attached = false;
        }
        false
    }

    #[inline(always)]
    fn owns_handle(&self) -> bool {
        self.attrs.cleanup
    }
}

#[cfg(test)]
mod tests {
    use super::{TextureAtlas, UvMapper};
    use crate::config::TextureConfig;
    use crate::gfx::backends::recording::RecordingDriver;
    use crate::gfx::{Caches, SamplerFilter, SamplerWrap};
    use crate::texture::{SamplerApply, Texture, TextureOps};

    fn atlas_caches() -> Caches<RecordingDriver> {
        Caches::new(RecordingDriver::new(), TextureConfig::default())
    }

    #[test]
    fn mapper_scales_into_region() {
        let m = UvMapper::new(0.25, 0.75, 0.5, 1.0);
        assert_eq!(m.map(0.0, 0.0), (0.25, 0.5));
        assert_eq!(m.map(1.0, 1.0), (0.75, 1.0));
        let mut rect = [0.0, 0.0, 0.5, 0.5];
        m.map_rect(&mut rect);
        assert_eq!(rect, [0.25, 0.5, 0.5, 0.75]);
        assert!(UvMapper::default().is_identity());
        assert!(!m.is_identity());
    }

    #[test]
    fn entries_share_one_sampler_cache() {
        let caches = atlas_caches();
        let id = caches.driver().create_texture();
        let mut atlas = TextureAtlas::new(Texture::with_id(&caches, id, 256, 256));
        let mut a = atlas.entry(0, 0, 128, 128).expect("fits");
        let mut b = atlas.entry(128, 0, 128, 128).expect("fits");

        a.set_wrap(SamplerWrap::Clamp, SamplerApply::default());
        b.set_wrap(SamplerWrap::Clamp, SamplerApply::default());
        a.set_filter(SamplerFilter::Linear, SamplerApply::default());
        b.set_filter(SamplerFilter::Linear, SamplerApply::default());
        assert_eq!(
            caches.driver().parameter_calls(),
            4,
            "second entry must see state already applied through the first"
        );
        assert_eq!(a.id(), id);
        assert_eq!(b.texture().width, 128);
    }

    #[test]
    fn entry_uv_mapper_lives_as_long_as_atlas() {
        let caches = atlas_caches();
        let id = caches.driver().create_texture();
        let mut atlas = TextureAtlas::new(Texture::with_id(&caches, id, 100, 50));
        let entry = atlas.entry(50, 25, 50, 25).expect("fits");
        let mapper = entry.texture().uv_mapper().expect("atlas holds the mapper");
        assert_eq!(mapper.map(0.0, 0.0), (0.5, 0.5));
        drop(mapper);

        assert!(atlas.terminate());
        assert!(entry.texture().uv_mapper().is_none());
        assert_eq!(caches.driver().delete_calls(), 1);
    }

    #[test]
    fn entry_never_deletes_shared_texture() {
        let caches = atlas_caches();
        let id = caches.driver().create_texture();
        let mut atlas = TextureAtlas::new(Texture::with_id(&caches, id, 64, 64));
        let mut entry = atlas.entry(0, 0, 32, 32).expect("fits");
        assert!(!entry.owns_handle());
        assert!(!entry.delete_texture());
        assert_eq!(entry.id(), 0);
        assert_eq!(atlas.id(), id);
        assert_eq!(caches.driver().delete_calls(), 0);
    }

    #[test]
    fn entry_attributes_cannot_delete_shared_texture() {
        let caches = atlas_caches();
        let id = caches.driver().create_texture();
        let mut atlas = TextureAtlas::new(Texture::with_id(&caches, id, 64, 64));
        let mut entry = atlas.entry(0, 0, 32, 32).expect("fits");
        assert_eq!(entry.texture().id, 0, "entry attributes never carry the shared name");
        assert!(!entry.texture_mut().delete_texture());

        assert!(atlas.terminate());
        assert_eq!(caches.driver().delete_calls(), 1);
        assert!(caches.driver().violations().is_empty());
    }

    #[test]
    fn entry_is_inert_after_atlas_terminates() {
        let caches = atlas_caches();
        let id = caches.driver().create_texture();
        let mut atlas = TextureAtlas::new(Texture::with_id(&caches, id, 64, 64));
        let mut entry = atlas.entry(0, 0, 32, 32).expect("fits");
        entry.set_wrap(SamplerWrap::Clamp, SamplerApply::default());
        assert!(atlas.terminate());
        caches.driver().take_calls();

        assert_eq!(entry.id(), 0);
        assert!(!entry.texture().is_allocated());
        entry.set_wrap(SamplerWrap::Repeat, SamplerApply::rebind());
        entry.texture_mut().set_wrap(SamplerWrap::Repeat, SamplerApply::rebind());
        entry.set_filter(SamplerFilter::Linear, SamplerApply::forced());
        assert!(
            caches.driver().calls().is_empty(),
            "terminated atlas must not be touched through its entries: {:?}",
            caches.driver().calls()
        );
        assert!(caches.driver().violations().is_empty());
    }

    #[test]
    fn detached_entry_issues_no_driver_calls() {
        let caches = atlas_caches();
        let id = caches.driver().create_texture();
        let mut atlas = TextureAtlas::new(Texture::with_id(&caches, id, 64, 64));
        let mut entry = atlas.entry(0, 0, 32, 32).expect("fits");
        assert!(!entry.delete_texture());
        assert!(!entry.is_attached());

        entry.set_wrap(SamplerWrap::Repeat, SamplerApply::rebind());
        entry.set_filter(SamplerFilter::Linear, SamplerApply::forced());
        assert!(caches.driver().calls().is_empty());
        assert_eq!(atlas.id(), id);
    }

    #[test]
    fn out_of_bounds_regions_are_rejected() {
        let caches = atlas_caches();
        let id = caches.driver().create_texture();
        let mut atlas = TextureAtlas::new(Texture::with_id(&caches, id, 64, 64));
        assert!(atlas.entry(60, 0, 8, 8).is_none());
        assert!(atlas.entry(0, 0, 0, 8).is_none());
        assert!(atlas.entry(u32::MAX, 0, 8, 8).is_none());
        assert_eq!(atlas.entry_count(), 0);
    }
}
