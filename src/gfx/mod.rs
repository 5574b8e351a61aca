pub mod backends;

use crate::config::{BindPolicy, TextureConfig};
use log::trace;
use rustc_hash::FxHashMap;
use std::{
    cell::{Cell, RefCell},
    str::FromStr,
};

/// Driver-side texture name. `0` is never a live texture.
pub type TextureId = u32;

// --- Public Data Contract ---

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TextureTarget {
    #[default]
    Texture2D,
    External,
    CubeMap,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SamplerWrap {
    Clamp,
    Repeat,
    MirroredRepeat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SamplerFilter {
    Nearest,
    Linear,
    NearestMipmapNearest,
    LinearMipmapNearest,
    NearestMipmapLinear,
    LinearMipmapLinear,
}

impl SamplerFilter {
    #[inline(always)]
    pub const fn is_mipmapped(self) -> bool {
        !matches!(self, Self::Nearest | Self::Linear)
    }

    /// The non-mipmapped filter sampling within a single level.
    #[inline(always)]
    pub const fn base(self) -> Self {
        match self {
            Self::Nearest | Self::NearestMipmapNearest | Self::NearestMipmapLinear => Self::Nearest,
            Self::Linear | Self::LinearMipmapNearest | Self::LinearMipmapLinear => Self::Linear,
        }
    }
}

/// A single sampler parameter write, as issued to the driver.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SamplerParam {
    WrapS(SamplerWrap),
    WrapT(SamplerWrap),
    MinFilter(SamplerFilter),
    MagFilter(SamplerFilter),
}

/// The graphics driver capability textures are built on.
///
/// Implementations must be called from the thread that owns the context.
pub trait Driver {
    fn bind_texture(&self, target: TextureTarget, id: TextureId);
    fn tex_parameter(&self, target: TextureTarget, param: SamplerParam);
    fn delete_texture(&self, id: TextureId);
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DriverStats {
    pub binds: u64,
    pub skipped_binds: u64,
    pub parameters: u64,
    pub deletes: u64,
}

/// Shared driver context every texture keeps a back-reference to.
///
/// Owns the driver and tracks which texture is bound on each target so
/// redundant binds never reach the driver.
pub struct Caches<D: Driver> {
    driver: D,
    config: TextureConfig,
    bound: RefCell<FxHashMap<TextureTarget, TextureId>>,
    stats: Cell<DriverStats>,
}

impl<D: Driver> Caches<D> {
    pub fn new(driver: D, config: TextureConfig) -> Self {
        Self {
            driver,
            config,
            bound: RefCell::new(FxHashMap::default()),
            stats: Cell::new(DriverStats::default()),
        }
    }

    #[inline(always)]
    pub fn driver(&self) -> &D {
        &self.driver
    }

    #[inline(always)]
    pub fn config(&self) -> &TextureConfig {
        &self.config
    }

    pub fn stats(&self) -> DriverStats {
        self.stats.get()
    }

    pub fn reset_stats(&self) {
        self.stats.set(DriverStats::default());
    }

    pub fn bound_texture(&self, target: TextureTarget) -> Option<TextureId> {
        self.bound.borrow().get(&target).copied()
    }

    /// Binds `id` to `target` unless it is already known to be bound there.
    pub fn bind_texture(&self, target: TextureTarget, id: TextureId) {
        if self.bound_texture(target) == Some(id) {
            trace!("Skipping redundant bind of texture {id} on {target:?}.");
            self.bump(|s| s.skipped_binds += 1);
            return;
        }
        self.force_bind_texture(target, id);
    }

    /// Binds `id` to `target` even if it is already tracked as bound.
    pub fn force_bind_texture(&self, target: TextureTarget, id: TextureId) {
        self.driver.bind_texture(target, id);
        self.bound.borrow_mut().insert(target, id);
        self.bump(|s| s.binds += 1);
    }

    /// Makes sure parameter writes for `id` land on `id`, honoring the
    /// configured [`BindPolicy`] when the caller did not ask for a rebind.
    pub(crate) fn prepare_target(&self, target: TextureTarget, id: TextureId, rebind: bool) {
        if rebind {
            self.force_bind_texture(target, id);
            return;
        }
        match self.config.bind_policy {
            BindPolicy::Trust => {}
            BindPolicy::Verify => self.bind_texture(target, id),
        }
    }

    pub fn tex_parameter(&self, target: TextureTarget, param: SamplerParam) {
        self.driver.tex_parameter(target, param);
        self.bump(|s| s.parameters += 1);
    }

    /// Deletes `id` and forgets every binding that referenced it.
    /// Returns `false` for the unallocated name `0`.
    pub fn delete_texture(&self, id: TextureId) -> bool {
        if id == 0 {
            return false;
        }
        self.bound.borrow_mut().retain(|_, bound| *bound != id);
        self.driver.delete_texture(id);
        self.bump(|s| s.deletes += 1);
        true
    }

    /// Forgets all tracked bindings. Call after code outside this crate
    /// changed texture bindings on the context.
    pub fn invalidate_bindings(&self) {
        self.bound.borrow_mut().clear();
    }

    #[inline(always)]
    fn bump(&self, f: impl FnOnce(&mut DriverStats)) {
        let mut stats = self.stats.get();
        f(&mut stats);
        self.stats.set(stats);
    }
}

// -- Boilerplate impls --
impl std::fmt::Display for SamplerWrap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Clamp => write!(f, "Clamp"),
            Self::Repeat => write!(f, "Repeat"),
            Self::MirroredRepeat => write!(f, "MirroredRepeat"),
        }
    }
}

impl FromStr for SamplerWrap {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "clamp" | "clamp-to-edge" | "clamp_to_edge" => Ok(Self::Clamp),
            "repeat" => Ok(Self::Repeat),
            "mirroredrepeat" | "mirrored-repeat" | "mirrored_repeat" => Ok(Self::MirroredRepeat),
            _ => Err(format!("'{s}' is not a valid wrap mode")),
        }
    }
}

impl std::fmt::Display for SamplerFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Nearest => write!(f, "Nearest"),
            Self::Linear => write!(f, "Linear"),
            Self::NearestMipmapNearest => write!(f, "NearestMipmapNearest"),
            Self::LinearMipmapNearest => write!(f, "LinearMipmapNearest"),
            Self::NearestMipmapLinear => write!(f, "NearestMipmapLinear"),
            Self::LinearMipmapLinear => write!(f, "LinearMipmapLinear"),
        }
    }
}

impl FromStr for SamplerFilter {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "nearest" => Ok(Self::Nearest),
            "linear" => Ok(Self::Linear),
            "nearestmipmapnearest" => Ok(Self::NearestMipmapNearest),
            "linearmipmapnearest" => Ok(Self::LinearMipmapNearest),
            "nearestmipmaplinear" => Ok(Self::NearestMipmapLinear),
            "linearmipmaplinear" | "trilinear" => Ok(Self::LinearMipmapLinear),
            _ => Err(format!("'{s}' is not a valid filter mode")),
        }
    }
}
