//! GL texture handles that remember their sampler state.
//!
//! A [`Texture`] skips wrap and filter writes the driver already holds,
//! carries the generation and in-use marker a texture cache needs, and can
//! be released deterministically through a [`ScopedTexture`].

pub mod atlas;
pub mod config;
pub mod gfx;
pub mod guard;
pub mod texture;

pub use atlas::{DelegateTexture, TextureAtlas, UvMapper};
pub use config::{BindPolicy, TextureConfig};
pub use gfx::{Caches, Driver, SamplerFilter, SamplerParam, SamplerWrap, TextureId, TextureTarget};
pub use guard::ScopedTexture;
pub use texture::{InUseToken, SamplerApply, Texture, TextureOps, reset_in_use};
