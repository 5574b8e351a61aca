use crate::texture::TextureOps;
use log::trace;

enum Held<'g, T: TextureOps> {
    Owned(Box<T>),
    Borrowed(&'g mut T),
}

/// Releases a texture when the enclosing scope ends, on every exit path.
///
/// If the texture's `cleanup` flag is set, dropping the guard deletes the
/// driver texture and then destroys an owned wrapper. A borrowed wrapper
/// stays with its owner, with its handle zeroed. Without `cleanup`, the
/// driver texture is left alone.
pub struct ScopedTexture<'g, T: TextureOps> {
    held: Option<Held<'g, T>>,
}

impl<'g, T: TextureOps> ScopedTexture<'g, T> {
    /// Guards an owned wrapper. The wrapper is destroyed with the guard in
    /// every case; only the driver delete depends on `cleanup`. Use
    /// [`ScopedTexture::borrowed`] for a texture that must outlive the scope.
    pub fn new(texture: Box<T>) -> Self {
        Self {
            held: Some(Held::Owned(texture)),
        }
    }

    pub fn borrowed(texture: &'g mut T) -> Self {
        Self {
            held: Some(Held::Borrowed(texture)),
        }
    }

    pub fn empty() -> Self {
        Self { held: None }
    }

    pub fn from_option(texture: Option<Box<T>>) -> Self {
        Self {
            held: texture.map(Held::Owned),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.held.is_none()
    }

    pub fn get(&self) -> Option<&T> {
        match self.held.as_ref()? {
            Held::Owned(t) => Some(&**t),
            Held::Borrowed(t) => Some(&**t),
        }
    }

    pub fn get_mut(&mut self) -> Option<&mut T> {
        match self.held.as_mut()? {
            Held::Owned(t) => Some(&mut **t),
            Held::Borrowed(t) => Some(&mut **t),
        }
    }

    /// Disarms the guard and hands back an owned texture, if it held one.
    pub fn into_inner(mut self) -> Option<Box<T>> {
        match self.held.take()? {
            Held::Owned(t) => Some(t),
            Held::Borrowed(_) => None,
        }
    }
}

impl<T: TextureOps> Drop for ScopedTexture<'_, T> {
    fn drop(&mut self) {
        match self.held.take() {
            None => {}
            Some(Held::Owned(mut texture)) => {
                if texture.owns_handle() {
                    texture.delete_texture();
                    trace!("Scoped texture released.");
                }
            }
            Some(Held::Borrowed(texture)) => {
                if texture.owns_handle() {
                    texture.delete_texture();
                    trace!("Scoped texture released; wrapper kept by its owner.");
                }
            }
        }
    }
}
