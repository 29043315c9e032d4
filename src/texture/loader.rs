use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};

use glam::Vec3;

use crate::error::TextureError;
use crate::render::TextureWrap;
use crate::scene::{Scene, SurfaceRole};
use super::{LoadedTexture, TextureSource, load_with_fallback};

/// What the app does with a texture once it arrives.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadPurpose {
    /// Initial texture for a fixed surface; builds the surface on arrival.
    BuildSurface(SurfaceRole),
    /// User-imported replacement for an existing surface texture.
    Retexture(SurfaceRole),
    /// Asset dropped on the floor at `anchor`.
    PlaceItem { asset_id: String, anchor: Vec3 },
}

/// One completed request.
#[derive(Debug)]
pub struct TextureDelivery {
    pub purpose: LoadPurpose,
    pub result: Result<LoadedTexture, TextureError>,
}

/// What to do with one delivery, decided without touching the GPU.
#[derive(Debug)]
pub enum Route {
    /// Upload and put the texture on a fixed surface.
    Surface {
        role: SurfaceRole,
        texture: LoadedTexture,
        wrap: TextureWrap,
        repeat: f32,
    },
    /// Upload and place a new item at the anchor captured at drop time.
    Place {
        asset_id: String,
        anchor: Vec3,
        texture: LoadedTexture,
    },
    /// Startup texture for a surface the user has already retextured.
    Skip(SurfaceRole),
    /// A fixed surface cannot be built at all.
    Exit { role: SurfaceRole, error: TextureError },
    /// A failure that leaves the scene unchanged.
    Ignore { purpose: LoadPurpose, error: TextureError },
}

impl TextureDelivery {
    /// `swap_repeat` is the UV repeat for user-imported surface textures.
    pub fn route(self, scene: &Scene, swap_repeat: f32) -> Route {
        match (self.purpose, self.result) {
            (LoadPurpose::BuildSurface(role), Ok(_)) if scene.surface(role).is_some() => Route::Skip(role),
            (LoadPurpose::BuildSurface(role), Ok(texture)) => Route::Surface {
                role,
                texture,
                wrap: TextureWrap::Clamp,
                repeat: 1.0,
            },
            (LoadPurpose::BuildSurface(role), Err(error)) => Route::Exit { role, error },
            (LoadPurpose::Retexture(role), Ok(texture)) => Route::Surface {
                role,
                texture,
                wrap: TextureWrap::Repeat,
                repeat: swap_repeat,
            },
            (LoadPurpose::PlaceItem { asset_id, anchor }, Ok(texture)) => Route::Place {
                asset_id,
                anchor,
                texture,
            },
            (purpose, Err(error)) => Route::Ignore { purpose, error },
        }
    }
}

/// Decodes images off the UI thread. Every `request` produces exactly one
/// `TextureDelivery`, collected with `poll`.
pub struct TextureLoader {
    fallback: PathBuf,
    tx: Sender<TextureDelivery>,
    rx: Receiver<TextureDelivery>,
    in_flight: usize,
}

impl TextureLoader {
    pub fn new(fallback: impl Into<PathBuf>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            fallback: fallback.into(),
            tx,
            rx,
            in_flight: 0,
        }
    }

    pub fn request(&mut self, source: TextureSource, purpose: LoadPurpose) {
        log::debug!("Requesting texture {source} for {purpose:?}");
        let tx = self.tx.clone();
        let fallback = self.fallback.clone();
        self.in_flight += 1;
        std::thread::spawn(move || {
            let result = load_with_fallback(&source, &fallback);
            // The receiver only disappears when the app is shutting down.
            let _ = tx.send(TextureDelivery { purpose, result });
        });
    }

    /// Drain all deliveries that have completed so far. Never blocks.
    pub fn poll(&mut self) -> Vec<TextureDelivery> {
        let done: Vec<TextureDelivery> = self.rx.try_iter().collect();
        self.in_flight -= done.len();
        done
    }

    /// Requests issued but not yet returned by `poll`.
    pub fn pending(&self) -> usize {
        self.in_flight
    }

    #[cfg(test)]
    fn wait_all(&mut self, timeout: std::time::Duration) -> Vec<TextureDelivery> {
        let deadline = std::time::Instant::now() + timeout;
        let mut out = Vec::new();
        while self.in_flight > 0 {
            let left = deadline.saturating_duration_since(std::time::Instant::now());
            match self.rx.recv_timeout(left) {
                Ok(delivery) => {
                    self.in_flight -= 1;
                    out.push(delivery);
                }
                Err(_) => break,
            }
        }
        out
    }
}
