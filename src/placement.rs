//! Turning an asset drop into a picture standing on the floor.

use std::path::Path;

use glam::{Vec2, Vec3};

use crate::render::{Camera, Viewport};
use crate::scene::mesh::{PlaneGeometry, Transform, face_towards};
use crate::scene::{ItemId, Material, PlacedItem, Scene};
use crate::settings::Settings;
use crate::texture::{TextureHandle, TextureSource};
use crate::util::picking::{self, Ray};

/// Every placed item is one world unit wide.
pub const ITEM_WIDTH: f32 = 1.0;

pub fn pointer_to_ndc(pointer: Vec2, viewport: &Viewport) -> Vec2 {
    picking::screen_to_ndc(pointer, viewport.size())
}

/// Where the ray through `pointer` meets the horizontal plane through the
/// origin. None when the ray runs parallel to it or points away.
pub fn floor_anchor(pointer: Vec2, camera: &Camera, viewport: &Viewport) -> Option<Vec3> {
    let ray = Ray::from_ndc(pointer_to_ndc(pointer, viewport), camera.view_projection());
    ray.intersect_plane(Vec3::ZERO, Vec3::Y).map(|t| ray.point_at(t))
}

/// Build an item for `texture` standing on `anchor` and facing the camera.
pub fn build_item(asset_id: &str, texture: TextureHandle, anchor: Vec3, camera_position: Vec3) -> PlacedItem {
    let height = ITEM_WIDTH / texture.aspect();
    let position = anchor + Vec3::Y * (height / 2.0);

    PlacedItem {
        asset_id: asset_id.to_string(),
        geometry: PlaneGeometry::new(ITEM_WIDTH, height),
        transform: Transform::from_position_rotation(position, face_towards(position, camera_position)),
        material: Material::unlit(texture),
    }
}

pub fn place_item(
    scene: &mut Scene,
    asset_id: &str,
    texture: TextureHandle,
    anchor: Vec3,
    camera_position: Vec3,
) -> ItemId {
    let item = build_item(asset_id, texture, anchor, camera_position);
    let position = item.transform.position;
    let aspect = item.aspect();
    let id = scene.add_item(item);
    log::info!("Placed {asset_id} as item {id} at {position} (aspect {aspect:.3})");
    id
}

/// Image source for an asset id: its listed `src`, else `<asset_dir>/<id>.png`.
pub fn resolve_asset_source(asset_id: &str, settings: &Settings) -> TextureSource {
    settings
        .assets
        .iter()
        .find(|a| a.id == asset_id)
        .and_then(|a| a.src.as_deref())
        .map(TextureSource::parse)
        .unwrap_or_else(|| {
            TextureSource::File(Path::new(&settings.textures.asset_dir).join(format!("{asset_id}.png")))
        })
}

/// Asset id for a file dropped from outside the app.
pub fn asset_id_for_file(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "dropped".to_string())
}
