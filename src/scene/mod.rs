mod object;
pub mod builder;
pub mod mesh;

pub use object::{Material, MaterialKind, PlacedItem, StandardParams, Surface};

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::texture::{TextureHandle, TextureId};
use mesh::{PlaneGeometry, Transform};

/// Which fixed surface of the room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SurfaceRole {
    Floor,
    /// Front wall.
    Wall1,
    /// Left wall.
    Wall2,
}

impl SurfaceRole {
    pub const ALL: [SurfaceRole; 3] = [SurfaceRole::Floor, SurfaceRole::Wall1, SurfaceRole::Wall2];

    pub fn label(self) -> &'static str {
        match self {
            SurfaceRole::Floor => "Floor",
            SurfaceRole::Wall1 => "Front wall",
            SurfaceRole::Wall2 => "Left wall",
        }
    }
}

impl fmt::Display for SurfaceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(u64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Anything the renderer keeps a GPU mesh for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MeshKey {
    Surface(SurfaceRole),
    Item(ItemId),
}

/// Borrowed view of one renderable entity.
pub struct MeshRef<'a> {
    pub geometry: &'a PlaneGeometry,
    pub transform: &'a Transform,
    pub material: &'a Material,
}

/// The three fixed surfaces, each absent until its first texture arrives.
#[derive(Default)]
pub struct Surfaces {
    floor: Option<Surface>,
    wall1: Option<Surface>,
    wall2: Option<Surface>,
}

impl Surfaces {
    pub fn get(&self, role: SurfaceRole) -> Option<&Surface> {
        match role {
            SurfaceRole::Floor => self.floor.as_ref(),
            SurfaceRole::Wall1 => self.wall1.as_ref(),
            SurfaceRole::Wall2 => self.wall2.as_ref(),
        }
    }

    fn slot_mut(&mut self, role: SurfaceRole) -> &mut Option<Surface> {
        match role {
            SurfaceRole::Floor => &mut self.floor,
            SurfaceRole::Wall1 => &mut self.wall1,
            SurfaceRole::Wall2 => &mut self.wall2,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Surface> {
        SurfaceRole::ALL.into_iter().filter_map(|role| self.get(role))
    }
}

/// Root container: the room surfaces and every placed item.
///
/// Items live in `items` (scene membership) and are mirrored in `draggable`
/// (the hit-test index). Both are private and only change together through
/// `add_item` / `remove_item`.
#[derive(Default)]
pub struct Scene {
    surfaces: Surfaces,
    items: BTreeMap<ItemId, PlacedItem>,
    draggable: Vec<ItemId>,
    next_item_id: u64,
    /// Meshes that need a GPU rebuild. Drained each frame by the renderer.
    dirty: BTreeSet<MeshKey>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn surfaces(&self) -> &Surfaces {
        &self.surfaces
    }

    pub fn surface(&self, role: SurfaceRole) -> Option<&Surface> {
        self.surfaces.get(role)
    }

    /// Build `role` on its first texture, re-texture it afterwards.
    /// Returns true when the surface was created by this call.
    pub fn apply_surface_texture(&mut self, role: SurfaceRole, texture: TextureHandle, uv_repeat: f32) -> bool {
        self.dirty.insert(MeshKey::Surface(role));
        let slot = self.surfaces.slot_mut(role);
        match slot {
            Some(surface) => {
                surface.material.texture = texture;
                surface.material.uv_repeat = uv_repeat;
                false
            }
            None => {
                *slot = Some(builder::build_surface(role, texture, uv_repeat));
                true
            }
        }
    }

    pub fn add_item(&mut self, item: PlacedItem) -> ItemId {
        let id = ItemId(self.next_item_id);
        self.next_item_id += 1;
        self.items.insert(id, item);
        self.draggable.push(id);
        self.dirty.insert(MeshKey::Item(id));
        debug_assert!(self.index_consistent());
        id
    }

    pub fn remove_item(&mut self, id: ItemId) -> Option<PlacedItem> {
        let item = self.items.remove(&id)?;
        self.draggable.retain(|&d| d != id);
        self.dirty.insert(MeshKey::Item(id));
        debug_assert!(self.index_consistent());
        Some(item)
    }

    pub fn item(&self, id: ItemId) -> Option<&PlacedItem> {
        self.items.get(&id)
    }

    /// Mutable access; marks the item for a GPU rebuild.
    pub fn item_mut(&mut self, id: ItemId) -> Option<&mut PlacedItem> {
        let item = self.items.get_mut(&id)?;
        self.dirty.insert(MeshKey::Item(id));
        Some(item)
    }

    pub fn contains_item(&self, id: ItemId) -> bool {
        self.items.contains_key(&id)
    }

    pub fn items(&self) -> impl Iterator<Item = (ItemId, &PlacedItem)> {
        self.items.iter().map(|(&id, item)| (id, item))
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Items eligible for pointer hit-testing, in placement order.
    pub fn draggable_ids(&self) -> &[ItemId] {
        &self.draggable
    }

    pub fn mesh(&self, key: MeshKey) -> Option<MeshRef<'_>> {
        match key {
            MeshKey::Surface(role) => self.surface(role).map(|s| MeshRef {
                geometry: &s.geometry,
                transform: &s.transform,
                material: &s.material,
            }),
            MeshKey::Item(id) => self.item(id).map(|i| MeshRef {
                geometry: &i.geometry,
                transform: &i.transform,
                material: &i.material,
            }),
        }
    }

    pub fn textures_in_use(&self) -> BTreeSet<TextureId> {
        self.surfaces
            .iter()
            .map(|s| s.material.texture.id)
            .chain(self.items.values().map(|i| i.material.texture.id))
            .collect()
    }

    pub fn take_dirty(&mut self) -> Vec<MeshKey> {
        std::mem::take(&mut self.dirty).into_iter().collect()
    }

    /// True when scene membership and the hit-test index agree.
    pub fn index_consistent(&self) -> bool {
        self.draggable.len() == self.items.len()
            && self.draggable.iter().all(|id| self.items.contains_key(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn tex(id: u64) -> TextureHandle {
        TextureHandle::new(TextureId(id), 100, 50)
    }

    fn item(name: &str) -> PlacedItem {
        PlacedItem {
            asset_id: name.to_string(),
            geometry: PlaneGeometry::new(1.0, 0.5),
            transform: Transform::default(),
            material: Material::unlit(tex(9)),
        }
    }

    #[test]
    fn surface_built_once_then_retextured() {
        let mut scene = Scene::new();
        assert!(scene.surface(SurfaceRole::Floor).is_none());
        assert!(scene.apply_surface_texture(SurfaceRole::Floor, tex(1), 1.0));
        assert!(!scene.apply_surface_texture(SurfaceRole::Floor, tex(2), 2.0));

        let floor = scene.surface(SurfaceRole::Floor).unwrap();
        assert_eq!(floor.material.texture.id, TextureId(2));
        assert_eq!(floor.material.uv_repeat, 2.0);
        assert_eq!(scene.surfaces().iter().count(), 1);
    }

    #[test]
    fn retexture_keeps_geometry() {
        let mut scene = Scene::new();
        scene.apply_surface_texture(SurfaceRole::Wall2, tex(1), 1.0);
        let before = scene.surface(SurfaceRole::Wall2).unwrap().transform;
        scene.apply_surface_texture(SurfaceRole::Wall2, tex(3), 2.0);
        assert_eq!(scene.surface(SurfaceRole::Wall2).unwrap().transform, before);
    }

    #[test]
    fn add_and_remove_keep_index_in_sync() {
        let mut scene = Scene::new();
        let a = scene.add_item(item("a"));
        let b = scene.add_item(item("b"));
        assert_ne!(a, b);
        assert_eq!(scene.draggable_ids(), &[a, b]);
        assert!(scene.index_consistent());

        let removed = scene.remove_item(a).unwrap();
        assert_eq!(removed.asset_id, "a");
        assert!(!scene.contains_item(a));
        assert_eq!(scene.draggable_ids(), &[b]);
        assert!(scene.index_consistent());
        assert!(scene.remove_item(a).is_none());
    }

    #[test]
    fn surfaces_never_enter_the_draggable_index() {
        let mut scene = Scene::new();
        for role in SurfaceRole::ALL {
            scene.apply_surface_texture(role, tex(1), 1.0);
        }
        assert!(scene.draggable_ids().is_empty());
        assert_eq!(scene.surfaces().iter().count(), 3);
        assert_eq!(scene.item_count(), 0);
    }

    #[test]
    fn dirty_tracks_mutations_once() {
        let mut scene = Scene::new();
        let id = scene.add_item(item("a"));
        scene.item_mut(id).unwrap().transform.position = Vec3::X;
        scene.item_mut(id).unwrap().transform.scale = 2.0;
        assert_eq!(scene.take_dirty(), vec![MeshKey::Item(id)]);
        assert!(scene.take_dirty().is_empty());

        scene.remove_item(id);
        assert_eq!(scene.take_dirty(), vec![MeshKey::Item(id)]);
        assert!(scene.mesh(MeshKey::Item(id)).is_none());
    }

    #[test]
    fn textures_in_use_covers_surfaces_and_items() {
        let mut scene = Scene::new();
        scene.apply_surface_texture(SurfaceRole::Floor, tex(1), 1.0);
        scene.add_item(item("a"));
        let used = scene.textures_in_use();
        assert!(used.contains(&TextureId(1)));
        assert!(used.contains(&TextureId(9)));
        assert_eq!(used.len(), 2);
    }
}
