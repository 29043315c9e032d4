//! Pointer-driven select / move / resize / delete of placed items.

use glam::{Vec2, Vec3};

use crate::input::{InputEvent, Key, PointerButton};
use crate::render::{Camera, Viewport};
use crate::scene::{ItemId, Scene, SurfaceRole};
use crate::settings::InteractionSettings;
use crate::util::picking::{self, Ray};

/// What subsequent pointer movement does to the selected item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Action {
    #[default]
    None,
    Move,
    Resize,
}

/// Coarse state, for status display and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle,
    /// Selected with no action running.
    Selected,
    SelectedMove,
    SelectedResize,
}

/// The selected item plus the references for delta-based edits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Selection {
    pub item: ItemId,
    /// Where the selecting ray hit the item.
    pub initial_pointer_world: Vec3,
    pub initial_pointer_screen: Vec2,
    pub initial_position: Vec3,
}

/// The item context menu, anchored at a screen position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContextMenu {
    pub position: Vec2,
    pub item: ItemId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuCommand {
    Move,
    Resize,
    Delete,
    /// Click outside the menu.
    Dismiss,
}

/// Whether a transition changed anything worth drawing right away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    pub redraw: bool,
}

impl Outcome {
    pub const IDLE: Self = Self { redraw: false };
    pub const REDRAW: Self = Self { redraw: true };
}

/// Camera and viewport the pointer positions refer to.
#[derive(Clone, Copy)]
pub struct SceneView<'a> {
    pub camera: &'a Camera,
    pub viewport: &'a Viewport,
}

impl SceneView<'_> {
    fn ray(&self, pos: Vec2) -> Ray {
        Ray::from_screen(pos, self.viewport.size(), self.camera.view_projection())
    }
}

/// Owns selection, current action, drag flag and the context menu.
pub struct Interaction {
    config: InteractionSettings,
    selection: Option<Selection>,
    action: Action,
    dragging: bool,
    /// Item scale when resize mode was entered.
    resize_base: f32,
    menu: Option<ContextMenu>,
}

impl Interaction {
    pub fn new(config: InteractionSettings) -> Self {
        Self {
            config,
            selection: None,
            action: Action::None,
            dragging: false,
            resize_base: 1.0,
            menu: None,
        }
    }

    #[cfg(test)]
    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn selected(&self) -> Option<ItemId> {
        self.selection.map(|s| s.item)
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn menu(&self) -> Option<&ContextMenu> {
        self.menu.as_ref()
    }

    pub fn state(&self) -> State {
        match (self.selection, self.action) {
            (None, _) => State::Idle,
            (Some(_), Action::None) => State::Selected,
            (Some(_), Action::Move) => State::SelectedMove,
            (Some(_), Action::Resize) => State::SelectedResize,
        }
    }

    pub fn handle(&mut self, event: InputEvent, scene: &mut Scene, view: SceneView<'_>) -> Outcome {
        match event {
            InputEvent::PointerDown { pos, button } => self.pointer_down(pos, button, scene, view),
            InputEvent::PointerMove { pos } => self.pointer_move(pos, scene, view),
            InputEvent::PointerUp { pos, button } => {
                let outcome = self.pointer_up();
                if outcome.redraw {
                    log::debug!("{button:?} released at {pos}, action ended");
                }
                outcome
            }
            InputEvent::Wheel { delta_y } => self.wheel(delta_y, scene),
            InputEvent::KeyPress(Key::Delete) => match self.selection {
                Some(sel) => self.delete_item(sel.item, scene),
                None => Outcome::IDLE,
            },
            InputEvent::KeyPress(Key::Other) => Outcome::IDLE,
        }
    }

    pub fn menu_command(&mut self, command: MenuCommand, scene: &mut Scene) -> Outcome {
        let Some(menu) = self.menu.take() else {
            return Outcome::IDLE;
        };
        log::debug!("Menu {command:?} on item {}", menu.item);
        match command {
            MenuCommand::Move => self.action = Action::Move,
            MenuCommand::Resize => {
                self.action = Action::Resize;
                self.resize_base = scene.item(menu.item).map_or(1.0, |i| i.transform.scale);
            }
            MenuCommand::Delete => return self.delete_item(menu.item, scene),
            MenuCommand::Dismiss => {}
        }
        Outcome::REDRAW
    }

    fn pointer_down(&mut self, pos: Vec2, button: PointerButton, scene: &Scene, view: SceneView<'_>) -> Outcome {
        if button == PointerButton::Other {
            return Outcome::IDLE;
        }

        let hit = picking::pick_item(&view.ray(pos), scene);
        let Some((hit, item)) = hit.and_then(|h| scene.item(h.item).map(|i| (h, i))) else {
            let changed = self.selection.is_some() || self.menu.is_some();
            self.clear();
            return Outcome { redraw: changed };
        };

        self.selection = Some(Selection {
            item: hit.item,
            initial_pointer_world: hit.position,
            initial_pointer_screen: pos,
            initial_position: item.transform.position,
        });

        if button == PointerButton::Secondary {
            // Replaces any open menu, so at most one exists.
            self.menu = Some(ContextMenu { position: pos, item: hit.item });
            log::debug!("Context menu for item {} at {pos}", hit.item);
        } else {
            self.menu = None;
            self.dragging = true;
            self.action = Action::Move;
            log::debug!("Dragging item {}", hit.item);
        }
        Outcome::REDRAW
    }

    fn pointer_move(&mut self, pos: Vec2, scene: &mut Scene, view: SceneView<'_>) -> Outcome {
        let Some(sel) = self.selection else {
            return Outcome::IDLE;
        };

        match self.action {
            Action::Move if self.dragging => {
                let floor_hit = scene
                    .surface(SurfaceRole::Floor)
                    .and_then(|floor| picking::hit_surface(&view.ray(pos), floor));
                let Some(floor_hit) = floor_hit else {
                    return Outcome::IDLE;
                };
                let Some(item) = scene.item_mut(sel.item) else {
                    return Outcome::IDLE;
                };
                // Only the floor-plane components move; height stays put.
                let delta = floor_hit - sel.initial_pointer_world;
                let position = &mut item.transform.position;
                position.x = sel.initial_position.x + delta.x;
                position.z = sel.initial_position.z + delta.z;
                Outcome::REDRAW
            }
            Action::Resize => {
                let Some(item) = scene.item_mut(sel.item) else {
                    return Outcome::IDLE;
                };
                let scale = (pos.y - sel.initial_pointer_screen.y) * self.config.resize_sensitivity + self.resize_base;
                item.transform.scale = scale.max(self.config.min_scale);
                Outcome::REDRAW
            }
            _ => Outcome::IDLE,
        }
    }

    fn pointer_up(&mut self) -> Outcome {
        let changed = self.dragging || self.action != Action::None;
        self.dragging = false;
        self.action = Action::None;
        Outcome { redraw: changed }
    }

    fn wheel(&mut self, delta_y: f32, scene: &mut Scene) -> Outcome {
        let Some(item) = self.selection.and_then(|sel| scene.item_mut(sel.item)) else {
            return Outcome::IDLE;
        };
        let scale = item.transform.scale - delta_y * self.config.wheel_sensitivity;
        item.transform.scale = scale.max(self.config.min_scale);
        item.transform.position.y = item.floor_anchored_y();
        Outcome::REDRAW
    }

    fn delete_item(&mut self, id: ItemId, scene: &mut Scene) -> Outcome {
        if let Some(item) = scene.remove_item(id) {
            log::info!("Deleted item {id} ({})", item.asset_id);
        }
        if self.selected() == Some(id) {
            self.clear();
        }
        if self.menu.is_some_and(|m| m.item == id) {
            self.menu = None;
        }
        Outcome::REDRAW
    }

    fn clear(&mut self) {
        self.selection = None;
        self.action = Action::None;
        self.dragging = false;
        self.menu = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placement;
    use crate::settings::CameraSettings;
    use crate::texture::{TextureHandle, TextureId};

    struct Rig {
        scene: Scene,
        camera: Camera,
        viewport: Viewport,
        interaction: Interaction,
        item: ItemId,
    }

    impl Rig {
        /// Floor in place and a 1x1 item standing at the origin.
        fn new() -> Self {
            let mut scene = Scene::new();
            scene.apply_surface_texture(SurfaceRole::Floor, TextureHandle::new(TextureId(0), 64, 64), 1.0);
            let camera = Camera::new(&CameraSettings::default(), 800.0, 600.0);
            let viewport = Viewport::new(800, 600, 1.0);
            let texture = TextureHandle::new(TextureId(1), 100, 100);
            let item = placement::place_item(&mut scene, "painting1", texture, Vec3::ZERO, camera.position);
            Self {
                scene,
                camera,
                viewport,
                interaction: Interaction::new(InteractionSettings::default()),
                item,
            }
        }

        fn send(&mut self, event: InputEvent) -> Outcome {
            let view = SceneView { camera: &self.camera, viewport: &self.viewport };
            self.interaction.handle(event, &mut self.scene, view)
        }

        fn screen_of(&self, world: Vec3) -> Vec2 {
            picking::project_to_screen(world, self.camera.view_projection(), self.viewport.size()).unwrap()
        }

        fn item_screen(&self) -> Vec2 {
            self.screen_of(self.position())
        }

        fn position(&self) -> Vec3 {
            self.scene.item(self.item).unwrap().transform.position
        }

        fn scale(&self) -> f32 {
            self.scene.item(self.item).unwrap().transform.scale
        }

        fn down(&mut self, pos: Vec2, button: PointerButton) -> Outcome {
            self.send(InputEvent::PointerDown { pos, button })
        }

        fn move_to(&mut self, pos: Vec2) -> Outcome {
            self.send(InputEvent::PointerMove { pos })
        }

        fn up(&mut self, pos: Vec2, button: PointerButton) -> Outcome {
            self.send(InputEvent::PointerUp { pos, button })
        }
    }

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-3
    }

    #[test]
    fn primary_press_on_item_starts_move() {
        let mut rig = Rig::new();
        let p0 = rig.item_screen();
        assert!(rig.down(p0, PointerButton::Primary).redraw);
        assert_eq!(rig.interaction.selected(), Some(rig.item));
        assert_eq!(rig.interaction.state(), State::SelectedMove);
        assert!(rig.interaction.is_dragging());
        let sel = rig.interaction.selection().unwrap();
        assert!(close(sel.initial_pointer_world, Vec3::new(0.0, 0.5, 0.0)));
    }

    #[test]
    fn drag_moves_by_floor_delta_keeping_height() {
        let mut rig = Rig::new();
        let start = rig.position();
        rig.down(rig.item_screen(), PointerButton::Primary);
        let grab = rig.interaction.selection().unwrap().initial_pointer_world;

        let target = Vec3::new(1.0, 0.0, 1.0);
        let p1 = rig.screen_of(target);
        assert!(rig.move_to(p1).redraw);

        let expected = Vec3::new(start.x + target.x - grab.x, start.y, start.z + target.z - grab.z);
        assert!(close(rig.position(), expected), "{} vs {expected}", rig.position());
        assert!((rig.position().y - start.y).abs() < 1e-6);
    }

    #[test]
    fn drag_result_depends_only_on_final_pointer() {
        let mut direct = Rig::new();
        let mut wandering = Rig::new();
        let p_end = direct.screen_of(Vec3::new(-1.0, 0.0, 0.5));

        direct.down(direct.item_screen(), PointerButton::Primary);
        direct.move_to(p_end);

        wandering.down(wandering.item_screen(), PointerButton::Primary);
        for p in [Vec3::new(0.5, 0.0, 0.5), Vec3::new(2.0, 0.0, -2.0), Vec3::new(-1.0, 0.0, 0.5)] {
            let screen = wandering.screen_of(p);
            wandering.move_to(screen);
        }
        wandering.move_to(p_end);

        assert!(close(direct.position(), wandering.position()));
    }

    #[test]
    fn drag_off_floor_is_ignored() {
        let mut rig = Rig::new();
        let start = rig.position();
        rig.down(rig.item_screen(), PointerButton::Primary);
        // top edge of the window looks above the horizon
        assert!(!rig.move_to(Vec2::new(400.0, 0.0)).redraw);
        assert_eq!(rig.position(), start);
    }

    #[test]
    fn release_ends_action_but_keeps_selection() {
        let mut rig = Rig::new();
        let p0 = rig.item_screen();
        rig.down(p0, PointerButton::Primary);
        rig.up(p0, PointerButton::Primary);
        assert_eq!(rig.interaction.state(), State::Selected);
        assert!(!rig.interaction.is_dragging());

        let before = rig.position();
        let p1 = rig.screen_of(Vec3::new(1.0, 0.0, 1.0));
        assert!(!rig.move_to(p1).redraw);
        assert_eq!(rig.position(), before);
    }

    #[test]
    fn press_on_empty_space_clears_everything() {
        let mut rig = Rig::new();
        let p0 = rig.item_screen();
        rig.down(p0, PointerButton::Secondary);
        assert!(rig.interaction.menu().is_some());

        rig.down(Vec2::new(20.0, 20.0), PointerButton::Primary);
        assert_eq!(rig.interaction.state(), State::Idle);
        assert!(rig.interaction.menu().is_none());
        assert!(!rig.interaction.is_dragging());
    }

    #[test]
    fn secondary_press_opens_single_menu() {
        let mut rig = Rig::new();
        let p0 = rig.item_screen();
        rig.down(p0, PointerButton::Secondary);
        let first = *rig.interaction.menu().unwrap();
        assert_eq!(first.item, rig.item);
        assert_eq!(first.position, p0);
        assert!(!rig.interaction.is_dragging());

        let p1 = p0 + Vec2::new(3.0, 2.0);
        rig.down(p1, PointerButton::Secondary);
        let second = *rig.interaction.menu().unwrap();
        assert_eq!(second.position, p1);
    }

    #[test]
    fn primary_press_closes_menu() {
        let mut rig = Rig::new();
        let p0 = rig.item_screen();
        rig.down(p0, PointerButton::Secondary);
        rig.down(p0, PointerButton::Primary);
        assert!(rig.interaction.menu().is_none());
        assert_eq!(rig.interaction.state(), State::SelectedMove);
    }

    #[test]
    fn menu_resize_tracks_total_displacement() {
        let mut rig = Rig::new();
        let p0 = rig.item_screen();
        rig.down(p0, PointerButton::Secondary);
        rig.up(p0, PointerButton::Secondary);
        assert!(rig.interaction.menu_command(MenuCommand::Resize, &mut rig.scene).redraw);
        assert!(rig.interaction.menu().is_none());
        assert_eq!(rig.interaction.state(), State::SelectedResize);

        rig.move_to(p0 + Vec2::new(0.0, 50.0));
        assert!((rig.scale() - 1.5).abs() < 1e-5);
        rig.move_to(p0 + Vec2::new(30.0, 20.0));
        assert!((rig.scale() - 1.2).abs() < 1e-5);
        rig.move_to(p0);
        assert!((rig.scale() - 1.0).abs() < 1e-5);

        rig.up(p0, PointerButton::Primary);
        rig.move_to(p0 + Vec2::new(0.0, 80.0));
        assert!((rig.scale() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn resize_starts_from_scale_at_entry() {
        let mut rig = Rig::new();
        let p0 = rig.item_screen();
        rig.down(p0, PointerButton::Primary);
        rig.send(InputEvent::Wheel { delta_y: -500.0 });
        rig.up(p0, PointerButton::Primary);
        assert!((rig.scale() - 1.5).abs() < 1e-5);

        let p0 = rig.item_screen();
        rig.down(p0, PointerButton::Secondary);
        rig.interaction.menu_command(MenuCommand::Resize, &mut rig.scene);
        rig.move_to(p0 + Vec2::new(0.0, 10.0));
        assert!((rig.scale() - 1.6).abs() < 1e-5);
    }

    #[test]
    fn resize_drag_is_floored() {
        let mut rig = Rig::new();
        let p0 = rig.item_screen();
        rig.down(p0, PointerButton::Secondary);
        rig.interaction.menu_command(MenuCommand::Resize, &mut rig.scene);

        rig.move_to(p0 - Vec2::new(0.0, 300.0));
        assert_eq!(rig.scale(), InteractionSettings::default().min_scale);
        rig.move_to(p0 + Vec2::new(0.0, 10.0));
        assert!((rig.scale() - 1.1).abs() < 1e-5);
    }

    #[test]
    fn menu_move_sets_action_without_moving() {
        let mut rig = Rig::new();
        let p0 = rig.item_screen();
        rig.down(p0, PointerButton::Secondary);
        rig.up(p0, PointerButton::Secondary);
        let before = rig.position();
        rig.interaction.menu_command(MenuCommand::Move, &mut rig.scene);
        assert_eq!(rig.interaction.state(), State::SelectedMove);
        assert_eq!(rig.position(), before);
        // Not dragging, so movement does nothing.
        let p1 = rig.screen_of(Vec3::new(1.0, 0.0, 0.0));
        rig.move_to(p1);
        assert_eq!(rig.position(), before);
    }

    #[test]
    fn menu_delete_removes_item() {
        let mut rig = Rig::new();
        let p0 = rig.item_screen();
        rig.down(p0, PointerButton::Secondary);
        assert!(rig.interaction.menu_command(MenuCommand::Delete, &mut rig.scene).redraw);
        assert!(!rig.scene.contains_item(rig.item));
        assert!(rig.scene.draggable_ids().is_empty());
        assert!(rig.interaction.menu().is_none());
        assert_eq!(rig.interaction.state(), State::Idle);
    }

    #[test]
    fn menu_commands_need_an_open_menu() {
        let mut rig = Rig::new();
        assert!(!rig.interaction.menu_command(MenuCommand::Delete, &mut rig.scene).redraw);
        assert!(rig.scene.contains_item(rig.item));

        let p0 = rig.item_screen();
        rig.down(p0, PointerButton::Secondary);
        assert!(rig.interaction.menu_command(MenuCommand::Dismiss, &mut rig.scene).redraw);
        assert!(rig.interaction.menu().is_none());
        assert_eq!(rig.interaction.selected(), Some(rig.item));
        assert!(!rig.interaction.menu_command(MenuCommand::Dismiss, &mut rig.scene).redraw);
    }

    #[test]
    fn wheel_scales_and_reanchors() {
        let mut rig = Rig::new();
        let p0 = rig.item_screen();
        rig.down(p0, PointerButton::Primary);
        rig.up(p0, PointerButton::Primary);

        assert!(rig.send(InputEvent::Wheel { delta_y: -100.0 }).redraw);
        assert!((rig.scale() - 1.1).abs() < 1e-5);
        assert!((rig.position().y - 0.55).abs() < 1e-5);

        rig.send(InputEvent::Wheel { delta_y: 100.0 });
        assert!((rig.scale() - 1.0).abs() < 1e-5);
        assert!((rig.position().y - 0.5).abs() < 1e-5);
    }

    #[test]
    fn wheel_is_monotonic_and_floored() {
        let mut rig = Rig::new();
        let p0 = rig.item_screen();
        rig.down(p0, PointerButton::Primary);
        let mut last = rig.scale();
        for _ in 0..5 {
            rig.send(InputEvent::Wheel { delta_y: 120.0 });
            assert!(rig.scale() < last);
            last = rig.scale();
        }
        rig.send(InputEvent::Wheel { delta_y: 10_000.0 });
        assert_eq!(rig.scale(), InteractionSettings::default().min_scale);
    }

    #[test]
    fn wheel_without_selection_does_nothing() {
        let mut rig = Rig::new();
        assert!(!rig.send(InputEvent::Wheel { delta_y: -100.0 }).redraw);
        assert_eq!(rig.scale(), 1.0);
    }

    #[test]
    fn delete_key_removes_selected_everywhere() {
        let mut rig = Rig::new();
        let p0 = rig.item_screen();
        rig.down(p0, PointerButton::Primary);
        rig.up(p0, PointerButton::Primary);

        assert!(rig.send(InputEvent::KeyPress(Key::Delete)).redraw);
        assert!(!rig.scene.contains_item(rig.item));
        assert!(rig.scene.draggable_ids().is_empty());
        assert!(rig.scene.index_consistent());
        assert_eq!(rig.interaction.state(), State::Idle);

        rig.down(p0, PointerButton::Primary);
        assert_eq!(rig.interaction.state(), State::Idle);
    }

    #[test]
    fn delete_key_without_selection_is_noop() {
        let mut rig = Rig::new();
        assert!(!rig.send(InputEvent::KeyPress(Key::Delete)).redraw);
        assert!(!rig.send(InputEvent::KeyPress(Key::Other)).redraw);
        assert_eq!(rig.scene.item_count(), 1);
    }

    #[test]
    fn other_buttons_are_ignored() {
        let mut rig = Rig::new();
        let p0 = rig.item_screen();
        assert!(!rig.down(p0, PointerButton::Other).redraw);
        assert_eq!(rig.interaction.state(), State::Idle);
    }
}
