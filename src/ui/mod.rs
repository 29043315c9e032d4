mod asset_panel;
mod context_menu;

use std::fmt;

use glam::Vec2;

use crate::interaction::{ContextMenu, MenuCommand, State};
use crate::scene::{ItemId, SurfaceRole};
use crate::settings::AssetEntry;

/// Actions the UI wants the app to execute (can't borrow mutably inside egui closures).
#[derive(Debug, Clone, PartialEq)]
pub enum UiAction {
    None,
    /// Pick an image file and apply it to a surface.
    ImportTexture(SurfaceRole),
    /// An asset was dragged out of the list and released over the room.
    /// `pointer` is in egui points.
    DropAsset { asset_id: String, pointer: Vec2 },
    PlaceAssetAtCenter(String),
    Menu(MenuCommand),
}

/// What the status line reports.
#[derive(Debug, Clone, Copy)]
pub struct StatusInfo {
    pub state: State,
    pub selected: Option<ItemId>,
    pub dragging: bool,
    pub item_count: usize,
    pub pending_loads: usize,
}

impl fmt::Display for StatusInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.state, self.selected) {
            (State::Idle, _) | (_, None) => write!(f, "Nothing selected")?,
            (State::Selected, Some(id)) => write!(f, "Item {id} selected")?,
            (State::SelectedMove, Some(id)) if self.dragging => write!(f, "Moving item {id}")?,
            (State::SelectedMove, Some(id)) => write!(f, "Item {id} in move mode")?,
            (State::SelectedResize, Some(id)) => write!(f, "Resizing item {id}")?,
        }
        write!(f, " | {} items", self.item_count)?;
        if self.pending_loads > 0 {
            write!(f, " | loading {}", self.pending_loads)?;
        }
        Ok(())
    }
}

/// Draw all egui UI. Called each frame within egui context.
pub fn draw_ui(
    ctx: &egui::Context,
    assets: &[AssetEntry],
    status: &StatusInfo,
    menu: Option<&ContextMenu>,
) -> UiAction {
    let mut action = asset_panel::draw_asset_panel(ctx, assets, status);

    if let Some(menu) = menu {
        let menu_action = context_menu::draw_context_menu(ctx, menu);
        if !matches!(menu_action, UiAction::None) {
            action = menu_action;
        }
    }

    action
}
