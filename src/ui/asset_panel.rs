use glam::Vec2;

use crate::scene::SurfaceRole;
use crate::settings::AssetEntry;
use crate::ui::{StatusInfo, UiAction};

/// Draw the left panel: texture import buttons, the asset list and a status line.
pub fn draw_asset_panel(ctx: &egui::Context, assets: &[AssetEntry], status: &StatusInfo) -> UiAction {
    let mut action = UiAction::None;

    egui::SidePanel::left("asset_panel").default_width(200.0).show(ctx, |ui| {
        ui.heading("Textures");
        for role in SurfaceRole::ALL {
            if ui.button(format!("Import {}...", role.label().to_lowercase())).clicked() {
                action = UiAction::ImportTexture(role);
            }
        }

        ui.separator();
        ui.heading("Assets");
        ui.small("Drag onto the room, or click to place in the middle");
        for asset in assets {
            let response = ui.add(
                egui::Label::new(format!("🖼 {}", asset.id))
                    .selectable(false)
                    .sense(egui::Sense::click_and_drag()),
            );

            if response.dragged() {
                ctx.set_cursor_icon(egui::CursorIcon::Grabbing);
                if let Some(pos) = ctx.pointer_interact_pos() {
                    drag_ghost(ctx, pos, &asset.id);
                }
            } else if response.hovered() {
                ctx.set_cursor_icon(egui::CursorIcon::Grab);
            }

            if response.drag_stopped() {
                // Dropping back onto a panel does nothing.
                if let Some(pos) = ctx.pointer_interact_pos().filter(|_| !ctx.is_pointer_over_area()) {
                    action = UiAction::DropAsset {
                        asset_id: asset.id.clone(),
                        pointer: Vec2::new(pos.x, pos.y),
                    };
                }
            } else if response.clicked() {
                action = UiAction::PlaceAssetAtCenter(asset.id.clone());
            }
        }

        ui.with_layout(egui::Layout::bottom_up(egui::Align::Min), |ui| {
            ui.label(status.to_string());
        });
    });

    action
}

fn drag_ghost(ctx: &egui::Context, pos: egui::Pos2, label: &str) {
    egui::Area::new(egui::Id::new("asset-drag-ghost"))
        .order(egui::Order::Tooltip)
        .fixed_pos(pos + egui::vec2(12.0, 12.0))
        .interactable(false)
        .show(ctx, |ui| {
            egui::Frame::popup(ui.style()).show(ui, |ui| {
                ui.label(label);
            });
        });
}
