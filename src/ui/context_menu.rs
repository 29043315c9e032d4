use crate::interaction::{ContextMenu, MenuCommand};
use crate::ui::UiAction;

pub(super) const MENU_ID: &str = "context-menu";

/// Draw the item menu at its anchor. A primary press anywhere outside it
/// dismisses the menu.
pub fn draw_context_menu(ctx: &egui::Context, menu: &ContextMenu) -> UiAction {
    let mut action = UiAction::None;
    let ppp = ctx.pixels_per_point();
    let anchor = egui::pos2(menu.position.x / ppp, menu.position.y / ppp);

    let area = egui::Area::new(egui::Id::new(MENU_ID))
        .order(egui::Order::Foreground)
        .fixed_pos(anchor)
        .show(ctx, |ui| {
            egui::Frame::menu(ui.style()).show(ui, |ui| {
                ui.set_min_width(100.0);
                for (label, command) in [
                    ("Move", MenuCommand::Move),
                    ("Resize", MenuCommand::Resize),
                    ("Delete", MenuCommand::Delete),
                ] {
                    if ui.button(label).clicked() {
                        action = UiAction::Menu(command);
                    }
                }
            });
        });

    if matches!(action, UiAction::None) {
        let pressed_outside = ctx.input(|i| {
            i.pointer.primary_pressed()
                && i.pointer.interact_pos().is_some_and(|p| !area.response.rect.contains(p))
        });
        if pressed_outside {
            action = UiAction::Menu(MenuCommand::Dismiss);
        }
    }

    action
}
