use crate::app::GanttApp;
use crate::model::ViewMode;
use crate::ui::theme;
use egui::{menu, RichText, Ui};
use egui_phosphor::regular as icons;

/// Render the top toolbar / menu bar.
pub fn show_toolbar(app: &mut GanttApp, ui: &mut Ui) {
    menu::bar(ui, |ui| {
        ui.menu_button(RichText::new("  File  ").font(theme::font_menu()), |ui| {
            if ui.button(format!("{} Open board…", icons::FOLDER_OPEN)).clicked() {
                app.open_board();
                ui.close_menu();
            }
            if ui.button(format!("{} Save board as…", icons::FLOPPY_DISK)).clicked() {
                app.save_board_as();
                ui.close_menu();
            }
            ui.separator();
            let reload = ui.add_enabled(
                app.store_path().is_some() && !app.is_dragging(),
                egui::Button::new(format!("{} Reload from disk", icons::ARROWS_CLOCKWISE)),
            );
            if reload.clicked() {
                app.reload_board();
                ui.close_menu();
            }
            if ui.button("  Sample board").clicked() {
                app.load_sample();
                ui.close_menu();
            }
        });

        ui.menu_button(RichText::new("  View  ").font(theme::font_menu()), |ui| {
            ui.label(RichText::new("Timeline scale").small().weak());
            for mode in ViewMode::ALL {
                if ui.radio(app.board.view_mode() == mode, mode.label()).clicked() {
                    app.set_view_mode(mode);
                    ui.close_menu();
                }
            }
        });

        ui.separator();

        if ui
            .button(format!("{} Today", icons::CALENDAR))
            .on_hover_text("Scroll to today")
            .clicked()
        {
            app.jump_to_today();
        }

        let mut multi = app.board.selection().is_multi();
        if ui
            .toggle_value(&mut multi, format!("{} Multi-select", icons::CHECK_SQUARE))
            .on_hover_text("Select several tasks and shift them with ← / →")
            .changed()
        {
            app.board.selection_mut().set_multi(multi);
        }

        let mut linking = app.chart.link_mode;
        if ui
            .toggle_value(&mut linking, format!("{} Link", icons::LINK))
            .on_hover_text("Click a predecessor, then its successor")
            .changed()
        {
            app.chart.set_link_mode(linking);
        }

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            let location = match app.store_path() {
                Some(path) => path.display().to_string(),
                None => "unsaved".to_string(),
            };
            ui.label(
                RichText::new(format!("{} ({location})", app.board.snapshot().name))
                    .size(11.0)
                    .weak(),
            );
        });
    });
}
