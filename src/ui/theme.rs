use egui::{Color32, FontId, Rounding, Stroke, Visuals};

// ── Palette ──────────────────────────────────────────────────────────────────

pub const BG_DARK: Color32 = Color32::from_rgb(22, 23, 30);
pub const BG_PANEL: Color32 = Color32::from_rgb(29, 30, 39);
pub const BG_HEADER: Color32 = Color32::from_rgb(33, 36, 47);
pub const BG_GROUP_ROW: Color32 = Color32::from_rgb(36, 38, 50);
pub const BG_WEEKEND: Color32 = Color32::from_rgba_premultiplied(255, 255, 255, 5);
pub const BG_TODAY: Color32 = Color32::from_rgba_premultiplied(60, 110, 200, 28);
pub const BG_SELECTED: Color32 = Color32::from_rgba_premultiplied(80, 140, 220, 45);

pub const BORDER_SUBTLE: Color32 = Color32::from_rgb(48, 50, 62);
pub const BORDER_ACCENT: Color32 = Color32::from_rgb(90, 140, 220);

pub const TEXT_PRIMARY: Color32 = Color32::from_rgb(228, 230, 238);
pub const TEXT_SECONDARY: Color32 = Color32::from_rgb(152, 158, 176);
pub const TEXT_DIM: Color32 = Color32::from_rgb(98, 103, 118);
pub const TEXT_ON_BAR: Color32 = Color32::WHITE;

pub const ACCENT: Color32 = Color32::from_rgb(80, 140, 220);
pub const TODAY_LINE: Color32 = Color32::from_rgb(240, 75, 75);
pub const GRID_LINE: Color32 = Color32::from_rgb(42, 44, 56);
pub const HANDLE_COLOR: Color32 = Color32::WHITE;

/// Bar fill for tasks without a priority colour.
pub const BAR_DEFAULT: Color32 = Color32::from_rgb(66, 133, 244);
/// Bar fill for tasks in finished or archived columns.
pub const BAR_CLOSED: Color32 = Color32::from_rgb(82, 150, 100);
pub const LINK_SOURCE: Color32 = Color32::from_rgb(251, 191, 36);

pub const NOTICE_ERROR: Color32 = Color32::from_rgb(239, 108, 108);

// ── Sizes ────────────────────────────────────────────────────────────────────

pub const HANDLE_WIDTH: f32 = 7.0;
pub const BAR_ROUNDING: f32 = 5.0;
pub const STATUS_BAR_HEIGHT: f32 = 24.0;
pub const SIDE_PANEL_WIDTH: f32 = 280.0;
/// Pointer distance within which an arrow counts as hit.
pub const ARROW_HIT_TOLERANCE: f32 = 5.0;

// ── Fonts ────────────────────────────────────────────────────────────────────

pub fn font_header() -> FontId {
    FontId::proportional(12.0)
}

pub fn font_sub() -> FontId {
    FontId::proportional(10.5)
}

pub fn font_bar() -> FontId {
    FontId::proportional(11.5)
}

pub fn font_small() -> FontId {
    FontId::proportional(9.5)
}

pub fn font_menu() -> FontId {
    FontId::proportional(13.0)
}

// ── Apply custom visuals ─────────────────────────────────────────────────────

pub fn apply_theme(ctx: &egui::Context) {
    let mut visuals = Visuals::dark();

    visuals.override_text_color = Some(TEXT_PRIMARY);
    visuals.panel_fill = BG_PANEL;
    visuals.window_fill = BG_PANEL;
    visuals.extreme_bg_color = Color32::from_rgb(19, 20, 27);
    visuals.faint_bg_color = BG_PANEL;

    let rounding = Rounding::same(4.0);
    let widgets = [
        (&mut visuals.widgets.noninteractive, BG_PANEL, BORDER_SUBTLE, TEXT_SECONDARY),
        (&mut visuals.widgets.inactive, Color32::from_rgb(42, 44, 56), BORDER_SUBTLE, TEXT_PRIMARY),
        (&mut visuals.widgets.hovered, Color32::from_rgb(52, 54, 68), ACCENT, TEXT_PRIMARY),
        (&mut visuals.widgets.active, Color32::from_rgb(60, 62, 76), ACCENT, Color32::WHITE),
        (&mut visuals.widgets.open, Color32::from_rgb(50, 52, 66), ACCENT, TEXT_PRIMARY),
    ];
    for (widget, fill, border, text) in widgets {
        widget.bg_fill = fill;
        widget.bg_stroke = Stroke::new(1.0, border);
        widget.fg_stroke = Stroke::new(1.0, text);
        widget.rounding = rounding;
    }

    visuals.selection.bg_fill = BG_SELECTED;
    visuals.selection.stroke = Stroke::new(1.0, ACCENT);
    visuals.window_rounding = Rounding::same(8.0);
    visuals.window_stroke = Stroke::new(1.0, BORDER_SUBTLE);
    visuals.striped = false;

    ctx.set_visuals(visuals);

    let mut style = (*ctx.style()).clone();
    style.spacing.item_spacing = egui::vec2(8.0, 4.0);
    style.spacing.button_padding = egui::vec2(8.0, 4.0);
    ctx.set_style(style);
}
