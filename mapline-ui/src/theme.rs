use egui::{Color32, Context, Stroke, Style, Visuals};

/// Фон карты, пока подложка не загружена (цвет «воды»).
pub const MAP_BACKGROUND: Color32 = Color32::from_rgb(196, 214, 230);
/// Линии градусной сетки
pub const GRATICULE: Color32 = Color32::from_rgba_premultiplied(80, 90, 110, 90);
/// Фон баннера ошибки
pub const ERROR_BANNER: Color32 = Color32::from_rgb(120, 30, 30);

pub fn configure_style(ctx: &Context) {
    let mut style = Style::default();
    let mut visuals = Visuals::light();

    // Светлые панели, чтобы не спорить с картой по контрасту
    visuals.panel_fill = Color32::from_rgb(242, 243, 245);
    visuals.window_fill = Color32::from_rgb(250, 250, 252);
    visuals.faint_bg_color = Color32::from_rgb(232, 234, 238);
    visuals.extreme_bg_color = Color32::from_rgb(255, 255, 255);
    visuals.window_stroke = Stroke::new(1.0, Color32::from_rgb(190, 195, 205));

    visuals.hyperlink_color = Color32::from_rgb(30, 90, 200);
    visuals.selection.bg_fill = Color32::from_rgb(170, 200, 240);
    visuals.selection.stroke = Stroke::new(1.0, Color32::from_rgb(30, 90, 200));

    visuals.widgets.inactive.bg_fill = Color32::from_rgb(225, 228, 234);
    visuals.widgets.hovered.bg_fill = Color32::from_rgb(210, 218, 230);
    visuals.widgets.active.bg_fill = Color32::from_rgb(180, 200, 230);

    style.visuals = visuals;

    style.spacing.item_spacing = egui::vec2(8.0, 4.0);
    style.spacing.button_padding = egui::vec2(6.0, 3.0);

    ctx.set_style(style);
}
