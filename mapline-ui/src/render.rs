//! Отрисовка карты на `egui::Painter`: обзорная подложка, градусная сетка и
//! линии оверлеев. Перетаскивание двигает карту, колесо мыши масштабирует.

use egui::{Color32, Pos2, Rect, Sense, Shape, Stroke, TextureHandle};
use log::debug;
use mapline_core::{Layer, MapView, Viewport};
use mapline_types::{Coordinate, Envelope, Graphic};

use crate::theme;

/// Шаг градусной сетки.
const GRATICULE_STEP: f64 = 30.0;
/// Чувствительность колеса: множитель масштаба на пиксель прокрутки.
const ZOOM_PER_SCROLL_PX: f32 = 0.002;

/// Текстура тайла обзорной подложки и её охват.
pub struct OverviewTexture {
    pub texture: TextureHandle,
    pub envelope: Envelope,
}

pub struct MapCanvas;

impl MapCanvas {
    /// Рисует карту на всё доступное место и обрабатывает навигацию.
    pub fn show(
        ui: &mut egui::Ui,
        view: &mut MapView,
        overview: &[OverviewTexture],
    ) {
        let (response, painter) = ui.allocate_painter(ui.available_size(), Sense::click_and_drag());
        let rect = response.rect;

        painter.rect_filled(rect, 0.0, theme::MAP_BACKGROUND);

        let Some(extent) = view.extent() else {
            return;
        };
        let Some(vp) = Viewport::fit(extent, rect.width(), rect.height()) else {
            return;
        };

        let to_pos = |c: Coordinate| -> Pos2 {
            let (x, y) = vp.to_screen(c);
            rect.min + egui::vec2(x, y)
        };

        let painter = painter.with_clip_rect(rect);

        if view.basemap().is_some_and(|b| b.is_visible()) {
            let uv = Rect::from_min_max(Pos2::ZERO, egui::pos2(1.0, 1.0));
            for tile in overview {
                let e = tile.envelope;
                let r = Rect::from_two_pos(
                    to_pos(Coordinate::new(e.xmin, e.ymax)),
                    to_pos(Coordinate::new(e.xmax, e.ymin)),
                );
                painter.image(tile.texture.id(), r, uv, Color32::WHITE);
            }
        }

        if view.spatial_reference().is_some_and(|sr| sr.is_geographic()) {
            draw_graticule(&painter, &vp, &to_pos);
        }

        for (_, layer) in view.layers() {
            let Layer::Overlay(overlay) = layer else {
                continue;
            };
            if !overlay.is_visible() {
                continue;
            }
            for graphic in overlay.graphics().filter(|g| g.is_drawable()) {
                draw_polyline(&painter, graphic, &to_pos);
            }
        }

        handle_navigation(ui, &response, view, &vp);
    }
}

fn draw_polyline(
    painter: &egui::Painter,
    graphic: &Graphic,
    to_pos: &impl Fn(Coordinate) -> Pos2,
) {
    let symbol = graphic.symbol;
    let points: Vec<Pos2> = graphic.geometry.points().iter().map(|&c| to_pos(c)).collect();
    let stroke = Stroke::new(
        symbol.width,
        Color32::from_rgb(symbol.color.r, symbol.color.g, symbol.color.b),
    );

    let pattern = symbol.style.dash_pattern();
    if pattern.is_empty() {
        painter.add(Shape::line(points, stroke));
        return;
    }

    // Шаблон задан в толщинах линии: (штрих, пробел, штрих, пробел, ...)
    let dashes: Vec<f32> = pattern.iter().step_by(2).map(|d| d * symbol.width).collect();
    let gaps: Vec<f32> = pattern
        .iter()
        .skip(1)
        .step_by(2)
        .map(|g| g * symbol.width)
        .collect();

    painter.extend(Shape::dashed_line_with_offset(
        &points, stroke, &dashes, &gaps, 0.0,
    ));
}

fn draw_graticule(
    painter: &egui::Painter,
    vp: &Viewport,
    to_pos: &impl Fn(Coordinate) -> Pos2,
) {
    let stroke = Stroke::new(1.0, theme::GRATICULE);

    for (a, b) in graticule_lines(&vp.extent()) {
        painter.line_segment([to_pos(a), to_pos(b)], stroke);
    }
}

/// Меридианы и параллели через 30° внутри `extent`,
/// ограниченные земным шаром (±180°, ±90°).
pub fn graticule_lines(extent: &Envelope) -> Vec<(Coordinate, Coordinate)> {
    let xmin = extent.xmin.max(-180.0);
    let xmax = extent.xmax.min(180.0);
    let ymin = extent.ymin.max(-90.0);
    let ymax = extent.ymax.min(90.0);

    let mut lines = Vec::new();
    if xmin > xmax || ymin > ymax {
        return lines;
    }

    let mut lon = (xmin / GRATICULE_STEP).ceil() * GRATICULE_STEP;
    while lon <= xmax {
        lines.push((Coordinate::new(lon, ymin), Coordinate::new(lon, ymax)));
        lon += GRATICULE_STEP;
    }

    let mut lat = (ymin / GRATICULE_STEP).ceil() * GRATICULE_STEP;
    while lat <= ymax {
        lines.push((Coordinate::new(xmin, lat), Coordinate::new(xmax, lat)));
        lat += GRATICULE_STEP;
    }

    lines
}

fn handle_navigation(
    ui: &egui::Ui,
    response: &egui::Response,
    view: &mut MapView,
    vp: &Viewport,
) {
    let mut next = None;

    if response.dragged() {
        let d = response.drag_delta();
        if d != egui::Vec2::ZERO {
            next = Some(vp.panned(d.x, d.y));
        }
    }

    if response.hovered() {
        let scroll = ui.input(|i| i.smooth_scroll_delta.y);
        if scroll != 0.0 {
            let anchor = response
                .hover_pos()
                .map(|p| p - response.rect.min)
                .unwrap_or(response.rect.size() / 2.0);
            let factor = (scroll * ZOOM_PER_SCROLL_PX).exp() as f64;
            next = Some(vp.zoomed(factor, (anchor.x, anchor.y)));
        }
    }

    if let Some(extent) = next {
        if let Err(e) = view.set_extent(extent) {
            debug!("Navigation ignored: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graticule_world() {
        let world = Envelope::new(-180.0, -90.0, 180.0, 90.0).unwrap();
        let lines = graticule_lines(&world);

        // 13 меридианов (-180..=180) и 7 параллелей (-90..=90)
        assert_eq!(lines.len(), 13 + 7);
        assert!(lines.iter().all(|(a, b)| {
            [a, b]
                .iter()
                .all(|c| c.x.abs() <= 180.0 && c.y.abs() <= 90.0)
        }));
    }

    #[test]
    fn test_graticule_bounded_for_huge_extents() {
        let wide = Envelope::new(-1.8e6, -90.0, 1.8e6, 90.0).unwrap();
        assert_eq!(graticule_lines(&wide).len(), 13 + 7);

        let huge = Envelope::new(-1e18, -1e18, 1e18, 1e18).unwrap();
        assert_eq!(graticule_lines(&huge).len(), 13 + 7);

        // Охват вне земного шара
        let outside = Envelope::new(1e6, 0.0, 2e6, 10.0).unwrap();
        assert!(graticule_lines(&outside).is_empty());
    }

    #[test]
    fn test_graticule_partial_extent() {
        let asia = Envelope::new(90.0, 20.0, 160.0, 50.0).unwrap();
        let lines = graticule_lines(&asia);

        let meridians: Vec<f64> = lines
            .iter()
            .filter(|(a, b)| a.x == b.x)
            .map(|(a, _)| a.x)
            .collect();
        assert_eq!(meridians, vec![90.0, 120.0, 150.0]);

        let parallels: Vec<f64> = lines
            .iter()
            .filter(|(a, b)| a.y == b.y)
            .map(|(a, _)| a.y)
            .collect();
        assert_eq!(parallels, vec![30.0]);
    }
}
