//! Преобразование координат карты в экранные и обратно.
//!
//! Экранная система: начало в левом верхнем углу области отрисовки, `y`
//! растёт вниз. Масштаб одинаков по обеим осям, поэтому охват расширяется
//! вокруг центра до пропорций окна.

use mapline_types::{Coordinate, Envelope};

/// Минимальная ширина охвата при приближении (в единицах карты).
const MIN_SPAN: f64 = 1e-9;
/// Максимальная ширина и высота охвата при отдалении (в единицах карты).
pub const MAX_SPAN: f64 = 1e9;

/// Отображение охвата на прямоугольник `width × height` пикселей.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    extent: Envelope,
    /// Единиц карты на пиксель
    resolution: f64,
    width: f32,
    height: f32,
}

impl Viewport {
    /// Вписывает `extent` в окно. `None` для пустого окна.
    pub fn fit(
        extent: Envelope,
        width: f32,
        height: f32,
    ) -> Option<Self> {
        if !(width > 0.0 && height > 0.0) {
            return None;
        }

        let resolution = (extent.width() / width as f64).max(extent.height() / height as f64);
        let center = extent.center();
        let half_w = resolution * width as f64 / 2.0;
        let half_h = resolution * height as f64 / 2.0;

        let extent = Envelope {
            xmin: center.x - half_w,
            ymin: center.y - half_h,
            xmax: center.x + half_w,
            ymax: center.y + half_h,
        };

        Some(Self {
            extent,
            resolution,
            width,
            height,
        })
    }

    /// Фактически видимый охват (с учётом пропорций окна).
    pub fn extent(&self) -> Envelope {
        self.extent
    }

    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    pub fn size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    pub fn to_screen(
        &self,
        c: Coordinate,
    ) -> (f32, f32) {
        let x = (c.x - self.extent.xmin) / self.resolution;
        let y = (self.extent.ymax - c.y) / self.resolution;
        (x as f32, y as f32)
    }

    pub fn to_map(
        &self,
        x: f32,
        y: f32,
    ) -> Coordinate {
        Coordinate::new(
            self.extent.xmin + x as f64 * self.resolution,
            self.extent.ymax - y as f64 * self.resolution,
        )
    }

    /// Охват после масштабирования в `factor` раз вокруг экранной точки
    /// `anchor`, которая остаётся на месте. `factor > 1` приближает.
    pub fn zoomed(
        &self,
        factor: f64,
        anchor: (f32, f32),
    ) -> Envelope {
        if !(factor.is_finite() && factor > 0.0) {
            return self.extent;
        }

        // Отдаление останавливается на MAX_SPAN по большей стороне
        let largest = self.extent.width().max(self.extent.height());
        let factor = factor.max(largest / MAX_SPAN);

        let a = self.to_map(anchor.0, anchor.1);
        let w = (self.extent.width() / factor).clamp(MIN_SPAN, MAX_SPAN);
        let h = (self.extent.height() / factor).clamp(MIN_SPAN, MAX_SPAN);

        // Доля отступа якоря от левого/верхнего края сохраняется
        let fx = (a.x - self.extent.xmin) / self.extent.width();
        let fy = (self.extent.ymax - a.y) / self.extent.height();

        let xmin = a.x - fx * w;
        let ymax = a.y + fy * h;

        Envelope {
            xmin,
            ymin: ymax - h,
            xmax: xmin + w,
            ymax,
        }
    }

    /// Охват после сдвига содержимого на (`dx`, `dy`) пикселей.
    pub fn panned(
        &self,
        dx: f32,
        dy: f32,
    ) -> Envelope {
        let mx = dx as f64 * self.resolution;
        let my = dy as f64 * self.resolution;

        // Содержимое едет вправо, охват уезжает влево
        Envelope {
            xmin: self.extent.xmin - mx,
            ymin: self.extent.ymin + my,
            xmax: self.extent.xmax - mx,
            ymax: self.extent.ymax + my,
        }
    }
}
