//! Геометрия: координаты, охватывающие прямоугольники и полилинии.
//!
//! Все значения интерпретируются в пространственной привязке карты, никаких
//! перепроецирований здесь не выполняется.

use serde::{Deserialize, Serialize};

use crate::{GeomResult, GeometryError};

/// Точка (x, y) в координатах карты.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
}

/// Охватывающий прямоугольник (xmin, ymin, xmax, ymax).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

/// Полилиния из одного пути. Неизменяема после построения.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Coordinate>", into = "Vec<Coordinate>")]
pub struct Polyline {
    points: Vec<Coordinate>,
}

/// Построитель полилинии в стиле `start_path` / `line_to`.
#[derive(Debug, Clone, Default)]
pub struct PolylineBuilder {
    points: Vec<Coordinate>,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl Coordinate {
    pub const fn new(
        x: f64,
        y: f64,
    ) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Envelope {
    /// Создаёт прямоугольник, требуя `xmin < xmax` и `ymin < ymax`.
    pub fn new(
        xmin: f64,
        ymin: f64,
        xmax: f64,
        ymax: f64,
    ) -> GeomResult<Self> {
        if ![xmin, ymin, xmax, ymax].iter().all(|v| v.is_finite()) {
            return Err(GeometryError::invalid_envelope(format!(
                "non-finite bounds ({xmin}, {ymin}, {xmax}, {ymax})"
            )));
        }

        if xmin >= xmax || ymin >= ymax {
            return Err(GeometryError::invalid_envelope(format!(
                "expected min < max, got ({xmin}, {ymin}, {xmax}, {ymax})"
            )));
        }

        Ok(Self {
            xmin,
            ymin,
            xmax,
            ymax,
        })
    }

    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }

    pub fn center(&self) -> Coordinate {
        Coordinate::new(
            (self.xmin + self.xmax) / 2.0,
            (self.ymin + self.ymax) / 2.0,
        )
    }

    pub fn contains(
        &self,
        c: Coordinate,
    ) -> bool {
        c.x >= self.xmin && c.x <= self.xmax && c.y >= self.ymin && c.y <= self.ymax
    }

    pub fn intersects(
        &self,
        other: &Envelope,
    ) -> bool {
        self.xmin <= other.xmax
            && other.xmin <= self.xmax
            && self.ymin <= other.ymax
            && other.ymin <= self.ymax
    }

    pub fn union(
        &self,
        other: &Envelope,
    ) -> Envelope {
        Envelope {
            xmin: self.xmin.min(other.xmin),
            ymin: self.ymin.min(other.ymin),
            xmax: self.xmax.max(other.xmax),
            ymax: self.ymax.max(other.ymax),
        }
    }
}

impl Polyline {
    /// Создаёт полилинию. Пустой путь и NaN/inf отклоняются.
    pub fn new(points: Vec<Coordinate>) -> GeomResult<Self> {
        if points.is_empty() {
            return Err(GeometryError::EmptyPath);
        }

        if let Some((index, c)) = points.iter().enumerate().find(|(_, c)| !c.is_finite()) {
            return Err(GeometryError::NonFinite {
                index,
                x: c.x,
                y: c.y,
            });
        }

        Ok(Self { points })
    }

    /// Удобный конструктор из пар `(x, y)`.
    pub fn from_xy(points: &[(f64, f64)]) -> GeomResult<Self> {
        Self::new(
            points
                .iter()
                .map(|&(x, y)| Coordinate::new(x, y))
                .collect(),
        )
    }

    pub fn points(&self) -> &[Coordinate] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Путь из одной точки строится, но не отрисовывается.
    pub fn is_drawable(&self) -> bool {
        self.points.len() >= 2
    }

    /// Охватывающий прямоугольник пути.
    ///
    /// Для вырожденного пути (одна точка или отрезок вдоль оси) прямоугольник
    /// имеет нулевую ширину/высоту, поэтому строится напрямую, без
    /// [`Envelope::new`].
    pub fn envelope(&self) -> Envelope {
        let first = self.points[0];
        self.points.iter().skip(1).fold(
            Envelope {
                xmin: first.x,
                ymin: first.y,
                xmax: first.x,
                ymax: first.y,
            },
            |e, c| Envelope {
                xmin: e.xmin.min(c.x),
                ymin: e.ymin.min(c.y),
                xmax: e.xmax.max(c.x),
                ymax: e.ymax.max(c.y),
            },
        )
    }

    /// Длина пути в единицах карты.
    pub fn length(&self) -> f64 {
        self.points
            .windows(2)
            .map(|w| (w[1].x - w[0].x).hypot(w[1].y - w[0].y))
            .sum()
    }
}

impl PolylineBuilder {
    /// Начинает путь с точки `(x, y)`.
    pub fn start_path(
        x: f64,
        y: f64,
    ) -> Self {
        Self {
            points: vec![Coordinate::new(x, y)],
        }
    }

    pub fn line_to(
        mut self,
        x: f64,
        y: f64,
    ) -> Self {
        self.points.push(Coordinate::new(x, y));
        self
    }

    pub fn build(self) -> GeomResult<Polyline> {
        Polyline::new(self.points)
    }
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов
////////////////////////////////////////////////////////////////////////////////

impl From<(f64, f64)> for Coordinate {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

impl TryFrom<Vec<Coordinate>> for Polyline {
    type Error = GeometryError;

    fn try_from(points: Vec<Coordinate>) -> GeomResult<Self> {
        Self::new(points)
    }
}

impl From<Polyline> for Vec<Coordinate> {
    fn from(p: Polyline) -> Self {
        p.points
    }
}

impl std::fmt::Display for Envelope {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(
            f,
            "[{:.3}, {:.3}, {:.3}, {:.3}]",
            self.xmin, self.ymin, self.xmax, self.ymax
        )
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_rejects_inverted_bounds() {
        assert!(Envelope::new(-15.8, -37.8, 156.8, 77.3).is_ok());
        assert!(Envelope::new(10.0, 0.0, 10.0, 5.0).is_err());
        assert!(Envelope::new(0.0, 5.0, 10.0, 1.0).is_err());
        assert!(Envelope::new(0.0, f64::NAN, 10.0, 1.0).is_err());
    }

    #[test]
    fn test_envelope_geometry() {
        let e = Envelope::new(-15.8, -37.8, 156.8, 77.3).unwrap();
        assert!((e.width() - 172.6).abs() < 1e-9);
        assert!((e.height() - 115.1).abs() < 1e-9);
        assert!(e.contains(Coordinate::new(118.169, 34.016)));
        assert!(!e.contains(Coordinate::new(170.0, 34.0)));

        let other = Envelope::new(150.0, 70.0, 200.0, 90.0).unwrap();
        assert!(e.intersects(&other));
        let u = e.union(&other);
        assert_eq!(u.xmax, 200.0);
        assert_eq!(u.ymin, -37.8);
    }

    #[test]
    fn test_polyline_validation() {
        assert_eq!(Polyline::new(vec![]), Err(GeometryError::EmptyPath));

        let err = Polyline::from_xy(&[(0.0, 0.0), (f64::INFINITY, 1.0)]).unwrap_err();
        assert!(matches!(err, GeometryError::NonFinite { index: 1, .. }));

        let single = Polyline::from_xy(&[(1.0, 2.0)]).unwrap();
        assert!(!single.is_drawable());
    }

    #[test]
    fn test_builder_matches_from_xy() {
        let built = PolylineBuilder::start_path(118.169, 34.016)
            .line_to(104.941, 39.7072)
            .line_to(96.724, 32.732)
            .build()
            .unwrap();
        let direct =
            Polyline::from_xy(&[(118.169, 34.016), (104.941, 39.7072), (96.724, 32.732)])
                .unwrap();

        assert_eq!(built, direct);
        assert_eq!(built.len(), 3);
        assert!(built.is_drawable());
    }

    #[test]
    fn test_polyline_envelope_and_length() {
        let p = Polyline::from_xy(&[(0.0, 0.0), (3.0, 4.0), (3.0, -1.0)]).unwrap();
        let e = p.envelope();
        assert_eq!((e.xmin, e.ymin, e.xmax, e.ymax), (0.0, -1.0, 3.0, 4.0));
        assert!((p.length() - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_polyline_deserialize_validates() {
        let ok: Polyline = serde_json::from_str(r#"[{"x":1.0,"y":2.0},{"x":3.0,"y":4.0}]"#).unwrap();
        assert_eq!(ok.len(), 2);

        let empty: Result<Polyline, _> = serde_json::from_str("[]");
        assert!(empty.is_err());
    }
}
