use serde::{Deserialize, Serialize};

use crate::{GeomResult, GeometryError};

/// Цвет RGB (8 бит на канал).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Стиль линии
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineStyle {
    /// Сплошная
    #[default]
    Solid,
    /// Штрих
    Dash,
    /// Пунктир (точки)
    Dot,
    /// Штрих-точка
    DashDot,
    /// Штрих-точка-точка
    DashDotDot,
    /// Невидимая линия
    Null,
}

/// Символ линии: цвет, толщина (px) и стиль.
///
/// При десериализации толщина проверяется так же, как в [`LineSymbol::new`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawLineSymbol")]
pub struct LineSymbol {
    pub color: Rgb,
    pub width: f32,
    pub style: LineStyle,
}

#[derive(Deserialize)]
struct RawLineSymbol {
    color: Rgb,
    width: f32,
    #[serde(default)]
    style: LineStyle,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const RED: Rgb = Rgb::new(255, 0, 0);
    pub const GREEN: Rgb = Rgb::new(0, 255, 0);
    pub const BLUE: Rgb = Rgb::new(0, 0, 255);
    pub const MAGENTA: Rgb = Rgb::new(255, 0, 255);
    pub const GRAY: Rgb = Rgb::new(128, 128, 128);

    pub const fn new(
        r: u8,
        g: u8,
        b: u8,
    ) -> Self {
        Self { r, g, b }
    }
}

impl LineStyle {
    /// Шаблон штриховки в единицах толщины линии: чередование
    /// (длина штриха, длина пробела). Пустой шаблон означает сплошную линию.
    pub fn dash_pattern(&self) -> &'static [f32] {
        match self {
            LineStyle::Solid | LineStyle::Null => &[],
            LineStyle::Dash => &[4.0, 3.0],
            LineStyle::Dot => &[1.0, 2.0],
            LineStyle::DashDot => &[4.0, 2.0, 1.0, 2.0],
            LineStyle::DashDotDot => &[4.0, 2.0, 1.0, 2.0, 1.0, 2.0],
        }
    }

    pub fn is_visible(&self) -> bool {
        !matches!(self, LineStyle::Null)
    }
}

impl LineSymbol {
    /// Сплошной символ заданного цвета и толщины.
    pub fn new(
        color: Rgb,
        width: f32,
    ) -> GeomResult<Self> {
        if !width.is_finite() || width <= 0.0 {
            return Err(GeometryError::InvalidWidth(width));
        }

        Ok(Self {
            color,
            width,
            style: LineStyle::Solid,
        })
    }

    pub fn with_style(
        mut self,
        style: LineStyle,
    ) -> Self {
        self.style = style;
        self
    }
}

impl TryFrom<RawLineSymbol> for LineSymbol {
    type Error = GeometryError;

    fn try_from(raw: RawLineSymbol) -> GeomResult<Self> {
        Ok(LineSymbol::new(raw.color, raw.width)?.with_style(raw.style))
    }
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов для LineStyle
////////////////////////////////////////////////////////////////////////////////

impl std::fmt::Display for LineStyle {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            LineStyle::Solid => write!(f, "solid"),
            LineStyle::Dash => write!(f, "dash"),
            LineStyle::Dot => write!(f, "dot"),
            LineStyle::DashDot => write!(f, "dash-dot"),
            LineStyle::DashDotDot => write!(f, "dash-dot-dot"),
            LineStyle::Null => write!(f, "null"),
        }
    }
}

impl std::str::FromStr for LineStyle {
    type Err = GeometryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "solid" => Ok(LineStyle::Solid),
            "dash" => Ok(LineStyle::Dash),
            "dot" => Ok(LineStyle::Dot),
            "dash-dot" | "dashdot" => Ok(LineStyle::DashDot),
            "dash-dot-dot" | "dashdotdot" => Ok(LineStyle::DashDotDot),
            "null" | "none" => Ok(LineStyle::Null),
            _ => Err(GeometryError::UnknownStyle(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_symbol_width_validation() {
        let s = LineSymbol::new(Rgb::MAGENTA, 4.0).unwrap();
        assert_eq!(s.style, LineStyle::Solid);
        assert_eq!(s.color, Rgb::new(255, 0, 255));

        assert_eq!(
            LineSymbol::new(Rgb::BLACK, 0.0),
            Err(GeometryError::InvalidWidth(0.0))
        );
        assert!(LineSymbol::new(Rgb::BLACK, -1.0).is_err());
        assert!(LineSymbol::new(Rgb::BLACK, f32::NAN).is_err());
    }

    #[test]
    fn test_line_style_fromstr() {
        assert_eq!("solid".parse::<LineStyle>().unwrap(), LineStyle::Solid);
        assert_eq!("DASH_DOT".parse::<LineStyle>().unwrap(), LineStyle::DashDot);
        assert_eq!("none".parse::<LineStyle>().unwrap(), LineStyle::Null);
        assert!("zigzag".parse::<LineStyle>().is_err());

        for style in [LineStyle::Dash, LineStyle::DashDotDot] {
            assert_eq!(style.to_string().parse::<LineStyle>().unwrap(), style);
        }
    }

    #[test]
    fn test_dash_patterns() {
        assert!(LineStyle::Solid.dash_pattern().is_empty());
        assert_eq!(LineStyle::Dash.dash_pattern().len() % 2, 0);
        assert!(!LineStyle::Null.is_visible());
    }
}
