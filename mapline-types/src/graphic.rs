use crate::{LineSymbol, Polyline};

/// Графика: геометрия + символ. Принадлежит слою, в который добавлена.
#[derive(Debug, Clone, PartialEq)]
pub struct Graphic {
    pub geometry: Polyline,
    pub symbol: LineSymbol,
}

impl Graphic {
    pub fn new(
        geometry: Polyline,
        symbol: LineSymbol,
    ) -> Self {
        Self { geometry, symbol }
    }

    /// Графика видна, если путь рисуем и стиль не `Null`.
    pub fn is_drawable(&self) -> bool {
        self.geometry.is_drawable() && self.symbol.style.is_visible()
    }
}
