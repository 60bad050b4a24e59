use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use log::trace;
use mapline_types::Graphic;

/// Запрос перерисовки, общий для карты и её слоёв.
#[derive(Debug, Clone, Default)]
pub struct RedrawFlag(Arc<AtomicBool>);

/// Идентификатор графики внутри слоя. Не переиспользуется.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GraphicId(u64);

/// Слой графики поверх подложки.
///
/// Порядок вставки = порядок отрисовки: более поздняя графика рисуется
/// поверх. Уникальность геометрии не требуется.
#[derive(Debug)]
pub struct OverlayLayer {
    name: String,
    graphics: Vec<(GraphicId, Graphic)>,
    next_id: u64,
    visible: bool,
    redraw: Option<RedrawFlag>,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl RedrawFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Снимает флаг и возвращает, был ли он установлен.
    pub fn take(&self) -> bool {
        self.0.swap(false, Ordering::AcqRel)
    }
}

impl GraphicId {
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl OverlayLayer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            graphics: Vec::new(),
            next_id: 0,
            visible: true,
            redraw: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Добавляет графику в конец (поверх остальных). O(1).
    pub fn add_graphic(
        &mut self,
        graphic: Graphic,
    ) -> GraphicId {
        let id = GraphicId(self.next_id);
        self.next_id += 1;

        trace!(
            "[{}] add graphic #{} ({} points)",
            self.name,
            id.0,
            graphic.geometry.len()
        );

        self.graphics.push((id, graphic));
        self.request_redraw();
        id
    }

    /// Удаляет графику. `None`, если такой нет.
    pub fn remove(
        &mut self,
        id: GraphicId,
    ) -> Option<Graphic> {
        let pos = self.graphics.iter().position(|(gid, _)| *gid == id)?;
        let (_, graphic) = self.graphics.remove(pos);
        self.request_redraw();
        Some(graphic)
    }

    /// Удаляет всю графику.
    pub fn clear(&mut self) {
        self.graphics.clear();
        self.request_redraw();
    }

    /// Графика в порядке отрисовки (снизу вверх).
    pub fn graphics(&self) -> impl Iterator<Item = &Graphic> {
        self.graphics.iter().map(|(_, g)| g)
    }

    pub fn get(
        &self,
        index: usize,
    ) -> Option<&Graphic> {
        self.graphics.get(index).map(|(_, g)| g)
    }

    pub fn graphic(
        &self,
        id: GraphicId,
    ) -> Option<&Graphic> {
        self.graphics
            .iter()
            .find(|(gid, _)| *gid == id)
            .map(|(_, g)| g)
    }

    pub fn ids(&self) -> impl Iterator<Item = GraphicId> + '_ {
        self.graphics.iter().map(|(id, _)| *id)
    }

    pub fn len(&self) -> usize {
        self.graphics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graphics.is_empty()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(
        &mut self,
        visible: bool,
    ) {
        if self.visible != visible {
            self.visible = visible;
            self.request_redraw();
        }
    }

    /// Привязывает слой к флагу перерисовки карты.
    pub(crate) fn attach(
        &mut self,
        redraw: RedrawFlag,
    ) {
        self.redraw = Some(redraw);
        if !self.graphics.is_empty() {
            self.request_redraw();
        }
    }

    /// Отвязывает слой и освобождает графику.
    pub(crate) fn release(&mut self) {
        self.graphics.clear();
        self.redraw = None;
    }

    fn request_redraw(&self) {
        if let Some(flag) = &self.redraw {
            flag.request();
        }
    }
}
