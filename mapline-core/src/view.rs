//! Карта: стек слоёв, охват и машина состояний готовности.
//!
//! Все мутации выполняются в UI-потоке. Фоновые потоки (загрузка метаданных и
//! обзорного тайла) только отправляют задачи в [`UiQueue`]; задачи
//! применяются в [`MapView::pump`]. После `dispose` фоновые результаты
//! отбрасываются: поток проверяет [`CancelToken`] перед отправкой, а задача проверяет
//! состояние карты при выполнении.

use std::{
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

use log::{debug, info, warn};
use mapline_types::{Envelope, Graphic, SpatialReference};

use crate::{
    BasemapLayer, BasemapService, CancelToken, GraphicId, Layer, LayerId, MapError, MapResult,
    OverlayLayer, OverviewImage, RedrawFlag, ServiceMetadata, TileKey, UiPoster, UiQueue,
    ViewConfig, ViewState, Waker,
};

/// Сколько тайлов грубейшего уровня загружать как обзорную подложку.
const MAX_OVERVIEW_TILES: usize = 4;

type ReadyListener = Box<dyn FnOnce(&mut MapView)>;
type FailedListener = Box<dyn FnOnce(&mut MapView, &MapError)>;

/// Результат [`MapView::add_graphic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Карта готова, графика добавлена в слой
    Added(GraphicId),
    /// Карта ещё не готова: графика будет добавлена при переходе в `Ready`
    Deferred,
}

/// Карта.
pub struct MapView {
    config: ViewConfig,
    state: ViewState,
    layers: Vec<(LayerId, Layer)>,
    next_layer_id: u64,
    extent: Option<Envelope>,
    spatial_reference: Option<SpatialReference>,
    /// Слой-подложка, от которой зависит готовность
    readiness_source: Option<LayerId>,
    ready_deadline: Option<Instant>,
    ready_listeners: Vec<ReadyListener>,
    failed_listeners: Vec<FailedListener>,
    pending_graphics: Vec<(LayerId, Graphic)>,
    queue: UiQueue<MapView>,
    cancel: CancelToken,
    redraw: RedrawFlag,
}

/// Освобождение карты из замыканий и других потоков (закрытие окна,
/// Ctrl+C) без владения самой картой.
#[derive(Debug, Clone)]
pub struct DisposeHandle {
    cancel: CancelToken,
    poster: UiPoster<MapView>,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl MapView {
    pub fn new(config: ViewConfig) -> Self {
        Self::with_queue(config, UiQueue::new())
    }

    /// Карта, будящая UI-цикл, когда фоновый поток присылает результат.
    pub fn with_waker(
        config: ViewConfig,
        waker: Waker,
    ) -> Self {
        Self::with_queue(config, UiQueue::with_waker(waker))
    }

    fn with_queue(
        config: ViewConfig,
        queue: UiQueue<MapView>,
    ) -> Self {
        Self {
            config,
            state: ViewState::Constructed,
            layers: Vec::new(),
            next_layer_id: 0,
            extent: None,
            spatial_reference: None,
            readiness_source: None,
            ready_deadline: None,
            ready_listeners: Vec::new(),
            failed_listeners: Vec::new(),
            pending_graphics: Vec::new(),
            queue,
            cancel: CancelToken::new(),
            redraw: RedrawFlag::new(),
        }
    }

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == ViewState::Ready
    }

    pub fn is_disposed(&self) -> bool {
        self.state == ViewState::Disposed
    }

    /// Пространственная привязка. Известна только после `Ready`.
    pub fn spatial_reference(&self) -> Option<SpatialReference> {
        self.spatial_reference
    }

    /// Текущий охват. До `set_extent` равен полному охвату подложки (после `Ready`).
    pub fn extent(&self) -> Option<Envelope> {
        self.extent
    }

    /// Устанавливает охват. Корректность (`min < max`) гарантирует
    /// [`Envelope::new`].
    pub fn set_extent(
        &mut self,
        extent: Envelope,
    ) -> MapResult<()> {
        self.ensure_alive("set_extent")?;
        debug!("Extent set to {extent}");
        self.extent = Some(extent);
        self.redraw.request();
        Ok(())
    }

    /// Добавляет слой в конец стека (поверх предыдущих).
    ///
    /// Первая добавленная подложка определяет готовность карты: её метаданные
    /// загружаются в фоновом потоке сразу после добавления.
    pub fn add_layer(
        &mut self,
        layer: impl Into<Layer>,
    ) -> MapResult<LayerId> {
        self.ensure_alive("add_layer")?;

        let mut layer = layer.into();
        let id = LayerId(self.next_layer_id);
        self.next_layer_id += 1;

        layer.attach(self.redraw.clone());

        let service = match &layer {
            Layer::Basemap(b) if self.readiness_source.is_none() => Some(b.service()),
            _ => None,
        };

        info!("Layer #{} '{}' added", id.0, layer.name());
        self.layers.push((id, layer));
        self.redraw.request();

        if let Some(service) = service {
            self.readiness_source = Some(id);
            if self.state == ViewState::Constructed {
                self.start_metadata_fetch(id, service);
            }
        }

        Ok(id)
    }

    /// Слои в порядке отрисовки (подложка первой).
    pub fn layers(&self) -> impl Iterator<Item = (LayerId, &Layer)> {
        self.layers.iter().map(|(id, l)| (*id, l))
    }

    pub fn layer(
        &self,
        id: LayerId,
    ) -> Option<&Layer> {
        self.layers
            .iter()
            .find(|(lid, _)| *lid == id)
            .map(|(_, l)| l)
    }

    fn layer_mut(
        &mut self,
        id: LayerId,
    ) -> Option<&mut Layer> {
        self.layers
            .iter_mut()
            .find(|(lid, _)| *lid == id)
            .map(|(_, l)| l)
    }

    pub fn overlay(
        &self,
        id: LayerId,
    ) -> Option<&OverlayLayer> {
        self.layer(id).and_then(Layer::as_overlay)
    }

    /// Изменяемый доступ к оверлею. Только в состоянии `Ready`.
    pub fn overlay_mut(
        &mut self,
        id: LayerId,
    ) -> MapResult<&mut OverlayLayer> {
        match &self.state {
            ViewState::Ready => {}
            ViewState::Constructed => return Err(MapError::NotReady),
            other => {
                return Err(MapError::lifecycle(format!(
                    "overlay access on {} map view",
                    other.as_str()
                )))
            }
        }

        self.layer_mut(id)
            .and_then(Layer::as_overlay_mut)
            .ok_or_else(|| MapError::UnknownLayer(format!("overlay #{}", id.0)))
    }

    /// Подложка, определяющая готовность.
    pub fn basemap(&self) -> Option<&BasemapLayer> {
        self.readiness_source
            .and_then(|id| self.layer(id))
            .and_then(Layer::as_basemap)
    }

    /// Добавляет графику в оверлей с учётом готовности.
    ///
    /// - `Ready`: сразу в слой;
    /// - `Constructed`: в очередь ожидания, переносится в слой при `Ready`
    ///   в порядке поступления;
    /// - `Failed`/`Disposed`: ошибка.
    pub fn add_graphic(
        &mut self,
        layer: LayerId,
        graphic: Graphic,
    ) -> MapResult<Admission> {
        match &self.state {
            ViewState::Ready => {
                let id = self.overlay_mut(layer)?.add_graphic(graphic);
                Ok(Admission::Added(id))
            }
            ViewState::Constructed => {
                if self.layer(layer).and_then(Layer::as_overlay).is_none() {
                    return Err(MapError::UnknownLayer(format!("overlay #{}", layer.0)));
                }
                self.pending_graphics.push((layer, graphic));
                debug!(
                    "Graphic deferred until ready ({} pending)",
                    self.pending_graphics.len()
                );
                Ok(Admission::Deferred)
            }
            ViewState::Failed(e) => Err(MapError::lifecycle(format!(
                "cannot add graphics: basemap failed ({e})"
            ))),
            ViewState::Disposed => Err(MapError::lifecycle("map view is disposed")),
        }
    }

    /// Число графики, ждущей готовности.
    pub fn pending_graphics(&self) -> usize {
        self.pending_graphics.len()
    }

    /// Подписка на готовность. Вызывается ровно один раз, в UI-потоке.
    ///
    /// Если карта уже готова, вызывается сразу. Если готовность больше не
    /// наступит (`Failed`, `Disposed`), слушатель отбрасывается и
    /// возвращается `false`.
    pub fn on_ready<F>(
        &mut self,
        listener: F,
    ) -> bool
    where
        F: FnOnce(&mut MapView) + 'static,
    {
        match &self.state {
            ViewState::Constructed => {
                self.ready_listeners.push(Box::new(listener));
                true
            }
            ViewState::Ready => {
                listener(self);
                true
            }
            other => {
                debug!("Ready listener dropped: map view is {}", other.as_str());
                false
            }
        }
    }

    /// Подписка на отказ подложки. Вызывается не более одного раза.
    pub fn on_failed<F>(
        &mut self,
        listener: F,
    ) -> bool
    where
        F: FnOnce(&mut MapView, &MapError) + 'static,
    {
        match &self.state {
            ViewState::Constructed => {
                self.failed_listeners.push(Box::new(listener));
                true
            }
            ViewState::Failed(e) => {
                let e = e.clone();
                listener(self, &e);
                true
            }
            _ => false,
        }
    }

    /// Отправитель задач в UI-очередь этой карты.
    pub fn poster(&self) -> UiPoster<MapView> {
        self.queue.poster()
    }

    pub fn dispose_handle(&self) -> DisposeHandle {
        DisposeHandle {
            cancel: self.cancel.clone(),
            poster: self.queue.poster(),
        }
    }

    /// Выполняет накопленные задачи UI-очереди и проверяет таймаут
    /// готовности. Вызывается из UI-цикла каждый кадр/тик.
    ///
    /// Возвращает число выполненных задач.
    pub fn pump(&mut self) -> usize {
        if self.cancel.is_cancelled() && !self.is_disposed() {
            self.dispose();
        }

        if self.is_disposed() {
            let dropped = self.queue.discard_pending();
            if dropped > 0 {
                debug!("Dropped {dropped} task(s) posted to a disposed map view");
            }
            return 0;
        }

        // Задача может сама вызвать dispose, поэтому очередь разбирается
        // по одной с проверкой состояния
        let mut n = 0;
        while let Some(task) = self.queue.try_next() {
            if self.is_disposed() {
                debug!("Dropping task posted to a disposed map view");
                continue;
            }
            task(self);
            n += 1;
        }

        self.check_ready_timeout();
        n
    }

    /// Снимает запрос перерисовки.
    pub fn take_redraw(&self) -> bool {
        self.redraw.take()
    }

    /// Освобождает карту: отменяет фоновые загрузки, отбрасывает слушателей
    /// и ожидающую графику, освобождает слои. Повторный вызов ничего не
    /// делает.
    pub fn dispose(&mut self) {
        if self.is_disposed() {
            return;
        }

        self.cancel.cancel();

        let listeners = self.ready_listeners.len() + self.failed_listeners.len();
        self.ready_listeners.clear();
        self.failed_listeners.clear();

        if !self.pending_graphics.is_empty() {
            debug!(
                "Discarding {} pending graphic(s) on dispose",
                self.pending_graphics.len()
            );
            self.pending_graphics.clear();
        }

        for (_, layer) in &mut self.layers {
            layer.release();
        }
        self.layers.clear();

        let dropped = self.queue.discard_pending();
        self.ready_deadline = None;
        self.state = ViewState::Disposed;
        self.redraw.request();

        info!("Map view disposed ({listeners} listener(s), {dropped} task(s) dropped)");
    }

    fn ensure_alive(
        &self,
        op: &str,
    ) -> MapResult<()> {
        if self.is_disposed() {
            return Err(MapError::lifecycle(format!("{op} on disposed map view")));
        }
        Ok(())
    }

    fn check_ready_timeout(&mut self) {
        let Some(deadline) = self.ready_deadline else {
            return;
        };

        if self.state == ViewState::Constructed && Instant::now() >= deadline {
            self.fail(MapError::Timeout(self.config.ready_timeout));
        }
    }

    ////////////////////////////////////////////////////////////////////////////
    // Фоновые загрузки
    ////////////////////////////////////////////////////////////////////////////

    fn start_metadata_fetch(
        &mut self,
        layer: LayerId,
        service: Arc<dyn BasemapService>,
    ) {
        let poster = self.queue.poster();
        let cancel = self.cancel.clone();
        let url = service.url().to_string();

        // Недостижимый срок означает ожидание без таймаута
        self.ready_deadline = Instant::now().checked_add(self.config.ready_timeout);
        info!("Fetching basemap metadata: {url}");

        let spawned = thread::Builder::new()
            .name("basemap-metadata".to_string())
            .spawn(move || {
                let started = Instant::now();
                let result = service.fetch_metadata();

                if cancel.is_cancelled() {
                    debug!("Metadata for {url} arrived after dispose; dropped");
                    return;
                }

                debug!(
                    "Metadata fetch for {url} finished in {:.0} ms",
                    started.elapsed().as_secs_f64() * 1e3
                );

                poster.post(move |view: &mut MapView| view.apply_metadata(layer, result));
            });

        if let Err(e) = spawned {
            self.fail(MapError::Worker(format!(
                "failed to spawn metadata thread: {e}"
            )));
        }
    }

    fn apply_metadata(
        &mut self,
        layer: LayerId,
        result: MapResult<ServiceMetadata>,
    ) {
        if self.state != ViewState::Constructed {
            debug!(
                "Ignoring basemap metadata: map view is {}",
                self.state.as_str()
            );
            return;
        }

        match result {
            Ok(metadata) => self.become_ready(layer, metadata),
            Err(e) => self.fail(e),
        }
    }

    fn become_ready(
        &mut self,
        layer: LayerId,
        metadata: ServiceMetadata,
    ) {
        let spatial_reference = metadata.spatial_reference;
        let full_extent = metadata.full_extent;
        let tile_info = metadata.tile_info.clone();

        if let Some(basemap) = self.layer_mut(layer).and_then(Layer::as_basemap_mut) {
            basemap.set_metadata(metadata);
        }

        self.spatial_reference = Some(spatial_reference);
        if self.extent.is_none() {
            self.extent = Some(full_extent);
        }
        self.ready_deadline = None;
        self.state = ViewState::Ready;

        info!("Map view ready: {spatial_reference}, full extent {full_extent}");

        // Отложенная графика раньше слушателей: они видят её в слоях
        for (layer_id, graphic) in std::mem::take(&mut self.pending_graphics) {
            match self.overlay_mut(layer_id) {
                Ok(overlay) => {
                    overlay.add_graphic(graphic);
                }
                Err(e) => warn!("Deferred graphic for layer #{} lost: {e}", layer_id.0),
            }
        }

        self.redraw.request();

        for listener in std::mem::take(&mut self.ready_listeners) {
            listener(self);
            if self.is_disposed() {
                return;
            }
        }
        self.failed_listeners.clear();

        if self.config.fetch_overview {
            let tiles = tile_info
                .map(|t| t.overview_tiles(&full_extent, MAX_OVERVIEW_TILES))
                .unwrap_or_default();
            if !tiles.is_empty() {
                self.start_overview_fetch(layer, tiles);
            }
        }
    }

    fn fail(
        &mut self,
        error: MapError,
    ) {
        warn!("Map view failed: {error}");

        if !self.pending_graphics.is_empty() {
            warn!(
                "{} deferred graphic(s) will not be drawn: basemap never became ready",
                self.pending_graphics.len()
            );
            self.pending_graphics.clear();
        }

        self.ready_listeners.clear();
        self.ready_deadline = None;
        self.state = ViewState::Failed(error.clone());
        self.redraw.request();

        for listener in std::mem::take(&mut self.failed_listeners) {
            listener(self, &error);
            if self.is_disposed() {
                return;
            }
        }
    }

    fn start_overview_fetch(
        &mut self,
        layer: LayerId,
        tiles: Vec<(TileKey, Envelope)>,
    ) {
        let Some(service) = self
            .layer(layer)
            .and_then(Layer::as_basemap)
            .map(BasemapLayer::service)
        else {
            return;
        };

        let poster = self.queue.poster();
        let cancel = self.cancel.clone();
        debug!("Fetching {} overview tile(s)", tiles.len());

        let spawned = thread::Builder::new()
            .name("basemap-overview".to_string())
            .spawn(move || {
                for (key, envelope) in tiles {
                    let result = service
                        .fetch_tile(key)
                        .and_then(|bytes| OverviewImage::decode(&bytes, envelope));

                    if cancel.is_cancelled() {
                        return;
                    }

                    poster.post(move |view: &mut MapView| view.apply_overview(layer, key, result));
                }
            });

        if let Err(e) = spawned {
            warn!("Failed to spawn overview thread: {e}");
        }
    }

    fn apply_overview(
        &mut self,
        layer: LayerId,
        key: TileKey,
        result: MapResult<OverviewImage>,
    ) {
        match result {
            Ok(image) => {
                if let Some(basemap) = self.layer_mut(layer).and_then(Layer::as_basemap_mut) {
                    info!(
                        "Basemap overview tile {key} loaded ({}x{})",
                        image.width, image.height
                    );
                    basemap.add_overview(image);
                    self.redraw.request();
                }
            }
            Err(e) => warn!("Basemap overview tile {key} unavailable: {e}"),
        }
    }
}

impl DisposeHandle {
    /// Отменяет фоновые загрузки немедленно и ставит освобождение карты в
    /// UI-очередь. Безопасно вызывать из любого потока и повторно.
    pub fn dispose(&self) {
        self.cancel.cancel();
        self.poster.post(|view: &mut MapView| view.dispose());
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Ждёт, пока карта выйдет из `Constructed`, прокачивая очередь.
///
/// Для режимов без UI-цикла (headless, тесты). Возвращает `true`, если
/// состояние определилось за `timeout`.
pub fn pump_until_settled(
    view: &mut MapView,
    timeout: Duration,
    tick: Duration,
) -> bool {
    let deadline = Instant::now().checked_add(timeout);

    loop {
        view.pump();
        if view.state().is_settled() {
            return true;
        }
        if deadline.is_some_and(|d| Instant::now() >= d) {
            return false;
        }
        thread::sleep(tick);
    }
}

impl Drop for MapView {
    fn drop(&mut self) {
        // Фоновые потоки не должны ничего присылать после уничтожения карты
        self.cancel.cancel();
    }
}

impl std::fmt::Debug for MapView {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("MapView")
            .field("state", &self.state)
            .field("layers", &self.layers.len())
            .field("extent", &self.extent)
            .field("spatial_reference", &self.spatial_reference)
            .field("pending_graphics", &self.pending_graphics.len())
            .finish()
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::{cell::Cell, rc::Rc};

    use mapline_types::{LineSymbol, Polyline, Rgb};

    use super::*;
    use crate::{world_metadata, StaticService};

    const TICK: Duration = Duration::from_millis(5);

    fn line(x: f64) -> Graphic {
        Graphic::new(
            Polyline::from_xy(&[(x, 0.0), (x + 1.0, 1.0)]).unwrap(),
            LineSymbol::new(Rgb::MAGENTA, 4.0).unwrap(),
        )
    }

    fn view_with(service: StaticService) -> (MapView, LayerId) {
        let mut view = MapView::new(ViewConfig {
            ready_timeout: Duration::from_secs(5),
            fetch_overview: false,
            ..Default::default()
        });
        view.add_layer(BasemapLayer::new(Arc::new(service))).unwrap();
        let overlay = view.add_layer(OverlayLayer::new("graphics")).unwrap();
        (view, overlay)
    }

    #[test]
    fn test_ready_sets_spatial_reference_and_default_extent() {
        let (mut view, _) = view_with(StaticService::world());
        assert_eq!(view.state(), &ViewState::Constructed);
        assert!(view.spatial_reference().is_none());

        assert!(pump_until_settled(&mut view, Duration::from_secs(5), TICK));
        assert!(view.is_ready());
        assert_eq!(view.spatial_reference(), Some(SpatialReference::wgs84()));
        assert_eq!(view.extent(), Some(world_metadata().full_extent));
        assert!(view.basemap().unwrap().metadata().is_some());
    }

    #[test]
    fn test_explicit_extent_survives_ready() {
        let (mut view, _) = view_with(StaticService::world());
        let extent = Envelope::new(-15.8, -37.8, 156.8, 77.3).unwrap();
        view.set_extent(extent).unwrap();

        pump_until_settled(&mut view, Duration::from_secs(5), TICK);
        assert_eq!(view.extent(), Some(extent));
    }

    #[test]
    fn test_ready_listener_fires_once() {
        let (mut view, _) = view_with(StaticService::world());
        let fired = Rc::new(Cell::new(0));

        let f = fired.clone();
        assert!(view.on_ready(move |_| f.set(f.get() + 1)));

        pump_until_settled(&mut view, Duration::from_secs(5), TICK);
        for _ in 0..3 {
            view.pump();
        }
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn test_late_ready_listener_fires_immediately() {
        let (mut view, _) = view_with(StaticService::world());
        pump_until_settled(&mut view, Duration::from_secs(5), TICK);

        let fired = Rc::new(Cell::new(false));
        let f = fired.clone();
        assert!(view.on_ready(move |v| f.set(v.is_ready())));
        assert!(fired.get());
    }

    #[test]
    fn test_graphics_before_ready_are_deferred_not_dropped() {
        let (mut view, overlay) = view_with(StaticService::world().with_delay(Duration::from_millis(50)));

        assert_eq!(view.add_graphic(overlay, line(0.0)), Ok(Admission::Deferred));
        assert_eq!(view.add_graphic(overlay, line(1.0)), Ok(Admission::Deferred));
        assert_eq!(view.pending_graphics(), 2);
        assert_eq!(view.overlay_mut(overlay).unwrap_err(), MapError::NotReady);

        // Слушатель видит отложенную графику уже в слое
        let seen = Rc::new(Cell::new(0));
        let s = seen.clone();
        view.on_ready(move |v| s.set(v.overlay(overlay).unwrap().len()));

        pump_until_settled(&mut view, Duration::from_secs(5), TICK);
        assert_eq!(seen.get(), 2);
        assert_eq!(view.pending_graphics(), 0);

        let xs: Vec<f64> = view
            .overlay(overlay)
            .unwrap()
            .graphics()
            .map(|g| g.geometry.points()[0].x)
            .collect();
        assert_eq!(xs, vec![0.0, 1.0]);

        assert!(matches!(
            view.add_graphic(overlay, line(2.0)),
            Ok(Admission::Added(_))
        ));
    }

    #[test]
    fn test_add_graphic_to_basemap_is_rejected() {
        let mut view = MapView::new(ViewConfig::default());
        let basemap = view
            .add_layer(BasemapLayer::new(Arc::new(StaticService::world())))
            .unwrap();

        assert!(matches!(
            view.add_graphic(basemap, line(0.0)),
            Err(MapError::UnknownLayer(_))
        ));
    }

    #[test]
    fn test_fetch_failure_is_terminal() {
        let (mut view, overlay) = view_with(StaticService::failing(
            "memory://down",
            MapError::network("connection refused"),
        ));

        let ready = Rc::new(Cell::new(false));
        let failed = Rc::new(Cell::new(false));
        let (r, f) = (ready.clone(), failed.clone());
        view.on_ready(move |_| r.set(true));
        view.on_failed(move |_, e| f.set(e.is_network()));
        view.add_graphic(overlay, line(0.0)).unwrap();

        assert!(pump_until_settled(&mut view, Duration::from_secs(5), TICK));
        assert!(matches!(view.state(), ViewState::Failed(MapError::Network(_))));
        assert!(!ready.get());
        assert!(failed.get());
        assert!(view.overlay(overlay).unwrap().is_empty());
        assert_eq!(view.pending_graphics(), 0);
        assert!(view.add_graphic(overlay, line(1.0)).is_err());
        assert!(!view.on_ready(|_| panic!("must not fire")));
    }

    #[test]
    fn test_timeout_moves_to_failed() {
        let mut view = MapView::new(ViewConfig {
            ready_timeout: Duration::from_millis(20),
            fetch_overview: false,
            ..Default::default()
        });
        view.add_layer(BasemapLayer::new(Arc::new(
            StaticService::world().with_delay(Duration::from_millis(300)),
        )))
        .unwrap();

        assert!(pump_until_settled(&mut view, Duration::from_secs(2), TICK));
        assert!(matches!(view.state(), ViewState::Failed(MapError::Timeout(_))));

        // Поздний результат не воскрешает карту
        thread::sleep(Duration::from_millis(350));
        view.pump();
        assert!(!view.is_ready());
    }

    #[test]
    fn test_dispose_before_ready_drops_notification() {
        let (mut view, overlay) =
            view_with(StaticService::world().with_delay(Duration::from_millis(50)));

        let fired = Rc::new(Cell::new(false));
        let f = fired.clone();
        view.on_ready(move |_| f.set(true));
        view.add_graphic(overlay, line(0.0)).unwrap();

        view.dispose();
        thread::sleep(Duration::from_millis(100));
        view.pump();

        assert!(view.is_disposed());
        assert!(!fired.get());
        assert_eq!(view.layers().count(), 0);
        assert!(view.set_extent(Envelope::new(0.0, 0.0, 1.0, 1.0).unwrap()).is_err());
        assert!(matches!(
            view.add_layer(OverlayLayer::new("late")),
            Err(MapError::Lifecycle(_))
        ));
        assert!(!view.on_ready(|_| {}));

        // Повторный dispose безопасен
        view.dispose();
    }

    #[test]
    fn test_dispose_handle_from_other_thread() {
        let (mut view, _) = view_with(StaticService::world().with_delay(Duration::from_millis(50)));
        let handle = view.dispose_handle();

        thread::spawn(move || handle.dispose()).join().unwrap();
        view.pump();

        assert!(view.is_disposed());
    }

    #[test]
    fn test_deferred_post_from_ready_listener() {
        let (mut view, overlay) = view_with(StaticService::world());

        view.on_ready(move |v| {
            let poster = v.poster();
            poster.post(move |v: &mut MapView| {
                v.overlay_mut(overlay).unwrap().add_graphic(line(5.0));
            });
            // Отложенная задача ещё не выполнена
            assert!(v.overlay(overlay).unwrap().is_empty());
        });

        pump_until_settled(&mut view, Duration::from_secs(5), TICK);
        view.pump();
        assert_eq!(view.overlay(overlay).unwrap().len(), 1);
    }

    #[test]
    fn test_unbounded_ready_timeout_does_not_overflow() {
        let mut view = MapView::new(ViewConfig {
            ready_timeout: Duration::MAX,
            fetch_overview: false,
            ..Default::default()
        });
        view.add_layer(BasemapLayer::new(Arc::new(StaticService::world())))
            .unwrap();

        assert!(pump_until_settled(&mut view, Duration::MAX, TICK));
        assert!(view.is_ready());
    }

    #[test]
    fn test_only_first_basemap_drives_readiness() {
        let first = Arc::new(StaticService::world());
        let second = Arc::new(StaticService::world());

        let mut view = MapView::new(ViewConfig {
            fetch_overview: false,
            ..Default::default()
        });
        view.add_layer(BasemapLayer::new(first.clone())).unwrap();
        view.add_layer(BasemapLayer::new(second.clone())).unwrap();

        pump_until_settled(&mut view, Duration::from_secs(5), TICK);
        assert_eq!(first.metadata_calls(), 1);
        assert_eq!(second.metadata_calls(), 0);
    }

    #[test]
    fn test_redraw_requested_on_ready() {
        let (mut view, _) = view_with(StaticService::world());
        view.take_redraw();

        pump_until_settled(&mut view, Duration::from_secs(5), TICK);
        assert!(view.take_redraw());
        assert!(!view.take_redraw());
    }
}
