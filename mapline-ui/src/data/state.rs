use std::{collections::VecDeque, sync::Arc};

use chrono::{DateTime, Utc};
use mapline_core::ViewState;
use parking_lot::RwLock;

/// Сколько событий хранит журнал.
const EVENT_LOG_CAPACITY: usize = 500;

/// Журнал, разделяемый между окном, слушателями карты и обработчиком Ctrl+C.
pub type SharedEventLog = Arc<RwLock<EventLog>>;

/// Состояние карты для строки статуса.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewStatus {
    Loading,
    Ready,
    Failed,
    Disposed,
}

/// Важность события журнала
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventLevel {
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone)]
pub struct Event {
    pub time: DateTime<Utc>,
    pub level: EventLevel,
    pub message: String,
}

/// Журнал событий карты (кольцевой, старые вытесняются).
#[derive(Debug, Default)]
pub struct EventLog {
    entries: VecDeque<Event>,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl ViewStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Loading => "Loading basemap",
            Self::Ready => "Ready",
            Self::Failed => "Basemap failed",
            Self::Disposed => "Closed",
        }
    }

    pub fn color(&self) -> egui::Color32 {
        match self {
            Self::Loading => egui::Color32::from_rgb(200, 150, 50),
            Self::Ready => egui::Color32::from_rgb(50, 180, 50),
            Self::Failed => egui::Color32::from_rgb(200, 60, 60),
            Self::Disposed => egui::Color32::from_rgb(130, 130, 130),
        }
    }
}

impl EventLevel {
    pub fn color(&self) -> egui::Color32 {
        match self {
            Self::Info => egui::Color32::from_rgb(40, 40, 40),
            Self::Warn => egui::Color32::from_rgb(190, 120, 0),
            Self::Error => egui::Color32::from_rgb(200, 40, 40),
        }
    }
}

impl EventLog {
    pub fn shared() -> SharedEventLog {
        Arc::new(RwLock::new(Self::default()))
    }

    pub fn push(
        &mut self,
        level: EventLevel,
        message: impl Into<String>,
    ) {
        if self.entries.len() >= EVENT_LOG_CAPACITY {
            self.entries.pop_front();
        }
        self.entries.push_back(Event {
            time: Utc::now(),
            level,
            message: message.into(),
        });
    }

    pub fn info(
        &mut self,
        message: impl Into<String>,
    ) {
        self.push(EventLevel::Info, message);
    }

    pub fn warn(
        &mut self,
        message: impl Into<String>,
    ) {
        self.push(EventLevel::Warn, message);
    }

    pub fn error(
        &mut self,
        message: impl Into<String>,
    ) {
        self.push(EventLevel::Error, message);
    }

    /// События от старых к новым.
    pub fn entries(&self) -> impl DoubleEndedIterator<Item = &Event> {
        self.entries.iter()
    }

    pub fn last(&self) -> Option<&Event> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов
////////////////////////////////////////////////////////////////////////////////

impl From<&ViewState> for ViewStatus {
    fn from(state: &ViewState) -> Self {
        match state {
            ViewState::Constructed => Self::Loading,
            ViewState::Ready => Self::Ready,
            ViewState::Failed(_) => Self::Failed,
            ViewState::Disposed => Self::Disposed,
        }
    }
}
