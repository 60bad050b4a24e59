use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use crate::MapError;

/// Состояние жизненного цикла карты.
///
/// ```text
/// Constructed ──► Ready ──► Disposed
///      │                       ▲
///      └──► Failed ────────────┘
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum ViewState {
    /// Создана, ждёт метаданные подложки
    Constructed,
    /// Пространственная привязка установлена
    Ready,
    /// Подложка не загрузилась (терминальное, кроме `Disposed`)
    Failed(MapError),
    /// Ресурсы освобождены, переходов больше нет
    Disposed,
}

impl ViewState {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Constructed => "constructed",
            Self::Ready => "ready",
            Self::Failed(_) => "failed",
            Self::Disposed => "disposed",
        }
    }

    /// Готовность больше не наступит.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Failed(_) | Self::Disposed)
    }

    /// Ожидание окончено: либо `Ready`, либо терминальное состояние.
    pub fn is_settled(&self) -> bool {
        !matches!(self, Self::Constructed)
    }
}

impl std::fmt::Display for ViewState {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            Self::Failed(e) => write!(f, "failed: {e}"),
            other => f.write_str(other.as_str()),
        }
    }
}

/// Флаг отмены фоновых загрузок. Устанавливается в `true` при `dispose`.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
