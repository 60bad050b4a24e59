//! Очередь задач UI-потока.
//!
//! Фоновые потоки не трогают состояние UI напрямую: они отправляют задачу
//! через [`UiPoster`], а UI-поток выполняет задачи по одной, строго в порядке
//! отправки. Единственная точка передачи между потоками это канал.

use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender, TryRecvError};

/// Задача, выполняемая в UI-потоке над контекстом `C`.
pub type UiTask<C> = Box<dyn FnOnce(&mut C) + Send + 'static>;

/// Будильник UI-цикла (например, `egui::Context::request_repaint`).
pub type Waker = Arc<dyn Fn() + Send + Sync + 'static>;

/// Приёмная сторона очереди. Живёт в UI-потоке.
pub struct UiQueue<C> {
    tx: Sender<UiTask<C>>,
    rx: Receiver<UiTask<C>>,
    waker: Option<Waker>,
}

/// Отправляющая сторона. Клонируется и передаётся в любые потоки.
pub struct UiPoster<C> {
    tx: Sender<UiTask<C>>,
    waker: Option<Waker>,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl<C> UiQueue<C> {
    pub fn new() -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        Self {
            tx,
            rx,
            waker: None,
        }
    }

    /// Очередь, будящая UI-цикл после каждой отправленной задачи.
    pub fn with_waker(waker: Waker) -> Self {
        let mut q = Self::new();
        q.waker = Some(waker);
        q
    }

    pub fn poster(&self) -> UiPoster<C> {
        UiPoster {
            tx: self.tx.clone(),
            waker: self.waker.clone(),
        }
    }

    /// Следующая задача, если есть. Не блокируется.
    pub fn try_next(&self) -> Option<UiTask<C>> {
        match self.rx.try_recv() {
            Ok(task) => Some(task),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Выполняет все накопленные задачи над `ctx`. Возвращает их число.
    ///
    /// Задачи, отправленные во время выполнения, тоже выполняются после
    /// текущей, в порядке отправки.
    pub fn run_pending(
        &self,
        ctx: &mut C,
    ) -> usize {
        let mut n = 0;
        while let Some(task) = self.try_next() {
            task(ctx);
            n += 1;
        }
        n
    }

    /// Выбрасывает накопленные задачи, не выполняя их.
    pub fn discard_pending(&self) -> usize {
        let mut n = 0;
        while self.try_next().is_some() {
            n += 1;
        }
        n
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

impl<C> UiPoster<C> {
    /// Ставит задачу в очередь UI. `false`, если очередь уже уничтожена.
    pub fn post<F>(
        &self,
        task: F,
    ) -> bool
    where
        F: FnOnce(&mut C) + Send + 'static,
    {
        if self.tx.send(Box::new(task)).is_err() {
            return false;
        }

        if let Some(wake) = &self.waker {
            wake();
        }

        true
    }
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов
////////////////////////////////////////////////////////////////////////////////

impl<C> Default for UiQueue<C> {
    fn default() -> Self {
        Self::new()
    }
}

// derive(Clone) потребовал бы `C: Clone`
impl<C> Clone for UiPoster<C> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            waker: self.waker.clone(),
        }
    }
}

impl<C> std::fmt::Debug for UiPoster<C> {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("UiPoster")
            .field("pending", &self.tx.len())
            .field("has_waker", &self.waker.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn test_tasks_run_in_post_order() {
        let queue: UiQueue<Vec<u32>> = UiQueue::new();
        let poster = queue.poster();

        for i in 0..5 {
            poster.post(move |v: &mut Vec<u32>| v.push(i));
        }

        let mut log = Vec::new();
        assert_eq!(queue.run_pending(&mut log), 5);
        assert_eq!(log, vec![0, 1, 2, 3, 4]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_posts_from_other_threads_are_applied_on_owner() {
        let queue: UiQueue<Vec<u32>> = UiQueue::new();
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let poster = queue.poster();
                std::thread::spawn(move || {
                    poster.post(move |v: &mut Vec<u32>| v.push(i));
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }

        let mut log = Vec::new();
        queue.run_pending(&mut log);
        log.sort();
        assert_eq!(log, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_nested_post_runs_after_current_task() {
        let queue: UiQueue<Vec<&'static str>> = UiQueue::new();
        let poster = queue.poster();
        let inner = queue.poster();

        poster.post(move |v: &mut Vec<&'static str>| {
            inner.post(|v: &mut Vec<&'static str>| v.push("deferred"));
            v.push("first");
        });
        poster.post(|v: &mut Vec<&'static str>| v.push("second"));

        let mut log = Vec::new();
        queue.run_pending(&mut log);
        assert_eq!(log, vec!["first", "second", "deferred"]);
    }

    #[test]
    fn test_waker_called_per_post() {
        let woken = Arc::new(AtomicUsize::new(0));
        let w = woken.clone();
        let queue: UiQueue<()> = UiQueue::with_waker(Arc::new(move || {
            w.fetch_add(1, Ordering::SeqCst);
        }));

        let poster = queue.poster();
        poster.post(|_| {});
        poster.post(|_| {});

        assert_eq!(woken.load(Ordering::SeqCst), 2);
        assert_eq!(queue.discard_pending(), 2);
    }

    #[test]
    fn test_post_after_queue_dropped_fails() {
        let queue: UiQueue<()> = UiQueue::new();
        let poster = queue.poster();
        drop(queue);
        assert!(!poster.post(|_| {}));
    }
}
