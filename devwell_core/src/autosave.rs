//! Debounced background persistence.
//!
//! Mutations hand the latest [`PersistedState`] to a worker thread. The
//! worker waits for the channel to stay quiet for the debounce window before
//! writing, so a burst of mutations collapses into one write of the final
//! state (trailing edge; every new snapshot restarts the window).

use crate::persistence::{PersistedState, Persistence};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::JoinHandle;
use std::time::Duration;

enum Command {
    Schedule(PersistedState),
    Clear,
    Flush(Sender<()>),
}

/// Handle to the autosave worker. Dropping it writes any pending snapshot
/// and joins the worker.
pub struct Autosaver {
    tx: Option<Sender<Command>>,
    worker: Option<JoinHandle<()>>,
}

impl Autosaver {
    pub fn spawn(persistence: Persistence, window: Duration) -> Self {
        let (tx, rx) = mpsc::channel();
        let worker = std::thread::Builder::new()
            .name("devwell-autosave".into())
            .spawn(move || run_worker(persistence, rx, window));

        let worker = match worker {
            Ok(handle) => Some(handle),
            Err(e) => {
                tracing::warn!("Failed to start autosave worker: {}. Changes will not be saved.", e);
                None
            }
        };

        Self {
            tx: Some(tx),
            worker,
        }
    }

    /// Queue `state` for writing once the debounce window elapses
    pub fn schedule(&self, state: PersistedState) {
        self.send(Command::Schedule(state));
    }

    /// Drop any pending snapshot and delete the persisted collections
    pub fn clear(&self) {
        self.send(Command::Clear);
    }

    /// Block until everything queued so far has been written
    pub fn flush(&self) {
        let (ack_tx, ack_rx) = mpsc::channel();
        if self.send(Command::Flush(ack_tx)) {
            let _ = ack_rx.recv();
        }
    }

    fn send(&self, command: Command) -> bool {
        match &self.tx {
            Some(tx) if self.worker.is_some() => tx.send(command).is_ok(),
            _ => false,
        }
    }
}

impl Drop for Autosaver {
    fn drop(&mut self) {
        // Closing the channel makes the worker write what it holds and exit
        self.tx.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::warn!("Autosave worker panicked");
            }
        }
    }
}

fn run_worker(persistence: Persistence, rx: Receiver<Command>, window: Duration) {
    let mut pending: Option<PersistedState> = None;

    loop {
        let command = if pending.is_some() {
            match rx.recv_timeout(window) {
                Ok(command) => command,
                Err(RecvTimeoutError::Timeout) => {
                    write(&persistence, &mut pending);
                    continue;
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        } else {
            match rx.recv() {
                Ok(command) => command,
                Err(_) => break,
            }
        };

        match command {
            Command::Schedule(state) => pending = Some(state),
            Command::Clear => {
                pending = None;
                if let Err(e) = persistence.clear() {
                    tracing::warn!("Failed to clear persisted data: {}", e);
                }
            }
            Command::Flush(ack) => {
                write(&persistence, &mut pending);
                let _ = ack.send(());
            }
        }
    }

    write(&persistence, &mut pending);
    tracing::debug!("Autosave worker stopped");
}

fn write(persistence: &Persistence, pending: &mut Option<PersistedState>) {
    if let Some(state) = pending.take() {
        // Not retried; the next scheduled snapshot tries again
        if let Err(e) = persistence.save(&state) {
            tracing::warn!("Failed to persist state: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob::{BlobStore, MemoryBlobStore};
    use crate::persistence::BREAK_HISTORY_KEY;
    use crate::{BreakRecord, BreakType, Mood, Result};
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Memory store that counts writes
    #[derive(Default)]
    struct CountingStore {
        inner: MemoryBlobStore,
        puts: AtomicUsize,
    }

    impl BlobStore for CountingStore {
        fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
            self.inner.get(key)
        }

        fn put(&self, key: &str, value: &[u8]) -> Result<()> {
            self.puts.fetch_add(1, Ordering::SeqCst);
            self.inner.put(key, value)
        }

        fn remove(&self, key: &str) -> Result<()> {
            self.inner.remove(key)
        }
    }

    fn state_with_breaks(n: usize) -> PersistedState {
        let mut state = PersistedState::default();
        for _ in 0..n {
            let now = Utc::now();
            state
                .break_history
                .push(BreakRecord::start(BreakType::Water, now).complete(Mood::Good, None, now));
        }
        state
    }

    #[test]
    fn test_burst_collapses_into_one_write() {
        let store = Arc::new(CountingStore::default());
        let persistence = Persistence::new(store.clone());
        let autosaver = Autosaver::spawn(persistence.clone(), Duration::from_millis(200));

        for n in 1..=5 {
            autosaver.schedule(state_with_breaks(n));
        }
        std::thread::sleep(Duration::from_millis(600));

        // One snapshot, three keys
        assert_eq!(store.puts.load(Ordering::SeqCst), 3);
        assert_eq!(persistence.load().break_history.len(), 5);
    }

    #[test]
    fn test_each_schedule_restarts_window() {
        let window = Duration::from_millis(400);
        let store = Arc::new(CountingStore::default());
        let persistence = Persistence::new(store.clone());
        let autosaver = Autosaver::spawn(persistence.clone(), window);

        // Five schedules half a window apart span well over two windows
        for n in 1..=5 {
            autosaver.schedule(state_with_breaks(n));
            std::thread::sleep(window / 2);
            assert_eq!(store.puts.load(Ordering::SeqCst), 0, "wrote after schedule {}", n);
        }

        std::thread::sleep(window * 2);
        assert_eq!(store.puts.load(Ordering::SeqCst), 3);
        assert_eq!(persistence.load().break_history.len(), 5);
    }

    #[test]
    fn test_flush_writes_immediately() {
        let store = Arc::new(CountingStore::default());
        let persistence = Persistence::new(store.clone());
        let autosaver = Autosaver::spawn(persistence.clone(), Duration::from_secs(60));

        autosaver.schedule(state_with_breaks(2));
        autosaver.flush();

        assert_eq!(persistence.load().break_history.len(), 2);
    }

    #[test]
    fn test_drop_writes_pending_snapshot() {
        let store = Arc::new(CountingStore::default());
        let persistence = Persistence::new(store.clone());

        {
            let autosaver = Autosaver::spawn(persistence.clone(), Duration::from_secs(60));
            autosaver.schedule(state_with_breaks(1));
        }

        assert_eq!(persistence.load().break_history.len(), 1);
    }

    #[test]
    fn test_clear_discards_pending_and_removes_keys() {
        let store = Arc::new(CountingStore::default());
        let persistence = Persistence::new(store.clone());
        persistence.save(&state_with_breaks(3)).unwrap();

        let autosaver = Autosaver::spawn(persistence.clone(), Duration::from_secs(60));
        autosaver.schedule(state_with_breaks(4));
        autosaver.clear();
        autosaver.flush();

        assert_eq!(store.inner.get(BREAK_HISTORY_KEY).unwrap(), None);
        assert!(store.inner.keys().is_empty());
    }
}
