//! Stub backend used for deterministic testing and CLI tooling.
//!
//! Simulates engine lifecycle and per-name stream state without real
//! audio I/O, and exposes counters so tests can assert construction and
//! disposal behavior.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::AudioError;

use super::backend::{AudioBackend, EngineConfig, EngineHandle, StreamListener};

/// Backend that hands out [`StubEngineHandle`] instances.
pub struct StubBackend {
    constructed: AtomicUsize,
    fail_construction: AtomicBool,
    last_handle: Mutex<Option<Arc<StubEngineHandle>>>,
}

impl StubBackend {
    pub fn new() -> Self {
        Self {
            constructed: AtomicUsize::new(0),
            fail_construction: AtomicBool::new(false),
            last_handle: Mutex::new(None),
        }
    }

    /// Total number of handles this backend has constructed.
    pub fn constructed(&self) -> usize {
        self.constructed.load(Ordering::SeqCst)
    }

    /// Make subsequent constructions fail with `ConstructionFailed`.
    pub fn set_fail_construction(&self, fail: bool) {
        self.fail_construction.store(fail, Ordering::SeqCst);
    }

    /// Most recently constructed handle, if any.
    pub fn last_handle(&self) -> Option<Arc<StubEngineHandle>> {
        self.last_handle
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl Default for StubBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioBackend for StubBackend {
    fn construct(&self, config: EngineConfig) -> Result<Arc<dyn EngineHandle>, AudioError> {
        if self.fail_construction.load(Ordering::SeqCst) {
            return Err(AudioError::ConstructionFailed {
                reason: "stub backend configured to fail".to_string(),
            });
        }

        let id = self.constructed.fetch_add(1, Ordering::SeqCst);
        let handle = Arc::new(StubEngineHandle {
            id,
            stream_buffer_size: config.stream_buffer_size,
            stream_buffer_size_multiplier: config.stream_buffer_size_multiplier,
            stream_events: Arc::clone(&config.stream_events),
            streaming: Mutex::new(BTreeSet::new()),
            one_shots: AtomicUsize::new(0),
            disposals: AtomicUsize::new(0),
            fail_dispose: AtomicBool::new(false),
        });

        *self
            .last_handle
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(Arc::clone(&handle));

        Ok(handle)
    }
}

/// Handle that records playback calls instead of producing audio.
pub struct StubEngineHandle {
    id: usize,
    stream_buffer_size: u32,
    stream_buffer_size_multiplier: u32,
    stream_events: Arc<dyn StreamListener>,
    streaming: Mutex<BTreeSet<String>>,
    one_shots: AtomicUsize,
    disposals: AtomicUsize,
    fail_dispose: AtomicBool,
}

impl StubEngineHandle {
    /// Construction order of this handle within its backend.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Buffer size the handle was constructed with.
    pub fn stream_buffer_size(&self) -> u32 {
        self.stream_buffer_size
    }

    pub fn stream_buffer_size_multiplier(&self) -> u32 {
        self.stream_buffer_size_multiplier
    }

    /// Whether the named stream is currently playing.
    pub fn is_streaming(&self, name: &str) -> bool {
        self.lock_streaming().contains(name)
    }

    pub fn one_shot_count(&self) -> usize {
        self.one_shots.load(Ordering::SeqCst)
    }

    pub fn disposals(&self) -> usize {
        self.disposals.load(Ordering::SeqCst)
    }

    /// Make `dispose` fail with `ShutdownFailed`.
    pub fn set_fail_dispose(&self, fail: bool) {
        self.fail_dispose.store(fail, Ordering::SeqCst);
    }

    /// Simulate the named stream reaching its end, notifying the listener.
    pub fn finish_stream(&self, name: &str) {
        let removed = self.lock_streaming().remove(name);
        if removed {
            self.stream_events.end_of_stream(name, 0);
        }
    }

    fn lock_streaming(&self) -> std::sync::MutexGuard<'_, BTreeSet<String>> {
        self.streaming
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl EngineHandle for StubEngineHandle {
    fn play_one_shot(
        &self,
        _url: &str,
        _volume: f32,
        _attenuation: f32,
    ) -> Result<String, AudioError> {
        let n = self.one_shots.fetch_add(1, Ordering::SeqCst);
        Ok(format!("tmp_{}_{}", self.id, n))
    }

    fn play_streamed(&self, name: &str, _url: &str, _looped: bool) -> Result<(), AudioError> {
        self.lock_streaming().insert(name.to_string());
        Ok(())
    }

    fn stop(&self, name: &str) -> Result<(), AudioError> {
        self.lock_streaming().remove(name);
        Ok(())
    }

    fn dispose(&self) -> Result<(), AudioError> {
        if self.fail_dispose.load(Ordering::SeqCst) {
            return Err(AudioError::ShutdownFailed {
                reason: "stub dispose configured to fail".to_string(),
            });
        }
        self.disposals.fetch_add(1, Ordering::SeqCst);
        self.lock_streaming().clear();
        Ok(())
    }
}
