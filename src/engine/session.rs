// EngineSession: Focused owner of the shared audio engine handle
//
// Single Responsibility: engine handle lifecycle (create-on-first-use,
// single active instance, explicit teardown) shared by independently
// scheduled command workers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use crate::assets::AssetProvider;
use crate::clips::ClipDescriptor;
use crate::config::{AppConfig, PlaybackSettings};
use crate::error::{log_audio_error, AudioError};
use crate::relay::LogRelay;

use super::backend::{AudioBackend, EngineConfig, EngineHandle, StreamListener};

/// What a completed shutdown means for later commands.
///
/// Under `Resurrecting`, a worker that asks for the engine after shutdown
/// gets a freshly constructed instance, so stale workers can resurrect
/// playback. `Terminal` makes shutdown final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShutdownPolicy {
    #[default]
    Resurrecting,
    Terminal,
}

/// Owns the lifecycle of one shared audio-engine handle.
///
/// At most one handle is live at a time. Workers borrow it as an
/// `Arc<dyn EngineHandle>` clone, so a worker that obtained the handle
/// before a concurrent shutdown finishes its call on the detached
/// instance. The session lock is held across construction (concurrent
/// `ensure_started` callers block until the single construction
/// completes) but never across playback or disposal calls.
///
/// Exposed as a component instance rather than a process-wide static so a
/// test harness can construct an isolated one.
pub struct EngineSession {
    backend: Arc<dyn AudioBackend>,
    assets: Arc<dyn AssetProvider>,
    relay: Arc<LogRelay>,
    handle: Mutex<Option<Arc<dyn EngineHandle>>>,
    settings: Arc<RwLock<PlaybackSettings>>,
    codecs: std::collections::BTreeMap<String, String>,
    policy: ShutdownPolicy,
    terminated: AtomicBool,
}

impl EngineSession {
    /// Create a session with no engine running.
    pub fn new(
        backend: Arc<dyn AudioBackend>,
        assets: Arc<dyn AssetProvider>,
        relay: Arc<LogRelay>,
        config: &AppConfig,
    ) -> Self {
        Self {
            backend,
            assets,
            relay,
            handle: Mutex::new(None),
            settings: Arc::new(RwLock::new(config.playback)),
            codecs: config.codecs.clone(),
            policy: ShutdownPolicy::default(),
            terminated: AtomicBool::new(false),
        }
    }

    /// Override the shutdown policy. The default is `Resurrecting`.
    pub fn with_shutdown_policy(mut self, policy: ShutdownPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Live playback settings, shared with the presentation layer.
    ///
    /// Settings are sampled when a handle is constructed, so edits apply
    /// to the next construction, not to a handle that is already live.
    pub fn settings(&self) -> Arc<RwLock<PlaybackSettings>> {
        Arc::clone(&self.settings)
    }

    /// Return the live engine handle, constructing it on first use.
    ///
    /// Safe under concurrent callers: the session lock serializes the
    /// check-and-construct, so exactly one construction occurs and every
    /// caller observes the same fully-constructed handle. After a
    /// resurrecting shutdown the next call constructs a fresh instance.
    ///
    /// # Errors
    /// - `SessionTerminated` under the terminal policy after shutdown
    /// - `ConstructionFailed` if the backend rejects construction
    /// - `LockPoisoned` on poisoned session state
    pub fn ensure_started(&self) -> Result<Arc<dyn EngineHandle>, AudioError> {
        let mut guard = self.lock_handle().map_err(|err| {
            log_audio_error(&err, "ensure_started");
            err
        })?;

        if let Some(handle) = guard.as_ref() {
            return Ok(Arc::clone(handle));
        }

        if self.policy == ShutdownPolicy::Terminal && self.terminated.load(Ordering::SeqCst) {
            let err = AudioError::SessionTerminated;
            log_audio_error(&err, "ensure_started");
            return Err(err);
        }

        let settings = self.read_settings().map_err(|err| {
            log_audio_error(&err, "ensure_started");
            err
        })?;

        let config = EngineConfig {
            stream_buffer_size: settings.stream_buffer_size,
            stream_buffer_size_multiplier: settings.stream_buffer_size_multiplier,
            codecs: self.codecs.clone(),
            assets: Arc::clone(&self.assets),
            stream_events: Arc::new(RelayStreamListener {
                relay: Arc::clone(&self.relay),
            }),
        };

        let handle = self.backend.construct(config).map_err(|err| {
            log_audio_error(&err, "ensure_started");
            err
        })?;

        self.relay.message("Audio engine started");
        *guard = Some(Arc::clone(&handle));
        Ok(handle)
    }

    /// Play a non-addressable effect and log its temporary source id.
    pub fn play_one_shot(&self, clip: &ClipDescriptor) -> Result<String, AudioError> {
        let handle = self.ensure_started()?;
        let url = self.assets.asset_url(clip.asset_name);
        let source_id = handle.play_one_shot(&url, 1.0, 0.0).map_err(|err| {
            log_audio_error(&err, "play_one_shot");
            err
        })?;
        self.relay
            .message(&format!("Temporary source name:{}", source_id));
        Ok(source_id)
    }

    /// Start or restart background playback of a streamed clip.
    pub fn play_streaming(&self, clip: &ClipDescriptor) -> Result<(), AudioError> {
        let handle = self.ensure_started()?;
        let url = self.assets.asset_url(clip.asset_name);
        handle
            .play_streamed(clip.asset_name, &url, false)
            .map_err(|err| {
                log_audio_error(&err, "play_streaming");
                err
            })
    }

    /// Halt a streamed clip. No-op when no engine is live or the clip is
    /// not playing.
    pub fn stop(&self, clip: &ClipDescriptor) -> Result<(), AudioError> {
        let handle = {
            let guard = self.lock_handle().map_err(|err| {
                log_audio_error(&err, "stop");
                err
            })?;
            guard.as_ref().map(Arc::clone)
        };

        match handle {
            None => Ok(()),
            Some(handle) => handle.stop(clip.asset_name).map_err(|err| {
                log_audio_error(&err, "stop");
                err
            }),
        }
    }

    /// Release the engine handle. Idempotent: a second call without an
    /// intervening start is a no-op.
    ///
    /// A worker already holding the handle races freely with this call
    /// and completes on the detached instance; a worker that calls
    /// `ensure_started` afterwards constructs a fresh one (default
    /// policy).
    pub fn shutdown(&self) -> Result<(), AudioError> {
        let detached = {
            let mut guard = self.lock_handle().map_err(|err| {
                log_audio_error(&err, "shutdown");
                err
            })?;
            if self.policy == ShutdownPolicy::Terminal {
                self.terminated.store(true, Ordering::SeqCst);
            }
            guard.take()
        };

        match detached {
            None => Ok(()),
            Some(handle) => {
                handle.dispose().map_err(|err| {
                    log_audio_error(&err, "shutdown");
                    err
                })?;
                self.relay.message("Audio engine shut down");
                Ok(())
            }
        }
    }

    /// Whether a handle is currently live (for assertions and status UI).
    pub fn has_live_handle(&self) -> bool {
        self.lock_handle()
            .map(|guard| guard.is_some())
            .unwrap_or(false)
    }

    fn lock_handle(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, Option<Arc<dyn EngineHandle>>>, AudioError> {
        self.handle.lock().map_err(|_| AudioError::LockPoisoned {
            component: "engine_handle".to_string(),
        })
    }

    fn read_settings(&self) -> Result<PlaybackSettings, AudioError> {
        self.settings
            .read()
            .map(|guard| *guard)
            .map_err(|_| AudioError::LockPoisoned {
                component: "playback_settings".to_string(),
            })
    }
}

/// Forwards engine stream events into the log relay.
struct RelayStreamListener {
    relay: Arc<LogRelay>,
}

impl StreamListener for RelayStreamListener {
    fn end_of_stream(&self, source_name: &str, _queue_size: usize) {
        self.relay.message(&format!(
            "'{}' has reached the end of the stream",
            source_name
        ));
    }
}
