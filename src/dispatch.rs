// CommandDispatcher: one independent worker per user-triggered command
//
// Single Responsibility: translate button presses into fire-and-forget
// workers that act on the shared session and log relay. Workers share no
// mutable state with each other; EngineSession and LogRelay synchronize
// internally.

use std::sync::Arc;
use std::thread;

use crate::assets::{AssetProvider, CREDITS_ASSET};
use crate::clips::clip;
use crate::engine::EngineSession;
use crate::error::{log_asset_error, log_audio_error, ErrorCode};
use crate::relay::{LogRelay, ScrollDirective};

/// Fixed buffer content shown when the credits resource cannot be read.
pub const CREDITS_FAILURE_TEXT: &str = "Failed to load credits\n";

/// User-triggered commands accepted by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    /// Play the clip in the given table slot
    Play(usize),
    /// Stop the streamed clip in the given table slot
    Stop(usize),
    /// Replace the log with the credits text
    ShowCredits,
    /// Tear down the shared engine handle
    Shutdown,
}

/// Spawns one worker per dispatched command and returns immediately.
///
/// Commands are handed to workers in the order received, but workers are
/// independently scheduled: completion order and effects on the shared
/// engine/log state are unordered except where the session's internal
/// locking serializes handle access.
pub struct CommandDispatcher {
    session: Arc<EngineSession>,
    relay: Arc<LogRelay>,
    assets: Arc<dyn AssetProvider>,
}

impl CommandDispatcher {
    pub fn new(
        session: Arc<EngineSession>,
        relay: Arc<LogRelay>,
        assets: Arc<dyn AssetProvider>,
    ) -> Self {
        Self {
            session,
            relay,
            assets,
        }
    }

    /// Dispatch a command onto its own worker thread.
    ///
    /// The join handle is returned so tests can wait for completion;
    /// production callers drop it (fire-and-forget). Worker failures are
    /// logged, never propagated.
    pub fn dispatch(&self, command: SessionCommand) -> thread::JoinHandle<()> {
        let session = Arc::clone(&self.session);
        let relay = Arc::clone(&self.relay);
        let assets = Arc::clone(&self.assets);

        thread::spawn(move || match command {
            SessionCommand::Play(slot) => run_play(&session, &relay, slot),
            SessionCommand::Stop(slot) => run_stop(&session, &relay, slot),
            SessionCommand::ShowCredits => run_credits(&relay, assets.as_ref()),
            SessionCommand::Shutdown => run_shutdown(&session),
        })
    }
}

fn run_play(session: &EngineSession, relay: &LogRelay, slot: usize) {
    let Some(descriptor) = clip(slot) else {
        log::warn!("[Dispatch] unknown clip slot {}", slot);
        return;
    };

    relay.message(&format!("Start playing '{}'", descriptor.asset_name));

    let result = if descriptor.one_shot {
        session.play_one_shot(descriptor).map(|_| ())
    } else {
        session.play_streaming(descriptor)
    };

    // Failure ends this worker only; other workers are unaffected
    if let Err(err) = result {
        log_audio_error(&err, "play_command");
        relay.error_message("EngineSession", &err.message());
    }
}

fn run_stop(session: &EngineSession, relay: &LogRelay, slot: usize) {
    let Some(descriptor) = clip(slot) else {
        log::warn!("[Dispatch] unknown clip slot {}", slot);
        return;
    };

    relay.message(&format!("Stopping '{}'", descriptor.asset_name));

    if let Err(err) = session.stop(descriptor) {
        log_audio_error(&err, "stop_command");
        relay.error_message("EngineSession", &err.message());
    }
}

fn run_credits(relay: &LogRelay, assets: &dyn AssetProvider) {
    match assets.read(CREDITS_ASSET) {
        Ok(bytes) => {
            let text = String::from_utf8_lossy(&bytes).into_owned();
            relay.replace(&text);
        }
        Err(err) => {
            log_asset_error(&err, "show_credits");
            relay.replace(CREDITS_FAILURE_TEXT);
        }
    }
    relay.flush(ScrollDirective::ToTop);
}

fn run_shutdown(session: &EngineSession) {
    if let Err(err) = session.shutdown() {
        log::warn!("[Dispatch] Problem during cleanup: {}", err);
    }
}
