// Soundpad Core - concurrency layer for an interactive clip-playback demo
//
// Every user action funnels through two shared resources: a lazily-created
// audio engine handle (owned by EngineSession) and a line-oriented log
// buffer (owned by LogRelay). Commands run on independent fire-and-forget
// workers; a single presentation consumer renders the log. A process-wide
// crash recorder captures unhandled faults, persists a report, and
// terminates.

// Module declarations
pub mod assets;
pub mod clips;
pub mod config;
pub mod crash;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod relay;

// Re-exports for convenience
pub use assets::{AssetProvider, DirAssetProvider, CREDITS_ASSET};
pub use clips::{clip, ClipDescriptor, CLIPS, SOUND_EFFECT_SLOT};
pub use config::{AppConfig, CrashConfig, PlaybackSettings};
pub use crash::{CrashRecorder, CrashReport, CrashViewer, DeviceInfo, RuntimeInfo};
pub use dispatch::{CommandDispatcher, SessionCommand};
pub use engine::{
    AudioBackend, EngineConfig, EngineHandle, EngineSession, ShutdownPolicy, StreamListener,
    StubBackend,
};
pub use error::{AssetError, AudioError, ErrorCode};
pub use relay::{LogRelay, RenderSink, ScrollDirective};
