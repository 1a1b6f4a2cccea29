//! Backend abstractions for the external audio engine.
//!
//! Decoding, mixing, and spatialization live behind these traits; the
//! session core only cares about handle lifecycle and call boundaries.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::assets::AssetProvider;
use crate::error::AudioError;

/// Configuration handed to a backend when constructing an engine handle.
///
/// Buffer parameters are sampled from the live playback settings at
/// construction time; the codec table and asset provider come from the
/// application configuration.
pub struct EngineConfig {
    pub stream_buffer_size: u32,
    pub stream_buffer_size_multiplier: u32,
    /// Asset extension -> decoder name
    pub codecs: BTreeMap<String, String>,
    pub assets: Arc<dyn AssetProvider>,
    pub stream_events: Arc<dyn StreamListener>,
}

/// Receives stream lifecycle notifications from the engine.
pub trait StreamListener: Send + Sync {
    /// A streamed source played through to its end.
    fn end_of_stream(&self, source_name: &str, queue_size: usize);
}

/// Listener that discards all stream events.
pub struct NullStreamListener;

impl StreamListener for NullStreamListener {
    fn end_of_stream(&self, _source_name: &str, _queue_size: usize) {}
}

/// One live instance of the external audio engine.
///
/// Handles are shared across command workers as `Arc<dyn EngineHandle>`;
/// a worker that obtained a handle before shutdown detached it may still
/// finish its call on the detached instance.
pub trait EngineHandle: Send + Sync {
    /// Play a non-addressable effect; the returned source id is used for
    /// logging only.
    fn play_one_shot(&self, url: &str, volume: f32, attenuation: f32)
        -> Result<String, AudioError>;

    /// Start or restart background playback of a named stream
    /// (last-writer-wins on the name).
    fn play_streamed(&self, name: &str, url: &str, looped: bool) -> Result<(), AudioError>;

    /// Halt the named stream; unknown names are a no-op.
    fn stop(&self, name: &str) -> Result<(), AudioError>;

    /// Release all underlying resources. Called exactly once per handle.
    fn dispose(&self) -> Result<(), AudioError>;
}

/// Factory for engine handles.
pub trait AudioBackend: Send + Sync {
    fn construct(&self, config: EngineConfig) -> Result<Arc<dyn EngineHandle>, AudioError>;
}
