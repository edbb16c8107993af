//! Collaborator services module
//! 
//! This module contains the audio cue output and the task store used by the
//! timer presentation and the HTTP API.

pub mod audio;
pub mod task_store;

// Re-export main types
pub use audio::{play_cue, Cue, SilentSink, ToneSink};
#[cfg(feature = "playback")]
pub use audio::DeviceSink;
pub use task_store::{InMemoryTaskStore, NewTask, TaskStore};
