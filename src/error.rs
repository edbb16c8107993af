//! Error types shared across the crate

use thiserror::Error;

/// Errors raised by the timer tick driver
#[derive(Debug, Error)]
pub enum TimerError {
    #[error("no tokio runtime available to drive timer ticks")]
    NoRuntime,
}

/// Errors raised while reading a plan selection
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanError {
    #[error("Please make both selections.")]
    IncompleteSelection,

    #[error("unknown home size: {0}")]
    UnknownHomeSize(String),

    #[error("unknown pets choice: {0}")]
    UnknownPetsChoice(String),
}

/// Errors raised by the task store
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("task {0} not found")]
    NotFound(u64),

    #[error("task name must not be blank")]
    BlankName,

    #[error("create a free account to save your tasks")]
    Unauthenticated,
}

/// Errors surfaced by application state operations
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Timer(#[from] TimerError),

    #[error("no timer is open for task {0}")]
    TimerNotOpen(u64),

    #[error("task {0} is already completed")]
    TaskCompleted(u64),

    #[error("duration {0} is not accepted")]
    DurationRejected(String),
}

/// Errors raised while synthesizing or playing an audio cue
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("audio output unavailable: {0}")]
    Unavailable(String),

    #[error("failed to spawn audio thread")]
    Spawn(#[source] std::io::Error),

    #[error("cue rendered no samples")]
    EmptyCue,
}
