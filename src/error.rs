//! Error types for orpheus_dsp.
//!
//! Only construction and configuration paths return errors. Port get/set
//! reports "not found" through `Option`/`bool`, and the render path never
//! fails.

use thiserror::Error;

use crate::unit::UnitId;

/// Error type for engine, graph and plugin setup.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Unknown unit: {0}")]
    UnknownUnit(UnitId),

    #[error("Unit {unit} has no input named '{name}'")]
    UnknownInput { unit: UnitId, name: String },

    #[error("Unit {unit} has no input #{index}")]
    InputOutOfRange { unit: UnitId, index: usize },

    #[error("Unit '{name}' declares {count} inputs, more than the engine supports")]
    TooManyInputs { name: &'static str, count: usize },

    #[error("No audio sink configured")]
    NoAudioSink,

    #[error("Graph command queue is full")]
    CommandQueueFull,

    #[error("Plugin '{0}' is not initialized")]
    PluginNotInitialized(String),

    #[error("Plugin '{0}' is already initialized")]
    AlreadyInitialized(String),
}

/// Result type alias.
pub type Result<T> = core::result::Result<T, Error>;
