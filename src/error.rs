//! Tipos de erro do motor de tempo de estágio.
//!
//! [`TimingError`] cobre as falhas das operações de calendário (instantes
//! inválidos, ausência de ponto de referência). [`StagetimeError`] agrega os
//! erros de aplicação (configuração, I/O, JSON, TOML) em torno dele.

use thiserror::Error;

/// Failures raised by the business-time computations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimingError {
    /// An instant or quantity could not be parsed or falls outside the
    /// representable calendar range.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Neither a matching chronology entry nor a creation instant is
    /// available to anchor a stage visit.
    #[error("no reference point to anchor the stage visit")]
    MissingReferencePoint,
}

impl TimingError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        TimingError::InvalidInput(msg.into())
    }
}

#[derive(Debug, Error)]
pub enum StagetimeError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Timing error: {0}")]
    Timing(#[from] TimingError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}
