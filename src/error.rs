//! # Error Types Module
//!
//! Questo modulo definisce tutti i tipi di errore della pipeline di minificazione.
//!
//! ## Responsabilità:
//! - Definisce `MinifyError` per categorizzare ogni esito negativo di un item
//! - Distingue gli errori di configurazione da quelli sul contenuto
//! - Integra con `thiserror` per conversioni automatiche
//!
//! ## Categorie di errori:
//! - `EmptyInput`: l'item non contiene bytes (sempre in `errors`)
//! - `NoBackendConfigured`: nessun plugin utilizzabile (sempre in `errors`)
//! - `Optimization` / `MissingDependency` / `Io`: fallimenti del backend,
//!   instradati in `errors` o `warnings` a seconda di `bail`
//! - `Cache`: guasti dello storage, mai esposti al chiamante
//! - `Validation` / `Json`: caricamento della configurazione
//!
//! ## Esempio:
//! ```rust
//! use media_minify::MinifyError;
//!
//! let err = MinifyError::Optimization("Corrupt JPEG data".to_string());
//! assert!(err.is_content_failure());
//! ```

/// Custom error types for the minification pipeline
#[derive(thiserror::Error, Debug)]
pub enum MinifyError {
    #[error("Empty input")]
    EmptyInput,

    #[error("No optimization plugins configured")]
    NoBackendConfigured,

    #[error("Optimization failed: {0}")]
    Optimization(String),

    #[error("Dependency missing: {0}")]
    MissingDependency(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Configuration error: {0}")]
    Validation(String),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MinifyError {
    /// True when the payload itself could not be processed (backend failure, missing tool, I/O),
    /// as opposed to input, cache or configuration errors
    pub fn is_content_failure(&self) -> bool {
        matches!(
            self,
            Self::Optimization(_) | Self::MissingDependency(_) | Self::Io(_)
        )
    }
}
