//! # Optimizer Backend Module
//!
//! Astrazione del backend di ottimizzazione e invocazione isolata.
//!
//! ## Responsabilità:
//! - Definisce il trait `Optimizer` implementato da ogni backend
//! - Definisce `Outcome`: il backend ottimizza oppure declina (contenuto non riconosciuto)
//! - `invoke()`: chiama il backend trattandolo come non affidabile
//!   (configurazione vuota, panic, output vuoto)

use crate::config::OptimizerConfig;
use crate::error::MinifyError;
use async_trait::async_trait;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use tracing::{debug, error};

/// What a backend did with a payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Transformed bytes
    Optimized(Vec<u8>),
    /// Content not recognized by any configured plugin; bytes pass through
    Unchanged,
}

/// A pluggable optimization backend
#[async_trait]
pub trait Optimizer: Send + Sync {
    /// Optimize one payload. Content errors are returned as `Err`; content the
    /// backend does not handle should be reported as `Outcome::Unchanged`.
    async fn optimize(&self, input: &[u8], config: &OptimizerConfig) -> Result<Outcome, MinifyError>;
}

/// Run the backend on one payload and return the bytes to use as output
pub async fn invoke(
    optimizer: &dyn Optimizer,
    input: &[u8],
    config: &OptimizerConfig,
) -> Result<Vec<u8>, MinifyError> {
    if config.is_empty() {
        return Err(MinifyError::NoBackendConfigured);
    }

    let outcome = AssertUnwindSafe(optimizer.optimize(input, config))
        .catch_unwind()
        .await
        .map_err(|panic| {
            let message = panic_message(panic.as_ref());
            error!("Optimizer panicked: {}", message);
            MinifyError::Optimization(format!("optimizer panicked: {}", message))
        })??;

    match outcome {
        Outcome::Optimized(output) if output.is_empty() && !input.is_empty() => {
            Err(MinifyError::Optimization("optimizer returned empty output".to_string()))
        }
        Outcome::Optimized(output) => {
            debug!("Optimized {} -> {} bytes", input.len(), output.len());
            Ok(output)
        }
        Outcome::Unchanged => {
            debug!("Optimizer declined payload of {} bytes, passing through", input.len());
            Ok(input.to_vec())
        }
    }
}

pub(crate) fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Result<Outcome, &'static str>);

    #[async_trait]
    impl Optimizer for Fixed {
        async fn optimize(&self, _input: &[u8], _config: &OptimizerConfig) -> Result<Outcome, MinifyError> {
            self.0.clone().map_err(|m| MinifyError::Optimization(m.to_string()))
        }
    }

    struct Panicking;

    #[async_trait]
    impl Optimizer for Panicking {
        async fn optimize(&self, _input: &[u8], _config: &OptimizerConfig) -> Result<Outcome, MinifyError> {
            panic!("decoder exploded");
        }
    }

    fn config() -> OptimizerConfig {
        OptimizerConfig::with_plugins(["test"])
    }

    #[tokio::test]
    async fn test_empty_config_is_no_backend() {
        let optimizer = Fixed(Ok(Outcome::Unchanged));
        let result = invoke(&optimizer, b"abc", &OptimizerConfig::default()).await;
        assert!(matches!(result, Err(MinifyError::NoBackendConfigured)));
    }

    #[tokio::test]
    async fn test_unchanged_passes_input_through() {
        let optimizer = Fixed(Ok(Outcome::Unchanged));
        assert_eq!(invoke(&optimizer, b"Foo", &config()).await.unwrap(), b"Foo");
    }

    #[tokio::test]
    async fn test_optimized_bytes_returned() {
        let optimizer = Fixed(Ok(Outcome::Optimized(b"ab".to_vec())));
        assert_eq!(invoke(&optimizer, b"abc", &config()).await.unwrap(), b"ab");
    }

    #[tokio::test]
    async fn test_empty_output_is_failure() {
        let optimizer = Fixed(Ok(Outcome::Optimized(Vec::new())));
        let result = invoke(&optimizer, b"abc", &config()).await;
        assert!(matches!(result, Err(MinifyError::Optimization(_))));
    }

    #[tokio::test]
    async fn test_backend_error_propagates() {
        let optimizer = Fixed(Err("Corrupt JPEG data"));
        let err = invoke(&optimizer, b"abc", &config()).await.unwrap_err();
        assert!(err.to_string().contains("Corrupt JPEG data"));
    }

    #[tokio::test]
    async fn test_panic_is_captured() {
        let err = invoke(&Panicking, b"abc", &config()).await.unwrap_err();
        assert!(err.to_string().contains("decoder exploded"));
    }
}
