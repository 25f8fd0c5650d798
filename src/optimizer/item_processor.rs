//! # Item Processor Module
//!
//! Worker per l'elaborazione di un singolo item.
//! Separato dal coordinatore batch per maggiore modularità.
//!
//! ## Flusso:
//! 1. Input assente: errore `EmptyInput`, nessun altro campo popolato
//! 2. Filtro: se rifiuta l'item, output = input e `filtered = true`
//! 3. Cache (se attiva): fingerprint + lookup, un hit termina qui
//! 4. Ottimizzazione: successo = output ottimizzato + scrittura in cache;
//!    fallimento = output = input, errore o warning a seconda di `bail`

use crate::{
    cache::CacheAdapter,
    config::{ItemFilter, MinifyOptions, OptimizerConfig},
    error::MinifyError,
    fingerprint::Fingerprint,
    item::{MinifyResult, WorkItem},
    optimizer::backend::{self, panic_message, Optimizer},
};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, warn};

/// Runs one item through filter, cache and optimizer
pub struct ItemProcessor {
    optimizer: Arc<dyn Optimizer>,
    config: OptimizerConfig,
    cache: CacheAdapter,
    bail: bool,
    filter: Option<ItemFilter>,
}

impl ItemProcessor {
    /// Crea nuovo item processor
    pub fn new(optimizer: Arc<dyn Optimizer>, options: &MinifyOptions, cache: CacheAdapter) -> Self {
        Self {
            optimizer,
            config: options.optimizer.clone(),
            cache,
            bail: options.bail,
            filter: options.filter.clone(),
        }
    }

    /// Processa un singolo item
    pub async fn process(&self, item: WorkItem) -> MinifyResult {
        let WorkItem { input, path } = item;
        let Some(input) = input else {
            debug!("Rejecting item without input");
            return MinifyResult::empty_input();
        };

        let mut result = MinifyResult {
            path,
            ..Default::default()
        };

        match self.passes_filter(&input, result.path.as_deref()) {
            Ok(true) => {}
            Ok(false) => {
                debug!("Item filtered out: {:?}", result.path);
                result.filtered = true;
                return Self::pass_through(result, input);
            }
            Err(e) => {
                self.record_failure(&mut result, e);
                return Self::pass_through(result, input);
            }
        }

        let fingerprint = self.fingerprint(&input);
        if let Some(ref key) = fingerprint {
            if let Some(cached) = self.cache.get(key).await {
                debug!("Cache hit for {:?} ({})", result.path, key);
                result.output = Some(cached);
                result.input = Some(input);
                return result;
            }
            debug!("Cache miss for {:?} ({})", result.path, key);
        }

        match backend::invoke(self.optimizer.as_ref(), &input, &self.config).await {
            Ok(output) => {
                if let Some(ref key) = fingerprint {
                    self.cache.put(key, &output).await;
                }
                result.output = Some(output);
                result.input = Some(input);
                result
            }
            Err(MinifyError::NoBackendConfigured) => {
                result.errors.push(MinifyError::NoBackendConfigured);
                Self::pass_through(result, input)
            }
            Err(e) => {
                self.record_failure(&mut result, e);
                Self::pass_through(result, input)
            }
        }
    }

    /// Run the filter hook; a panicking hook counts as a processing failure
    fn passes_filter(&self, input: &[u8], path: Option<&str>) -> Result<bool, MinifyError> {
        let Some(ref filter) = self.filter else {
            return Ok(true);
        };

        std::panic::catch_unwind(AssertUnwindSafe(|| filter(input, path))).map_err(|panic| {
            MinifyError::Optimization(format!("filter panicked: {}", panic_message(panic.as_ref())))
        })
    }

    /// Cache key, only computed when the cache is enabled
    fn fingerprint(&self, input: &[u8]) -> Option<Fingerprint> {
        if !self.cache.is_enabled() {
            return None;
        }

        match Fingerprint::compute(input, &self.config) {
            Ok(key) => Some(key),
            Err(e) => {
                warn!("Could not fingerprint item, skipping cache: {}", e);
                None
            }
        }
    }

    /// Route a processing failure according to the bail policy
    fn record_failure(&self, result: &mut MinifyResult, error: MinifyError) {
        if self.bail {
            warn!("Optimization failed for {:?}: {}", result.path, error);
            result.errors.push(error);
        } else {
            debug!("Optimization failed for {:?}, keeping original: {}", result.path, error);
            result.warnings.push(error);
        }
    }

    fn pass_through(mut result: MinifyResult, input: Vec<u8>) -> MinifyResult {
        result.output = Some(input.clone());
        result.input = Some(input);
        result
    }
}
