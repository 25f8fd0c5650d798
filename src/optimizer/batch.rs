//! # Batch Coordinator Module
//!
//! Coordinatore che distribuisce gli item sui task e raccoglie i risultati.
//!
//! ## Responsabilità:
//! - Un task tokio per item, opzionalmente limitati da un semaforo (`workers`)
//! - Ogni task porta con sé l'indice originale: i risultati vengono scritti
//!   nello slot corrispondente, indipendentemente dall'ordine di completamento
//! - Isolamento: il fallimento di un item (anche un panic) non tocca gli altri
//! - Input assente o vuoto = risultato vuoto
//!
//! ## Esempio:
//! ```rust,no_run
//! use media_minify::{CommandOptimizer, MinifyOptions, Minifier, OptimizerConfig, WorkItem};
//! use std::sync::Arc;
//!
//! # async fn demo() {
//! let options = MinifyOptions::new(OptimizerConfig::with_plugins(["mozjpeg"]));
//! let minifier = Minifier::new(Arc::new(CommandOptimizer::new()), options);
//! let results = minifier.run(vec![WorkItem::new(std::fs::read("a.jpg").unwrap(), "a.jpg")]).await;
//! # }
//! ```

use crate::{
    cache::{CacheAdapter, CacheStore},
    config::MinifyOptions,
    item::{MinifyResult, WorkItem},
    optimizer::{backend::Optimizer, item_processor::ItemProcessor},
};
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, error};

/// Batch entry point: owns the processor shared by all item tasks
pub struct Minifier {
    optimizer: Arc<dyn Optimizer>,
    options: MinifyOptions,
    processor: Arc<ItemProcessor>,
}

impl Minifier {
    /// Build a minifier; the cache location is resolved here, once
    pub fn new(optimizer: Arc<dyn Optimizer>, options: MinifyOptions) -> Self {
        let cache = CacheAdapter::configure(&options.cache);
        Self::with_adapter(optimizer, options, cache)
    }

    /// Replace the physical cache store. Has no effect when caching is disabled.
    pub fn with_cache_store(self, store: Arc<dyn CacheStore>) -> Self {
        let cache = if self.options.cache.is_enabled() {
            CacheAdapter::from_store(store)
        } else {
            CacheAdapter::Disabled
        };
        Self::with_adapter(self.optimizer, self.options, cache)
    }

    fn with_adapter(
        optimizer: Arc<dyn Optimizer>,
        options: MinifyOptions,
        cache: CacheAdapter,
    ) -> Self {
        let processor = Arc::new(ItemProcessor::new(optimizer.clone(), &options, cache));
        Self {
            optimizer,
            options,
            processor,
        }
    }

    pub fn options(&self) -> &MinifyOptions {
        &self.options
    }

    /// Process all items concurrently; one result per item, in input order
    pub async fn run(&self, items: Vec<WorkItem>) -> Vec<MinifyResult> {
        self.run_with_progress(items, |_, _| {}).await
    }

    /// Like `run`, calling `on_complete(index, result)` as each item finishes
    pub async fn run_with_progress<F>(
        &self,
        items: Vec<WorkItem>,
        mut on_complete: F,
    ) -> Vec<MinifyResult>
    where
        F: FnMut(usize, &MinifyResult),
    {
        if items.is_empty() {
            return Vec::new();
        }

        let total = items.len();
        let limiter = self.options.workers.map(|workers| Arc::new(Semaphore::new(workers.max(1))));
        debug!("Processing {} items (worker limit: {:?})", total, self.options.workers);

        let mut pending = FuturesUnordered::new();
        for (index, item) in items.into_iter().enumerate() {
            let processor = self.processor.clone();
            let limiter = limiter.clone();
            let path = item.path.clone();

            let handle = tokio::spawn(async move {
                // I permessi vengono rilasciati automaticamente quando il task finisce
                let _permit = match limiter {
                    Some(semaphore) => semaphore.acquire_owned().await.ok(),
                    None => None,
                };
                processor.process(item).await
            });

            pending.push(async move { (index, path, handle.await) });
        }

        let mut slots: Vec<Option<MinifyResult>> = (0..total).map(|_| None).collect();
        while let Some((index, path, joined)) = pending.next().await {
            let result = joined.unwrap_or_else(|e| {
                error!("Task for item {} ({:?}) failed: {}", index, path, e);
                MinifyResult::aborted(path, format!("item task failed: {}", e))
            });
            on_complete(index, &result);
            slots[index] = Some(result);
        }

        slots
            .into_iter()
            .map(|slot| slot.unwrap_or_default())
            .collect()
    }
}

/// One-shot entry point; `None` or an empty list yields an empty result
pub async fn minify(
    items: Option<Vec<WorkItem>>,
    optimizer: Arc<dyn Optimizer>,
    options: MinifyOptions,
) -> Vec<MinifyResult> {
    match items {
        Some(items) if !items.is_empty() => Minifier::new(optimizer, options).run(items).await,
        _ => Vec::new(),
    }
}
