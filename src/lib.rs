//! # Media Minify Library
//!
//! Questo è il modulo principale della libreria che espone tutte le API pubbliche.
//!
//! ## Responsabilità:
//! - Definisce la struttura modulare della pipeline di minificazione
//! - Espone i tipi e le funzioni principali tramite re-exports
//! - Fornisce un'interfaccia pulita per il main.rs e per altri consumatori
//!
//! ## Architettura dei moduli:
//! - `config`: Opzioni della pipeline e configurazione della CLI
//! - `error`: Tipi di errore per item e configurazione
//! - `item`: Item di lavoro e risultati per item
//! - `fingerprint`: Chiavi di cache derivate da input e configurazione
//! - `cache`: Adapter di cache e store su disco / in memoria
//! - `optimizer`: Backend, worker per item e coordinatore batch
//! - `tool_resolver`: Ricerca dei tool esterni
//! - `file_manager`: Operazioni sui file e discovery immagini
//! - `progress`: Progress bar e statistiche
//! - `json_output`: Messaggi JSON per uso programmatico
//!
//! ## Utilizzo:
//! ```rust,no_run
//! use media_minify::{minify, CommandOptimizer, MinifyOptions, OptimizerConfig, WorkItem};
//! use std::sync::Arc;
//!
//! # async fn demo() {
//! let options = MinifyOptions::new(OptimizerConfig::with_plugins(["jpegtran", "oxipng"]));
//! let items = vec![WorkItem::new(std::fs::read("logo.png").unwrap(), "logo.png")];
//! let results = minify(Some(items), Arc::new(CommandOptimizer::new()), options).await;
//! assert_eq!(results.len(), 1);
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod file_manager;
pub mod fingerprint;
pub mod item;
pub mod json_output;
pub mod optimizer;
pub mod progress;
pub mod tool_resolver;

pub use cache::{CacheAdapter, CacheStore, DiskStore, MemoryStore};
pub use config::{CacheMode, Config, ItemFilter, MinifyOptions, OptimizerConfig, PluginSpec};
pub use error::MinifyError;
pub use fingerprint::Fingerprint;
pub use item::{MinifyResult, WorkItem};
pub use optimizer::{minify, CommandOptimizer, DirectoryMinifier, Minifier, Optimizer, Outcome};
