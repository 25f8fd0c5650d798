//! # Optimizer Module
//!
//! Pipeline di minificazione separata in sottomoduli:
//! - `backend`: Contratto `Optimizer` e invocazione protetta del backend
//! - `command_backend`: Backend basato su tool esterni (mozjpeg, oxipng, ...)
//! - `item_processor`: Worker per il singolo item (filtro, cache, ottimizzazione)
//! - `batch`: Coordinatore concorrente che preserva l'ordine
//! - `directory_minifier`: Orchestratore della CLI su una directory
//! - `path_resolver`: Logica di calcolo path centralizzata

pub mod backend;
pub mod batch;
pub mod command_backend;
pub mod directory_minifier;
pub mod item_processor;
pub mod path_resolver;

pub use backend::{Optimizer, Outcome};
pub use batch::{minify, Minifier};
pub use command_backend::{CommandOptimizer, ToolPreset};
pub use directory_minifier::DirectoryMinifier;
pub use item_processor::ItemProcessor;
pub use path_resolver::PathResolver;
