pub mod api;
pub mod core;
pub mod images;
pub mod scraping;
pub mod tools;

// --- Primary core exports ---
pub use crate::core::types;
pub use crate::core::types::*;
pub use crate::core::{AppState, ExtractError};
pub use images::{ExtractionProfile, ImageValidator};
pub use tools::{download, extract};
