//! Candidate collection and content-image validation.

pub mod collector;
pub mod profile;
pub mod validator;

pub use collector::{collect_candidates, CollectorOptions};
pub use profile::{ExtractionProfile, PageLoadOptions, ProfilePreset};
pub use validator::{ExtensionMatch, ImageValidator, ValidatorPolicy};
