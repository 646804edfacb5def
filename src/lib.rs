//! Learnpulse - Feature extraction engine for early prediction of course completion
//!
//! Learnpulse transforms raw course-platform activity logs into fixed-length
//! feature vectors through a deterministic pipeline: ingestion → observation
//! windowing → base aggregation → interaction composition → assembly. The same
//! computation backs both output modes: the training matrix (with completion
//! labels) and the precomputed lookup table used at serving time.
//!
//! ## Modules
//!
//! - **Pipeline**: windowing, aggregation, composition, and the two assembly modes
//! - **Store**: atomic persistence of the per-user feature lookup table
//! - **Serving**: payload validation and prediction via the external classifier

pub mod aggregate;
pub mod compose;
pub mod error;
pub mod labels;
pub mod model;
pub mod pipeline;
pub mod schema;
pub mod serving;
pub mod store;
pub mod types;
pub mod window;

pub use error::EngineError;
pub use model::CompletionClassifier;
pub use pipeline::{build_training_set, compute_feature_table, FeatureTable};
pub use store::FeatureStore;

// Schema exports
pub use schema::{ActivityLogAdapter, RawEvent, RawSubmission, SCHEMA_VERSION};

// Feature schema exports
pub use types::{FeatureRow, FeatureVector, FEATURE_COUNT, FEATURE_NAMES};

/// Engine version embedded in run manifests
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for run manifests
pub const PRODUCER_NAME: &str = "learnpulse";
