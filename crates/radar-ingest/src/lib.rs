//! Turns raw collector records into uniform [`radar_core::model::Signal`]s.

pub mod batch;
pub mod error;
pub mod normalize;
pub mod record;
pub mod topics;

pub use batch::{load_batch, load_batches, RawBatch};
pub use error::IngestError;
pub use normalize::{normalize, NormalizeOutcome};
pub use record::{RawRecord, RepositoryRecord, SocialRecord, ValueFlowRecord};
