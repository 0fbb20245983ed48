//! Run history: what previous runs reported, used for novelty, velocity
//! baselines and narrative direction.

mod snapshot;
mod store;

pub use snapshot::{
    canonical_name, word_overlap, BaselineRecord, HistorySnapshot, NarrativeRecord, RunRecord,
};
pub use store::{HistoryStore, RunGuard};
