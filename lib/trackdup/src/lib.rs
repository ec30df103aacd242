pub mod classify;
pub mod config;
pub mod engine;
pub mod error;
pub mod registry;
pub mod report;
pub mod services;
pub mod similarity;
pub mod traits;
pub mod worker;

pub use config::ScanConfig;
pub use engine::{find_duplicates, scan, DuplicateScanner, ScanState};
pub use error::{DedupError, Result};
pub use registry::ScanRegistry;
pub use services::{DedupService, Providers, ProvidersBuilder};
pub use similarity::{similarity, BigramDice, Similarity};
pub use traits::TrackProvider;
pub use worker::{start_scan, ScanHandle};

pub use shared::library::{
    DuplicateEntry, DuplicateGroup, DuplicateReason, DuplicateReport, ScanSnapshot, TrackRecord,
};
