use std::sync::Arc;

use futures::future::join_all;
use tokio::task;
use tracing::debug;

use crate::error::PipelineError;
use crate::features::{FeatureExtractor, FeatureSet};
use crate::records::CleanedRecord;

/// Fans `records` out over `workers` blocking tasks and waits for all of them.
///
/// Tasks finish in any order; the result is re-sorted by load position so the
/// corpus fan-in sees records in a deterministic order. A panicked task fails
/// the whole stage.
pub async fn extract_all(
    extractor: Arc<FeatureExtractor>,
    records: &[CleanedRecord],
    workers: usize,
) -> Result<Vec<FeatureSet>, PipelineError> {
    if records.is_empty() {
        return Ok(Vec::new());
    }

    let workers = workers.max(1);
    let chunk_size = records.len().div_ceil(workers);

    let handles = records
        .chunks(chunk_size)
        .map(|chunk| {
            let chunk = chunk.to_vec();
            let extractor = Arc::clone(&extractor);
            task::spawn_blocking(move || {
                chunk
                    .iter()
                    .map(|record| extractor.extract(record))
                    .collect::<Vec<_>>()
            })
        })
        .collect::<Vec<_>>();
    debug!(tasks = handles.len(), records = records.len(), "feature extraction fanned out");

    let mut features = Vec::with_capacity(records.len());
    for joined in join_all(handles).await {
        let chunk = joined.map_err(|err| PipelineError::Worker(err.to_string()))?;
        features.extend(chunk);
    }

    features.sort_by_key(|f| f.position);
    Ok(features)
}
