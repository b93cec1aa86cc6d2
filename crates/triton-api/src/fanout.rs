//! Concurrent sub-operations with error aggregation.

use std::future::Future;

use futures::future::join_all;
use tracing::debug;
use triton_cloudapi::{Error, Result};

/// Runs every future concurrently and waits for all of them.
///
/// Succeeds with the outputs in input order only if every future succeeded.
/// Otherwise every failure is collected: one failure is returned as is,
/// several become [`Error::Multi`].
pub async fn fan_out<I, F, T>(futures: I) -> Result<Vec<T>>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = Result<T>>,
{
    let results = join_all(futures).await;
    let total = results.len();
    let mut values = Vec::with_capacity(total);
    let mut errors = Vec::new();
    for result in results {
        match result {
            Ok(value) => values.push(value),
            Err(e) => errors.push(e),
        }
    }
    debug!(total, failed = errors.len(), "fan-out finished");
    Error::from_many(errors)?;
    Ok(values)
}
