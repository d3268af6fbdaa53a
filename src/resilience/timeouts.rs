//! Per-attempt deadlines.
//!
//! Every upstream attempt runs under a deadline. A timed-out attempt is a
//! transient transport failure and is retried like a refused connection.

use std::future::Future;
use std::time::Duration;

use crate::upstream::TransportError;

/// Run `fut`, giving up after `deadline`.
pub async fn with_deadline<T, F>(deadline: Duration, fut: F) -> Result<T, TransportError>
where
    F: Future<Output = Result<T, TransportError>>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => Err(TransportError::Timeout(deadline)),
    }
}
