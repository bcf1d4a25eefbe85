//! Execution helpers shared by every operation.
//!
//! Operations are plain `async fn`s returning [`FsResult`], so they compose
//! with `?`, `and_then` on futures, or `tokio::try_join!`. The helpers here
//! add the two things every operation needs on top: optional cancellation
//! and offloading of blocking work.

use std::future::Future;
use std::io;
use std::path::Path;

use tokio_util::sync::CancellationToken;

use crate::error::{Cause, FsError, FsResult, Operation};

/// Runs `work`, failing with [`Cause::Aborted`] if `cancel` fires first.
///
/// A token that is already cancelled aborts without polling `work`.
pub(crate) async fn cancellable<T, Fut>(
    operation: Operation,
    path: &Path,
    cancel: Option<&CancellationToken>,
    work: Fut,
) -> FsResult<T>
where
    Fut: Future<Output = FsResult<T>>,
{
    let Some(token) = cancel else {
        return work.await;
    };
    tokio::select! {
        biased;
        () = token.cancelled() => {
            tracing::debug!(%operation, path = %path.display(), "operation aborted");
            Err(FsError::new(operation, path, Cause::Aborted))
        }
        result = work => result,
    }
}

/// Runs blocking filesystem work on tokio's blocking pool.
pub(crate) async fn blocking<T, F>(operation: Operation, path: &Path, work: F) -> FsResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, Cause> + Send + 'static,
{
    match tokio::task::spawn_blocking(work).await {
        Ok(result) => result.map_err(|cause| FsError::new(operation, path, cause)),
        Err(join) => Err(FsError::new(
            operation,
            path,
            Cause::Io(io::Error::other(join)),
        )),
    }
}
