//! Streaming HTTP downloads into files.

use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;

use crate::codec::Codec;
use crate::error::{Cause, EntryKind, FsError, FsResult, Operation};
use crate::fs::ops::ensure_parent;
use crate::fs::File;
use crate::pipeline::cancellable;

/// Bytes received so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadProgress {
    pub downloaded_bytes: u64,
    /// From `Content-Length`, when the server sent one.
    pub total_bytes: Option<u64>,
}

pub type ProgressCallback = Arc<dyn Fn(DownloadProgress) + Send + Sync>;

#[derive(Clone)]
pub struct DownloadOptions {
    pub overwrite: bool,
    pub cancel: Option<CancellationToken>,
    pub on_progress: Option<ProgressCallback>,
    /// Minimum time between two progress reports.
    pub progress_interval: Duration,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            overwrite: false,
            cancel: None,
            on_progress: None,
            progress_interval: Duration::from_millis(100),
        }
    }
}

impl fmt::Debug for DownloadOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DownloadOptions")
            .field("overwrite", &self.overwrite)
            .field("cancel", &self.cancel)
            .field("on_progress", &self.on_progress.is_some())
            .field("progress_interval", &self.progress_interval)
            .finish()
    }
}

impl DownloadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(DownloadProgress) + Send + Sync + 'static,
    {
        self.on_progress = Some(Arc::new(callback));
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadOutcome {
    Downloaded { bytes: u64 },
    /// The file was already there and `overwrite` was off.
    AlreadyExists,
}

impl<C: Codec> File<C> {
    /// Downloads `url` into this file, creating parent folders.
    ///
    /// The body is streamed into a hidden sibling and renamed into place once
    /// complete, so a failed or cancelled transfer leaves any existing file
    /// untouched. An existing file is left alone unless `overwrite` is set.
    ///
    /// # Errors
    ///
    /// An [`Operation::Download`] error whose cause is [`Cause::Http`] for
    /// transport failures and non-success statuses, [`Cause::Aborted`] when
    /// cancelled, [`Cause::WrongKind`] when a folder is in the way, or an I/O
    /// cause for local failures.
    pub async fn download(&self, url: &str, options: &DownloadOptions) -> FsResult<DownloadOutcome> {
        match self.stat().await {
            Ok(_) if !options.overwrite => {
                tracing::debug!(path = %self.path().display(), "download skipped, file exists");
                return Ok(DownloadOutcome::AlreadyExists);
            }
            Ok(_) => {}
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(FsError::new(Operation::Download, self.path(), e.into_cause())),
        }

        let partial = self.parent_path().join(format!(".{}.download", self.name()));
        let created = AtomicBool::new(false);
        let result = cancellable(
            Operation::Download,
            self.path(),
            options.cancel.as_ref(),
            self.fetch(url, options, &partial, &created),
        )
        .await;

        if result.is_err() && created.load(Ordering::SeqCst) {
            match tokio::fs::remove_file(&partial).await {
                Err(e) if e.kind() != std::io::ErrorKind::NotFound => {
                    tracing::warn!(path = %partial.display(), error = %e, "could not remove partial download");
                }
                _ => {}
            }
        }
        result
    }

    async fn fetch(
        &self,
        url: &str,
        options: &DownloadOptions,
        partial: &Path,
        created: &AtomicBool,
    ) -> FsResult<DownloadOutcome> {
        let fail = |cause: Cause| FsError::new(Operation::Download, self.path(), cause);
        let io_fail = |e: std::io::Error| fail(Cause::from_io(e, EntryKind::File));

        let mut response = reqwest::get(url)
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| fail(Cause::Http(e)))?;
        let total_bytes = response.content_length();

        ensure_parent(self.path()).await.map_err(io_fail)?;
        let mut out = tokio::fs::File::create(partial).await.map_err(io_fail)?;
        created.store(true, Ordering::SeqCst);

        let mut downloaded_bytes = 0u64;
        let mut last_report: Option<Instant> = None;
        while let Some(chunk) = response.chunk().await.map_err(|e| fail(Cause::Http(e)))? {
            out.write_all(&chunk).await.map_err(io_fail)?;
            downloaded_bytes += chunk.len() as u64;

            if let Some(report) = &options.on_progress {
                let due = last_report.map_or(true, |at| at.elapsed() >= options.progress_interval);
                if due {
                    report(DownloadProgress {
                        downloaded_bytes,
                        total_bytes,
                    });
                    last_report = Some(Instant::now());
                }
            }
        }
        out.flush().await.map_err(io_fail)?;
        drop(out);
        tokio::fs::rename(partial, self.path())
            .await
            .map_err(io_fail)?;

        if let Some(report) = &options.on_progress {
            report(DownloadProgress {
                downloaded_bytes,
                total_bytes,
            });
        }
        tracing::debug!(url, path = %self.path().display(), bytes = downloaded_bytes, "downloaded");
        Ok(DownloadOutcome::Downloaded {
            bytes: downloaded_bytes,
        })
    }
}
