use crate::errors::AppError;

/// Runs file I/O or CPU-bound work (store writes, PDF layout) on tokio's
/// blocking pool and waits for it.
pub async fn run_blocking<T, F>(work: F) -> Result<T, AppError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed: {e}")))
}
