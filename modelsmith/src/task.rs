//! Detached background work.

use std::future::Future;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Runs `future` on the current tokio runtime without awaiting it.
///
/// Generated data-access objects use this for cache population and eviction
/// after a successful write. The caller sees success as soon as the storage
/// write returns, so the cache may briefly lag storage. When no runtime is
/// available the work is dropped with a warning and `None` is returned.
///
/// ## Examples
///
/// ```
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// let handle = modelsmith::detach(async { 1 + 1 });
/// assert_eq!(handle.unwrap().await.unwrap(), 2);
/// # });
/// ```
pub fn detach<F>(future: F) -> Option<JoinHandle<F::Output>>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    match Handle::try_current() {
        Ok(handle) => Some(handle.spawn(future)),
        Err(e) => {
            tracing::warn!(error = %e, "no async runtime, detached task dropped");
            None
        }
    }
}
