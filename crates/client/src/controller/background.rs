//! Detached background tasks.

use std::future::Future;

use tracing::Instrument;

use cyft_core::Error;

/// Spawn `task` with nobody awaiting it.
///
/// The task runs under its own span; its error is logged at debug level and
/// dropped. Callers must not depend on it completing.
pub fn spawn_detached<F>(label: &'static str, task: F)
where
    F: Future<Output = Result<(), Error>> + Send + 'static,
{
    let span = tracing::debug_span!("detached", task = label);
    tokio::spawn(
        async move {
            if let Err(err) = task.await {
                tracing::debug!("detached task failed: {}", err);
            }
        }
        .instrument(span),
    );
}
