use std::path::PathBuf;

use futures::future::{BoxFuture, FutureExt};
use graphview::{HistoryUpdate, Persister};
use tracing::info;

/// Writes the whole graph history as JSON, in the shape the loader accepts.
pub struct FilePersister {
    path: PathBuf,
}

impl FilePersister {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Persister for FilePersister {
    fn persist(&self, update: HistoryUpdate) -> BoxFuture<'_, anyhow::Result<()>> {
        async move {
            let body = serde_json::to_vec_pretty(&update)?;
            smol::fs::write(&self.path, body).await?;
            info!(
                path = %self.path.display(),
                snapshots = update.graph_history.len(),
                "saved graph history"
            );
            Ok(())
        }
        .boxed()
    }
}
