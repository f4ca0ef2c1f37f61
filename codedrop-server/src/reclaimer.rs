//! Background reclamation of expired drops and unreferenced blobs.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::time::interval;
use tracing::{debug, error, info, warn};

use codedrop_core::DropId;
use codedrop_metadata::{MetadataError, MetadataStore};
use codedrop_store::ObjectStore;

use crate::service::blob_key;

/// Configuration for the reclaimer.
#[derive(Debug, Clone)]
pub struct ReclaimerConfig {
    /// How often to sweep for expired drops (default: 5 minutes).
    pub sweep_interval: Duration,
}

impl Default for ReclaimerConfig {
    fn default() -> Self {
        Self {
            sweep_interval: Duration::from_secs(300),
        }
    }
}

/// Periodically removes expired drops and the blobs nothing references.
///
/// Exactly one reclaimer should run per deployment: the sweep assumes no
/// concurrent sweeper is deleting the same drops. A sweep is cancellable
/// between drops but an individual drop is reclaimed to completion;
/// per-drop failures are logged and the sweep moves on.
pub struct Reclaimer {
    config: ReclaimerConfig,
    metadata: Arc<dyn MetadataStore>,
    objects: Arc<dyn ObjectStore>,
    shutdown_rx: mpsc::Receiver<()>,
}

impl Reclaimer {
    /// Create a new reclaimer. Returns the reclaimer and a shutdown sender.
    pub fn new(
        config: ReclaimerConfig,
        metadata: Arc<dyn MetadataStore>,
        objects: Arc<dyn ObjectStore>,
    ) -> (Self, mpsc::Sender<()>) {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        (
            Self {
                config,
                metadata,
                objects,
                shutdown_rx,
            },
            shutdown_tx,
        )
    }

    /// Run the sweep loop until shutdown is signaled.
    pub async fn run(&mut self) {
        info!(interval = ?self.config.sweep_interval, "reclaimer starting");

        let mut ticker = interval(self.config.sweep_interval);

        loop {
            tokio::select! {
                _ = self.shutdown_rx.recv() => {
                    info!("reclaimer received shutdown signal");
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.sweep().await {
                        error!(error = %e, "sweep failed");
                    }
                }
            }
        }

        info!("reclaimer stopped");
    }

    /// One pass over currently expired drops.
    pub async fn sweep(&self) -> Result<(), MetadataError> {
        let expired = self.metadata.find_expired(Utc::now()).await?;
        if expired.is_empty() {
            return Ok(());
        }

        debug!(count = expired.len(), "sweeping expired drops");

        for drop_id in expired {
            if let Err(e) = self.reclaim_drop(&drop_id).await {
                error!(drop_id = %drop_id, error = %e, "failed to reclaim drop");
            }
        }

        Ok(())
    }

    /// Remove one drop's rows and any blobs left unreferenced.
    ///
    /// The drop row is deleted before the refcount check: its own chunk
    /// rows must stop counting, or no shared blob would ever reach zero.
    /// An upload racing this delete can re-put a blob after we remove it;
    /// content addressing makes the re-put byte-identical, so the race
    /// costs at most one spurious write.
    async fn reclaim_drop(&self, drop_id: &DropId) -> Result<(), MetadataError> {
        let hashes = self.metadata.list_chunk_hashes(drop_id).await?;

        self.metadata.delete_drop(drop_id).await?;

        for hash in hashes {
            if self.metadata.ref_count(&hash).await? == 0 {
                let key = blob_key(&hash);
                if let Err(e) = self.objects.delete(&key).await {
                    warn!(key = %key, error = %e, "failed to delete unreferenced blob");
                }
            }
        }

        info!(drop_id = %drop_id, "drop reclaimed");
        Ok(())
    }
}
