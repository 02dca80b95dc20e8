use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use etrace_view::{RowAnnotationStore, TraceStore};

use crate::bridge::{BridgeConfig, DeviceOpener, IngestionBridge, SerialOpener};
use crate::error::{CaptureError, Result};

/// Lifecycle of one serial capture session.
///
/// `stop` cancels the bridge and waits for its task to finish, so the device
/// is closed and the store no longer written once it returns.
pub struct SerialCapture {
    config: BridgeConfig,
    store: Arc<dyn TraceStore>,
    annotations: Arc<RowAnnotationStore>,

    /// Cancellation token for the running bridge
    cancel: CancellationToken,

    task: Option<JoinHandle<()>>,
}

impl SerialCapture {
    pub fn new(config: BridgeConfig, store: Arc<dyn TraceStore>, annotations: Arc<RowAnnotationStore>) -> Self {
        Self {
            config,
            store,
            annotations,
            cancel: CancellationToken::new(),
            task: None,
        }
    }

    pub fn device(&self) -> &str {
        &self.config.device
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Start capturing from the configured serial port
    pub fn start(&mut self) -> Result<()> {
        self.start_with(SerialOpener)
    }

    /// Start capturing through a custom device opener
    pub fn start_with<O: DeviceOpener>(&mut self, opener: O) -> Result<()> {
        if self.task.is_some() {
            return Err(CaptureError::AlreadyRunning {
                device: self.config.device.clone(),
            });
        }

        // Fresh token so a stopped session can be started again
        self.cancel = CancellationToken::new();
        let bridge = IngestionBridge::new(
            opener,
            self.config.clone(),
            Arc::clone(&self.store),
            Arc::clone(&self.annotations),
        );
        self.task = Some(tokio::spawn(bridge.run(self.cancel.clone())));
        tracing::info!(device = %self.config.device, "capture started");
        Ok(())
    }

    /// Cancel the bridge and wait for it to exit
    pub async fn stop(&mut self) {
        self.cancel.cancel();
        let Some(task) = self.task.take() else {
            return;
        };
        if let Err(e) = task.await {
            tracing::warn!(device = %self.config.device, error = %e, "capture task ended abnormally");
        }
        tracing::info!(device = %self.config.device, "capture stopped");
    }
}

impl Drop for SerialCapture {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
