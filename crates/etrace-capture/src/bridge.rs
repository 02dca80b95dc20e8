use std::future::Future;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use futures::FutureExt;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio_util::sync::CancellationToken;

use etrace_types::TraceEvent;
use etrace_view::{RowAnnotationStore, TraceStore};

/// Opens the byte source the bridge reads from
pub trait DeviceOpener: Send + Sync + 'static {
    type Device: AsyncRead + Unpin + Send + 'static;

    /// Open `device` configured for `baud_rate`
    fn open(&self, device: &str, baud_rate: u32) -> impl Future<Output = io::Result<Self::Device>> + Send;
}

/// Opens real serial ports
#[derive(Clone, Copy, Debug, Default)]
pub struct SerialOpener;

impl DeviceOpener for SerialOpener {
    type Device = tokio_serial::SerialStream;

    fn open(&self, device: &str, baud_rate: u32) -> impl Future<Output = io::Result<Self::Device>> + Send {
        let builder = tokio_serial::new(device, baud_rate);
        let result = tokio_serial::SerialStream::open(&builder).map_err(io::Error::from);
        std::future::ready(result)
    }
}

/// Serial capture settings
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Device path, e.g. `/dev/ttyUSB0` or `\\.\COM7`
    pub device: String,

    pub baud_rate: u32,

    /// Pause before reopening after any failure
    pub reconnect_backoff: Duration,

    /// Longest single wait for data before cancellation is re-checked
    pub read_timeout: Duration,

    pub read_buffer_size: usize,
}

impl BridgeConfig {
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            baud_rate: 115_200,
            reconnect_backoff: Duration::from_millis(500),
            read_timeout: Duration::from_millis(500),
            read_buffer_size: 4096,
        }
    }
}

/// Open failures between repeated diagnostic rows
const OPEN_FAILURE_REPEAT: u32 = 20;

enum BridgeState<D> {
    Connecting,
    RequestRead(D),
    WaitForRead(D),
    ConsumeData(D, usize),
}

/// Source identifier for a device: the name without its device-namespace prefix
pub fn source_name(device: &str) -> &str {
    device
        .strip_prefix(r"\\.\")
        .or_else(|| device.strip_prefix("/dev/"))
        .unwrap_or(device)
}

/// Decode one read's bytes into trimmed, non-empty lines
pub fn split_lines(bytes: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(bytes)
        .split('\n')
        .map(str::trim_end)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Background loop turning a serial byte stream into trace rows.
///
/// Any failure (including a failed open) drops the device, waits the backoff
/// and reconnects; the loop only ends on cancellation. The bridge touches
/// nothing but the store's append path and annotation creation.
pub struct IngestionBridge<O: DeviceOpener> {
    opener: O,
    config: BridgeConfig,
    store: Arc<dyn TraceStore>,
    annotations: Arc<RowAnnotationStore>,
    source: String,
}

impl<O: DeviceOpener> IngestionBridge<O> {
    pub fn new(
        opener: O,
        config: BridgeConfig,
        store: Arc<dyn TraceStore>,
        annotations: Arc<RowAnnotationStore>,
    ) -> Self {
        let source = source_name(&config.device).to_string();
        Self {
            opener,
            config,
            store,
            annotations,
            source,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Run until `cancel` fires. The device is released before returning.
    pub async fn run(self, cancel: CancellationToken) {
        let mut buf = vec![0u8; self.config.read_buffer_size.max(1)];
        let mut state = BridgeState::Connecting;
        let mut failed_opens = 0u32;

        tracing::info!(device = %self.config.device, baud = self.config.baud_rate, "serial bridge started");

        loop {
            if cancel.is_cancelled() {
                break;
            }

            state = match state {
                BridgeState::Connecting => {
                    let opened = tokio::select! {
                        _ = cancel.cancelled() => break,
                        result = self.opener.open(&self.config.device, self.config.baud_rate) => result,
                    };
                    match opened {
                        Ok(device) => {
                            tracing::info!(device = %self.config.device, "serial device opened");
                            failed_opens = 0;
                            BridgeState::RequestRead(device)
                        }
                        Err(e) => {
                            // An absent device fails every backoff period; rows for the
                            // first failure and then every OPEN_FAILURE_REPEAT-th one
                            failed_opens = failed_opens.saturating_add(1);
                            if failed_opens == 1 {
                                self.report(&format!("cannot open {}: {}", self.config.device, e));
                            } else if failed_opens % OPEN_FAILURE_REPEAT == 1 {
                                self.report(&format!(
                                    "still cannot open {} after {} attempts: {}",
                                    self.config.device, failed_opens, e
                                ));
                            } else {
                                tracing::debug!(attempt = failed_opens, error = %e, "serial open retry failed");
                            }
                            if !self.backoff(&cancel).await {
                                break;
                            }
                            BridgeState::Connecting
                        }
                    }
                }

                BridgeState::RequestRead(mut device) => match device.read(&mut buf).now_or_never() {
                    Some(Ok(n)) if n > 0 => BridgeState::ConsumeData(device, n),
                    Some(result) => {
                        drop(device);
                        self.read_failed(result.err());
                        if !self.backoff(&cancel).await {
                            break;
                        }
                        BridgeState::Connecting
                    }
                    None => BridgeState::WaitForRead(device),
                },

                BridgeState::WaitForRead(mut device) => {
                    let waited = tokio::select! {
                        _ = cancel.cancelled() => None,
                        result = tokio::time::timeout(self.config.read_timeout, device.read(&mut buf)) => Some(result),
                    };
                    match waited {
                        None => break,
                        // Nothing yet; loop back so cancellation is observed
                        Some(Err(_elapsed)) => BridgeState::WaitForRead(device),
                        Some(Ok(Ok(n))) if n > 0 => BridgeState::ConsumeData(device, n),
                        Some(Ok(result)) => {
                            drop(device);
                            self.read_failed(result.err());
                            if !self.backoff(&cancel).await {
                                break;
                            }
                            BridgeState::Connecting
                        }
                    }
                }

                BridgeState::ConsumeData(device, n) => {
                    let timestamp = Local::now();
                    for line in split_lines(&buf[..n]) {
                        self.inject(timestamp, line);
                    }
                    BridgeState::RequestRead(device)
                }
            };
        }

        tracing::info!(device = %self.config.device, "serial bridge stopped");
    }

    /// Sleep the reconnect backoff; false if cancelled meanwhile
    async fn backoff(&self, cancel: &CancellationToken) -> bool {
        tokio::select! {
            _ = cancel.cancelled() => false,
            _ = tokio::time::sleep(self.config.reconnect_backoff) => true,
        }
    }

    /// `None` means the device reported end of stream
    fn read_failed(&self, error: Option<io::Error>) {
        let message = match error {
            Some(e) => format!("read from {} failed: {}", self.config.device, e),
            None => format!("{} closed", self.config.device),
        };
        self.report(&message);
    }

    fn report(&self, message: &str) {
        tracing::warn!(device = %self.config.device, "{}", message);
        self.inject(Local::now(), format!("[etrace] {}", message));
    }

    fn inject(&self, timestamp: DateTime<Local>, line: String) {
        let row = self
            .store
            .append_row(TraceEvent::message(timestamp, self.source.clone(), line));
        self.annotations.get_or_create(row);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use etrace_types::Column;
    use etrace_view::MemoryTraceStore;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::io::{AsyncWriteExt, DuplexStream};

    /// Hands out pre-made duplex ends, then fails
    struct DuplexOpener {
        devices: Mutex<Vec<DuplexStream>>,
        opens: Arc<AtomicUsize>,
    }

    impl DeviceOpener for DuplexOpener {
        type Device = DuplexStream;

        fn open(&self, _device: &str, _baud_rate: u32) -> impl Future<Output = io::Result<DuplexStream>> + Send {
            self.opens.fetch_add(1, Ordering::SeqCst);
            let next = self.devices.lock().pop();
            std::future::ready(next.ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no device")))
        }
    }

    fn fast_config(device: &str) -> BridgeConfig {
        BridgeConfig {
            reconnect_backoff: Duration::from_millis(10),
            read_timeout: Duration::from_millis(20),
            ..BridgeConfig::new(device)
        }
    }

    async fn wait_for_rows(store: &MemoryTraceStore, rows: usize) {
        for _ in 0..200 {
            if store.row_count() >= rows {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    #[test]
    fn test_split_lines_trims_and_drops_empty() {
        assert_eq!(split_lines(b"line1\r\nline2\r\n"), vec!["line1", "line2"]);
        assert_eq!(split_lines(b"\r\n\r\n  \nx  \t"), vec!["x"]);
        assert_eq!(split_lines(b"  lead"), vec!["  lead"]);
        assert!(split_lines(b"").is_empty());
    }

    #[test]
    fn test_source_name_strips_prefix() {
        assert_eq!(source_name(r"\\.\COM7"), "COM7");
        assert_eq!(source_name("/dev/ttyUSB0"), "ttyUSB0");
        assert_eq!(source_name("COM3"), "COM3");
    }

    #[tokio::test]
    async fn test_one_read_becomes_rows_with_shared_timestamp() {
        let (device, mut remote) = tokio::io::duplex(256);
        let store = MemoryTraceStore::new();
        let annotations = Arc::new(RowAnnotationStore::new());
        let opener = DuplexOpener {
            devices: Mutex::new(vec![device]),
            opens: Arc::new(AtomicUsize::new(0)),
        };
        let bridge = IngestionBridge::new(
            opener,
            fast_config(r"\\.\COM7"),
            Arc::new(store.clone()),
            Arc::clone(&annotations),
        );
        let cancel = CancellationToken::new();
        let task = tokio::spawn(bridge.run(cancel.clone()));

        remote.write_all(b"line1\r\nline2\r\n").await.unwrap();
        wait_for_rows(&store, 2).await;
        cancel.cancel();
        task.await.unwrap();

        assert_eq!(store.cell_text(0, Column::Message).as_deref(), Some("line1"));
        assert_eq!(store.cell_text(1, Column::Message).as_deref(), Some("line2"));
        assert_eq!(store.cell_text(0, Column::Log).as_deref(), Some("COM7"));
        let first = store.event(0).unwrap();
        let second = store.event(1).unwrap();
        assert_eq!(first.timestamp, second.timestamp);
        assert!(annotations.len() >= 2);
    }

    #[tokio::test]
    async fn test_cancel_releases_the_device() {
        let (device, mut remote) = tokio::io::duplex(64);
        let store = MemoryTraceStore::new();
        let opener = DuplexOpener {
            devices: Mutex::new(vec![device]),
            opens: Arc::new(AtomicUsize::new(0)),
        };
        let bridge = IngestionBridge::new(
            opener,
            fast_config("/dev/ttyUSB1"),
            Arc::new(store.clone()),
            Arc::new(RowAnnotationStore::new()),
        );
        let cancel = CancellationToken::new();
        let task = tokio::spawn(bridge.run(cancel.clone()));

        remote.write_all(b"ready\n").await.unwrap();
        wait_for_rows(&store, 1).await;
        assert_eq!(store.row_count(), 1);

        cancel.cancel();
        task.await.unwrap();

        // the bridge's end is gone, so the peer can no longer write
        assert!(remote.write_all(b"late\n").await.is_err());
    }

    #[tokio::test]
    async fn test_closed_device_reports_and_reconnects() {
        let (first, remote_first) = tokio::io::duplex(64);
        let (second, mut remote_second) = tokio::io::duplex(64);
        let store = MemoryTraceStore::new();
        let opens = Arc::new(AtomicUsize::new(0));
        let opener = DuplexOpener {
            // popped from the back
            devices: Mutex::new(vec![second, first]),
            opens: Arc::clone(&opens),
        };
        let bridge = IngestionBridge::new(
            opener,
            fast_config("/dev/ttyACM0"),
            Arc::new(store.clone()),
            Arc::new(RowAnnotationStore::new()),
        );
        let cancel = CancellationToken::new();
        let task = tokio::spawn(bridge.run(cancel.clone()));

        drop(remote_first);
        wait_for_rows(&store, 1).await;
        remote_second.write_all(b"after\n").await.unwrap();
        wait_for_rows(&store, 2).await;
        cancel.cancel();
        task.await.unwrap();

        let diagnostic = store.cell_text(0, Column::Message).unwrap_or_default();
        assert!(diagnostic.contains("closed"));
        assert_eq!(store.cell_text(1, Column::Message).as_deref(), Some("after"));
        assert!(opens.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test]
    async fn test_open_failures_retry_until_cancelled() {
        let store = MemoryTraceStore::new();
        let opens = Arc::new(AtomicUsize::new(0));
        let opener = DuplexOpener {
            devices: Mutex::new(Vec::new()),
            opens: Arc::clone(&opens),
        };
        let bridge = IngestionBridge::new(
            opener,
            fast_config("COM9"),
            Arc::new(store.clone()),
            Arc::new(RowAnnotationStore::new()),
        );
        let cancel = CancellationToken::new();
        let task = tokio::spawn(bridge.run(cancel.clone()));

        for _ in 0..200 {
            if opens.load(Ordering::SeqCst) >= 3 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .expect("bridge did not stop")
            .unwrap();

        assert!(opens.load(Ordering::SeqCst) >= 3);
        // no repeat row before OPEN_FAILURE_REPEAT attempts
        assert_eq!(store.row_count(), 1);
    }

    #[tokio::test]
    async fn test_open_failures_repeat_a_diagnostic_periodically() {
        let store = MemoryTraceStore::new();
        let opens = Arc::new(AtomicUsize::new(0));
        let opener = DuplexOpener {
            devices: Mutex::new(Vec::new()),
            opens: Arc::clone(&opens),
        };
        let config = BridgeConfig {
            reconnect_backoff: Duration::from_millis(1),
            ..fast_config("COM2")
        };
        let bridge = IngestionBridge::new(
            opener,
            config,
            Arc::new(store.clone()),
            Arc::new(RowAnnotationStore::new()),
        );
        let cancel = CancellationToken::new();
        let task = tokio::spawn(bridge.run(cancel.clone()));

        let wanted = OPEN_FAILURE_REPEAT as usize + 1;
        for _ in 0..1000 {
            if opens.load(Ordering::SeqCst) >= wanted {
                break;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        cancel.cancel();
        task.await.unwrap();

        let attempts = opens.load(Ordering::SeqCst);
        assert!(attempts >= wanted);
        assert_eq!(store.row_count(), 1 + (attempts - 1) / OPEN_FAILURE_REPEAT as usize);
        let repeated = store.cell_text(1, Column::Message).unwrap_or_default();
        assert!(repeated.contains("after 21 attempts"));
    }
}
