//! Concurrency tests for RasterSource with mock openers and decoders.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use raster_access::{
    PixelWindow, RasterDecoder, RasterError, RasterMetadata, RasterOpener, RasterSource,
    RasterSourceConfig, Result,
};

fn test_metadata() -> RasterMetadata {
    RasterMetadata {
        origin: (0.0, 5.0),
        resolution: (1.0, -1.0),
        width: 5,
        height: 5,
        fill_value: f32::NAN,
    }
}

/// Decoder that records overlapping reads instead of tolerating them.
struct ReentrancyCheckingDecoder {
    metadata: RasterMetadata,
    in_progress: AtomicBool,
    violations: AtomicUsize,
    calls: AtomicUsize,
    fail_call: Option<usize>,
}

impl ReentrancyCheckingDecoder {
    fn new(fail_call: Option<usize>) -> Self {
        Self {
            metadata: test_metadata(),
            in_progress: AtomicBool::new(false),
            violations: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
            fail_call,
        }
    }
}

#[async_trait]
impl RasterDecoder for ReentrancyCheckingDecoder {
    fn metadata(&self) -> &RasterMetadata {
        &self.metadata
    }

    async fn read_window(&self, window: &PixelWindow) -> Result<Vec<f32>> {
        if self.in_progress.swap(true, Ordering::SeqCst) {
            self.violations.fetch_add(1, Ordering::SeqCst);
            return Err(RasterError::decode_failure("read already in progress"));
        }

        // Yield to the scheduler so an unserialized caller would overlap here.
        tokio::time::sleep(Duration::from_millis(10)).await;

        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.in_progress.store(false, Ordering::SeqCst);

        if self.fail_call == Some(call) {
            return Err(RasterError::decode_failure("injected failure"));
        }
        Ok(vec![call as f32; window.len()])
    }
}

/// Opener handing out a shared decoder, counting opens, optionally failing
/// the first N attempts.
struct CountingOpener {
    decoder: Arc<ReentrancyCheckingDecoder>,
    opens: Arc<AtomicUsize>,
    fail_first: usize,
    delay: Duration,
}

#[async_trait]
impl RasterOpener for CountingOpener {
    async fn open(&self) -> Result<Arc<dyn RasterDecoder>> {
        let n = self.opens.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        if n < self.fail_first {
            return Err(RasterError::decode_failure("corrupt header"));
        }
        Ok(self.decoder.clone())
    }
}

fn source_with(
    decoder: Arc<ReentrancyCheckingDecoder>,
    fail_first: usize,
) -> (Arc<RasterSource>, Arc<AtomicUsize>) {
    let opens = Arc::new(AtomicUsize::new(0));
    let source = RasterSource::with_opener(CountingOpener {
        decoder,
        opens: opens.clone(),
        fail_first,
        delay: Duration::from_millis(20),
    });
    (Arc::new(source), opens)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_reads_never_overlap() {
    let decoder = Arc::new(ReentrancyCheckingDecoder::new(None));
    let (source, _) = source_with(decoder.clone(), 0);
    let handle = source.acquire().await.unwrap();

    let tasks: Vec<_> = (0..5)
        .map(|_| {
            let source = source.clone();
            let handle = handle.clone();
            tokio::spawn(async move {
                source
                    .read_window(&handle, Some(PixelWindow::new(0, 0, 1, 1)))
                    .await
            })
        })
        .collect();

    for task in tasks {
        let window = task.await.unwrap().unwrap();
        assert_eq!(window.len(), 4);
    }

    assert_eq!(decoder.violations.load(Ordering::SeqCst), 0);
    assert_eq!(decoder.calls.load(Ordering::SeqCst), 5);
    assert_eq!(source.read_count(), 5);
}

#[tokio::test]
async fn test_reads_are_served_in_submission_order() {
    let decoder = Arc::new(ReentrancyCheckingDecoder::new(None));
    let (source, _) = source_with(decoder, 0);
    let handle = source.acquire().await.unwrap();

    // join_all polls in order, so lock requests are queued 0..5.
    let reads = (0..5).map(|_| source.read_window(&handle, Some(PixelWindow::new(0, 0, 0, 0))));
    let results = futures::future::join_all(reads).await;

    let order: Vec<f32> = results.into_iter().map(|r| r.unwrap().data[0]).collect();
    assert_eq!(order, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
}

#[tokio::test]
async fn test_failed_read_does_not_break_queue() {
    let decoder = Arc::new(ReentrancyCheckingDecoder::new(Some(2)));
    let (source, _) = source_with(decoder.clone(), 0);
    let handle = source.acquire().await.unwrap();

    let reads = (0..5).map(|_| source.read_window(&handle, Some(PixelWindow::new(0, 0, 0, 0))));
    let results = futures::future::join_all(reads).await;

    for (i, result) in results.iter().enumerate() {
        if i == 2 {
            assert!(matches!(result, Err(RasterError::DecodeFailure(_))));
        } else {
            assert_eq!(result.as_ref().unwrap().data[0], i as f32);
        }
    }
    assert_eq!(decoder.violations.load(Ordering::SeqCst), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_acquire_opens_once() {
    let decoder = Arc::new(ReentrancyCheckingDecoder::new(None));
    let (source, opens) = source_with(decoder, 0);

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let source = source.clone();
            tokio::spawn(async move { source.acquire().await })
        })
        .collect();

    for task in tasks {
        let handle = task.await.unwrap().unwrap();
        assert_eq!(handle.metadata().width, 5);
    }

    assert_eq!(opens.load(Ordering::SeqCst), 1);
    assert!(source.is_open());
}

#[tokio::test]
async fn test_failed_open_can_be_retried() {
    let decoder = Arc::new(ReentrancyCheckingDecoder::new(None));
    let (source, opens) = source_with(decoder, 1);

    let first = source.acquire().await;
    assert!(matches!(first, Err(RasterError::DecodeFailure(_))));
    assert!(!source.is_open());

    let second = source.acquire().await;
    assert!(second.is_ok());

    // Cached afterwards.
    source.acquire().await.unwrap();
    assert_eq!(opens.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_empty_window_skips_decoder() {
    let decoder = Arc::new(ReentrancyCheckingDecoder::new(None));
    let (source, _) = source_with(decoder.clone(), 0);
    let handle = source.acquire().await.unwrap();

    let window = source.read_window(&handle, None).await.unwrap();
    assert!(window.is_empty());
    assert_eq!(decoder.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_no_source_configured_is_unavailable() {
    let source = RasterSource::new(RasterSourceConfig::default());
    let err = source.acquire().await.unwrap_err();

    match err {
        RasterError::DataUnavailable(msg) => {
            assert!(msg.contains("Download a local copy"));
            assert!(msg.contains("remote URL"));
        }
        other => panic!("expected DataUnavailable, got {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_local_path_is_unavailable() {
    let source = RasterSource::new(RasterSourceConfig::local("/nonexistent/population.zarr"));
    let err = source.acquire().await.unwrap_err();
    assert!(matches!(err, RasterError::DataUnavailable(ref m) if m.contains("does not exist")));
}
