use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tokio::sync::mpsc;

use super::extract::ThumbnailExtractor;
use super::media::{MediaItem, THUMBNAIL_HEIGHT, THUMBNAIL_WIDTH};
use super::queue::JobQueue;
use super::rendezvous::Rendezvous;

/// Messages the worker posts to the consumer's message loop.
///
/// Delivery is fire-and-forget, except that every `ItemUpdated` must be
/// answered by arriving at the shared rendezvous barrier once the consumer
/// has finished with the published item.
#[derive(Debug, Clone)]
pub enum UiMessage {
    ShowProgress,
    HideProgress,
    SetStatusText {
        text: String,
        count: usize,
        total: usize,
    },
    ItemUpdated(MediaItem),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThumbnailerConfig {
    pub width: u32,
    pub height: u32,
    /// Prefix of the status line, completed with the current file name.
    pub status_prefix: String,
}

impl Default for ThumbnailerConfig {
    fn default() -> Self {
        Self {
            width: THUMBNAIL_WIDTH,
            height: THUMBNAIL_HEIGHT,
            status_prefix: "Thumbnail".to_string(),
        }
    }
}

/// Background thumbnail pipeline.
///
/// A single worker thread drains the job queue in FIFO order, extracts one
/// thumbnail at a time and publishes each result to the consumer, then
/// blocks until the barrier acknowledgment before taking the next job. At
/// most one item is in flight at any moment.
pub struct ThumbnailerService {
    queue: Arc<JobQueue>,
    barrier: Arc<Rendezvous>,
    worker: Option<JoinHandle<()>>,
}

impl ThumbnailerService {
    /// Start the worker thread. `ui` is the consumer's message channel.
    pub fn spawn(
        extractor: Arc<dyn ThumbnailExtractor>,
        ui: mpsc::UnboundedSender<UiMessage>,
        config: ThumbnailerConfig,
    ) -> Self {
        let queue = Arc::new(JobQueue::new());
        let barrier = Arc::new(Rendezvous::new());
        let worker = {
            let queue = Arc::clone(&queue);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || run_worker(queue, barrier, extractor, ui, config))
        };

        Self {
            queue,
            barrier,
            worker: Some(worker),
        }
    }

    /// Queue a thumbnail job. Never fails; duplicates are processed again.
    pub fn add_job(&self, item: MediaItem) {
        self.queue.add_job(item);
    }

    /// Drop all pending jobs and reset the progress epoch. A job the worker
    /// has already taken still completes.
    pub fn clear_jobs(&self) {
        self.queue.clear_jobs();
    }

    /// Number of jobs still waiting for the worker.
    pub fn pending(&self) -> usize {
        self.queue.pending()
    }

    /// Barrier the consumer must arrive at after each `ItemUpdated`.
    pub fn barrier(&self) -> Arc<Rendezvous> {
        Arc::clone(&self.barrier)
    }

    /// Ask the worker to exit at its next blocking point and wait for it.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.queue.close();
        self.barrier.break_barrier();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("thumbnailer worker panicked");
            }
        }
    }
}

impl Drop for ThumbnailerService {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_worker(
    queue: Arc<JobQueue>,
    barrier: Arc<Rendezvous>,
    extractor: Arc<dyn ThumbnailExtractor>,
    ui: mpsc::UnboundedSender<UiMessage>,
    config: ThumbnailerConfig,
) {
    // Jobs serviced since the worker started; never reset by clear_jobs.
    let mut count = 0usize;
    log::info!("thumbnailer worker started");

    loop {
        let popped = queue.pop_blocking(|| {
            // Idle: the browser hides its progress indicator and status
            // line until new jobs arrive.
            let _ = ui.send(UiMessage::HideProgress);
            let _ = ui.send(UiMessage::SetStatusText {
                text: String::new(),
                count: 0,
                total: 0,
            });
        });
        let Some((mut item, total)) = popped else {
            break;
        };

        let _ = ui.send(UiMessage::ShowProgress);
        let _ = ui.send(UiMessage::SetStatusText {
            text: format!("{} {}", config.status_prefix, item.file_name),
            count,
            total,
        });
        count += 1;

        let Some(thumbnail) = extractor.extract(&item.path, config.width, config.height) else {
            // No thumbnail for this item; move straight on to the next job.
            log::debug!("no thumbnail for {}", item.path.display());
            continue;
        };

        item.set_thumbnail(thumbnail);
        if ui.send(UiMessage::ItemUpdated(item)).is_err() {
            // Consumer is gone, nothing left to publish to.
            break;
        }

        // Wait for the consumer to finish with the published item before
        // starting the next one.
        if barrier.arrive().is_err() {
            break;
        }
    }

    log::info!("thumbnailer worker stopped after {} job(s)", count);
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;
    use std::path::Path;
    use std::time::Duration;

    struct FakeExtractor {
        fail: Vec<&'static str>,
    }

    impl FakeExtractor {
        fn ok() -> Self {
            Self { fail: Vec::new() }
        }

        fn failing_for(names: &[&'static str]) -> Self {
            Self {
                fail: names.to_vec(),
            }
        }
    }

    impl ThumbnailExtractor for FakeExtractor {
        fn extract(&self, path: &Path, width: u32, height: u32) -> Option<RgbaImage> {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            if self.fail.iter().any(|f| *f == name) {
                None
            } else {
                Some(RgbaImage::new(width, height))
            }
        }
    }

    #[test]
    fn test_skips_failed_extractions_and_reports_epoch_totals() {
        // Drive the loop directly over a pre-filled queue so both jobs are
        // visible in the first epoch snapshot.
        let queue = Arc::new(JobQueue::new());
        queue.add_job(MediaItem::new("/videos/a.mp4"));
        queue.add_job(MediaItem::new("/videos/b.mp4"));
        let barrier = Arc::new(Rendezvous::new());
        let (tx, mut rx) = mpsc::unbounded_channel();

        let worker = {
            let queue = Arc::clone(&queue);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                run_worker(
                    queue,
                    barrier,
                    Arc::new(FakeExtractor::failing_for(&["b.mp4"])),
                    tx,
                    ThumbnailerConfig::default(),
                )
            })
        };

        let mut statuses = Vec::new();
        let mut published = Vec::new();
        while let Some(message) = rx.blocking_recv() {
            match message {
                UiMessage::SetStatusText { text, count, total } if !text.is_empty() => {
                    statuses.push((text, count, total));
                }
                UiMessage::ItemUpdated(item) => {
                    published.push(item);
                    barrier.arrive().unwrap();
                }
                UiMessage::HideProgress if statuses.len() == 2 => break,
                _ => {}
            }
        }

        assert_eq!(
            statuses,
            vec![
                ("Thumbnail a.mp4".to_string(), 0, 2),
                ("Thumbnail b.mp4".to_string(), 1, 2),
            ]
        );
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].file_name, "a.mp4");
        let thumbnail = published[0].thumbnail().unwrap();
        assert_eq!(thumbnail.dimensions(), (120, 120));

        queue.close();
        barrier.break_barrier();
        worker.join().unwrap();
    }

    #[test]
    fn test_processes_jobs_in_submission_order() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let service = ThumbnailerService::spawn(
            Arc::new(FakeExtractor::ok()),
            tx,
            ThumbnailerConfig::default(),
        );
        let barrier = service.barrier();
        for i in 0..5 {
            service.add_job(MediaItem::new(format!("/videos/clip-{i}.mp4")));
        }

        let mut published = Vec::new();
        while published.len() < 5 {
            if let UiMessage::ItemUpdated(item) = rx.blocking_recv().unwrap() {
                published.push(item.file_name.clone());
                barrier.arrive().unwrap();
            }
        }

        let expected: Vec<String> = (0..5).map(|i| format!("clip-{i}.mp4")).collect();
        assert_eq!(published, expected);
        service.stop();
    }

    #[test]
    fn test_clear_starts_new_epoch() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let service = ThumbnailerService::spawn(
            Arc::new(FakeExtractor::ok()),
            tx,
            ThumbnailerConfig::default(),
        );
        let barrier = service.barrier();

        service.clear_jobs();
        service.add_job(MediaItem::new("/videos/x.mp4"));

        loop {
            match rx.blocking_recv().unwrap() {
                UiMessage::SetStatusText { text, count, total } if !text.is_empty() => {
                    assert_eq!(text, "Thumbnail x.mp4");
                    assert_eq!(count, 0);
                    assert_eq!(total, 1);
                    break;
                }
                UiMessage::ItemUpdated(_) => {
                    barrier.arrive().unwrap();
                }
                _ => {}
            }
        }
        service.stop();
    }

    #[test]
    fn test_waits_for_ack_before_next_job() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let service = ThumbnailerService::spawn(
            Arc::new(FakeExtractor::ok()),
            tx,
            ThumbnailerConfig::default(),
        );
        let barrier = service.barrier();
        service.add_job(MediaItem::new("/videos/first.mp4"));
        service.add_job(MediaItem::new("/videos/second.mp4"));

        // Run up to the first publication without acknowledging it.
        loop {
            if let UiMessage::ItemUpdated(item) = rx.blocking_recv().unwrap() {
                assert_eq!(item.file_name, "first.mp4");
                break;
            }
        }

        // The worker must make no progress on the second job until the
        // barrier is acknowledged.
        thread::sleep(Duration::from_millis(100));
        assert!(matches!(
            rx.try_recv(),
            Err(mpsc::error::TryRecvError::Empty)
        ));

        barrier.arrive().unwrap();
        loop {
            if let UiMessage::ItemUpdated(item) = rx.blocking_recv().unwrap() {
                assert_eq!(item.file_name, "second.mp4");
                barrier.arrive().unwrap();
                break;
            }
        }
        service.stop();
    }

    #[test]
    fn test_stop_terminates_worker_blocked_on_empty_queue() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let service = ThumbnailerService::spawn(
            Arc::new(FakeExtractor::ok()),
            tx,
            ThumbnailerConfig::default(),
        );

        // Wait until the worker reports idle, so it is parked on the queue.
        loop {
            if matches!(rx.blocking_recv().unwrap(), UiMessage::HideProgress) {
                break;
            }
        }

        // Joins the worker; a missed close signal would hang the test here.
        service.stop();

        // Nothing beyond idle notifications was ever sent.
        while let Ok(message) = rx.try_recv() {
            match message {
                UiMessage::HideProgress => {}
                UiMessage::SetStatusText { text, .. } => assert!(text.is_empty()),
                other => panic!("unexpected message after stop: {:?}", other),
            }
        }
    }

    #[test]
    fn test_consumer_teardown_stops_worker_at_publish() {
        let queue = Arc::new(JobQueue::new());
        queue.add_job(MediaItem::new("/videos/orphan.mp4"));
        let barrier = Arc::new(Rendezvous::new());
        let (tx, rx) = mpsc::unbounded_channel::<UiMessage>();
        drop(rx);

        let worker = {
            let queue = Arc::clone(&queue);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                run_worker(
                    queue,
                    barrier,
                    Arc::new(FakeExtractor::ok()),
                    tx,
                    ThumbnailerConfig::default(),
                )
            })
        };

        // The failed publish must end the loop without any barrier wait.
        worker.join().unwrap();
    }
}
