//! Thumbnail generation.
//!
//! Stage 4 of the inventory pipeline. Every discovered photo gets a reduced
//! copy under the thumbnail directory, mirroring the source layout:
//!
//! ```text
//! photos/A78/IMG_0001.jpg   (4032x3024)
//! resized/A78/IMG_0001.jpg  (800x600, JPEG quality 85)
//! ```
//!
//! ## Rules
//!
//! - The longer edge is scaled down to 800px; smaller images keep their size.
//! - The thumbnail keeps the source format (JPEG, PNG or GIF).
//! - An existing thumbnail is never touched, whatever its age or content.
//!   Re-running after an interruption only fills in what is missing.
//! - A source that cannot be decoded is reported and skipped; the rest of the
//!   batch carries on.
//! - A thumbnail is encoded into a temporary file next to its destination and
//!   moved into place without overwriting, so a half-written thumbnail is
//!   never visible.
//!
//! ## Parallel Processing
//!
//! Images are processed in parallel on a dedicated [rayon](https://docs.rs/rayon)
//! pool sized by the caller. Progress is reported per photo directory through
//! an optional [`ProcessEvent`] channel.

use crate::atomic::temp_file_for;
use crate::imaging::{BackendError, ImageBackend, RustBackend, ThumbnailConfig, create_thumbnail};
use crate::types::Container;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Image processing failed: {0}")]
    Imaging(#[from] BackendError),
    #[error("Cannot start worker pool: {0}")]
    ThreadPool(String),
}

/// One source image whose thumbnail should exist.
#[derive(Debug, Clone, PartialEq)]
pub struct ThumbnailJob {
    /// Photo directory name, used to group progress output.
    pub dir: String,
    /// Source path relative to the document directory, for display.
    pub source_path: String,
    pub source: PathBuf,
    pub dest: PathBuf,
}

/// Outcome for a single image.
#[derive(Debug, Clone, PartialEq)]
pub enum ThumbnailStatus {
    /// Destination already present; left untouched.
    Existing,
    Created { width: u32, height: u32 },
    Failed(String),
}

/// Progress events, sent in processing order.
#[derive(Debug, Clone)]
pub enum ProcessEvent {
    DirectoryStarted {
        dir: String,
        image_count: usize,
    },
    ThumbnailDone {
        index: usize,
        source_path: String,
        status: ThumbnailStatus,
    },
}

/// Counts of thumbnail outcomes for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ThumbnailStats {
    pub created: u32,
    pub existing: u32,
    pub failed: u32,
}

impl ThumbnailStats {
    pub fn record(&mut self, status: &ThumbnailStatus) {
        match status {
            ThumbnailStatus::Existing => self.existing += 1,
            ThumbnailStatus::Created { .. } => self.created += 1,
            ThumbnailStatus::Failed(_) => self.failed += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.created + self.existing + self.failed
    }
}

impl fmt::Display for ThumbnailStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.existing > 0 || self.failed > 0 {
            if self.failed > 0 {
                write!(
                    f,
                    "{} existing, {} created, {} failed ({} total)",
                    self.existing,
                    self.created,
                    self.failed,
                    self.total()
                )
            } else {
                write!(
                    f,
                    "{} existing, {} created ({} total)",
                    self.existing,
                    self.created,
                    self.total()
                )
            }
        } else {
            write!(f, "{} created", self.created)
        }
    }
}

/// Collect one job per distinct source image across all containers.
///
/// Containers sharing a photo directory share its images, so each file is
/// planned once. Jobs come back sorted by source path.
pub fn plan_jobs(containers: &[Container], base: &Path) -> Vec<ThumbnailJob> {
    let mut jobs: BTreeMap<&str, ThumbnailJob> = BTreeMap::new();
    for container in containers {
        for image in &container.images {
            jobs.entry(image.source_path.as_str())
                .or_insert_with(|| ThumbnailJob {
                    dir: container.photos_dir.clone(),
                    source_path: image.source_path.clone(),
                    source: base.join(&image.source_path),
                    dest: base.join(&image.thumbnail_path),
                });
        }
    }
    jobs.into_values().collect()
}

/// Create every missing thumbnail with the pure Rust backend.
pub fn generate_thumbnails(
    jobs: &[ThumbnailJob],
    threads: usize,
    events: Option<Sender<ProcessEvent>>,
) -> Result<ThumbnailStats, ProcessError> {
    let backend = RustBackend::new();
    generate_thumbnails_with_backend(&backend, jobs, threads, events)
}

/// Create every missing thumbnail using a specific backend (allows testing with mock).
///
/// Per-image failures are counted, never returned; the only error is failing
/// to start the worker pool.
pub fn generate_thumbnails_with_backend(
    backend: &impl ImageBackend,
    jobs: &[ThumbnailJob],
    threads: usize,
    events: Option<Sender<ProcessEvent>>,
) -> Result<ThumbnailStats, ProcessError> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads.max(1))
        .build()
        .map_err(|e| ProcessError::ThreadPool(e.to_string()))?;

    let config = ThumbnailConfig::default();
    let mut by_dir: BTreeMap<&str, Vec<&ThumbnailJob>> = BTreeMap::new();
    for job in jobs {
        by_dir.entry(job.dir.as_str()).or_default().push(job);
    }

    let send = |event: ProcessEvent| {
        if let Some(tx) = &events {
            // Receiver gone means nobody is listening; keep working.
            let _ = tx.send(event);
        }
    };

    let mut stats = ThumbnailStats::default();
    for (dir, dir_jobs) in by_dir {
        send(ProcessEvent::DirectoryStarted {
            dir: dir.to_string(),
            image_count: dir_jobs.len(),
        });

        let statuses: Vec<ThumbnailStatus> = pool.install(|| {
            dir_jobs
                .par_iter()
                .map(|job| match process_job(backend, job, &config) {
                    Ok(status) => status,
                    Err(e) => {
                        warn!(source = %job.source_path, error = %e, "thumbnail failed");
                        ThumbnailStatus::Failed(e.to_string())
                    }
                })
                .collect()
        });

        for (i, (job, status)) in dir_jobs.iter().zip(statuses).enumerate() {
            stats.record(&status);
            send(ProcessEvent::ThumbnailDone {
                index: i + 1,
                source_path: job.source_path.clone(),
                status,
            });
        }
    }

    info!(%stats, "thumbnails");
    Ok(stats)
}

fn process_job(
    backend: &impl ImageBackend,
    job: &ThumbnailJob,
    config: &ThumbnailConfig,
) -> Result<ThumbnailStatus, ProcessError> {
    if job.dest.exists() {
        return Ok(ThumbnailStatus::Existing);
    }

    let dest_dir = job
        .dest
        .parent()
        .ok_or_else(|| io::Error::other(format!("no parent: {}", job.dest.display())))?;
    std::fs::create_dir_all(dest_dir)?;

    let tmp = temp_file_for(&job.dest, dest_dir, ".thumb-")?;
    let dims = create_thumbnail(backend, &job.source, tmp.path(), config)?;

    match tmp.persist_noclobber(&job.dest) {
        Ok(_) => {
            debug!(
                dest = %job.dest.display(),
                width = dims.width,
                height = dims.height,
                "thumbnail created"
            );
            Ok(ThumbnailStatus::Created {
                width: dims.width,
                height: dims.height,
            })
        }
        // Another run finished this one first.
        Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => Ok(ThumbnailStatus::Existing),
        Err(e) => Err(e.error.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use crate::test_helpers::{container_with_images, touch, write_jpeg};
    use std::fs;
    use tempfile::TempDir;

    fn job(base: &Path, dir: &str, name: &str) -> ThumbnailJob {
        let source_path = format!("photos/{dir}/{name}");
        ThumbnailJob {
            dir: dir.to_string(),
            source: base.join(&source_path),
            dest: base.join(format!("resized/{dir}/{name}")),
            source_path,
        }
    }

    // =========================================================================
    // Stats
    // =========================================================================

    #[test]
    fn stats_display_created_only() {
        let s = ThumbnailStats {
            created: 3,
            ..Default::default()
        };
        assert_eq!(s.to_string(), "3 created");
    }

    #[test]
    fn stats_display_with_existing() {
        let s = ThumbnailStats {
            created: 2,
            existing: 5,
            failed: 0,
        };
        assert_eq!(s.to_string(), "5 existing, 2 created (7 total)");
    }

    #[test]
    fn stats_display_with_failures() {
        let s = ThumbnailStats {
            created: 1,
            existing: 1,
            failed: 1,
        };
        assert_eq!(s.to_string(), "1 existing, 1 created, 1 failed (3 total)");
    }

    // =========================================================================
    // Planning
    // =========================================================================

    #[test]
    fn shared_directory_planned_once_per_file() {
        let base = Path::new("/inv");
        let a = container_with_images("A78-1", "A78", &["1.jpg", "2.jpg"]);
        let b = container_with_images("A78-2", "A78", &["1.jpg", "2.jpg"]);
        let c = container_with_images("box", "box", &["x.png"]);

        let jobs = plan_jobs(&[a, b, c], base);
        let sources: Vec<&str> = jobs.iter().map(|j| j.source_path.as_str()).collect();
        assert_eq!(
            sources,
            vec!["photos/A78/1.jpg", "photos/A78/2.jpg", "photos/box/x.png"]
        );
        assert_eq!(jobs[0].dest, base.join("resized/A78/1.jpg"));
    }

    // =========================================================================
    // Generation (mock backend)
    // =========================================================================

    #[test]
    fn creates_missing_thumbnails() {
        let tmp = TempDir::new().unwrap();
        let jobs = vec![job(tmp.path(), "A", "1.jpg"), job(tmp.path(), "A", "2.jpg")];
        let backend = MockBackend::with_dimensions(4000, 3000);

        let stats = generate_thumbnails_with_backend(&backend, &jobs, 2, None).unwrap();

        assert_eq!(stats.created, 2);
        assert!(tmp.path().join("resized/A/1.jpg").exists());
        assert!(tmp.path().join("resized/A/2.jpg").exists());
        let thumbs = backend
            .get_operations()
            .into_iter()
            .filter(|op| matches!(op, RecordedOp::Thumbnail { width: 800, height: 600, .. }))
            .count();
        assert_eq!(thumbs, 2);
    }

    #[test]
    fn existing_thumbnail_is_left_alone() {
        let tmp = TempDir::new().unwrap();
        let j = job(tmp.path(), "A", "1.jpg");
        fs::create_dir_all(j.dest.parent().unwrap()).unwrap();
        fs::write(&j.dest, b"stale but present").unwrap();
        let backend = MockBackend::with_dimensions(100, 100);

        let stats = generate_thumbnails_with_backend(&backend, &[j.clone()], 1, None).unwrap();

        assert_eq!(stats.existing, 1);
        assert_eq!(stats.created, 0);
        assert!(backend.get_operations().is_empty());
        assert_eq!(fs::read(&j.dest).unwrap(), b"stale but present");
    }

    #[test]
    fn failure_does_not_abort_batch() {
        let tmp = TempDir::new().unwrap();
        let jobs = vec![
            job(tmp.path(), "A", "bad.jpg"),
            job(tmp.path(), "A", "good.jpg"),
        ];
        let backend = MockBackend::with_dimensions(100, 100).failing_on("bad.jpg");

        let stats = generate_thumbnails_with_backend(&backend, &jobs, 2, None).unwrap();

        assert_eq!(stats.failed, 1);
        assert_eq!(stats.created, 1);
        assert!(!tmp.path().join("resized/A/bad.jpg").exists());
        assert!(tmp.path().join("resized/A/good.jpg").exists());
    }

    #[test]
    fn no_temporary_files_left_behind() {
        let tmp = TempDir::new().unwrap();
        let jobs = vec![job(tmp.path(), "A", "bad.jpg"), job(tmp.path(), "A", "ok.jpg")];
        let backend = MockBackend::with_dimensions(10, 10).failing_on("bad.jpg");

        generate_thumbnails_with_backend(&backend, &jobs, 1, None).unwrap();

        let names: Vec<String> = fs::read_dir(tmp.path().join("resized/A"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["ok.jpg"]);
    }

    #[test]
    fn events_grouped_by_directory() {
        let tmp = TempDir::new().unwrap();
        let jobs = vec![
            job(tmp.path(), "A", "1.jpg"),
            job(tmp.path(), "A", "2.jpg"),
            job(tmp.path(), "B", "1.jpg"),
        ];
        let backend = MockBackend::with_dimensions(10, 10);
        let (tx, rx) = std::sync::mpsc::channel();

        generate_thumbnails_with_backend(&backend, &jobs, 2, Some(tx)).unwrap();
        let events: Vec<ProcessEvent> = rx.iter().collect();

        assert_eq!(events.len(), 5);
        assert!(matches!(
            &events[0],
            ProcessEvent::DirectoryStarted { dir, image_count: 2 } if dir == "A"
        ));
        assert!(matches!(
            &events[2],
            ProcessEvent::ThumbnailDone { index: 2, source_path, .. } if source_path == "photos/A/2.jpg"
        ));
        assert!(matches!(
            &events[3],
            ProcessEvent::DirectoryStarted { dir, image_count: 1 } if dir == "B"
        ));
    }

    // =========================================================================
    // Generation (real backend)
    // =========================================================================

    #[test]
    fn real_backend_second_run_changes_nothing() {
        let tmp = TempDir::new().unwrap();
        write_jpeg(&tmp.path().join("photos/A/big.jpg"), 1600, 1200);
        touch(&tmp.path().join("photos/A/corrupt.jpg"));
        let jobs = vec![
            job(tmp.path(), "A", "big.jpg"),
            job(tmp.path(), "A", "corrupt.jpg"),
        ];

        let first = generate_thumbnails(&jobs, 2, None).unwrap();
        assert_eq!(first.created, 1);
        assert_eq!(first.failed, 1);

        let thumb = tmp.path().join("resized/A/big.jpg");
        assert_eq!(image::image_dimensions(&thumb).unwrap(), (800, 600));
        let modified = fs::metadata(&thumb).unwrap().modified().unwrap();

        let second = generate_thumbnails(&jobs, 2, None).unwrap();
        assert_eq!(second.existing, 1);
        assert_eq!(second.created, 0);
        assert_eq!(fs::metadata(&thumb).unwrap().modified().unwrap(), modified);
    }

    #[cfg(unix)]
    #[test]
    fn created_thumbnail_is_world_readable() {
        use std::os::unix::fs::PermissionsExt;
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::with_dimensions(1600, 1200);
        let j = job(tmp.path(), "A", "a.jpg");

        generate_thumbnails_with_backend(&backend, &[j.clone()], 1, None).unwrap();

        let mode = fs::metadata(&j.dest).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644, "mode {mode:o}");
    }
}
