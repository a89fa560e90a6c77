use std::path::{Path, PathBuf};

/// Reasons a track export can fail, reported after the fact through
/// [`TrackExporter::error_code`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportErrorCode {
    DirectoryNotWritable,
    TrackUnavailable,
    WriteFailed,
}

/// Progress callback for an export run: (locations written so far, total
/// locations), for completion-percentage display.
pub type ProgressListener = Box<dyn FnMut(usize, usize) + Send>;

/// The export side of the importer's entity contract. The importer only
/// consumes documents; implementations of this trait produce them, and
/// callers drive both through the same entity types.
///
/// `write_track` blocks until the export finishes or is stopped. A stop
/// requested through `stop_write` is cooperative: the writer observes it
/// between location writes, never mid-write.
pub trait TrackExporter {
    /// Override the directory the output file is created in.
    fn set_directory(&mut self, directory: PathBuf);

    /// Register a listener invoked after each location write.
    fn set_progress_listener(&mut self, listener: ProgressListener);

    /// Absolute path of the produced file, once created.
    fn absolute_path(&self) -> Option<&Path>;

    /// Write the track out. Blocking.
    fn write_track(&mut self);

    /// Request that an in-progress write stop at the next location
    /// boundary.
    fn stop_write(&mut self);

    /// Whether the last `write_track` ran to completion.
    fn was_success(&self) -> bool;

    fn error_code(&self) -> Option<ExportErrorCode>;
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal exporter standing in for a real document writer, to pin
    /// down the contract: progress per location, cooperative stop between
    /// locations, post-hoc success flag.
    struct CountingExporter {
        locations: usize,
        directory: Option<PathBuf>,
        path: Option<PathBuf>,
        listener: Option<ProgressListener>,
        stop_requested: bool,
        success: bool,
        error: Option<ExportErrorCode>,
        written: usize,
    }

    impl CountingExporter {
        fn new(locations: usize) -> Self {
            Self {
                locations,
                directory: None,
                path: None,
                listener: None,
                stop_requested: false,
                success: false,
                error: None,
                written: 0,
            }
        }
    }

    impl TrackExporter for CountingExporter {
        fn set_directory(&mut self, directory: PathBuf) {
            self.directory = Some(directory);
        }

        fn set_progress_listener(&mut self, listener: ProgressListener) {
            self.listener = Some(listener);
        }

        fn absolute_path(&self) -> Option<&Path> {
            self.path.as_deref()
        }

        fn write_track(&mut self) {
            let Some(dir) = self.directory.clone() else {
                self.error = Some(ExportErrorCode::DirectoryNotWritable);
                return;
            };
            self.path = Some(dir.join("track.kml"));
            for i in 0..self.locations {
                if self.stop_requested {
                    return;
                }
                self.written = i + 1;
                if let Some(listener) = self.listener.as_mut() {
                    listener(i + 1, self.locations);
                }
            }
            self.success = true;
        }

        fn stop_write(&mut self) {
            self.stop_requested = true;
        }

        fn was_success(&self) -> bool {
            self.success
        }

        fn error_code(&self) -> Option<ExportErrorCode> {
            self.error
        }
    }

    #[test]
    fn test_progress_pairs_reach_total() {
        use std::sync::{Arc, Mutex};

        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_in_listener = Arc::clone(&seen);

        let mut exporter = CountingExporter::new(3);
        exporter.set_directory(PathBuf::from("/tmp/export"));
        exporter.set_progress_listener(Box::new(move |current, total| {
            seen_in_listener.lock().unwrap().push((current, total));
        }));
        exporter.write_track();

        assert!(exporter.was_success());
        assert_eq!(exporter.error_code(), None);
        assert_eq!(*seen.lock().unwrap(), vec![(1, 3), (2, 3), (3, 3)]);
        assert_eq!(
            exporter.absolute_path(),
            Some(Path::new("/tmp/export/track.kml"))
        );
    }

    #[test]
    fn test_stop_before_write_is_observed() {
        let mut exporter = CountingExporter::new(10);
        exporter.set_directory(PathBuf::from("/tmp/export"));
        exporter.stop_write();
        exporter.write_track();

        assert!(!exporter.was_success());
        assert_eq!(exporter.written, 0);
    }

    #[test]
    fn test_missing_directory_reports_error_code() {
        let mut exporter = CountingExporter::new(1);
        exporter.write_track();

        assert!(!exporter.was_success());
        assert_eq!(
            exporter.error_code(),
            Some(ExportErrorCode::DirectoryNotWritable)
        );
    }
}
