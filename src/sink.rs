use crate::error::SinkError;
use crate::types::{Track, TrackPoint, Waypoint};

/// Receiver of finished entities. The importer calls these synchronously
/// and in document order:
///
/// - `on_track_start` once per multi-track open
/// - `on_track_segment_start` once per segment open
/// - `insert_track_point` once per fused point, in order
/// - `on_track_segment_end` when the segment closes
/// - `on_track_end` with the finalized track metadata
/// - `add_waypoint` zero or one time per marker element
/// - `on_file_end` exactly once, at document close
///
/// The sink may perform I/O; a failing call aborts the import and no
/// further calls are made.
pub trait TrackImportSink {
    fn on_track_start(&mut self) -> Result<(), SinkError>;
    fn on_track_segment_start(&mut self) -> Result<(), SinkError>;
    fn insert_track_point(&mut self, point: TrackPoint) -> Result<(), SinkError>;
    fn on_track_segment_end(&mut self) -> Result<(), SinkError>;
    fn on_track_end(&mut self, track: Track) -> Result<(), SinkError>;
    fn add_waypoint(&mut self, waypoint: Waypoint) -> Result<(), SinkError>;
    fn on_file_end(&mut self) -> Result<(), SinkError>;
}

/// Translates a photo href as written in the document (a path relative to
/// the containing archive) into a path the caller can actually open.
/// Returning `None` leaves the waypoint without a photo.
pub trait PhotoUrlResolver {
    fn resolve_photo_url(&self, href: &str) -> Option<String>;
}

/// Resolver for documents that carry no photo archive: hrefs pass through
/// unchanged.
pub struct PassthroughPhotoResolver;

impl PhotoUrlResolver for PassthroughPhotoResolver {
    fn resolve_photo_url(&self, href: &str) -> Option<String> {
        Some(href.to_string())
    }
}
