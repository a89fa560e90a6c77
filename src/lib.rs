//! Streaming importer for KML GPS-track documents with `gx:` track
//! extensions, as written by OpenTracks/MyTracks.
//!
//! [`import_kml`] drives a push-based element dispatcher over the document
//! and streams normalized entities (tracks, segments, points, waypoints)
//! into a caller-supplied [`sink::TrackImportSink`]. Per-channel extended
//! data (speed, heart rate, cadence, power, elevation gain) arrives in the
//! document separately from the position samples and is fused onto the
//! points of each segment by index.

pub mod error;
pub mod export;
pub mod importer;
pub mod sink;
pub mod types;

pub use error::{ImportError, SinkError};
pub use importer::import_kml;
pub use sink::{PassthroughPhotoResolver, PhotoUrlResolver, TrackImportSink};
pub use types::{ChannelKind, Position, Track, TrackPoint, TrackSegment, Waypoint};
