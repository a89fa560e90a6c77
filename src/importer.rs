use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::{debug, warn};

use crate::error::ImportError;
use crate::sink::{PhotoUrlResolver, TrackImportSink};
use crate::types::{ChannelKind, Position, Track, TrackPoint, TrackSegment, Waypoint};

type Result<T> = std::result::Result<T, ImportError>;

/// Style reference that marks a standalone point of interest. Markers with
/// any other style (including the one wrapping a track) are not waypoints.
const WAYPOINT_STYLE_URL: &str = "#waypoint";

/// Import a KML document with gx track extensions, streaming the finished
/// entities into `sink`. Photo hrefs on waypoints are translated through
/// `photos` before emission.
///
/// One call processes one document end-to-end; a fatal error leaves the
/// sink in whatever state the last successful call put it in, and the
/// caller must treat the import as failed.
pub fn import_kml<S, P>(xml: &str, sink: &mut S, photos: &P) -> Result<()>
where
    S: TrackImportSink,
    P: PhotoUrlResolver,
{
    let mut reader = Reader::from_str(xml);
    let mut importer = KmlImporter::new(sink, photos);

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => importer.start_element(&e)?,
            Ok(Event::Empty(e)) => {
                let name = e.name().as_ref().to_vec();
                importer.start_element(&e)?;
                importer.end_element(&name)?;
            }
            Ok(Event::End(e)) => importer.end_element(e.name().as_ref())?,
            Ok(Event::Text(e)) => {
                importer.append_content(std::str::from_utf8(e.as_ref()).unwrap_or_default());
            }
            Ok(Event::CData(e)) => {
                importer.append_content(std::str::from_utf8(e.as_ref()).unwrap_or_default());
            }
            Ok(Event::GeneralRef(e)) => {
                // Character references (&#60; &#x3C;) and predefined entities
                if let Ok(Some(ch)) = e.resolve_char_ref() {
                    importer.push_char(ch);
                } else {
                    let name = std::str::from_utf8(e.as_ref()).unwrap_or_default();
                    match name {
                        "amp" => importer.push_char('&'),
                        "lt" => importer.push_char('<'),
                        "gt" => importer.push_char('>'),
                        "quot" => importer.push_char('"'),
                        "apos" => importer.push_char('\''),
                        _ => {}
                    }
                }
            }
            Ok(Event::Eof) => {
                importer.finish()?;
                break;
            }
            Err(e) => return Err(ImportError::XmlParse(e)),
            _ => {}
        }
    }

    Ok(())
}

/// The recognized element vocabulary. Anything else in the document is
/// passed over without effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    Kml,
    Placemark,
    PhotoOverlay,
    MultiTrack,
    TrackSegment,
    Coord,
    SimpleArrayData,
    GxValue,
    Coordinates,
    Name,
    TrackId,
    Description,
    Icon,
    Value,
    When,
    StyleUrl,
    Href,
}

impl Tag {
    /// Dispatch on the qualified tag name. `gx:value` and `value` are
    /// distinct tags with unrelated meanings, so the prefix matters.
    fn from_name(name: &[u8]) -> Option<Tag> {
        match name {
            b"kml" => Some(Tag::Kml),
            b"Placemark" => Some(Tag::Placemark),
            b"PhotoOverlay" => Some(Tag::PhotoOverlay),
            b"gx:MultiTrack" => Some(Tag::MultiTrack),
            b"gx:Track" => Some(Tag::TrackSegment),
            b"gx:coord" => Some(Tag::Coord),
            b"gx:SimpleArrayData" => Some(Tag::SimpleArrayData),
            b"gx:value" => Some(Tag::GxValue),
            b"coordinates" => Some(Tag::Coordinates),
            b"name" => Some(Tag::Name),
            b"opentracks:trackid" => Some(Tag::TrackId),
            b"description" => Some(Tag::Description),
            b"icon" => Some(Tag::Icon),
            b"value" => Some(Tag::Value),
            b"when" => Some(Tag::When),
            b"styleUrl" => Some(Tag::StyleUrl),
            b"href" => Some(Tag::Href),
            _ => None,
        }
    }
}

/// Nesting state of the dispatcher. Waypoint scratch is orthogonal: a
/// marker element may appear in any of these states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    InTrack,
    InSegment,
}

/// Scratch fields shared between waypoint and track assembly. A marker
/// element wraps both kinds of entity, so marker-open resets everything.
#[derive(Default)]
struct Scratch {
    name: Option<String>,
    uuid: Option<String>,
    description: Option<String>,
    icon: Option<String>,
    category: Option<String>,
    time: Option<String>,
    position: Option<Position>,
    style_url: Option<String>,
    photo_url: Option<String>,
}

struct KmlImporter<'a, S, P> {
    sink: &'a mut S,
    photos: &'a P,
    state: State,
    scratch: Scratch,
    content: String,
    segment: TrackSegment,
    channels: [Vec<f64>; ChannelKind::COUNT],
    current_channel: Option<String>,
    file_ended: bool,
}

impl<'a, S, P> KmlImporter<'a, S, P>
where
    S: TrackImportSink,
    P: PhotoUrlResolver,
{
    fn new(sink: &'a mut S, photos: &'a P) -> Self {
        Self {
            sink,
            photos,
            state: State::Idle,
            scratch: Scratch::default(),
            content: String::new(),
            segment: TrackSegment::default(),
            channels: Default::default(),
            current_channel: None,
            file_ended: false,
        }
    }

    fn append_content(&mut self, text: &str) {
        self.content.push_str(text);
    }

    fn push_char(&mut self, ch: char) {
        self.content.push(ch);
    }

    fn start_element(&mut self, e: &BytesStart<'_>) -> Result<()> {
        match Tag::from_name(e.name().as_ref()) {
            Some(Tag::Placemark) | Some(Tag::PhotoOverlay) => self.on_marker_start(),
            Some(Tag::MultiTrack) => self.on_track_start()?,
            Some(Tag::TrackSegment) => self.on_segment_start()?,
            Some(Tag::SimpleArrayData) => self.on_channel_start(e)?,
            _ => {}
        }
        Ok(())
    }

    fn end_element(&mut self, name: &[u8]) -> Result<()> {
        match Tag::from_name(name) {
            Some(Tag::Kml) => self.on_file_end()?,
            Some(Tag::Placemark) | Some(Tag::PhotoOverlay) => self.on_marker_end()?,
            Some(Tag::MultiTrack) => self.on_track_end()?,
            Some(Tag::TrackSegment) => self.on_segment_end()?,
            Some(Tag::Coord) => self.on_sample_end(),
            Some(Tag::GxValue) => self.on_channel_value_end()?,
            Some(Tag::Coordinates) => self.on_waypoint_position_end(),
            Some(Tag::Name) => self.scratch.name = Some(self.content.trim().to_string()),
            Some(Tag::TrackId) => self.scratch.uuid = Some(self.content.trim().to_string()),
            Some(Tag::Description) => {
                self.scratch.description = Some(self.content.trim().to_string());
            }
            Some(Tag::Icon) => self.scratch.icon = Some(self.content.trim().to_string()),
            Some(Tag::Value) => self.scratch.category = Some(self.content.trim().to_string()),
            Some(Tag::When) => self.scratch.time = Some(self.content.trim().to_string()),
            Some(Tag::StyleUrl) => self.scratch.style_url = Some(self.content.trim().to_string()),
            Some(Tag::Href) => self.scratch.photo_url = Some(self.content.trim().to_string()),
            _ => {}
        }

        // The content buffer never survives an end tag, consumed or not.
        self.content.clear();
        Ok(())
    }

    /// A marker wraps either a waypoint or a whole track, so all scratch
    /// fields start over here.
    fn on_marker_start(&mut self) {
        self.scratch = Scratch::default();
    }

    fn on_marker_end(&mut self) -> Result<()> {
        if self.scratch.style_url.as_deref() != Some(WAYPOINT_STYLE_URL) {
            return Ok(());
        }

        // The href in the document is relative to the containing archive.
        let photo_url = self
            .scratch
            .photo_url
            .take()
            .and_then(|raw| self.photos.resolve_photo_url(&raw));

        let waypoint = Waypoint {
            name: self.scratch.name.take(),
            description: self.scratch.description.take(),
            icon: self.scratch.icon.take(),
            category: self.scratch.category.take(),
            photo_url,
            position: self.scratch.position.take(),
            time: self.scratch.time.take(),
        };
        self.sink.add_waypoint(waypoint)?;
        Ok(())
    }

    fn on_track_start(&mut self) -> Result<()> {
        if self.state != State::Idle {
            return Err(ImportError::Structure {
                element: "gx:MultiTrack",
                reason: "a track is already open",
            });
        }
        self.sink.on_track_start()?;
        self.state = State::InTrack;
        Ok(())
    }

    fn on_track_end(&mut self) -> Result<()> {
        if self.state != State::InTrack {
            return Ok(());
        }
        let track = Track {
            uuid: self.scratch.uuid.take(),
            name: self.scratch.name.clone(),
            category: self.scratch.category.clone(),
            description: self.scratch.description.clone(),
        };
        self.sink.on_track_end(track)?;
        self.state = State::Idle;
        Ok(())
    }

    fn on_segment_start(&mut self) -> Result<()> {
        if self.state != State::InTrack {
            return Err(ImportError::Structure {
                element: "gx:Track",
                reason: "missing enclosing gx:MultiTrack",
            });
        }
        self.sink.on_track_segment_start()?;
        self.segment.points.clear();
        for buffer in &mut self.channels {
            buffer.clear();
        }
        self.current_channel = None;
        self.state = State::InSegment;
        Ok(())
    }

    /// Fuse the channel buffers onto the point buffer by index and flush
    /// the segment. A channel shorter than the point sequence leaves the
    /// trailing points unset; excess samples are dropped.
    fn on_segment_end(&mut self) -> Result<()> {
        if self.state != State::InSegment {
            return Ok(());
        }
        for (i, point) in self.segment.points.iter_mut().enumerate() {
            for kind in ChannelKind::ALL {
                if let Some(value) = self.channels[kind.index()].get(i) {
                    point.set_channel(kind, *value);
                }
            }
        }
        for point in self.segment.points.drain(..) {
            self.sink.insert_track_point(point)?;
        }
        self.sink.on_track_segment_end()?;
        self.state = State::InTrack;
        Ok(())
    }

    /// A `gx:coord` closed: one sample boundary. The point is buffered
    /// even when its coordinate text is unusable, so that the channel
    /// sample at the same index still lines up with the right sample.
    fn on_sample_end(&mut self) {
        if self.state != State::InSegment {
            return;
        }
        let position = parse_position(&self.content, ' ');
        if position.is_none() {
            debug!(text = %self.content.trim(), "skipping malformed gx:coord");
        }
        self.segment.points.push(TrackPoint {
            position,
            time: self.scratch.time.take(),
            ..TrackPoint::default()
        });
    }

    fn on_channel_start(&mut self, e: &BytesStart<'_>) -> Result<()> {
        self.current_channel = None;
        for attr in e.attributes() {
            let attr = attr.map_err(|e| ImportError::XmlParse(e.into()))?;
            if attr.key.local_name().as_ref() == b"name" {
                let name = std::str::from_utf8(&attr.value).unwrap_or_default();
                self.current_channel = Some(name.to_string());
            }
        }
        Ok(())
    }

    fn on_channel_value_end(&mut self) -> Result<()> {
        let Some(channel) = self.current_channel.clone() else {
            return Ok(());
        };
        let text = self.content.trim();
        if text.is_empty() {
            return Ok(());
        }
        let value = text
            .parse::<f64>()
            .map_err(|_| ImportError::NumericFormat {
                element: "gx:value",
                value: text.to_string(),
            })?;
        match ChannelKind::from_name(&channel) {
            Some(kind) => self.channels[kind.index()].push(value),
            None => warn!(channel = %channel, "unsupported extended data channel"),
        }
        Ok(())
    }

    fn on_waypoint_position_end(&mut self) {
        self.scratch.position = parse_position(&self.content, ',');
    }

    /// Document close. Anything still open is flushed so a truncated
    /// document commits what it completed; the end-of-file signal fires
    /// exactly once.
    fn on_file_end(&mut self) -> Result<()> {
        if self.file_ended {
            return Ok(());
        }
        self.on_segment_end()?;
        self.on_track_end()?;
        self.sink.on_file_end()?;
        self.file_ended = true;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.on_file_end()
    }
}

/// Tokenize coordinate text into a position. Accepts exactly 2 or 3
/// fields (longitude, latitude, optional altitude); anything else, or a
/// longitude/latitude that is not a number, yields no position. Never an
/// error: a bad coordinate costs one position, not the import.
fn parse_position(text: &str, delimiter: char) -> Option<Position> {
    let parts: Vec<&str> = text.trim().split(delimiter).collect();
    if parts.len() != 2 && parts.len() != 3 {
        return None;
    }
    let longitude = parts[0].trim().parse::<f64>().ok()?;
    let latitude = parts[1].trim().parse::<f64>().ok()?;
    let altitude = parts.get(2).and_then(|s| s.trim().parse::<f64>().ok());
    Some(Position {
        longitude,
        latitude,
        altitude,
    })
}
