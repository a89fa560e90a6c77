use serde::{Deserialize, Serialize};

/// A geographic position. Longitude and latitude always come together;
/// altitude is present only when the source supplied a third coordinate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub longitude: f64,
    pub latitude: f64,
    pub altitude: Option<f64>,
}

/// Metadata of a finished track. Points and segments are streamed to the
/// sink while the track is open, so the finalized value carries only the
/// fields collected from the enclosing marker element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub uuid: Option<String>,
    pub name: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
}

/// One segment's worth of buffered points, fused and flushed when the
/// segment element closes.
#[derive(Debug, Default)]
pub struct TrackSegment {
    pub points: Vec<TrackPoint>,
}

/// A single track sample.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    pub position: Option<Position>,
    pub time: Option<String>,
    pub speed: Option<f64>,
    pub heart_rate: Option<f64>,
    pub cadence: Option<f64>,
    pub power: Option<f64>,
    pub elevation_gain: Option<f64>,
}

impl TrackPoint {
    /// Assign one extended-data sample to the field the channel maps to.
    pub fn set_channel(&mut self, kind: ChannelKind, value: f64) {
        match kind {
            ChannelKind::Speed => self.speed = Some(value),
            ChannelKind::Power => self.power = Some(value),
            ChannelKind::HeartRate => self.heart_rate = Some(value),
            ChannelKind::Cadence => self.cadence = Some(value),
            ChannelKind::ElevationGain => self.elevation_gain = Some(value),
        }
    }
}

/// A standalone point of interest, emitted only for markers whose style
/// reference equals the reserved waypoint style.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub name: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub category: Option<String>,
    pub photo_url: Option<String>,
    pub position: Option<Position>,
    pub time: Option<String>,
}

/// The recognized extended-data channels. Each one maps a named scalar
/// sequence in the document onto one `TrackPoint` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    Speed,
    Power,
    HeartRate,
    Cadence,
    ElevationGain,
}

impl ChannelKind {
    pub const COUNT: usize = 5;

    pub const ALL: [ChannelKind; Self::COUNT] = [
        ChannelKind::Speed,
        ChannelKind::Power,
        ChannelKind::HeartRate,
        ChannelKind::Cadence,
        ChannelKind::ElevationGain,
    ];

    /// Look up a channel by its document name. Unknown names return `None`
    /// and are skipped by the caller.
    pub fn from_name(name: &str) -> Option<ChannelKind> {
        match name {
            "speed" => Some(ChannelKind::Speed),
            "power" => Some(ChannelKind::Power),
            "heart_rate" => Some(ChannelKind::HeartRate),
            "cadence" => Some(ChannelKind::Cadence),
            "elevation_gain" => Some(ChannelKind::ElevationGain),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ChannelKind::Speed => "speed",
            ChannelKind::Power => "power",
            ChannelKind::HeartRate => "heart_rate",
            ChannelKind::Cadence => "cadence",
            ChannelKind::ElevationGain => "elevation_gain",
        }
    }

    /// Index into the per-segment channel buffer array.
    pub fn index(self) -> usize {
        match self {
            ChannelKind::Speed => 0,
            ChannelKind::Power => 1,
            ChannelKind::HeartRate => 2,
            ChannelKind::Cadence => 3,
            ChannelKind::ElevationGain => 4,
        }
    }
}
