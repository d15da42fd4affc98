use crate::domain::services::{dec_to_dms, latitude_ref, longitude_ref};
use chrono::{DateTime, Datelike, NaiveDateTime, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

pub const CSV_HEADER: [&str; 9] = [
    "Date",
    "Localtime",
    "latitude",
    "longitude",
    "speed",
    "alt",
    "temp",
    "sats",
    "photo",
];

/// Decimal degrees, WGS84.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

impl Position {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FixMode {
    Unknown = 0,
    NoFix = 1,
    TwoD = 2,
    ThreeD = 3,
}

impl FixMode {
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => FixMode::NoFix,
            2 => FixMode::TwoD,
            3 => FixMode::ThreeD,
            _ => FixMode::Unknown,
        }
    }

    pub fn has_fix(self) -> bool {
        self >= FixMode::TwoD
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GpsFix {
    pub position: Position,
    pub mode: FixMode,
    pub time: DateTime<Utc>,
    /// Metres per second.
    pub speed: f64,
    /// Metres above the reference ellipsoid or MSL, whichever gpsd reported.
    pub altitude: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub fix: GpsFix,
    pub satellites: u32,
    pub temperature_c: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogPoint {
    pub index: u32,
    pub photo_name: String,
    pub observation: Observation,
    pub local_date: String,
    pub local_time: String,
}

impl LogPoint {
    pub fn new(index: u32, layout: &SessionLayout, observation: Observation, tz: Tz) -> Self {
        let local = observation.fix.time.with_timezone(&tz);
        Self {
            index,
            photo_name: layout.photo_name(index),
            local_date: local.format("%b %d %Y").to_string(),
            local_time: local.format("%I:%M:%S%p %Z").to_string(),
            observation,
        }
    }

    pub fn position(&self) -> Position {
        self.observation.fix.position
    }
}

/// Time-position-velocity report. Every field is optional on the wire.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TpvReport {
    pub mode: u8,
    pub time: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub altitude: Option<f64>,
    pub speed: Option<f64>,
}

/// Satellite view report; `satellites` is `None` when gpsd sent no count.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SkyReport {
    pub satellites: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GpsReport {
    Tpv(TpvReport),
    Sky(SkyReport),
    Other(String),
}

/// GPS IFD values as they are stored in the JPEG.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GpsExifTags {
    /// Degrees, minutes, hundredths of a second.
    pub latitude: (u32, u32, u32),
    pub latitude_ref: String,
    pub longitude: (u32, u32, u32),
    pub longitude_ref: String,
    /// Altitude in centimetres, stored as `n/100`.
    pub altitude_cm: u32,
    /// Speed in mm/s, stored as `n/1000` with ref `M`.
    pub speed_mm_s: u32,
    pub satellites: String,
    /// UTC hour, minute, second.
    pub time_stamp: (u32, u32, u32),
    /// `YYYY:MM:DD`, UTC.
    pub date_stamp: String,
}

impl GpsExifTags {
    pub fn from_point(point: &LogPoint) -> Self {
        let fix = &point.observation.fix;
        let position = fix.position;
        let utc = fix.time;

        Self {
            latitude: dec_to_dms(position.latitude),
            latitude_ref: latitude_ref(position.latitude).to_string(),
            longitude: dec_to_dms(position.longitude),
            longitude_ref: longitude_ref(position.longitude).to_string(),
            // unsigned rationals; below-datum readings clamp to zero
            altitude_cm: (100.0 * fix.altitude).trunc().max(0.0) as u32,
            speed_mm_s: (1000.0 * fix.speed).trunc().max(0.0) as u32,
            satellites: point.observation.satellites.to_string(),
            time_stamp: (utc.hour(), utc.minute(), utc.second()),
            date_stamp: format!("{:04}:{:02}:{:02}", utc.year(), utc.month(), utc.day()),
        }
    }
}

/// Names the directory and files of one logging run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionLayout {
    id: String,
}

impl SessionLayout {
    pub const ID_FORMAT: &'static str = "%y%m%d.%H%M%S";

    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn starting_at(local_start: NaiveDateTime) -> Self {
        Self::new(local_start.format(Self::ID_FORMAT).to_string())
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Relative to the data root.
    pub fn dir(&self) -> &str {
        &self.id
    }

    pub fn csv_name(&self) -> String {
        format!("gpsdata.{}.csv", self.id)
    }

    pub fn csv_path(&self) -> String {
        format!("{}/{}", self.id, self.csv_name())
    }

    pub fn photo_name(&self, index: u32) -> String {
        format!("{}-{}.jpg", self.id, index)
    }

    pub fn photo_path(&self, index: u32) -> String {
        format!("{}/{}", self.id, self.photo_name(index))
    }

    /// True for names shaped like `%y%m%d.%H%M%S`.
    pub fn is_session_id(name: &str) -> bool {
        NaiveDateTime::parse_from_str(name, Self::ID_FORMAT).is_ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DistanceReference {
    #[default]
    LastLogged,
    LastPoll,
}

impl std::str::FromStr for DistanceReference {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "last-logged" => Ok(DistanceReference::LastLogged),
            "last-poll" => Ok(DistanceReference::LastPoll),
            other => Err(format!(
                "unknown distance reference '{}', expected last-logged or last-poll",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub points_logged: u32,
    pub polls: u64,
    pub errors: u64,
}
