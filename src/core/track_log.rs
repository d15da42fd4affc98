use crate::domain::model::{LogPoint, SessionLayout, CSV_HEADER};
use crate::domain::ports::Storage;
use crate::domain::services::{celsius_to_fahrenheit, metres_to_feet, mps_to_mph};
use crate::utils::error::{LoggerError, Result};

/// Full precision, but whole degrees keep their `.0`.
fn coordinate(value: f64) -> String {
    let text = value.to_string();
    if value.is_finite() && !text.contains('.') {
        format!("{}.0", text)
    } else {
        text
    }
}

/// Values of one CSV row, in header order.
pub fn row_fields(point: &LogPoint) -> [String; 9] {
    let obs = &point.observation;
    let position = point.position();

    [
        point.local_date.clone(),
        point.local_time.clone(),
        coordinate(position.latitude),
        coordinate(position.longitude),
        format!("{:.1}", mps_to_mph(obs.fix.speed)),
        format!("{:.1}", metres_to_feet(obs.fix.altitude)),
        obs.temperature_c
            .map(|c| format!("{:.1}", celsius_to_fahrenheit(c)))
            .unwrap_or_default(),
        obs.satellites.to_string(),
        point.photo_name.clone(),
    ]
}

fn encode<I, T>(record: I) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = T>,
    T: AsRef<[u8]>,
{
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer.write_record(record)?;
    writer.into_inner().map_err(|e| LoggerError::ProcessingError {
        message: format!("failed to flush CSV row: {}", e),
    })
}

pub fn header_bytes() -> Result<Vec<u8>> {
    encode(CSV_HEADER)
}

pub fn row_bytes(point: &LogPoint) -> Result<Vec<u8>> {
    encode(row_fields(point))
}

/// The tab-separated echo printed to stdout unless quiet.
pub fn console_header() -> String {
    "Date\t\tLocaltime\tlatitude\tlongitude\tspeed\talt\ttemp\tsats\tphoto".to_string()
}

pub fn console_row(point: &LogPoint) -> String {
    row_fields(point).join("\t")
}

/// Appends points to the session CSV.
pub struct TrackLog<S: Storage> {
    storage: S,
    path: String,
}

impl<S: Storage> TrackLog<S> {
    pub fn new(storage: S, layout: &SessionLayout) -> Self {
        Self {
            storage,
            path: layout.csv_path(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Creates (or truncates) the file with just the header row.
    pub async fn start(&self) -> Result<()> {
        self.storage.write_file(&self.path, &header_bytes()?).await
    }

    pub async fn append(&self, point: &LogPoint) -> Result<()> {
        self.storage.append_file(&self.path, &row_bytes(point)?).await
    }
}
