//! Writes the GPS IFD into captured JPEGs using `little_exif`.

use crate::domain::model::GpsExifTags;
use crate::utils::error::{LoggerError, Result};
use little_exif::exif_tag::ExifTag;
use little_exif::metadata::Metadata;
use little_exif::rational::uR64;
use std::path::Path;

fn rational(nominator: u32, denominator: u32) -> uR64 {
    uR64 {
        nominator,
        denominator,
    }
}

fn dms_rationals((degrees, minutes, hundredths): (u32, u32, u32)) -> Vec<uR64> {
    vec![
        rational(degrees, 1),
        rational(minutes, 1),
        rational(hundredths, 100),
    ]
}

/// The little_exif tags for one point, in the order they are written.
pub fn exif_tags(tags: &GpsExifTags) -> Vec<ExifTag> {
    let (hour, minute, second) = tags.time_stamp;

    vec![
        ExifTag::GPSVersionID(vec![2, 3, 0, 0]),
        ExifTag::GPSLatitudeRef(tags.latitude_ref.clone()),
        ExifTag::GPSLatitude(dms_rationals(tags.latitude)),
        ExifTag::GPSLongitudeRef(tags.longitude_ref.clone()),
        ExifTag::GPSLongitude(dms_rationals(tags.longitude)),
        ExifTag::GPSAltitudeRef(vec![0]),
        ExifTag::GPSAltitude(vec![rational(tags.altitude_cm, 100)]),
        ExifTag::GPSSpeedRef("M".to_string()),
        ExifTag::GPSSpeed(vec![rational(tags.speed_mm_s, 1000)]),
        ExifTag::GPSSatellites(tags.satellites.clone()),
        ExifTag::GPSTimeStamp(vec![
            rational(hour, 1),
            rational(minute, 1),
            rational(second, 1),
        ]),
        ExifTag::GPSDateStamp(tags.date_stamp.clone()),
    ]
}

/// Adds GPS tags to an existing JPEG, keeping the tags the camera wrote.
///
/// The file must already carry an EXIF block; `little_exif` cannot safely
/// create one from scratch, and every capture program we drive writes one.
pub fn write_gps_exif<P: AsRef<Path>>(path: P, tags: &GpsExifTags) -> Result<()> {
    let path = path.as_ref();

    let mut metadata = Metadata::new_from_path(path).map_err(|e| LoggerError::ExifError {
        message: format!(
            "could not read existing EXIF from '{}': {:?}",
            path.display(),
            e
        ),
    })?;

    for tag in exif_tags(tags) {
        metadata.set_tag(tag);
    }

    metadata
        .write_to_file(path)
        .map_err(|e| LoggerError::ExifError {
            message: format!("failed to write EXIF to '{}': {:?}", path.display(), e),
        })?;

    tracing::debug!("Embedded GPS EXIF into {}", path.display());
    Ok(())
}
