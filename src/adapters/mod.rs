// Adapters layer: concrete implementations of the domain ports for the Pi
// hardware (gpsd, camera, 1-Wire probe, GPIO button) and local storage.

pub mod button;
pub mod camera;
pub mod exif;
pub mod gpsd;
pub mod storage;
pub mod thermometer;
