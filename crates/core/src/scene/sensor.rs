//! The optical satellites this library works with

use chrono::NaiveDate;

/// The two daily-reflectance satellites combined by the flood algorithm.
///
/// Both image the same grid roughly once per day; the morning and afternoon
/// overpasses together give two observations per calendar day once both
/// platforms are flying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sensor {
    /// Morning-overpass platform, operational since early 2000
    Terra,
    /// Afternoon-overpass platform, operational since mid 2002
    Aqua,
}

impl Sensor {
    /// Get a string representing the name of the sensor
    pub fn name(&self) -> &'static str {
        match self {
            Sensor::Terra => "Terra",
            Sensor::Aqua => "Aqua",
        }
    }

    /// Date from which the sensor delivers usable daily reflectance.
    pub fn operational(&self) -> NaiveDate {
        match self {
            // First day of the Terra daily surface-reflectance record
            Sensor::Terra => NaiveDate::from_ymd_opt(2000, 2, 24).unwrap(),
            Sensor::Aqua => NaiveDate::from_ymd_opt(2002, 7, 4).unwrap(),
        }
    }
}

/// First date with both sensors flying.
///
/// Events beginning on or after this date see two observations per day and
/// use the stricter composite voting rule.
pub fn dual_sensor_start() -> NaiveDate {
    Sensor::Aqua.operational()
}
