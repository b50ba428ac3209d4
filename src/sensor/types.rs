//! Inertial sample type shared by every sensor source.

use serde::{Deserialize, Serialize};

/// Number of channels in one sample.
pub const CHANNELS: usize = 6;

/// Header written by the data-capture logger ahead of its sample rows.
pub const CSV_HEADER: &str = "timestamp,accel_x,accel_y,accel_z,gyro_x,gyro_y,gyro_z";

/// One 6-axis inertial reading.
///
/// Ordering is implicit: samples are processed strictly in arrival order, so no
/// timestamp is carried.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// User acceleration (x, y, z) in g
    pub accel: [f64; 3],
    /// Rotation rate (x, y, z) in rad/s
    pub gyro: [f64; 3],
}

impl Sample {
    pub fn new(accel: [f64; 3], gyro: [f64; 3]) -> Self {
        Self { accel, gyro }
    }

    /// Channel values in buffer order: accel x/y/z then gyro x/y/z.
    pub fn channels(&self) -> [f64; CHANNELS] {
        [
            self.accel[0],
            self.accel[1],
            self.accel[2],
            self.gyro[0],
            self.gyro[1],
            self.gyro[2],
        ]
    }

    /// Magnitude of the rotation-rate vector.
    pub fn gyro_magnitude(&self) -> f64 {
        self.gyro.iter().map(|v| v * v).sum::<f64>().sqrt()
    }

    /// Parse a logger row: `timestamp,ax,ay,az,gx,gy,gz`.
    ///
    /// The timestamp column is ignored. Returns `None` for the header, blank
    /// lines, or malformed rows.
    pub fn from_csv_line(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() || line.starts_with("timestamp") {
            return None;
        }

        let values: Vec<f64> = line
            .split(',')
            .map(|field| field.trim().parse::<f64>())
            .collect::<Result<_, _>>()
            .ok()?;

        if values.len() != CHANNELS + 1 {
            return None;
        }

        Some(Self {
            accel: [values[1], values[2], values[3]],
            gyro: [values[4], values[5], values[6]],
        })
    }
}
