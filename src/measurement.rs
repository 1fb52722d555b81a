//! PM concentration extraction.
//!
//! Particle counts are derived from mass concentrations by assuming spherical
//! particles of a fixed mean radius and density. Conversion parameters come
//! from <http://ir.uiowa.edu/cgi/viewcontent.cgi?article=5915&context=etd>.

use crate::codec::Response;
use crate::error::{Result, Sds011Error};
use crate::types::{Measurement, Pollutant, UnitOfMeasure};

// Truncated on purpose: published particle counts were computed with it
#[allow(clippy::approx_constant)]
const PI: f64 = 3.14159;

/// Particle density in µg/m³
const DENSITY: f64 = 1.65e12;

/// Cubic meters to 0.01 cubic feet
const K: f64 = 3531.5;

impl Pollutant {
    /// Assumed mean particle radius in meters
    fn mean_radius(self) -> f64 {
        match self {
            Pollutant::Pm25 => 0.44e-6,
            Pollutant::Pm10 => 2.60e-6,
        }
    }

    /// Convert a µg/m³ value into `unit`
    pub fn convert(self, value: f64, unit: UnitOfMeasure) -> f64 {
        match unit {
            UnitOfMeasure::MassConcentration => value,
            UnitOfMeasure::ParticleConcentration => {
                let radius = self.mean_radius();
                let volume = (4.0 / 3.0) * PI * radius.powi(3);
                let mass = DENSITY * volume;
                (value / (K * mass) + 0.5).floor()
            }
        }
    }
}

/// Convert a mass concentration of the pollutant tagged `pm` (`"pm2.5"` or
/// `"pm10"`) into `unit`.
pub fn mass_to_particles(pm: &str, value: f64, unit: UnitOfMeasure) -> Result<f64> {
    let pollutant: Pollutant = pm.parse()?;
    Ok(pollutant.convert(value, unit))
}

/// Read PM2.5 and PM10 out of a data report
pub fn extract(response: &Response, unit: UnitOfMeasure) -> Result<Measurement> {
    if !response.is_report() {
        return Err(Sds011Error::Format(format!(
            "expected a data report, got marker {:#04x}",
            response.marker()
        )));
    }

    let [pm25_low, pm25_high, pm10_low, pm10_high] = response.pm_bytes();
    let pm25 = f64::from(u16::from_le_bytes([pm25_low, pm25_high])) / 10.0;
    let pm10 = f64::from(u16::from_le_bytes([pm10_low, pm10_high])) / 10.0;

    let measurement = Measurement {
        pm25: Pollutant::Pm25.convert(pm25, unit),
        pm10: Pollutant::Pm10.convert(pm10, unit),
    };
    log::debug!(
        "Processed frame - PM2.5: {}, PM10: {}",
        measurement.pm25,
        measurement.pm10
    );
    Ok(measurement)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::checksum;

    fn report(pm: [u8; 4]) -> Response {
        let mut frame = [0xAA, 0xC0, pm[0], pm[1], pm[2], pm[3], 0xCC, 0x0B, 0x00, 0xAB];
        frame[8] = checksum(&frame[..8]).unwrap();
        Response::decode(&frame).unwrap()
    }

    #[test]
    fn mass_unit_is_pass_through() {
        assert_eq!(
            mass_to_particles("pm2.5", 10.0, UnitOfMeasure::MassConcentration).unwrap(),
            10.0
        );
        assert_eq!(
            mass_to_particles("pm10", 42.7, UnitOfMeasure::MassConcentration).unwrap(),
            42.7
        );
    }

    #[test]
    fn particle_unit_uses_sphere_model() {
        assert_eq!(
            mass_to_particles("pm2.5", 10.0, UnitOfMeasure::ParticleConcentration).unwrap(),
            4810.0
        );
        assert_eq!(
            mass_to_particles("pm10", 10.0, UnitOfMeasure::ParticleConcentration).unwrap(),
            23.0
        );
        assert_eq!(
            mass_to_particles("pm10", 45.6, UnitOfMeasure::ParticleConcentration).unwrap(),
            106.0
        );
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let result = mass_to_particles("pm1.0", 10.0, UnitOfMeasure::MassConcentration);
        assert!(matches!(result, Err(Sds011Error::Configuration(_))));
    }

    #[test]
    fn extracts_little_endian_tenths() {
        // PM2.5 = 0x007B = 12.3, PM10 = 0x01C8 = 45.6
        let measurement =
            extract(&report([0x7B, 0x00, 0xC8, 0x01]), UnitOfMeasure::MassConcentration).unwrap();
        assert_eq!(measurement.pm25, 12.3);
        assert_eq!(measurement.pm10, 45.6);
    }

    #[test]
    fn extracts_particle_counts() {
        let measurement = extract(
            &report([0x7B, 0x00, 0xC8, 0x01]),
            UnitOfMeasure::ParticleConcentration,
        )
        .unwrap();
        assert_eq!(measurement.pm25, 5916.0);
        assert_eq!(measurement.pm10, 106.0);
    }

    #[test]
    fn command_reply_is_not_a_measurement() {
        let reply =
            Response::decode(&[0xAA, 0xC5, 0x02, 0x01, 0x01, 0x00, 0xCC, 0x0B, 0xDB, 0xAB])
                .unwrap();
        assert!(matches!(
            extract(&reply, UnitOfMeasure::MassConcentration),
            Err(Sds011Error::Format(_))
        ));
    }
}
