//! ---
//! avsim_section: "11-simulation"
//! avsim_subsection: "02-model"
//! avsim_type: "source"
//! avsim_scope: "code"
//! avsim_description: "Standard atmosphere helpers."
//! avsim_version: "v0.1.0"
//! avsim_owner: "tbd"
//! ---
//! Fixed lapse-rate atmosphere. Altitudes in feet, temperatures in °C.

const SEA_LEVEL_TEMP_C: f64 = 15.0;
const LAPSE_RATE_C_PER_FT: f64 = 1.98 / 1_000.0;
const TROPOPAUSE_FT: f64 = 36_089.0;
const TROPOPAUSE_TEMP_C: f64 = -56.5;
const SEA_LEVEL_PRESSURE_PSI: f64 = 14.696;
const KELVIN_OFFSET: f64 = 273.15;

/// ISA outside air temperature at `altitude_ft`.
pub fn isa_temperature_c(altitude_ft: f64) -> f64 {
    if altitude_ft >= TROPOPAUSE_FT {
        TROPOPAUSE_TEMP_C
    } else {
        SEA_LEVEL_TEMP_C - LAPSE_RATE_C_PER_FT * altitude_ft.max(0.0)
    }
}

/// Static pressure at `altitude_ft` from the standard-atmosphere pressure law.
pub fn static_pressure_psi(altitude_ft: f64) -> f64 {
    let altitude = altitude_ft.clamp(0.0, 60_000.0);
    SEA_LEVEL_PRESSURE_PSI * (1.0 - 6.8756e-6 * altitude).max(0.0).powf(5.2559)
}

/// Rough true airspeed estimate: about 2 % per 1,000 ft above IAS.
pub fn true_airspeed_kt(indicated_kt: f64, altitude_ft: f64) -> f64 {
    indicated_kt.max(0.0) * (1.0 + 0.02 * altitude_ft.max(0.0) / 1_000.0)
}

pub fn speed_of_sound_kt(oat_c: f64) -> f64 {
    38.967_854 * (oat_c + KELVIN_OFFSET).max(1.0).sqrt()
}

pub fn mach_number(true_airspeed_kt: f64, oat_c: f64) -> f64 {
    true_airspeed_kt.max(0.0) / speed_of_sound_kt(oat_c)
}

/// Total (ram) air temperature for a given static temperature and Mach.
pub fn total_air_temperature_c(oat_c: f64, mach: f64) -> f64 {
    (oat_c + KELVIN_OFFSET) * (1.0 + 0.2 * mach * mach) - KELVIN_OFFSET
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lapse_rate_and_tropopause() {
        assert_eq!(isa_temperature_c(0.0), 15.0);
        assert!((isa_temperature_c(10_000.0) - -4.8).abs() < 1e-9);
        assert_eq!(isa_temperature_c(39_000.0), -56.5);
    }

    #[test]
    fn pressure_falls_with_altitude() {
        assert!((static_pressure_psi(0.0) - 14.696).abs() < 1e-9);
        let cruise = static_pressure_psi(35_000.0);
        assert!(cruise > 3.0 && cruise < 4.0, "got {cruise}");
    }

    #[test]
    fn tat_exceeds_oat_in_flight() {
        let oat = isa_temperature_c(35_000.0);
        let mach = mach_number(true_airspeed_kt(280.0, 35_000.0), oat);
        assert!(mach > 0.7 && mach < 0.9, "got {mach}");
        assert!(total_air_temperature_c(oat, mach) > oat);
    }
}
