//! Solar position (NOAA general solar position algorithm).
//!
//! Computes declination, equation of time, hour angle, true and apparent
//! zenith and azimuth for any location and timezone-aware timestamp.

use chrono::{DateTime, TimeZone, Timelike, Utc};

/// Julian day of the Unix epoch.
const UNIX_EPOCH_JD: f64 = 2_440_587.5;
/// Julian day of J2000.0.
const J2000_JD: f64 = 2_451_545.0;

/// Sun position for one timestamp and location. All angles in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolarPosition {
    /// Geometric zenith angle.
    pub zenith_deg: f64,
    /// Zenith angle corrected for atmospheric refraction.
    pub apparent_zenith_deg: f64,
    /// Azimuth, clockwise from north (0 = N, 90 = E, 180 = S).
    pub azimuth_deg: f64,
    /// Solar declination.
    pub declination_deg: f64,
    /// Equation of time in minutes.
    pub equation_of_time_min: f64,
    /// Hour angle (negative before solar noon).
    pub hour_angle_deg: f64,
}

impl SolarPosition {
    /// Whether the refracted sun disc center is above the horizon.
    pub fn is_above_horizon(&self) -> bool {
        self.apparent_zenith_deg < 90.0
    }
}

/// Julian day for a timezone-aware timestamp.
pub fn julian_day<Tz: TimeZone>(dt: &DateTime<Tz>) -> f64 {
    let utc = dt.with_timezone(&Utc);
    let seconds = utc.timestamp() as f64 + f64::from(utc.timestamp_subsec_nanos()) * 1e-9;
    seconds / 86_400.0 + UNIX_EPOCH_JD
}

/// Atmospheric refraction in degrees for a true elevation angle (NOAA).
pub fn atmospheric_refraction(elevation_deg: f64) -> f64 {
    let e = elevation_deg;
    let arcsec = if e > 85.0 {
        0.0
    } else if e > 5.0 {
        let t = e.to_radians().tan();
        58.1 / t - 0.07 / t.powi(3) + 0.000_086 / t.powi(5)
    } else if e > -0.575 {
        1735.0 + e * (-518.2 + e * (103.4 + e * (-12.79 + e * 0.711)))
    } else {
        -20.772 / e.to_radians().tan()
    };
    arcsec / 3600.0
}

/// Computes the sun position at `dt` for the given coordinates.
///
/// # Arguments
///
/// * `latitude` - Latitude in degrees (north positive)
/// * `longitude` - Longitude in degrees (east positive)
/// * `dt` - Timestamp in any time zone
pub fn solar_position<Tz: TimeZone>(
    latitude: f64,
    longitude: f64,
    dt: &DateTime<Tz>,
) -> SolarPosition {
    let jd = julian_day(dt);
    let t = (jd - J2000_JD) / 36_525.0;

    let mean_long = (280.466_46 + t * (36_000.769_83 + t * 0.000_303_2)).rem_euclid(360.0);
    let mean_anom = 357.529_11 + t * (35_999.050_29 - 0.000_153_7 * t);
    let ecc = 0.016_708_634 - t * (0.000_042_037 + 0.000_000_126_7 * t);

    let m = mean_anom.to_radians();
    let center = m.sin() * (1.914_602 - t * (0.004_817 + 0.000_014 * t))
        + (2.0 * m).sin() * (0.019_993 - 0.000_101 * t)
        + (3.0 * m).sin() * 0.000_289;
    let true_long = mean_long + center;

    let omega = (125.04 - 1934.136 * t).to_radians();
    let apparent_long = true_long - 0.005_69 - 0.004_78 * omega.sin();

    let obliq_arcsec = 21.448 - t * (46.815 + t * (0.000_59 - t * 0.001_813));
    let mean_obliq = 23.0 + (26.0 + obliq_arcsec / 60.0) / 60.0;
    let obliq = (mean_obliq + 0.002_56 * omega.cos()).to_radians();

    let decl = (obliq.sin() * apparent_long.to_radians().sin()).asin();

    let y = (obliq / 2.0).tan().powi(2);
    let l0 = mean_long.to_radians();
    let eot_min = 4.0
        * (y * (2.0 * l0).sin() - 2.0 * ecc * m.sin() + 4.0 * ecc * y * m.sin() * (2.0 * l0).cos()
            - 0.5 * y * y * (4.0 * l0).sin()
            - 1.25 * ecc * ecc * (2.0 * m).sin())
        .to_degrees();

    let utc = dt.with_timezone(&Utc);
    let utc_minutes = f64::from(utc.num_seconds_from_midnight()) / 60.0
        + f64::from(utc.nanosecond()) * 1e-9 / 60.0;
    let true_solar_min = (utc_minutes + eot_min + 4.0 * longitude).rem_euclid(1440.0);
    let hour_angle_deg = true_solar_min / 4.0 - 180.0;

    let lat = latitude.to_radians();
    let ha = hour_angle_deg.to_radians();
    let cos_zenith = lat.sin() * decl.sin() + lat.cos() * decl.cos() * ha.cos();
    let zenith_deg = cos_zenith.clamp(-1.0, 1.0).acos().to_degrees();

    let azimuth_deg = (180.0
        + ha.sin()
            .atan2(ha.cos() * lat.sin() - decl.tan() * lat.cos())
            .to_degrees())
    .rem_euclid(360.0);

    let apparent_zenith_deg = zenith_deg - atmospheric_refraction(90.0 - zenith_deg);

    SolarPosition {
        zenith_deg,
        apparent_zenith_deg,
        azimuth_deg,
        declination_deg: decl.to_degrees(),
        equation_of_time_min: eot_min,
        hour_angle_deg,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    macro_rules! assert_approx {
        ($left:expr, $right:expr, $tol:expr) => {
            let (l, r) = ($left as f64, $right as f64);
            assert!(
                (l - r).abs() <= $tol,
                "assert_approx failed: left={}, right={}, diff={}, tol={}",
                l,
                r,
                (l - r).abs(),
                $tol
            );
        };
    }

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn julian_day_of_j2000() {
        assert_approx!(julian_day(&utc(2000, 1, 1, 12, 0)), J2000_JD, 1e-9);
    }

    #[test]
    fn declination_at_june_solstice() {
        let pos = solar_position(0.0, 0.0, &utc(2024, 6, 20, 21, 0));
        assert_approx!(pos.declination_deg, 23.44, 0.05);
    }

    #[test]
    fn declination_near_zero_at_equinox() {
        let pos = solar_position(0.0, 0.0, &utc(2024, 3, 20, 3, 0));
        assert_approx!(pos.declination_deg, 0.0, 0.1);
    }

    #[test]
    fn equation_of_time_in_known_range() {
        // Early November maximum is about +16.4 minutes.
        let pos = solar_position(0.0, 0.0, &utc(2024, 11, 3, 12, 0));
        assert_approx!(pos.equation_of_time_min, 16.4, 0.3);
        // Mid February minimum is about -14.2 minutes.
        let pos = solar_position(0.0, 0.0, &utc(2024, 2, 11, 12, 0));
        assert_approx!(pos.equation_of_time_min, -14.2, 0.3);
    }

    #[test]
    fn solstice_noon_zenith_at_45n() {
        let pos = solar_position(45.0, 0.0, &utc(2024, 6, 21, 12, 2));
        assert_approx!(pos.zenith_deg, 45.0 - 23.44, 0.3);
        assert_approx!(pos.azimuth_deg, 180.0, 2.0);
    }

    #[test]
    fn southern_hemisphere_noon_sun_is_north() {
        let pos = solar_position(-33.9, 18.4, &utc(2024, 6, 21, 10, 45));
        assert!(
            pos.azimuth_deg < 10.0 || pos.azimuth_deg > 350.0,
            "azimuth {}",
            pos.azimuth_deg
        );
    }

    #[test]
    fn morning_sun_is_east_afternoon_west() {
        let morning = solar_position(35.0, 0.0, &utc(2024, 6, 21, 8, 0));
        let afternoon = solar_position(35.0, 0.0, &utc(2024, 6, 21, 16, 0));
        assert!(morning.azimuth_deg > 45.0 && morning.azimuth_deg < 135.0);
        assert!(afternoon.azimuth_deg > 225.0 && afternoon.azimuth_deg < 315.0);
        assert!(morning.hour_angle_deg < 0.0);
        assert!(afternoon.hour_angle_deg > 0.0);
    }

    #[test]
    fn time_zone_does_not_change_position() {
        use chrono_tz::Europe::Nicosia;
        let t = utc(2024, 6, 21, 9, 30);
        let local = t.with_timezone(&Nicosia);
        assert_eq!(
            solar_position(35.1856, 33.3823, &t),
            solar_position(35.1856, 33.3823, &local)
        );
    }

    #[test]
    fn polar_night_sun_never_rises() {
        for h in 0..24 {
            let pos = solar_position(80.0, 15.0, &utc(2024, 12, 21, h, 0));
            assert!(pos.apparent_zenith_deg >= 90.0, "hour {h}: {}", pos.apparent_zenith_deg);
        }
    }

    #[test]
    fn midnight_sun_never_sets() {
        for h in 0..24 {
            let pos = solar_position(80.0, 15.0, &utc(2024, 6, 21, h, 0));
            assert!(pos.is_above_horizon(), "hour {h}: {}", pos.apparent_zenith_deg);
        }
    }

    #[test]
    fn refraction_lifts_sun_near_horizon() {
        assert_approx!(atmospheric_refraction(0.0), 1735.0 / 3600.0, 1e-9);
        assert_eq!(atmospheric_refraction(89.0), 0.0);
        assert!(atmospheric_refraction(10.0) > atmospheric_refraction(30.0));
        let pos = solar_position(35.0, 0.0, &utc(2024, 6, 21, 12, 0));
        assert!(pos.apparent_zenith_deg < pos.zenith_deg);
    }
}
