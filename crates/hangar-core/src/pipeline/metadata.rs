//! EXIF metadata extraction from image bytes.
//!
//! Extraction never fails: a missing EXIF block, an unreadable one, or a tag
//! with an unexpected type all resolve to an absent field.

use chrono::{NaiveDate, NaiveDateTime};
use exif::{Exif, Field, In, Reader, Tag, Value};
use std::io::Cursor;

use crate::types::ExtractedMetadata;

/// Extracts camera and shooting metadata from image files.
pub struct MetadataExtractor;

impl MetadataExtractor {
    /// Extract EXIF data from an in-memory image.
    ///
    /// Returns an empty record if the image has no readable EXIF data.
    pub fn extract(bytes: &[u8]) -> ExtractedMetadata {
        let mut cursor = Cursor::new(bytes);
        match Reader::new().read_from_container(&mut cursor) {
            Ok(exif) => Self::from_exif(&exif),
            Err(e) => {
                tracing::debug!("No usable EXIF data: {e}");
                ExtractedMetadata::default()
            }
        }
    }

    /// Build a metadata record from already-parsed EXIF.
    pub fn from_exif(exif: &Exif) -> ExtractedMetadata {
        let (gps_latitude, gps_longitude) = match Self::get_gps_position(exif) {
            Some((lat, lon)) => (Some(lat), Some(lon)),
            None => (None, None),
        };

        ExtractedMetadata {
            camera_make: Self::get_string(exif, Tag::Make),
            camera_model: Self::get_string(exif, Tag::Model),
            camera_serial: Self::get_string(exif, Tag::BodySerialNumber),
            lens_make: Self::get_string(exif, Tag::LensMake),
            lens_model: Self::get_string(exif, Tag::LensModel),
            focal_length: Self::get_rational(exif, Tag::FocalLength),
            focal_length_35mm: Self::get_u32(exif, Tag::FocalLengthIn35mmFilm).filter(|&v| v > 0),
            aperture: Self::get_rational(exif, Tag::FNumber),
            shutter_speed: Self::get_shutter_speed(exif),
            iso: Self::get_u32(exif, Tag::PhotographicSensitivity),
            exposure_mode: Self::get_label(exif, Tag::ExposureMode, EXPOSURE_MODES),
            exposure_program: Self::get_label(exif, Tag::ExposureProgram, EXPOSURE_PROGRAMS),
            metering_mode: Self::get_label(exif, Tag::MeteringMode, METERING_MODES),
            white_balance: Self::get_label(exif, Tag::WhiteBalance, WHITE_BALANCE),
            flash: Self::get_label(exif, Tag::Flash, FLASH_MODES),
            exposure_bias: Self::get_exposure_bias(exif),
            taken_at: Self::get_datetime(exif),
            gps_latitude,
            gps_longitude,
            gps_altitude: Self::get_gps_altitude(exif),
            width: Self::get_u32(exif, Tag::PixelXDimension)
                .or_else(|| Self::get_u32(exif, Tag::ImageWidth)),
            height: Self::get_u32(exif, Tag::PixelYDimension)
                .or_else(|| Self::get_u32(exif, Tag::ImageLength)),
            orientation: Self::get_u32(exif, Tag::Orientation).filter(|o| (1..=8).contains(o)),
            color_space: Self::get_label(exif, Tag::ColorSpace, COLOR_SPACES),
            software: Self::get_string(exif, Tag::Software),
        }
    }

    fn field(exif: &Exif, tag: Tag) -> Option<&Field> {
        exif.get_field(tag, In::PRIMARY)
    }

    /// Get an ASCII field, trimmed of padding; blank values are absent.
    fn get_string(exif: &Exif, tag: Tag) -> Option<String> {
        match &Self::field(exif, tag)?.value {
            Value::Ascii(parts) => {
                let raw = parts.first()?;
                let s = String::from_utf8_lossy(raw);
                let s = s.trim_matches(|c: char| c == '\0' || c.is_whitespace());
                (!s.is_empty()).then(|| s.to_string())
            }
            _ => None,
        }
    }

    /// Get an unsigned integer field (BYTE, SHORT or LONG).
    fn get_u32(exif: &Exif, tag: Tag) -> Option<u32> {
        Self::field(exif, tag)?.value.get_uint(0)
    }

    /// Get an unsigned rational field as a decimal.
    fn get_rational(exif: &Exif, tag: Tag) -> Option<f64> {
        match &Self::field(exif, tag)?.value {
            Value::Rational(v) => v.first().and_then(|r| rational_to_f64(r.num, r.denom)),
            _ => None,
        }
    }

    /// Translate an integer code through a label table.
    fn get_label(exif: &Exif, tag: Tag, table: &[(u32, &'static str)]) -> Option<String> {
        Self::get_u32(exif, tag)
            .and_then(|code| lookup(table, code))
            .map(str::to_string)
    }

    fn get_shutter_speed(exif: &Exif) -> Option<String> {
        match &Self::field(exif, Tag::ExposureTime)?.value {
            Value::Rational(v) => v
                .first()
                .and_then(|r| format_shutter_speed(r.num, r.denom)),
            _ => None,
        }
    }

    fn get_exposure_bias(exif: &Exif) -> Option<String> {
        match &Self::field(exif, Tag::ExposureBiasValue)?.value {
            Value::SRational(v) => v
                .first()
                .and_then(|r| format_exposure_bias(r.num as i64, r.denom as i64)),
            Value::Rational(v) => v
                .first()
                .and_then(|r| format_exposure_bias(r.num as i64, r.denom as i64)),
            _ => None,
        }
    }

    /// Get the capture time, preferring DateTimeOriginal over DateTime.
    fn get_datetime(exif: &Exif) -> Option<NaiveDateTime> {
        let field = Self::field(exif, Tag::DateTimeOriginal)
            .or_else(|| Self::field(exif, Tag::DateTime))?;
        match &field.value {
            Value::Ascii(parts) => parse_exif_datetime(parts.first()?),
            _ => None,
        }
    }

    /// Latitude and longitude as a pair; both or neither.
    fn get_gps_position(exif: &Exif) -> Option<(f64, f64)> {
        let lat = Self::get_gps_coord(exif, Tag::GPSLatitude, Tag::GPSLatitudeRef);
        let lon = Self::get_gps_coord(exif, Tag::GPSLongitude, Tag::GPSLongitudeRef);
        pair_coordinates(lat, lon)
    }

    /// Get GPS coordinate, converting from degrees/minutes/seconds to decimal.
    fn get_gps_coord(exif: &Exif, coord_tag: Tag, ref_tag: Tag) -> Option<f64> {
        let coord = Self::field(exif, coord_tag)?;
        let reference = Self::get_string(exif, ref_tag)?;

        let degrees = match &coord.value {
            Value::Rational(r) if r.len() >= 3 => dms_to_decimal(
                rational_to_f64(r[0].num, r[0].denom)?,
                rational_to_f64(r[1].num, r[1].denom)?,
                rational_to_f64(r[2].num, r[2].denom)?,
            ),
            _ => return None,
        };

        // S and W hemispheres are negative
        match reference.as_str() {
            "N" | "E" => Some(degrees),
            "S" | "W" => Some(-degrees),
            _ => None,
        }
    }

    fn get_gps_altitude(exif: &Exif) -> Option<f64> {
        let altitude = Self::get_rational(exif, Tag::GPSAltitude)?;
        let below_sea_level = Self::get_u32(exif, Tag::GPSAltitudeRef) == Some(1);
        Some(signed_altitude(altitude, below_sea_level))
    }
}

/// Convert a numerator/denominator pair to a decimal; zero denominator is absent.
pub fn rational_to_f64(num: u32, denom: u32) -> Option<f64> {
    (denom != 0).then(|| num as f64 / denom as f64)
}

/// Format an exposure time.
///
/// Below one second the value is a reduced fraction (`"1/500 s"`); from one
/// second up it is a decimal with one place (`"3.0 s"`). A zero numerator or
/// denominator is absent.
pub fn format_shutter_speed(num: u32, denom: u32) -> Option<String> {
    if num == 0 || denom == 0 {
        return None;
    }
    if num < denom {
        let divisor = gcd(num, denom);
        Some(format!("{}/{} s", num / divisor, denom / divisor))
    } else {
        Some(format!("{:.1} s", num as f64 / denom as f64))
    }
}

/// Format exposure compensation: `"+0.7 EV"`, `"0 EV"`, `"-1.5 EV"`.
pub fn format_exposure_bias(num: i64, denom: i64) -> Option<String> {
    if denom == 0 {
        return None;
    }
    if num == 0 {
        return Some("0 EV".to_string());
    }
    let value = num as f64 / denom as f64;
    if value > 0.0 {
        Some(format!("+{value:.1} EV"))
    } else {
        Some(format!("{value:.1} EV"))
    }
}

/// Negate an altitude recorded below sea level.
pub fn signed_altitude(altitude: f64, below_sea_level: bool) -> f64 {
    if below_sea_level {
        -altitude
    } else {
        altitude
    }
}

/// Keep a decoded position only when both axes decoded.
pub fn pair_coordinates(lat: Option<f64>, lon: Option<f64>) -> Option<(f64, f64)> {
    match (lat, lon) {
        (Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite() => Some((lat, lon)),
        _ => None,
    }
}

fn dms_to_decimal(degrees: f64, minutes: f64, seconds: f64) -> f64 {
    degrees + minutes / 60.0 + seconds / 3600.0
}

fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

fn parse_exif_datetime(raw: &[u8]) -> Option<NaiveDateTime> {
    let dt = exif::DateTime::from_ascii(raw).ok()?;
    NaiveDate::from_ymd_opt(dt.year as i32, dt.month as u32, dt.day as u32)?.and_hms_opt(
        dt.hour as u32,
        dt.minute as u32,
        dt.second as u32,
    )
}

fn lookup(table: &[(u32, &'static str)], code: u32) -> Option<&'static str> {
    table.iter().find(|(c, _)| *c == code).map(|(_, label)| *label)
}

const EXPOSURE_MODES: &[(u32, &str)] = &[(0, "Auto"), (1, "Manual"), (2, "Auto bracket")];

const EXPOSURE_PROGRAMS: &[(u32, &str)] = &[
    (1, "Manual"),
    (2, "Normal program"),
    (3, "Aperture priority"),
    (4, "Shutter priority"),
    (5, "Creative program"),
    (6, "Action program"),
    (7, "Portrait mode"),
    (8, "Landscape mode"),
];

const METERING_MODES: &[(u32, &str)] = &[
    (1, "Average"),
    (2, "Center-weighted average"),
    (3, "Spot"),
    (4, "Multi-spot"),
    (5, "Pattern"),
    (6, "Partial"),
    (255, "Other"),
];

const WHITE_BALANCE: &[(u32, &str)] = &[(0, "Auto"), (1, "Manual")];

const FLASH_MODES: &[(u32, &str)] = &[
    (0x00, "No flash"),
    (0x01, "Fired"),
    (0x05, "Fired, return not detected"),
    (0x07, "Fired, return detected"),
    (0x08, "On, did not fire"),
    (0x09, "On, fired"),
    (0x0D, "On, return not detected"),
    (0x0F, "On, return detected"),
    (0x10, "Off, did not fire"),
    (0x18, "Auto, did not fire"),
    (0x19, "Auto, fired"),
    (0x1D, "Auto, fired, return not detected"),
    (0x1F, "Auto, fired, return detected"),
    (0x20, "No flash function"),
    (0x41, "Fired, red-eye reduction"),
    (0x49, "On, red-eye reduction"),
    (0x50, "Off, red-eye reduction"),
    (0x58, "Auto, did not fire, red-eye reduction"),
    (0x59, "Auto, fired, red-eye reduction"),
];

const COLOR_SPACES: &[(u32, &str)] = &[(1, "sRGB"), (2, "Adobe RGB"), (0xFFFF, "Uncalibrated")];

#[cfg(test)]
mod tests {
    use super::*;
    use exif::experimental::Writer;
    use exif::{Rational, SRational};

    fn ascii(tag: Tag, s: &str) -> Field {
        Field {
            tag,
            ifd_num: In::PRIMARY,
            value: Value::Ascii(vec![s.as_bytes().to_vec()]),
        }
    }

    fn rationals(tag: Tag, parts: &[(u32, u32)]) -> Field {
        Field {
            tag,
            ifd_num: In::PRIMARY,
            value: Value::Rational(
                parts
                    .iter()
                    .map(|&(num, denom)| Rational { num, denom })
                    .collect(),
            ),
        }
    }

    fn short(tag: Tag, v: u16) -> Field {
        Field {
            tag,
            ifd_num: In::PRIMARY,
            value: Value::Short(vec![v]),
        }
    }

    fn build_exif(fields: &[Field]) -> Exif {
        let mut writer = Writer::new();
        for field in fields {
            writer.push_field(field);
        }
        let mut buf = Cursor::new(Vec::new());
        writer.write(&mut buf, false).unwrap();
        Reader::new().read_raw(buf.into_inner()).unwrap()
    }

    #[test]
    fn test_extract_without_exif_is_empty() {
        assert_eq!(
            MetadataExtractor::extract(b"not an image"),
            ExtractedMetadata::default()
        );
        assert_eq!(MetadataExtractor::extract(&[]), ExtractedMetadata::default());
    }

    #[test]
    fn test_shutter_speed_fraction() {
        assert_eq!(format_shutter_speed(1, 500).as_deref(), Some("1/500 s"));
        assert_eq!(format_shutter_speed(10, 5000).as_deref(), Some("1/500 s"));
        assert_eq!(format_shutter_speed(2, 3).as_deref(), Some("2/3 s"));
    }

    #[test]
    fn test_shutter_speed_seconds() {
        assert_eq!(format_shutter_speed(3, 1).as_deref(), Some("3.0 s"));
        assert_eq!(format_shutter_speed(1, 1).as_deref(), Some("1.0 s"));
        assert_eq!(format_shutter_speed(25, 10).as_deref(), Some("2.5 s"));
    }

    #[test]
    fn test_shutter_speed_absent() {
        assert_eq!(format_shutter_speed(0, 1), None);
        assert_eq!(format_shutter_speed(1, 0), None);
    }

    #[test]
    fn test_exposure_bias_formatting() {
        assert_eq!(format_exposure_bias(-3, 2).as_deref(), Some("-1.5 EV"));
        assert_eq!(format_exposure_bias(0, 1).as_deref(), Some("0 EV"));
        assert_eq!(format_exposure_bias(2, 3).as_deref(), Some("+0.7 EV"));
        assert_eq!(format_exposure_bias(1, 0), None);
    }

    #[test]
    fn test_rational_zero_denominator_is_absent() {
        assert_eq!(rational_to_f64(56, 10), Some(5.6));
        assert_eq!(rational_to_f64(56, 0), None);
    }

    #[test]
    fn test_altitude_sign() {
        assert_eq!(signed_altitude(12.5, false), 12.5);
        assert_eq!(signed_altitude(12.5, true), -12.5);
    }

    #[test]
    fn test_gps_pairing_invariant() {
        assert_eq!(pair_coordinates(Some(51.47), Some(-0.45)), Some((51.47, -0.45)));
        assert_eq!(pair_coordinates(Some(51.47), None), None);
        assert_eq!(pair_coordinates(None, Some(-0.45)), None);
        assert_eq!(pair_coordinates(Some(f64::NAN), Some(1.0)), None);
    }

    #[test]
    fn test_label_lookup_unknown_code_is_absent() {
        assert_eq!(lookup(METERING_MODES, 5), Some("Pattern"));
        assert_eq!(lookup(METERING_MODES, 0), None);
        assert_eq!(lookup(EXPOSURE_PROGRAMS, 0), None);
        assert_eq!(lookup(FLASH_MODES, 0x19), Some("Auto, fired"));
        assert_eq!(lookup(COLOR_SPACES, 7), None);
    }

    #[test]
    fn test_gcd() {
        assert_eq!(gcd(10, 5000), 10);
        assert_eq!(gcd(7, 13), 1);
    }

    #[test]
    fn test_parse_exif_datetime() {
        let parsed = parse_exif_datetime(b"2023:07:14 16:05:09").unwrap();
        assert_eq!(parsed.to_string(), "2023-07-14 16:05:09");
        assert!(parse_exif_datetime(b"garbage").is_none());
    }

    #[test]
    fn test_from_exif_full_record() {
        let exif = build_exif(&[
            ascii(Tag::Make, "Canon"),
            ascii(Tag::Model, "EOS R5"),
            ascii(Tag::Software, "Firmware 1.8.1"),
            short(Tag::Orientation, 6),
            rationals(Tag::ExposureTime, &[(1, 2000)]),
            rationals(Tag::FNumber, &[(56, 10)]),
            rationals(Tag::FocalLength, &[(400, 1)]),
            short(Tag::PhotographicSensitivity, 400),
            short(Tag::MeteringMode, 5),
            short(Tag::ExposureProgram, 3),
            short(Tag::ColorSpace, 1),
            Field {
                tag: Tag::ExposureBiasValue,
                ifd_num: In::PRIMARY,
                value: Value::SRational(vec![SRational { num: -3, denom: 2 }]),
            },
            ascii(Tag::DateTimeOriginal, "2023:07:14 16:05:09"),
            ascii(Tag::GPSLatitudeRef, "N"),
            rationals(Tag::GPSLatitude, &[(51, 1), (28, 1), (12, 1)]),
            ascii(Tag::GPSLongitudeRef, "W"),
            rationals(Tag::GPSLongitude, &[(0, 1), (27, 1), (0, 1)]),
            rationals(Tag::GPSAltitude, &[(25, 1)]),
        ]);

        let meta = MetadataExtractor::from_exif(&exif);
        assert_eq!(meta.camera_make.as_deref(), Some("Canon"));
        assert_eq!(meta.camera_model.as_deref(), Some("EOS R5"));
        assert_eq!(meta.software.as_deref(), Some("Firmware 1.8.1"));
        assert_eq!(meta.orientation, Some(6));
        assert_eq!(meta.shutter_speed.as_deref(), Some("1/2000 s"));
        assert_eq!(meta.aperture, Some(5.6));
        assert_eq!(meta.focal_length, Some(400.0));
        assert_eq!(meta.iso, Some(400));
        assert_eq!(meta.metering_mode.as_deref(), Some("Pattern"));
        assert_eq!(meta.exposure_program.as_deref(), Some("Aperture priority"));
        assert_eq!(meta.color_space.as_deref(), Some("sRGB"));
        assert_eq!(meta.exposure_bias.as_deref(), Some("-1.5 EV"));
        assert_eq!(
            meta.taken_at.map(|t| t.to_string()).as_deref(),
            Some("2023-07-14 16:05:09")
        );
        let lat = meta.gps_latitude.unwrap();
        let lon = meta.gps_longitude.unwrap();
        assert!((lat - 51.47).abs() < 1e-9);
        assert!((lon + 0.45).abs() < 1e-9);
        assert_eq!(meta.gps_altitude, Some(25.0));
        assert!(meta.lens_model.is_none());
    }

    #[test]
    fn test_from_exif_latitude_without_longitude_drops_both() {
        let exif = build_exif(&[
            ascii(Tag::Make, "Nikon"),
            ascii(Tag::GPSLatitudeRef, "N"),
            rationals(Tag::GPSLatitude, &[(40, 1), (38, 1), (23, 1)]),
        ]);

        let meta = MetadataExtractor::from_exif(&exif);
        assert_eq!(meta.camera_make.as_deref(), Some("Nikon"));
        assert!(meta.gps_latitude.is_none());
        assert!(meta.gps_longitude.is_none());
    }

    #[test]
    fn test_from_exif_zero_denominator_and_unknown_codes() {
        let exif = build_exif(&[
            rationals(Tag::FNumber, &[(28, 0)]),
            rationals(Tag::ExposureTime, &[(0, 1)]),
            short(Tag::MeteringMode, 42),
            short(Tag::Orientation, 9),
        ]);

        let meta = MetadataExtractor::from_exif(&exif);
        assert!(meta.aperture.is_none());
        assert!(meta.shutter_speed.is_none());
        assert!(meta.metering_mode.is_none());
        assert!(meta.orientation.is_none());
    }
}
