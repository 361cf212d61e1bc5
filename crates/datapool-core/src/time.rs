//! Year extraction from file names and the representative date of a year range.

use std::path::Path;

use chrono::NaiveDate;

/// First and last year named in a file name.
///
/// Years are four-digit tokens starting `19` or `20`, scanned left to right
/// without overlap, so `velocity_1990_2020_1km.nc` gives `(1990, 2020)` and
/// `velocity_2015.nc` gives `(2015, 2015)`. Only the final path component is
/// scanned.
#[must_use]
pub fn year_range_from_file_name(path: &Path) -> Option<(i32, i32)> {
    let name = path.file_name()?.to_string_lossy();
    let bytes = name.as_bytes();

    let mut years = Vec::new();
    let mut i = 0;
    while i + 4 <= bytes.len() {
        let window = &bytes[i..i + 4];
        let century = matches!(&window[..2], b"19" | b"20");
        if century && window[2].is_ascii_digit() && window[3].is_ascii_digit() {
            let year = window
                .iter()
                .fold(0_i32, |acc, digit| acc * 10 + i32::from(digit - b'0'));
            years.push(year);
            i += 4;
        } else {
            i += 1;
        }
    }

    let first = years.iter().min()?;
    let last = years.iter().max()?;
    Some((*first, *last))
}

/// 2 July of the middle year of `start..=end`.
#[must_use]
pub fn mid_year_date(start: i32, end: i32) -> Option<NaiveDate> {
    let mid = start + (end - start) / 2;
    NaiveDate::from_ymd_opt(mid, 7, 2)
}

/// Days since the Unix epoch, as stored in an Arrow `Date32` column.
#[must_use]
pub fn date32_days(date: NaiveDate) -> i32 {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default();
    i32::try_from(date.signed_duration_since(epoch).num_days()).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn years(name: &str) -> Option<(i32, i32)> {
        year_range_from_file_name(Path::new(name))
    }

    #[test]
    fn range_and_single_year() {
        assert_eq!(years("Antarctica_ice_velocity_1990_2020_1km_v1.nc"), Some((1990, 2020)));
        assert_eq!(years("Central_Antarctica_ice_velocity_2015.nc"), Some((2015, 2015)));
    }

    #[test]
    fn years_are_sorted_not_positional() {
        assert_eq!(years("flux_2020_from_1995.csv"), Some((1995, 2020)));
    }

    #[test]
    fn tokens_do_not_overlap() {
        // "19992000": 1999 then 2000, never "9920".
        assert_eq!(years("run19992000.csv"), Some((1999, 2000)));
        assert_eq!(years("id_20191.csv"), Some((2019, 2019)));
    }

    #[test]
    fn directory_names_are_ignored() {
        assert_eq!(years("/data/2001/velocity_static.csv"), None);
    }

    #[test]
    fn no_year_found() {
        assert_eq!(years("velocity_1km.csv"), None);
        assert_eq!(years("code_1850.csv"), None);
    }

    #[test]
    fn middle_year_rounds_down() {
        assert_eq!(mid_year_date(1990, 2020), NaiveDate::from_ymd_opt(2005, 7, 2));
        assert_eq!(mid_year_date(2015, 2016), NaiveDate::from_ymd_opt(2015, 7, 2));
        assert_eq!(mid_year_date(2015, 2015), NaiveDate::from_ymd_opt(2015, 7, 2));
    }

    #[test]
    fn date32_counts_days_from_epoch() {
        assert_eq!(date32_days(NaiveDate::from_ymd_opt(1970, 1, 2).unwrap()), 1);
        assert_eq!(date32_days(NaiveDate::from_ymd_opt(2000, 7, 2).unwrap()), 11_140);
    }
}
