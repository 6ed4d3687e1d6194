//! The RFC 3659 `YYYYMMDDHHMMSS` timestamp, as MDTM and MLSD use it,
//! mapped to and from the back-end's packed FAT stamps.

use crate::storage::FatStamp;

/// Renders a stamp as the 14-digit MDTM form.
pub(crate) fn format_stamp(stamp: FatStamp) -> String {
    let (year, month, day, hour, minute, second) = stamp.fields();
    format!(
        "{:04}{:02}{:02}{:02}{:02}{:02}",
        year, month, day, hour, minute, second
    )
}

/// Splits an MDTM argument into its optional timestamp and the file
/// name.
///
/// A timestamp is exactly 14 digits followed by a space; anything else
/// means no timestamp was provided and the whole argument is the file
/// name.
pub(crate) fn split_stamp_args(args: &str) -> (Option<FatStamp>, &str) {
    let bytes = args.as_bytes();
    if bytes.len() < 15 || bytes[14] != b' ' || !bytes[..14].iter().all(|b| b.is_ascii_digit()) {
        return (None, args);
    }

    let field = |from: usize, to: usize| args[from..to].parse::<u16>().unwrap_or(0);
    let stamp = FatStamp::pack(
        field(0, 4),
        field(4, 6),
        field(6, 8),
        field(8, 10),
        field(10, 12),
        field(12, 14),
    );
    (Some(stamp), &args[15..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn round_trips_valid_stamps() {
        for stamp in [
            FatStamp::pack(2024, 1, 15, 10, 30, 0),
            FatStamp::pack(1980, 1, 1, 0, 0, 0),
            FatStamp::pack(2099, 12, 31, 23, 59, 58),
        ] {
            let text = format!("{} x", format_stamp(stamp));
            assert_eq!(split_stamp_args(&text), (Some(stamp), "x"));
        }
    }

    #[test]
    fn formats_the_expected_digits() {
        assert_eq!(format_stamp(FatStamp::pack(2024, 1, 15, 10, 30, 0)), "20240115103000");
    }

    #[test]
    fn short_or_malformed_input_is_just_a_file_name() {
        assert_eq!(split_stamp_args("f.txt"), (None, "f.txt"));
        assert_eq!(split_stamp_args("20240115103000"), (None, "20240115103000"));
        assert_eq!(split_stamp_args("2024011510300Z f.txt"), (None, "2024011510300Z f.txt"));
        assert_eq!(split_stamp_args("20240115103000_f.txt"), (None, "20240115103000_f.txt"));
    }

    #[test]
    fn file_name_starts_right_after_the_space() {
        let (stamp, name) = split_stamp_args("20240115103000  spaced.txt");
        assert!(stamp.is_some());
        assert_eq!(name, " spaced.txt");
    }
}
