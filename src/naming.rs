//! Centralized filename parsing for the `YYYY-MM` convention.
//!
//! Every image the tool manages ends up named after the month it was taken:
//! a four-digit year, a dash, a two-digit month, then anything at all.
//!
//! - `2020-01.png` → year "2020", month 1, rest ""
//! - `2020-01_3.jpg` → year "2020", month 1, rest "_3"
//! - `2021-07-beach.png` → year "2021", month 7, rest "-beach"
//! - `vacation.png` → undated, gets renamed on the next run
//!
//! Renamed files get the bare `YYYY-MM` stem, or `YYYY-MM_N` when that stem is
//! already taken. [`format_stem`] builds both forms.

/// A stem that starts with a `YYYY-MM` prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatedName {
    /// Four-digit year, kept as text since it is only ever used as a key.
    pub year: String,
    /// Month in `1..=12`.
    pub month: u32,
    /// Whatever follows the prefix, separator included.
    pub rest: String,
}

/// Parse a filename stem following the `YYYY-MM` convention.
///
/// Returns `None` when the stem does not start with four ASCII digits, a dash
/// and a valid two-digit month.
pub fn parse_dated_name(stem: &str) -> Option<DatedName> {
    let bytes = stem.as_bytes();
    if bytes.len() < 7 || bytes[4] != b'-' {
        return None;
    }
    // Byte checks first: slicing is only safe once the prefix is known ASCII.
    if !bytes[..4].iter().all(u8::is_ascii_digit) || !bytes[5..7].iter().all(u8::is_ascii_digit)
    {
        return None;
    }
    let year = &stem[..4];
    let month: u32 = stem[5..7].parse().ok()?;
    if !(1..=12).contains(&month) {
        return None;
    }
    Some(DatedName {
        year: year.to_string(),
        month,
        rest: stem[7..].to_string(),
    })
}

/// Build a `YYYY-MM` stem, with a `_N` suffix when `suffix` is set.
pub fn format_stem(year: i32, month: u32, suffix: Option<u32>) -> String {
    match suffix {
        Some(n) => format!("{year:04}-{month:02}_{n}"),
        None => format!("{year:04}-{month:02}"),
    }
}

/// Split a filename into stem and extension at the last dot.
///
/// A leading dot does not count as an extension separator, so `.hidden`
/// has no extension.
pub fn split_extension(filename: &str) -> (&str, Option<&str>) {
    match filename.rfind('.') {
        Some(0) | None => (filename, None),
        Some(pos) => (&filename[..pos], Some(&filename[pos + 1..])),
    }
}
