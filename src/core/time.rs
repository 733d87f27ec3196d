use time::{format_description::well_known::Rfc3339, OffsetDateTime};

pub(crate) fn now_rfc3339() -> String {
    format_offset(OffsetDateTime::now_utc())
}

pub(crate) fn format_offset(value: OffsetDateTime) -> String {
    value.format(&Rfc3339).unwrap_or_else(|_| value.to_string())
}

/// Parses an upstream timestamp, tolerating the naive `YYYY-MM-DDTHH:MM:SS`
/// form some services emit by assuming UTC.
pub(crate) fn parse_timestamp(value: &str) -> Option<OffsetDateTime> {
    if let Ok(parsed) = OffsetDateTime::parse(value, &Rfc3339) {
        return Some(parsed);
    }

    let with_zone = format!("{}Z", value.trim_end_matches('Z'));
    OffsetDateTime::parse(&with_zone, &Rfc3339).ok()
}
