//! 日期解析模块
//!
//! 后端返回的日期列格式并不统一：REST 后端给出 RFC 3339，
//! 托管数据库的 `date` 列只有 `YYYY-MM-DD`，表单控件则给出
//! `YYYY-MM-DDTHH:MM`。这里统一宽松解析为 UTC 时间。

use chrono::{DateTime, NaiveDate, NaiveDateTime, Timelike, Utc};

/// 宽松解析日期/时间字符串
///
/// 依次尝试：RFC 3339、无时区的日期时间（秒可省略）、纯日期（当天零点）。
pub fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    parse_date(s).and_then(|d| d.and_hms_opt(0, 0, 0)).map(|n| n.and_utc())
}

/// 解析 `YYYY-MM-DD`
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}

/// 表单 `<input type="date">` 使用的格式
pub fn format_date_input(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d").to_string()
}

/// 表单 `<input type="datetime-local">` 使用的格式
///
/// 秒为零时省略秒，与浏览器控件的默认精度一致。
pub fn format_datetime_input(dt: &DateTime<Utc>) -> String {
    if dt.second() == 0 && dt.nanosecond() == 0 {
        dt.format("%Y-%m-%dT%H:%M").to_string()
    } else {
        dt.format("%Y-%m-%dT%H:%M:%S").to_string()
    }
}

/// 表格中显示的格式
pub fn format_display(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M").to_string()
}

/// serde `with` 适配：序列化为 RFC 3339，反序列化时接受上述所有格式
pub mod flexible {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&dt.to_rfc3339_opts(SecondsFormat::Secs, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_datetime(&raw)
            .ok_or_else(|| D::Error::custom(format!("unrecognised date '{}'", raw)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn parses_all_backend_formats() {
        let rfc = parse_datetime("2024-05-01T08:30:00+02:00").unwrap();
        assert_eq!(rfc.hour(), 6);

        let naive = parse_datetime("2024-05-01T08:30").unwrap();
        assert_eq!((naive.hour(), naive.minute()), (8, 30));

        let date_only = parse_datetime("2024-05-01").unwrap();
        assert_eq!((date_only.day(), date_only.hour()), (1, 0));
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_datetime("").is_none());
        assert!(parse_datetime("yesterday").is_none());
        assert!(parse_date("2024-13-01").is_none());
    }

    #[test]
    fn formats_for_date_inputs() {
        let dt = parse_datetime("2024-05-01T23:59:00Z").unwrap();
        assert_eq!(format_date_input(&dt), "2024-05-01");
        assert_eq!(format_display(&dt), "2024-05-01 23:59");
    }

    #[test]
    fn datetime_inputs_keep_the_time_of_day() {
        let dt = parse_datetime("2024-05-01T14:30:00Z").unwrap();
        assert_eq!(format_datetime_input(&dt), "2024-05-01T14:30");
        assert_eq!(parse_datetime(&format_datetime_input(&dt)), Some(dt));

        let dt = parse_datetime("2024-05-01T14:30:15Z").unwrap();
        assert_eq!(format_datetime_input(&dt), "2024-05-01T14:30:15");
        assert_eq!(parse_datetime(&format_datetime_input(&dt)), Some(dt));
    }
}
