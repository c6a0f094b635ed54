// ==========================================
// 车间工单重排系统 - 时刻解析与分钟运算
// ==========================================
// 口径: 所有时刻均为 UTC 绝对时刻, 线上格式 ISO-8601
// 红线: 解析失败不抛错, 返回 None 交由约束校验器报告
// ==========================================

use chrono::{DateTime, Duration, SecondsFormat, Utc};

/// 解析 ISO-8601 (RFC 3339) 时刻字符串
///
/// # 返回
/// - `Some(t)`: 解析成功, 统一换算为 UTC
/// - `None`: 格式非法或为空 (由约束校验器负责出具诊断)
pub fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

/// 格式化为 ISO-8601 字符串 (秒精度, Z 后缀)
pub fn format_instant(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// 两时刻间的整分钟数 (b - a, 向零截断)
pub fn minutes_between(a: DateTime<Utc>, b: DateTime<Utc>) -> i64 {
    (b - a).num_minutes()
}

/// 时刻加 n 分钟
pub fn add_minutes(t: DateTime<Utc>, minutes: i64) -> DateTime<Utc> {
    t + Duration::minutes(minutes)
}

/// 时刻减 n 分钟 (朴素分钟差, 不经过班次日历)
pub fn sub_minutes(t: DateTime<Utc>, minutes: i64) -> DateTime<Utc> {
    t - Duration::minutes(minutes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_format_roundtrip() {
        let t = parse_instant("2024-01-15T08:00:00Z").unwrap();
        assert_eq!(format_instant(t), "2024-01-15T08:00:00Z");
    }

    #[test]
    fn test_parse_with_offset_normalizes_to_utc() {
        let t = parse_instant("2024-01-15T09:00:00+01:00").unwrap();
        assert_eq!(format_instant(t), "2024-01-15T08:00:00Z");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_instant("not-a-date").is_none());
        assert!(parse_instant("").is_none());
        assert!(parse_instant("2024-01-15").is_none());
    }

    #[test]
    fn test_minute_arithmetic() {
        let a = parse_instant("2024-01-15T08:00:00Z").unwrap();
        let b = parse_instant("2024-01-15T12:00:00Z").unwrap();
        assert_eq!(minutes_between(a, b), 240);
        assert_eq!(add_minutes(a, 240), b);
        assert_eq!(sub_minutes(b, 240), a);
    }
}
