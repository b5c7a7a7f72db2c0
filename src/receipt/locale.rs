use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime};
use std::str::FromStr;

/// 日期时间格式 (按优先级尝试)
const DATETIME_FORMATS: [&str; 2] = ["%d/%m/%Y %H:%M:%S", "%d/%m/%Y %H:%M"];
const DATE_FORMAT: &str = "%d/%m/%Y";

/// 解析巴西格式金额 ("R$ 1.234,56" -> 1234.56)
///
/// 点号视为千分位, 逗号视为小数点; 无法解析时返回 None, 不会 panic。
pub fn parse_decimal(s: &str) -> Option<BigDecimal> {
    let cleaned: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, ',' | '.' | '-'))
        .collect();

    let commas = cleaned.matches(',').count();
    if commas > 1 && !cleaned.contains('.') {
        return None;
    }

    let normalized = cleaned.replace('.', "").replace(',', ".");
    if normalized.is_empty() {
        return None;
    }
    BigDecimal::from_str(&normalized).ok()
}

/// 解析 "dd/mm/yyyy HH:MM[:SS]" 或 "dd/mm/yyyy" (零点)
pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, DATE_FORMAT)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}
