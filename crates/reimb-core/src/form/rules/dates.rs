//! Date normalization for expense forms.

use chrono::NaiveDate;

/// Normalize a captured date into `y/m/d` form.
///
/// 年 and 月 markers and dashes become `/`, 日 is dropped, runs of `/` are
/// collapsed and leading/trailing separators trimmed. Digits are kept as
/// written, so "2024-07-15" becomes "2024/07/15" and "2024年7月15日"
/// becomes "2024/7/15".
pub fn normalize_date(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());

    for c in raw.trim().chars() {
        match c {
            '年' | '月' | '-' | '/' => {
                if !out.ends_with('/') {
                    out.push('/');
                }
            }
            '日' => {}
            c => out.push(c),
        }
    }

    out.trim_matches('/').to_string()
}

/// Interpret a normalized `y/m/d` date as a calendar date.
pub fn to_naive_date(normalized: &str) -> Option<NaiveDate> {
    let mut parts = normalized.split('/');
    let year: i32 = parts.next()?.parse().ok()?;
    let month: u32 = parts.next()?.parse().ok()?;
    let day: u32 = parts.next()?.parse().ok()?;

    if parts.next().is_some() {
        return None;
    }

    NaiveDate::from_ymd_opt(year, month, day)
}
