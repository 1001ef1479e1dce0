//! Amount parsing for expense forms.

/// Parse an amount captured from OCR text, e.g. "12,345" or "12，345".
///
/// Returns `None` when the value is not a plain non-negative integer once
/// thousands separators are removed, or does not fit in a `u64`.
pub fn parse_amount(s: &str) -> Option<u64> {
    let cleaned: String = s
        .trim()
        .chars()
        .filter(|c| !matches!(c, ',' | '，'))
        .collect();

    if cleaned.is_empty() || !cleaned.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    cleaned.parse().ok()
}

/// Format an amount with comma thousands separators (12,345).
pub fn format_amount(amount: u64) -> String {
    let digits = amount.to_string();
    let chars: Vec<char> = digits.chars().collect();
    let mut formatted = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, c) in chars.iter().enumerate() {
        if i > 0 && (chars.len() - i) % 3 == 0 {
            formatted.push(',');
        }
        formatted.push(*c);
    }

    formatted
}
