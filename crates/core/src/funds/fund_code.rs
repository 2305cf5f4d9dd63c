use crate::constants::{BASE_FUND_CODES, L_INCOME_FUND_CODE};

const FUND_SUFFIX: &str = "FUND";

/// Maps a fund code as typed by a user, shown in the UI or stored by older
/// schema versions onto the canonical key used for price and position lookups.
///
/// Recognized spellings are compacted (case, spaces, `-`, `_`, `.` and a trailing
/// "Fund" are ignored). Anything unrecognized is returned trimmed and uppercased.
pub fn normalize_fund_code(raw: &str) -> String {
    let trimmed = raw.trim();
    let compact: String = trimmed
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_' | '.'))
        .flat_map(char::to_uppercase)
        .collect();

    let key = match compact.strip_suffix(FUND_SUFFIX) {
        Some(stem) if !stem.is_empty() => stem,
        _ => compact.as_str(),
    };

    if key == "LINCOME" {
        return L_INCOME_FUND_CODE.to_string();
    }
    if let Some(year) = lifecycle_year(key) {
        return format!("L{year}");
    }
    if BASE_FUND_CODES.contains(&key) {
        return key.to_string();
    }

    trimmed.to_uppercase()
}

fn lifecycle_year(key: &str) -> Option<&str> {
    let digits = key.strip_prefix('L')?;
    (digits.len() == 4 && digits.chars().all(|c| c.is_ascii_digit())).then_some(digits)
}
