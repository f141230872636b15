//! Input masks for the numeric form fields.
//!
//! Every formatter strips non-digits first and then re-inserts separators,
//! so they are total (never fail) and idempotent on their own output.

/// CEP digit count that triggers an address lookup.
pub const CEP_DIGITS: usize = 8;

/// CNPJ digit count that triggers a company lookup.
pub const CNPJ_DIGITS: usize = 14;

const PHONE_DIGITS: usize = 11;

/// Keep only ASCII digits, preserving order.
pub fn digits_only(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Format a Brazilian postal code (CEP) as `NNNNN-NNN`.
///
/// Up to five digits are returned untouched; anything past the eighth digit
/// is dropped.
pub fn format_postal_code(raw: &str) -> String {
    let numbers = digits_only(raw);
    if numbers.len() <= 5 {
        return numbers;
    }
    let end = numbers.len().min(CEP_DIGITS);
    format!("{}-{}", &numbers[..5], &numbers[5..end])
}

/// Format a phone number as `(AA) NNNNN-NNNN`.
///
/// # Examples
///
/// ```rust
/// use netway_contact_form::formatters::format_phone;
///
/// assert_eq!(format_phone("11987654321"), "(11) 98765-4321");
/// assert_eq!(format_phone("119"), "(11) 9");
/// ```
pub fn format_phone(raw: &str) -> String {
    let numbers = digits_only(raw);
    match numbers.len() {
        0..=2 => numbers,
        3..=7 => format!("({}) {}", &numbers[..2], &numbers[2..]),
        len => {
            let end = len.min(PHONE_DIGITS);
            format!(
                "({}) {}-{}",
                &numbers[..2],
                &numbers[2..7],
                &numbers[7..end]
            )
        }
    }
}

/// Format a CNPJ as `NN.NNN.NNN/NNNN-NN`, inserting separators as digits arrive.
pub fn format_tax_id(raw: &str) -> String {
    let numbers = digits_only(raw);
    let n = &numbers[..numbers.len().min(CNPJ_DIGITS)];
    match n.len() {
        0..=2 => n.to_string(),
        3..=5 => format!("{}.{}", &n[..2], &n[2..]),
        6..=8 => format!("{}.{}.{}", &n[..2], &n[2..5], &n[5..]),
        9..=12 => format!("{}.{}.{}/{}", &n[..2], &n[2..5], &n[5..8], &n[8..]),
        _ => format!(
            "{}.{}.{}/{}-{}",
            &n[..2],
            &n[2..5],
            &n[5..8],
            &n[8..12],
            &n[12..]
        ),
    }
}

/// True when the formatted value carries exactly `expected` digits.
pub fn has_digit_count(value: &str, expected: usize) -> bool {
    value.chars().filter(|c| c.is_ascii_digit()).count() == expected
}
