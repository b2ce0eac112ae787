//! Phone number sanitization and display formatting.
//!
//! The form accepts raw keyboard input for the phone field; everything
//! that is not an ASCII digit is dropped and the result is capped at
//! [`MAX_PHONE_DIGITS`]. The submitted number is the selected country's
//! dial code joined with the digits: `+<dialCode> <digits>`.

/// Maximum number of digits retained from user input (ITU-T E.164 allows
/// 15 significant digits).
pub const MAX_PHONE_DIGITS: usize = 15;

/// Strip non-digit characters from raw input and cap the length.
pub fn sanitize_digits(input: &str) -> String {
    input
        .chars()
        .filter(|c| c.is_ascii_digit())
        .take(MAX_PHONE_DIGITS)
        .collect()
}

/// Format a phone number for submission or display.
///
/// With a known dial code the result is `+<dialCode> <digits>`; until a
/// dial code has been resolved the digits are passed through bare.
pub fn format_phone_number(dial_code: Option<u32>, digits: &str) -> String {
    match dial_code {
        Some(code) => format!("+{code} {digits}"),
        None => digits.to_string(),
    }
}
