use rand::{rng, Rng};

/// Smallest and largest numeric suffix of a generated code
const DIGITS_MIN: u32 = 10_000;
const DIGITS_MAX: u32 = 99_999;

/// Layout of system generated codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CodeFormat {
    /// `A12345`
    #[default]
    Compact,
    /// `A:12345` for a `:` separator
    Separated(char),
}

/// Generates a short code: one uppercase letter followed by a 5 digit number
pub fn generate_code(format: CodeFormat) -> String {
    let mut rng = rng();
    let letter = char::from(b'A' + rng.random_range(0..26u8));
    let digits = rng.random_range(DIGITS_MIN..=DIGITS_MAX);

    match format {
        CodeFormat::Compact => format!("{}{}", letter, digits),
        CodeFormat::Separated(separator) => format!("{}{}{}", letter, separator, digits),
    }
}

/// Checks whether `code` has the shape `generate_code` produces for `format`
pub fn is_generated_code(code: &str, format: CodeFormat) -> bool {
    let mut chars = code.chars();
    let Some(letter) = chars.next() else {
        return false;
    };
    if !letter.is_ascii_uppercase() {
        return false;
    }

    let rest = chars.as_str();
    let digits = match format {
        CodeFormat::Compact => rest,
        CodeFormat::Separated(separator) => match rest.strip_prefix(separator) {
            Some(digits) => digits,
            None => return false,
        },
    };

    digits.len() == 5
        && digits.chars().all(|c| c.is_ascii_digit())
        && digits
            .parse::<u32>()
            .is_ok_and(|n| (DIGITS_MIN..=DIGITS_MAX).contains(&n))
}
