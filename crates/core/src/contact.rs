//! Click-to-contact links for labs.

use crate::constants::DEFAULT_COUNTRY_CALLING_CODE;

/// Builds a `wa.me` link for a phone number.
///
/// Non-digits are stripped. Local numbers are given the country calling code:
/// an 11-digit number with a leading `0` drops the `0`, and a bare 10-digit number is
/// prefixed as-is. Numbers that already carry the code are left alone.
///
/// Returns `None` if the number contains no digits.
pub fn whatsapp_link(phone: &str, text: Option<&str>) -> Option<String> {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }

    let formatted = if digits.len() == 11 && digits.starts_with('0') {
        format!("{DEFAULT_COUNTRY_CALLING_CODE}{}", &digits[1..])
    } else if digits.len() == 10 && !digits.starts_with(DEFAULT_COUNTRY_CALLING_CODE) {
        format!("{DEFAULT_COUNTRY_CALLING_CODE}{digits}")
    } else {
        digits
    };

    Some(match text.filter(|t| !t.is_empty()) {
        Some(text) => format!(
            "https://wa.me/{formatted}?text={}",
            urlencoding::encode(text)
        ),
        None => format!("https://wa.me/{formatted}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_mobile_number_gains_country_code() {
        assert_eq!(
            whatsapp_link("0803-123-4567", None).as_deref(),
            Some("https://wa.me/2348031234567")
        );
    }

    #[test]
    fn ten_digit_number_is_prefixed() {
        assert_eq!(
            whatsapp_link("803 123 4567", None).as_deref(),
            Some("https://wa.me/2348031234567")
        );
    }

    #[test]
    fn international_number_is_kept() {
        assert_eq!(
            whatsapp_link("+234 803 123 4567", None).as_deref(),
            Some("https://wa.me/2348031234567")
        );
    }

    #[test]
    fn text_is_url_encoded() {
        assert_eq!(
            whatsapp_link("08031234567", Some("Hi, is the lab open?")).as_deref(),
            Some("https://wa.me/2348031234567?text=Hi%2C%20is%20the%20lab%20open%3F")
        );
    }

    #[test]
    fn no_digits_means_no_link() {
        assert_eq!(whatsapp_link("N/A", None), None);
    }
}
