/// Number-parsing and case-folding rules for text coercion.
///
/// The invariant locale uses `.` as decimal separator and `,` for grouping,
/// so `"1,234.5"` parses as `1234.5`. A locale only affects how *text* becomes
/// a number; numbers are always rendered with the canonical "General" form.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Locale {
    pub decimal_separator: char,
    pub thousands_separator: Option<char>,
}

impl Default for Locale {
    fn default() -> Self {
        Self::invariant()
    }
}

impl Locale {
    pub const fn invariant() -> Self {
        Locale {
            decimal_separator: '.',
            thousands_separator: Some(','),
        }
    }

    pub const fn new(decimal_separator: char, thousands_separator: Option<char>) -> Self {
        Locale {
            decimal_separator,
            thousands_separator,
        }
    }

    /// Parse a numeric literal: optional sign, grouped integer digits, an
    /// optional fraction and exponent, and an optional trailing `%`.
    /// Surrounding whitespace is ignored.
    pub fn parse_number(&self, s: &str) -> Option<f64> {
        let mut s = s.trim();
        let mut divisor = 1.0;
        if let Some(rest) = s.strip_suffix('%') {
            s = rest.trim_end();
            divisor = 100.0;
        }
        if s.is_empty() {
            return None;
        }

        let (sign, body) = match s.as_bytes()[0] {
            b'-' => ("-", &s[1..]),
            b'+' => ("", &s[1..]),
            _ => ("", s),
        };

        let (mantissa, exponent) = match body.find(['e', 'E']) {
            Some(pos) => (&body[..pos], Some(&body[pos + 1..])),
            None => (body, None),
        };

        let (int_part, frac_part) = match mantissa.split_once(self.decimal_separator) {
            Some((i, f)) => (i, Some(f)),
            None => (mantissa, None),
        };

        let int_digits = self.strip_grouping(int_part)?;
        if let Some(frac) = frac_part {
            if !frac.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
        }
        if int_digits.is_empty() && frac_part.is_none_or(str::is_empty) {
            return None;
        }

        let mut normalised = String::with_capacity(s.len() + 2);
        normalised.push_str(sign);
        normalised.push_str(if int_digits.is_empty() { "0" } else { &int_digits });
        if let Some(frac) = frac_part.filter(|f| !f.is_empty()) {
            normalised.push('.');
            normalised.push_str(frac);
        }
        if let Some(exp) = exponent {
            let digits = exp.strip_prefix(['+', '-']).unwrap_or(exp);
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            normalised.push('e');
            normalised.push_str(exp);
        }
        normalised.parse::<f64>().ok().map(|n| n / divisor)
    }

    /// Digits of an integer part with grouping separators removed; groups after
    /// the first must hold exactly three digits.
    fn strip_grouping(&self, int_part: &str) -> Option<String> {
        let Some(sep) = self.thousands_separator.filter(|s| int_part.contains(*s)) else {
            return int_part
                .bytes()
                .all(|b| b.is_ascii_digit())
                .then(|| int_part.to_string());
        };
        let mut out = String::with_capacity(int_part.len());
        for (i, group) in int_part.split(sep).enumerate() {
            let ok = group.bytes().all(|b| b.is_ascii_digit())
                && if i == 0 {
                    (1..=3).contains(&group.len())
                } else {
                    group.len() == 3
                };
            if !ok {
                return None;
            }
            out.push_str(group);
        }
        Some(out)
    }

    /// Case folding for text comparison.
    pub fn fold_case(&self, s: &str) -> String {
        s.to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invariant_numbers() {
        let loc = Locale::invariant();
        assert_eq!(loc.parse_number(" 42 "), Some(42.0));
        assert_eq!(loc.parse_number("-1.5E+3"), Some(-1500.0));
        assert_eq!(loc.parse_number("1,234.5"), Some(1234.5));
        assert_eq!(loc.parse_number("50%"), Some(0.5));
        assert_eq!(loc.parse_number(".5"), Some(0.5));
        assert_eq!(loc.parse_number("1,23"), None);
        assert_eq!(loc.parse_number("TRUE"), None);
        assert_eq!(loc.parse_number("inf"), None);
        assert_eq!(loc.parse_number("NaN"), None);
        assert_eq!(loc.parse_number(""), None);
        assert_eq!(loc.parse_number("1e"), None);
    }

    #[test]
    fn comma_decimal_locale() {
        let loc = Locale::new(',', Some('.'));
        assert_eq!(loc.parse_number("1.234,56"), Some(1234.56));
        assert_eq!(loc.parse_number("0,25"), Some(0.25));
        assert_eq!(Locale::invariant().parse_number("1.234,56"), None);
    }
}
