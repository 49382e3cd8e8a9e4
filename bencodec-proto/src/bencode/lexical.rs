pub fn is_non_zero_digit(c: u8) -> bool {
    matches!(c, b'1'..=b'9')
}

pub fn is_digit(c: u8) -> bool {
    c == b'0' || is_non_zero_digit(c)
}

fn all_digits(input: &[u8]) -> bool {
    input.iter().copied().all(is_digit)
}

/// Checks the body of an integer element (what sits between `i` and `e`).
///
/// Accepts `0`, a non-zero digit followed by any digits, or `-` followed by such a number.
/// Rejects the empty body, leading zeros, a bare `-` and `-0`. This is stricter than
/// `str::parse`, which is why bodies are checked here before conversion.
pub fn valid_int_format(input: &[u8]) -> bool {
    match input {
        [] => false,
        [c] => is_digit(*c),
        [b'-', first, rest @ ..] => is_non_zero_digit(*first) && all_digits(rest),
        [first, rest @ ..] => is_non_zero_digit(*first) && all_digits(rest),
    }
}

/// Checks the length prefix of a string element (what precedes `:`).
///
/// Same leading-zero rule as [`valid_int_format`], without a sign.
pub fn valid_str_len_format(input: &[u8]) -> bool {
    match input {
        [] => false,
        [c] => is_digit(*c),
        [first, rest @ ..] => is_non_zero_digit(*first) && all_digits(rest),
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test]
    fn digit_classes() {
        for c in b'0'..=b'9' {
            assert!(is_digit(c));
        }
        assert!(!is_non_zero_digit(b'0'));
        for c in b'1'..=b'9' {
            assert!(is_non_zero_digit(c));
        }
        for c in [b'a', b'-', b':', b' ', b'/', 0xff] {
            assert!(!is_digit(c));
            assert!(!is_non_zero_digit(c));
        }
    }

    #[test_case(b"0" ; "zero")]
    #[test_case(b"7" ; "single digit")]
    #[test_case(b"42" ; "two digits")]
    #[test_case(b"100" ; "trailing zeros")]
    #[test_case(b"-1" ; "negative")]
    #[test_case(b"-100" ; "negative trailing zeros")]
    #[test_case(b"9223372036854775808" ; "format does not check range")]
    fn int_format_accepts(input: &[u8]) {
        assert!(valid_int_format(input));
    }

    #[test_case(b"" ; "empty")]
    #[test_case(b"-" ; "bare minus")]
    #[test_case(b"-0" ; "negative zero")]
    #[test_case(b"00" ; "double zero")]
    #[test_case(b"01" ; "leading zero")]
    #[test_case(b"-01" ; "negative leading zero")]
    #[test_case(b"+1" ; "plus sign")]
    #[test_case(b"--1" ; "double minus")]
    #[test_case(b" 1" ; "leading space")]
    #[test_case(b"1a" ; "trailing garbage")]
    #[test_case(b"a" ; "not a digit")]
    fn int_format_rejects(input: &[u8]) {
        assert!(!valid_int_format(input));
    }

    #[test_case(b"0" ; "zero")]
    #[test_case(b"4" ; "single digit")]
    #[test_case(b"10" ; "trailing zero")]
    #[test_case(b"123456" ; "many digits")]
    fn str_len_format_accepts(input: &[u8]) {
        assert!(valid_str_len_format(input));
    }

    #[test_case(b"" ; "empty")]
    #[test_case(b"01" ; "leading zero")]
    #[test_case(b"00" ; "double zero")]
    #[test_case(b"-1" ; "negative")]
    #[test_case(b"1e" ; "trailing garbage")]
    #[test_case(b"100e-1" ; "embedded end delimiter")]
    fn str_len_format_rejects(input: &[u8]) {
        assert!(!valid_str_len_format(input));
    }
}
