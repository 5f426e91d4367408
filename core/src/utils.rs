//! Utility functions and types.

use std::fmt;

/// Values shorter than this are hidden completely.
const REDACT_MIN_VISIBLE: usize = 12;
/// How many leading and trailing chars stay visible for long values.
const REDACT_KEEP: usize = 3;

/// Redact hides secrets like access key secrets and security tokens in
/// `Debug` and `Display` output.
///
/// - Missing or empty values are printed as `EMPTY`.
/// - Values shorter than 12 bytes are printed as `***`.
/// - Longer values keep their first and last three chars: `LTA***xyz`.
#[derive(Clone, Copy)]
pub struct Redact<'a>(Option<&'a str>);

impl Redact<'_> {
    fn write(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = match self.0 {
            None | Some("") => return f.write_str("EMPTY"),
            Some(v) => v,
        };

        let (Some(head), Some(tail)) = (
            v.get(..REDACT_KEEP),
            v.len().checked_sub(REDACT_KEEP).and_then(|at| v.get(at..)),
        ) else {
            return f.write_str("***");
        };
        if v.len() < REDACT_MIN_VISIBLE {
            return f.write_str("***");
        }

        write!(f, "{head}***{tail}")
    }
}

impl<'a> From<&'a str> for Redact<'a> {
    fn from(value: &'a str) -> Self {
        Redact(Some(value))
    }
}

impl<'a> From<&'a String> for Redact<'a> {
    fn from(value: &'a String) -> Self {
        Redact(Some(value.as_str()))
    }
}

impl<'a> From<&'a Option<String>> for Redact<'a> {
    fn from(value: &'a Option<String>) -> Self {
        Redact(value.as_deref())
    }
}

impl fmt::Debug for Redact<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write(f)
    }
}

impl fmt::Display for Redact<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("", "EMPTY"; "empty")]
    #[test_case("Short", "***"; "short")]
    #[test_case("HelloWorld", "***"; "below threshold")]
    #[test_case("Hello World!", "Hel***ld!"; "at threshold")]
    #[test_case("LTAI5tExampleAccessKey", "LTA***Key"; "access key")]
    fn test_redact(input: &str, expected: &str) {
        assert_eq!(format!("{:?}", Redact::from(input)), expected);
        assert_eq!(format!("{}", Redact::from(input)), expected);
    }

    #[test]
    fn test_redact_option() {
        let none: Option<String> = None;
        assert_eq!(format!("{:?}", Redact::from(&none)), "EMPTY");

        let token = Some("CAIShwJ1q6Ft5B2yfSjIr5bSEsj4g7BihPWGWHz".to_string());
        assert_eq!(format!("{:?}", Redact::from(&token)), "CAI***WHz");
    }
}
