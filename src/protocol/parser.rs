//! Parsing of user-supplied command text.
//!
//! Accepted grammars, after trimming and case folding:
//! ```text
//! rgb        := 'R' ws* num ws+ 'G' ws* num ws+ 'B' ws* num
//! brightness := 'L' ws* num
//! num        := [0-9]+
//! ```
//! A grammar match with a value above 255 is `OutOfRange`; values are never clamped.

use crate::error::ParseError;
use crate::protocol::command::Command;

/// Parses command text into a [`Command`].
///
/// # Errors
///
/// Returns [`ParseError::UnrecognizedFormat`] when no grammar matches and
/// [`ParseError::OutOfRange`] when a matched field exceeds 255.
pub fn parse(raw: &str) -> Result<Command, ParseError> {
    let normalized = raw.trim().to_uppercase();

    if let Some(fields) = match_rgb(&normalized) {
        let [r, g, b] = fields;
        return Ok(Command::SetRgb {
            r: to_u8('R', r)?,
            g: to_u8('G', g)?,
            b: to_u8('B', b)?,
        });
    }

    if let Some(level) = match_brightness(&normalized) {
        return Ok(Command::SetBrightness {
            level: to_u8('L', level)?,
        });
    }

    Err(ParseError::UnrecognizedFormat)
}

fn match_rgb(input: &str) -> Option<[&str; 3]> {
    let mut scanner = Scanner::new(input);
    let r = scanner.field('R')?;
    scanner.require_whitespace()?;
    let g = scanner.field('G')?;
    scanner.require_whitespace()?;
    let b = scanner.field('B')?;
    scanner.finish()?;
    Some([r, g, b])
}

fn match_brightness(input: &str) -> Option<&str> {
    let mut scanner = Scanner::new(input);
    let level = scanner.field('L')?;
    scanner.finish()?;
    Some(level)
}

fn to_u8(field: char, digits: &str) -> Result<u8, ParseError> {
    // Only ASCII digits reach here, so the sole failure mode is overflow.
    digits.parse::<u8>().map_err(|_| ParseError::OutOfRange {
        field,
        value: digits.to_owned(),
    })
}

/// Minimal cursor over the normalized input.
struct Scanner<'a> {
    rest: &'a str,
}

impl<'a> Scanner<'a> {
    const fn new(input: &'a str) -> Self {
        Self { rest: input }
    }

    /// `letter ws* digits`
    fn field(&mut self, letter: char) -> Option<&'a str> {
        self.rest = self.rest.strip_prefix(letter)?;
        self.skip_whitespace();
        self.digits()
    }

    fn skip_whitespace(&mut self) -> usize {
        let trimmed = self.rest.trim_start();
        let skipped = self.rest.len() - trimmed.len();
        self.rest = trimmed;
        skipped
    }

    fn require_whitespace(&mut self) -> Option<()> {
        (self.skip_whitespace() > 0).then_some(())
    }

    fn digits(&mut self) -> Option<&'a str> {
        let end = self
            .rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(self.rest.len());
        if end == 0 {
            return None;
        }
        let (digits, rest) = self.rest.split_at(end);
        self.rest = rest;
        Some(digits)
    }

    fn finish(&self) -> Option<()> {
        self.rest.is_empty().then_some(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::command::PRESETS;

    #[test]
    fn test_parse_rgb() {
        assert_eq!(
            parse("R255 G0 B128"),
            Ok(Command::SetRgb {
                r: 255,
                g: 0,
                b: 128
            })
        );
    }

    #[test]
    fn test_parse_case_and_spacing() {
        assert_eq!(
            parse("r 10  g20   b30"),
            Ok(Command::SetRgb {
                r: 10,
                g: 20,
                b: 30
            })
        );
        assert_eq!(parse("  R 255  G0   B0 "), parse("R255 G0 B0"));
        assert_eq!(parse("R255\tG0\nB0"), parse("R255 G0 B0"));
    }

    #[test]
    fn test_parse_brightness() {
        assert_eq!(parse("L128"), Ok(Command::SetBrightness { level: 128 }));
        assert_eq!(parse("l 7"), Ok(Command::SetBrightness { level: 7 }));
    }

    #[test]
    fn test_parse_leading_zeros() {
        assert_eq!(parse("L007"), Ok(Command::SetBrightness { level: 7 }));
    }

    #[test]
    fn test_out_of_range() {
        assert_eq!(
            parse("R256 G0 B0"),
            Err(ParseError::OutOfRange {
                field: 'R',
                value: "256".into()
            })
        );
        assert_eq!(
            parse("L300"),
            Err(ParseError::OutOfRange {
                field: 'L',
                value: "300".into()
            })
        );
        assert!(matches!(
            parse("R1 G2 B99999999999999999999999"),
            Err(ParseError::OutOfRange { field: 'B', .. })
        ));
    }

    #[test]
    fn test_unrecognized() {
        for input in [
            "purple",
            "",
            "   ",
            "R255G0B0",
            "R255 G0",
            "R-1 G0 B0",
            "R+1 G0 B0",
            "L",
            "L12 extra",
            "G0 R0 B0",
            "R1 G2 B3 L4",
        ] {
            assert_eq!(
                parse(input),
                Err(ParseError::UnrecognizedFormat),
                "input: {input:?}"
            );
        }
    }

    #[test]
    fn test_structure_checked_before_range() {
        // Wrong shape wins over a too-large number.
        assert_eq!(parse("R999 G0"), Err(ParseError::UnrecognizedFormat));
    }

    #[test]
    fn test_encoding_ignores_input_variation() {
        let variants = ["R1 G2 B3", "r1 g2 b3", "R 1   G 2 B  3", "  r1\tG2 b3  "];
        let encoded: Vec<_> = variants
            .iter()
            .map(|v| parse(v).unwrap().encode())
            .collect();
        assert!(encoded.iter().all(|e| e == &encoded[0]));
        assert_eq!(&encoded[0][..], b"R1 G2 B3\n");
    }

    #[test]
    fn test_presets_parse() {
        for preset in PRESETS {
            let cmd = parse(preset).unwrap();
            assert_eq!(cmd.to_string(), preset);
        }
    }
}
