//! G-Code line tokenizing and classification
//!
//! Only the pieces of G-code the post-processor cares about are understood:
//! the motion mnemonic, the extrusion distance and whether any spatial axis
//! is present. Everything after a `;` is a comment and is never scanned.

use thiserror::Error;

use robopost_core::GcodeError;

/// Mnemonics that mark a line as a motion command
pub const MOTION_MNEMONICS: [&str; 6] = ["G0", "G1", "G2", "G3", "G4", "G28"];

/// Parameter letter carrying the extrusion distance
pub const EXTRUSION_PARAM: char = 'E';

/// Parameter letters of spatial axes
pub const SPATIAL_AXES: [char; 6] = ['X', 'Y', 'Z', 'A', 'B', 'C'];

/// A parameter value that is not a number
#[derive(Error, Debug, Clone, PartialEq)]
#[error("invalid value '{value}' for parameter '{param}': {reason}")]
pub struct ParameterError {
    /// The parameter letter
    pub param: char,
    /// The text following the letter
    pub value: String,
    /// Why the text could not be parsed
    pub reason: String,
}

impl ParameterError {
    /// Attach the position of the offending line
    pub fn at(self, layer: usize, line_number: usize) -> GcodeError {
        GcodeError::InvalidParameter {
            layer,
            line_number,
            param: self.param,
            value: self.value,
            reason: self.reason,
        }
    }
}

/// A whitespace-delimited word of a G-code line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    text: &'a str,
}

impl<'a> Token<'a> {
    /// Wrap a single word
    pub fn new(text: &'a str) -> Self {
        Self { text }
    }

    /// The full token text
    pub fn text(&self) -> &'a str {
        self.text
    }

    /// Leading letter, if the token starts with one
    pub fn letter(&self) -> Option<char> {
        self.text.chars().next().filter(|c| c.is_ascii_alphabetic())
    }

    /// Everything after the leading character
    pub fn value_text(&self) -> &'a str {
        let mut chars = self.text.chars();
        chars.next();
        chars.as_str()
    }

    /// Parse the text after the leading letter as a number
    pub fn value(&self) -> Result<f64, ParameterError> {
        let value = self.value_text();
        value.parse::<f64>().map_err(|e| ParameterError {
            param: self.letter().unwrap_or('?'),
            value: value.to_string(),
            reason: e.to_string(),
        })
    }

    /// Whether this token begins with one of the motion mnemonics
    pub fn is_motion_mnemonic(&self) -> bool {
        MOTION_MNEMONICS.iter().any(|m| self.text.starts_with(m))
    }

    /// Whether this token is a spatial axis word
    pub fn is_spatial_axis(&self) -> bool {
        self.letter().is_some_and(|c| SPATIAL_AXES.contains(&c))
    }
}

/// The part of a line before any `;` comment
pub fn code_portion(line: &str) -> &str {
    match line.find(';') {
        Some(pos) => &line[..pos],
        None => line,
    }
}

/// Split the code portion of a line into tokens
///
/// Words are separated by whitespace or start at an uppercase letter, so
/// compact G-code such as `G1X10E1` yields `G1`, `X10` and `E1`.
pub fn tokenize(line: &str) -> impl Iterator<Item = Token<'_>> {
    code_portion(line)
        .split_whitespace()
        .flat_map(split_words)
        .map(Token::new)
}

fn split_words(chunk: &str) -> Vec<&str> {
    let mut words = Vec::new();
    let mut start = 0;
    for (pos, c) in chunk.char_indices().skip(1) {
        if c.is_ascii_uppercase() {
            words.push(&chunk[start..pos]);
            start = pos;
        }
    }
    words.push(&chunk[start..]);
    words
}

/// Parameters of a motion line relevant to the extruder
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionLine {
    /// Extrusion distance, `None` when the line has no `E` word
    pub extrusion: Option<f64>,
    /// Whether any of X, Y, Z, A, B or C is present
    pub has_spatial_axis: bool,
}

/// Classification of a single line
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LineClass {
    /// Not a motion command, copied through untouched
    Passthrough,
    /// Motion command that may change the extruder state
    Motion(MotionLine),
}

/// Stateless line classifier
#[derive(Debug, Clone, Copy, Default)]
pub struct LineClassifier;

impl LineClassifier {
    /// Create a new classifier
    pub fn new() -> Self {
        Self
    }

    /// Classify a line
    ///
    /// The extrusion distance comes from the first `E` word; a malformed
    /// value is an error rather than a silent zero.
    pub fn classify(&self, line: &str) -> Result<LineClass, ParameterError> {
        let tokens: Vec<Token<'_>> = tokenize(line).collect();

        if !tokens.iter().any(Token::is_motion_mnemonic) {
            return Ok(LineClass::Passthrough);
        }

        let extrusion = tokens
            .iter()
            .find(|token| token.letter() == Some(EXTRUSION_PARAM))
            .map(Token::value)
            .transpose()?;

        Ok(LineClass::Motion(MotionLine {
            extrusion,
            has_spatial_axis: tokens.iter().any(Token::is_spatial_axis),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn motion(line: &str) -> MotionLine {
        match LineClassifier::new().classify(line).unwrap() {
            LineClass::Motion(m) => m,
            LineClass::Passthrough => panic!("expected motion line: {line:?}"),
        }
    }

    #[test]
    fn test_tokenize_strips_comment() {
        let tokens: Vec<&str> = tokenize("G1 X10 E1.5 ;Extrude G1 E9\n")
            .map(|t| t.text())
            .collect();
        assert_eq!(tokens, vec!["G1", "X10", "E1.5"]);
    }

    #[test]
    fn test_tokenize_compact_words() {
        let tokens: Vec<&str> = tokenize("G1X10.5Y-2E0.8 F1800\n")
            .map(|t| t.text())
            .collect();
        assert_eq!(tokens, vec!["G1", "X10.5", "Y-2", "E0.8", "F1800"]);

        let line = motion("G1X10E1");
        assert_eq!(line.extrusion, Some(1.0));
        assert!(line.has_spatial_axis);
    }

    #[test]
    fn test_token_parts() {
        let token = Token::new("E-1.25");
        assert_eq!(token.letter(), Some('E'));
        assert_eq!(token.value_text(), "-1.25");
        assert_eq!(token.value().unwrap(), -1.25);
        assert_eq!(Token::new(";comment").letter(), None);
    }

    #[test]
    fn test_passthrough_lines() {
        let classifier = LineClassifier::new();
        for line in [
            ";LAYER:0\n",
            "M104 S200\n",
            "M62 P0 ;Robot Extruder active: On\n",
            "\n",
            "",
            ";G1 X10 E5\n",
        ] {
            assert_eq!(classifier.classify(line).unwrap(), LineClass::Passthrough);
        }
    }

    #[test]
    fn test_motion_mnemonics_match_as_prefix() {
        for line in ["G0 X1", "G1 X1", "G2 X1", "G3 X1", "G4 P1", "G28", "G10 X1"] {
            motion(line);
        }
    }

    #[test]
    fn test_extrusion_value() {
        assert_eq!(motion("G1 X10 Y5 E0.42\n").extrusion, Some(0.42));
        assert_eq!(motion("G1 E-1.2\n").extrusion, Some(-1.2));
        assert_eq!(motion("G1 X3 E0\n").extrusion, Some(0.0));
        assert_eq!(motion("G0 X10 Y5\n").extrusion, None);
    }

    #[test]
    fn test_first_extrusion_word_wins() {
        assert_eq!(motion("G1 E2 E3").extrusion, Some(2.0));
    }

    #[test]
    fn test_spatial_axis_presence() {
        assert!(motion("G1 X10 E1").has_spatial_axis);
        assert!(motion("G1 Z0.3 E1").has_spatial_axis);
        assert!(motion("G1 A90 E1").has_spatial_axis);
        assert!(!motion("G1 E1 F1800").has_spatial_axis);
        assert!(!motion("G1 E1 ;X marks the spot").has_spatial_axis);
    }

    #[test]
    fn test_malformed_extrusion_is_error() {
        let err = LineClassifier::new().classify("G1 X1 E1.2.3\n").unwrap_err();
        assert_eq!(err.param, 'E');
        assert_eq!(err.value, "1.2.3");

        assert!(LineClassifier::new().classify("G1 E\n").is_err());
    }

    #[test]
    fn test_error_location() {
        let err = LineClassifier::new().classify("G1 Eabc").unwrap_err().at(3, 7);
        assert!(matches!(
            err,
            GcodeError::InvalidParameter {
                layer: 3,
                line_number: 7,
                param: 'E',
                ..
            }
        ));
    }
}
