//! Line command parsing.
//!
//! Lines arrive without their terminator and already upper-cased.

use heapless::Vec;
use libm::fabsf;

use crate::error::ProtocolError;
use crate::motion::Axis;

/// How jog axis values are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PositionMode {
    /// `G90`: values are target positions.
    Absolute,
    /// `G91`: values are displacements.
    Relative,
}

/// A parsed `$J=` jog.
#[derive(Debug, Clone, PartialEq)]
pub struct JogRequest {
    /// Positioning mode, `G90` unless `G91` is given.
    pub mode: PositionMode,
    /// Axis values in the order they appeared.
    pub targets: Vec<(Axis, f32), 2>,
    /// `F` word. Parsed, but motion runs at the fixed step rate.
    pub feed: Option<f32>,
}

/// A complete line command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// `RST`
    Reset,
    /// `HOME`
    Home,
    /// `$J=...`
    Jog(JogRequest),
    /// `ALT:<delta>`
    LegacyAltitude(f32),
}

const JOG_PREFIX: &str = "$J=";
const LEGACY_ALT_PREFIX: &str = "ALT:";

/// Largest axis word or `ALT:` delta accepted, in degrees (100 turns).
pub const MAX_AXIS_DEGREES: f32 = 36_000.0;

/// Parse one line.
pub fn parse_line(line: &str) -> Result<Command, ProtocolError> {
    let line = line.trim();

    if line == "RST" {
        return Ok(Command::Reset);
    }
    if line == "HOME" {
        return Ok(Command::Home);
    }
    if let Some(body) = line.strip_prefix(JOG_PREFIX) {
        return parse_jog(body).map(Command::Jog);
    }
    if let Some(value) = line.strip_prefix(LEGACY_ALT_PREFIX) {
        return parse_axis_value(value.trim()).map(Command::LegacyAltitude);
    }

    Err(ProtocolError::UnknownCommand)
}

fn parse_number(text: &str) -> Result<f32, ProtocolError> {
    let value: f32 = text.parse().map_err(|_| ProtocolError::InvalidNumber)?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ProtocolError::InvalidNumber)
    }
}

fn parse_axis_value(text: &str) -> Result<f32, ProtocolError> {
    let value = parse_number(text)?;
    if fabsf(value) <= MAX_AXIS_DEGREES {
        Ok(value)
    } else {
        Err(ProtocolError::OutOfRange)
    }
}

fn parse_jog(body: &str) -> Result<JogRequest, ProtocolError> {
    let mut jog = JogRequest {
        mode: PositionMode::Absolute,
        targets: Vec::new(),
        feed: None,
    };

    for word in Words::new(body) {
        let (letter, value) = word?;
        match letter {
            'G' => match value {
                "90" => jog.mode = PositionMode::Absolute,
                "91" => jog.mode = PositionMode::Relative,
                // Units and machine-coordinate words are accepted as-is.
                "20" | "21" | "53" => {}
                _ => return Err(ProtocolError::UnexpectedWord('G')),
            },
            'F' => jog.feed = Some(parse_number(value)?),
            _ => {
                let axis = Axis::from_letter(letter).ok_or(ProtocolError::UnexpectedWord(letter))?;
                if jog.targets.iter().any(|(a, _)| *a == axis) {
                    return Err(ProtocolError::RepeatedAxis);
                }
                let value = parse_axis_value(value)?;
                // At most one entry per axis, so this never overflows.
                let _ = jog.targets.push((axis, value));
            }
        }
    }

    if jog.targets.is_empty() {
        return Err(ProtocolError::NoAxis);
    }

    Ok(jog)
}

/// Splits `G91X1.5F300` into `('G', "91")`, `('X', "1.5")`, `('F', "300")`.
struct Words<'a> {
    rest: &'a str,
}

impl<'a> Words<'a> {
    fn new(body: &'a str) -> Self {
        Self { rest: body }
    }
}

impl<'a> Iterator for Words<'a> {
    type Item = Result<(char, &'a str), ProtocolError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.rest = self.rest.trim_start();
        let mut chars = self.rest.chars();
        let letter = chars.next()?;
        if !letter.is_ascii_alphabetic() {
            self.rest = "";
            return Some(Err(ProtocolError::UnexpectedWord(letter)));
        }

        let after = &self.rest[letter.len_utf8()..];
        let end = after
            .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-' || c == '+'))
            .unwrap_or(after.len());
        let value = &after[..end];
        self.rest = &after[end..];

        if value.is_empty() {
            self.rest = "";
            return Some(Err(ProtocolError::InvalidNumber));
        }
        Some(Ok((letter, value)))
    }
}
