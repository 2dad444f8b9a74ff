use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::FrameError;

/// Clockwise rotation in whole quarter turns.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum RotationAngle {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl RotationAngle {
    pub const ALL: [RotationAngle; 4] = [
        RotationAngle::Deg0,
        RotationAngle::Deg90,
        RotationAngle::Deg180,
        RotationAngle::Deg270,
    ];

    pub fn degrees(self) -> i32 {
        self.quarter_turns() as i32 * 90
    }

    pub fn quarter_turns(self) -> u8 {
        match self {
            RotationAngle::Deg0 => 0,
            RotationAngle::Deg90 => 1,
            RotationAngle::Deg180 => 2,
            RotationAngle::Deg270 => 3,
        }
    }

    /// Inverse of [`RotationAngle::quarter_turns`], taken modulo four.
    pub fn from_quarter_turns(turns: u8) -> Self {
        match turns % 4 {
            0 => RotationAngle::Deg0,
            1 => RotationAngle::Deg90,
            2 => RotationAngle::Deg180,
            _ => RotationAngle::Deg270,
        }
    }

    /// Snap an arbitrary angle to the nearest quarter turn.
    ///
    /// Unlike `TryFrom<i32>` this never fails: the angle is reduced modulo 360
    /// and halfway values round up, so 45 becomes 90 and 315 becomes 0.
    pub fn normalized(degrees: i32) -> Self {
        let reduced = degrees.rem_euclid(360);
        let turns = (reduced + 45) / 90;
        Self::from_quarter_turns(turns as u8)
    }

    /// The rotation that undoes this one.
    pub fn inverse(self) -> Self {
        Self::from_quarter_turns((4 - self.quarter_turns()) % 4)
    }

    /// True when the output frame has width and height swapped.
    pub fn swaps_dimensions(self) -> bool {
        matches!(self, RotationAngle::Deg90 | RotationAngle::Deg270)
    }
}

impl TryFrom<i32> for RotationAngle {
    type Error = FrameError;

    fn try_from(degrees: i32) -> Result<Self, Self::Error> {
        match degrees {
            0 => Ok(RotationAngle::Deg0),
            90 => Ok(RotationAngle::Deg90),
            180 => Ok(RotationAngle::Deg180),
            270 => Ok(RotationAngle::Deg270),
            other => Err(FrameError::UnsupportedAngle(other)),
        }
    }
}

impl From<RotationAngle> for i32 {
    fn from(angle: RotationAngle) -> Self {
        angle.degrees()
    }
}

impl FromStr for RotationAngle {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_suffix('°')
            .or_else(|| trimmed.strip_suffix("deg"))
            .unwrap_or(trimmed)
            .trim();
        let degrees: i32 = digits
            .parse()
            .map_err(|_| FrameError::InvalidAngle(s.to_string()))?;
        RotationAngle::try_from(degrees)
    }
}

impl fmt::Display for RotationAngle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}
