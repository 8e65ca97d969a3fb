use anyhow::{Result, bail};

/// Longest temporal window the pattern matcher accepts.
pub const MAX_LENGTH: usize = 60;

/// A field parity. Doubles as the field order argument
/// (`Top` = top field first).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Bottom = 0,
    Top = 1,
}

impl Field {
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Field::Bottom => Field::Top,
            Field::Top => Field::Bottom,
        }
    }
}

impl TryFrom<i64> for Field {
    type Error = anyhow::Error;

    fn try_from(val: i64) -> Result<Self> {
        Ok(match val {
            0 => Self::Bottom,
            1 => Self::Top,
            _ => bail!("Invalid field value, must be 0 or 1, got {val}."),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// One output frame per input frame.
    SameRate = 0,
    /// Two output frames per input frame (bob).
    DoubleRate = 1,
}

impl TryFrom<i64> for OutputMode {
    type Error = anyhow::Error;

    fn try_from(val: i64) -> Result<Self> {
        Ok(match val {
            0 => Self::SameRate,
            1 => Self::DoubleRate,
            _ => bail!("Invalid value for 'mode', must be 0 or 1, got {val}."),
        })
    }
}

/// Neighborhood variant used by the local contrast estimator.
///
/// Compensated variants split the neighborhood into a vertical and a
/// horizontal set and scale each difference by the plane's subsampling;
/// range variants include the center pixel and emit plain max minus min.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreshType {
    FourCompensated = 0,
    EightCompensated = 1,
    Four = 2,
    Eight = 3,
    FourRange = 4,
    EightRange = 5,
}

impl TryFrom<i64> for ThreshType {
    type Error = anyhow::Error;

    fn try_from(val: i64) -> Result<Self> {
        Ok(match val {
            0 => Self::FourCompensated,
            1 => Self::EightCompensated,
            2 => Self::Four,
            3 => Self::Eight,
            4 => Self::FourRange,
            5 => Self::EightRange,
            _ => bail!("Invalid value for 'ttype', must be 0-5, got {val}."),
        })
    }
}

/// Kind of motion run the pattern matcher searches for in the temporal
/// window. Shorter runs classify more pixels as moving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionType {
    /// single marked pixels (most motion)
    Pixel = 0,
    /// marked pixel pairs
    Pair = 1,
    /// marked pixel triples (least motion)
    Triple = 2,
}

impl TryFrom<i64> for MotionType {
    type Error = anyhow::Error;

    fn try_from(val: i64) -> Result<Self> {
        Ok(match val {
            0 => Self::Pixel,
            1 => Self::Pair,
            2 => Self::Triple,
            _ => bail!("Invalid value for 'mtype', must be 0, 1, or 2, got {val}."),
        })
    }
}

/// Per-pixel test used by the combing detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombedMetric {
    /// Same-signed field differences plus a second-derivative check.
    Difference = 0,
    /// Product of the two field differences against cthresh squared.
    Product = 1,
}

impl TryFrom<i64> for CombedMetric {
    type Error = anyhow::Error;

    fn try_from(val: i64) -> Result<Self> {
        Ok(match val {
            0 => Self::Difference,
            1 => Self::Product,
            _ => bail!("Invalid value for 'metric', must be 0 or 1, got {val}."),
        })
    }
}
