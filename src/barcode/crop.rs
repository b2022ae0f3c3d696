use std::fmt;
use std::str::FromStr;

use crate::runtime::Error;

///////////////////////////////
/// A crop over a sequence, written `start:stop:step` with every part optional.
/// Negative indices count from the end and a negative step walks backwards,
/// with the same clamping rules as Python slices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CropRange {
    pub start: Option<isize>,
    pub stop: Option<isize>,
    pub step: Option<isize>,
}

impl CropRange {
    /// The crop that keeps the whole sequence (`:`)
    pub fn full() -> Self {
        CropRange::default()
    }

    pub fn is_full(&self) -> bool {
        self.start.is_none() && self.stop.is_none() && matches!(self.step, None | Some(1))
    }

    /// Resolve the crop against a sequence of `len` elements, returning the
    /// selected indices in output order
    pub fn indices(&self, len: usize) -> impl Iterator<Item = usize> {
        let len = len as isize;
        let step = self.step.unwrap_or(1);
        let (lower, upper) = if step < 0 { (-1, len - 1) } else { (0, len) };

        let clamp = |bound: Option<isize>, default: isize| match bound {
            None => default,
            Some(i) if i < 0 => (i + len).max(lower),
            Some(i) => i.min(upper),
        };
        let start = clamp(self.start, if step < 0 { upper } else { lower });
        let stop = clamp(self.stop, if step < 0 { lower } else { upper });

        let mut i = start;
        std::iter::from_fn(move || {
            let inside = if step > 0 { i < stop } else { i > stop };
            if !inside {
                return None;
            }
            let current = i;
            // Past isize range means past the sequence
            i = i.checked_add(step).unwrap_or(stop);
            Some(current as usize)
        })
    }

    pub fn apply(&self, seq: &str) -> String {
        if self.is_full() {
            return seq.to_string();
        }
        let chars: Vec<char> = seq.chars().collect();
        self.indices(chars.len()).map(|i| chars[i]).collect()
    }
}

impl FromStr for CropRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() > 3 {
            return Err(Error::parse_error(
                format!("crop expression '{}'", s),
                Some("expected at most start:stop:step"),
            ));
        }

        let parse_part = |part: Option<&&str>| -> Result<Option<isize>, Error> {
            match part.map(|p| p.trim()) {
                None | Some("") => Ok(None),
                Some(p) => p.parse::<isize>().map(Some).map_err(|e| {
                    Error::parse_error(format!("crop expression '{}'", s), Some(e.to_string()))
                }),
            }
        };

        let crop = CropRange {
            start: parse_part(parts.first())?,
            stop: parse_part(parts.get(1))?,
            step: parse_part(parts.get(2))?,
        };
        if crop.step == Some(0) {
            return Err(Error::parse_error(
                format!("crop expression '{}'", s),
                Some("step cannot be zero"),
            ));
        }
        Ok(crop)
    }
}

impl fmt::Display for CropRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |v: Option<isize>| v.map(|v| v.to_string()).unwrap_or_default();
        write!(f, "{}:{}", show(self.start), show(self.stop))?;
        if let Some(step) = self.step {
            write!(f, ":{}", step)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn crop(expr: &str, seq: &str) -> String {
        expr.parse::<CropRange>().unwrap().apply(seq)
    }

    #[test]
    fn test_full_range_is_identity() {
        assert_eq!(crop(":", "ACGTACGT"), "ACGTACGT");
        assert_eq!(crop("::", "ACGTACGT"), "ACGTACGT");
        assert_eq!(crop("::1", "ACGTACGT"), "ACGTACGT");
        assert_eq!(crop("0:8", "ACGTACGT"), "ACGTACGT");
        assert_eq!(crop("-100:100", "ACGTACGT"), "ACGTACGT");
    }

    #[test]
    fn test_open_ended_bounds() {
        assert_eq!(crop("2:", "ACGTACGT"), "GTACGT");
        assert_eq!(crop(":3", "ACGTACGT"), "ACG");
        assert_eq!(crop("2", "ACGTACGT"), "GTACGT");
        assert_eq!(crop("-3:", "ACGTACGT"), "CGT");
        assert_eq!(crop(":-2", "ACGTACGT"), "ACGTAC");
    }

    #[test]
    fn test_step_and_reversal() {
        assert_eq!(crop("::2", "ACGTACGT"), "AGAG");
        assert_eq!(crop("::-1", "ACGTTT"), "TTTGCA");
        assert_eq!(crop("4:1:-1", "ABCDEF"), "EDC");
        assert_eq!(crop("1:4:-1", "ABCDEF"), "");
        assert_eq!(crop("::-2", "ABCDEF"), "FDB");
    }

    #[test]
    fn test_out_of_range_is_clamped() {
        assert_eq!(crop("10:", "ACGT"), "");
        assert_eq!(crop(":10", "ACGT"), "ACGT");
        assert_eq!(crop("10::-1", "ACGT"), "TGCA");
        assert_eq!(crop("2:", ""), "");
    }

    #[test]
    fn test_huge_step_takes_one_element() {
        assert_eq!(crop("3::9223372036854775807", "ACGTACGT"), "T");
        assert_eq!(crop("::9223372036854775807", "ACGT"), "A");
        assert_eq!(crop("::-9223372036854775807", "ACGT"), "T");
        assert_eq!(crop("-1::-9223372036854775808", "ACGT"), "T");
    }

    #[test]
    fn test_invalid_expressions() {
        assert!("a:b".parse::<CropRange>().is_err());
        assert!("::0".parse::<CropRange>().is_err());
        assert!("1:2:3:4".parse::<CropRange>().is_err());
    }

    #[test]
    fn test_display_roundtrips_through_parse() {
        for expr in [":", "2:", ":-3", "1:10:2", "::-1"] {
            let parsed: CropRange = expr.parse().unwrap();
            assert_eq!(parsed.to_string().parse::<CropRange>().unwrap(), parsed);
        }
    }
}
