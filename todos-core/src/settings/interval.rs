use serde::{de::Error, Deserialize, Deserializer};
use std::fmt;
use std::time::Duration;

/// A duration written with a unit suffix: `250ms`, `15s`, `1m`, `3h`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interval {
    Millis(u64),
    Seconds(u64),
    Minutes(u64),
    Hours(u64),
}

impl Interval {
    pub fn as_duration(&self) -> Duration {
        match *self {
            Interval::Millis(ms) => Duration::from_millis(ms),
            Interval::Seconds(s) => Duration::from_secs(s),
            Interval::Minutes(m) => Duration::from_secs(m.saturating_mul(60)),
            Interval::Hours(h) => Duration::from_secs(h.saturating_mul(3600)),
        }
    }

    pub fn is_zero(&self) -> bool {
        self.as_duration().is_zero()
    }
}

impl std::str::FromStr for Interval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let split = s
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| format!("missing time unit in '{s}'"))?;
        let (num, unit) = s.split_at(split);
        let num: u64 = num
            .parse()
            .map_err(|e| format!("invalid number in '{s}': {e}"))?;

        match unit {
            "ms" => Ok(Interval::Millis(num)),
            "s" => Ok(Interval::Seconds(num)),
            "m" => Ok(Interval::Minutes(num)),
            "h" => Ok(Interval::Hours(num)),
            _ => Err(format!("invalid time unit '{unit}'")),
        }
    }
}

impl<'de> Deserialize<'de> for Interval {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s: String = Deserialize::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}

impl From<Interval> for Duration {
    fn from(val: Interval) -> Self {
        val.as_duration()
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Interval::Millis(ms) => write!(f, "{ms}ms"),
            Interval::Seconds(s) => write!(f, "{s}s"),
            Interval::Minutes(m) => write!(f, "{m}m"),
            Interval::Hours(h) => write!(f, "{h}h"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_units() {
        assert_eq!("250ms".parse(), Ok(Interval::Millis(250)));
        assert_eq!("15s".parse(), Ok(Interval::Seconds(15)));
        assert_eq!("1m".parse(), Ok(Interval::Minutes(1)));
        assert_eq!("3h".parse(), Ok(Interval::Hours(3)));
        assert_eq!(
            Interval::Hours(3).as_duration(),
            Duration::from_secs(3 * 60 * 60)
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!("15".parse::<Interval>().is_err());
        assert!("m".parse::<Interval>().is_err());
        assert!("10d".parse::<Interval>().is_err());
    }

    #[test]
    fn test_huge_values_saturate() {
        assert_eq!(
            Interval::Hours(u64::MAX).as_duration(),
            Duration::from_secs(u64::MAX)
        );
        assert_eq!(
            Interval::Minutes(u64::MAX / 2).as_duration(),
            Duration::from_secs(u64::MAX)
        );
    }

    #[test]
    fn test_display_round_trips_config_notation() {
        assert_eq!(Interval::Minutes(1).to_string(), "1m");
        assert_eq!(Interval::Millis(10).to_string(), "10ms");
    }
}
