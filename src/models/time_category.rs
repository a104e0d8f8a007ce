use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Rough bucket for how long a recipe takes end to end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeCategory {
    Quick,
    Moderate,
    Lengthy,
}

impl TimeCategory {
    /// Upper bound (inclusive) for `Quick`, in minutes.
    pub const QUICK_MAX: u32 = 30;
    /// Upper bound (inclusive) for `Moderate`, in minutes.
    pub const MODERATE_MAX: u32 = 60;

    pub fn classify(minutes: u32) -> Self {
        if minutes <= Self::QUICK_MAX {
            TimeCategory::Quick
        } else if minutes <= Self::MODERATE_MAX {
            TimeCategory::Moderate
        } else {
            TimeCategory::Lengthy
        }
    }

    /// Classifies a free-text duration such as "1 hr 20 min".
    pub fn classify_text(text: &str) -> Option<Self> {
        parse_minutes(text).map(Self::classify)
    }
}

impl fmt::Display for TimeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeCategory::Quick => write!(f, "quick"),
            TimeCategory::Moderate => write!(f, "moderate"),
            TimeCategory::Lengthy => write!(f, "lengthy"),
        }
    }
}

impl FromStr for TimeCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "quick" => Ok(TimeCategory::Quick),
            "moderate" => Ok(TimeCategory::Moderate),
            "lengthy" => Ok(TimeCategory::Lengthy),
            _ => Err(format!(
                "Invalid time category '{}'. Valid options: quick, moderate, lengthy",
                s
            )),
        }
    }
}

/// Parses a human or ISO-8601 duration into whole minutes.
///
/// Accepts "45 mins", "1 hr 20 min", "1h30m", "1.5 hours", "PT1H30M" and bare
/// numbers (read as minutes). Returns `None` when no number is present.
pub fn parse_minutes(text: &str) -> Option<u32> {
    let lower = text.trim().to_lowercase();
    let body = lower.strip_prefix("pt").unwrap_or(&lower);

    let mut chars = body.chars().peekable();
    let mut total = 0.0_f64;
    let mut found = false;

    while let Some(&c) = chars.peek() {
        if !(c.is_ascii_digit() || c == '.') {
            chars.next();
            continue;
        }

        let mut number = String::new();
        while let Some(&d) = chars.peek() {
            if d.is_ascii_digit() || d == '.' {
                number.push(d);
                chars.next();
            } else {
                break;
            }
        }
        let Ok(value) = number.parse::<f64>() else {
            continue;
        };

        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }
        let mut word = String::new();
        while let Some(&w) = chars.peek() {
            if w.is_alphabetic() {
                word.push(w);
                chars.next();
            } else {
                break;
            }
        }

        let minutes = match word.chars().next() {
            Some('h') => value * 60.0,
            Some('d') => value * 24.0 * 60.0,
            Some('s') => value / 60.0,
            _ => value,
        };
        total += minutes;
        found = true;
    }

    if found {
        Some(total.round() as u32)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_boundaries() {
        assert_eq!(TimeCategory::classify(0), TimeCategory::Quick);
        assert_eq!(TimeCategory::classify(30), TimeCategory::Quick);
        assert_eq!(TimeCategory::classify(31), TimeCategory::Moderate);
        assert_eq!(TimeCategory::classify(60), TimeCategory::Moderate);
        assert_eq!(TimeCategory::classify(61), TimeCategory::Lengthy);
    }

    #[test]
    fn test_parse_minutes_variants() {
        assert_eq!(parse_minutes("45 mins"), Some(45));
        assert_eq!(parse_minutes("1 hr 20 min"), Some(80));
        assert_eq!(parse_minutes("1h30m"), Some(90));
        assert_eq!(parse_minutes("1.5 hours"), Some(90));
        assert_eq!(parse_minutes("PT1H30M"), Some(90));
        assert_eq!(parse_minutes("25"), Some(25));
    }

    #[test]
    fn test_parse_minutes_without_number() {
        assert_eq!(parse_minutes("overnight"), None);
        assert_eq!(parse_minutes(""), None);
    }

    #[test]
    fn test_classify_text() {
        assert_eq!(
            TimeCategory::classify_text("2 hours"),
            Some(TimeCategory::Lengthy)
        );
        assert_eq!(TimeCategory::classify_text("unknown"), None);
    }

    #[test]
    fn test_time_category_from_str() {
        assert_eq!(
            TimeCategory::from_str("QUICK").unwrap(),
            TimeCategory::Quick
        );
        assert!(TimeCategory::from_str("slow").is_err());
    }

    #[test]
    fn test_time_category_json() {
        let json = serde_json::to_string(&TimeCategory::Moderate).unwrap();
        assert_eq!(json, "\"moderate\"");
    }
}
