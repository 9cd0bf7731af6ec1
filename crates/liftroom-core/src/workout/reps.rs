use std::fmt;

use serde::{Deserialize, Serialize};

/// Structured reading of a free-form reps descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RepsTarget {
    Exact { reps: u32 },
    Range { min: u32, max: u32 },
    /// As many reps as possible.
    Amrap,
    Freeform { text: String },
}

impl RepsTarget {
    pub fn parse(descriptor: &str) -> Self {
        let text = descriptor.trim();
        if text.eq_ignore_ascii_case("amrap") || text.eq_ignore_ascii_case("max") {
            return RepsTarget::Amrap;
        }
        if let Ok(reps) = text.parse::<u32>() {
            return RepsTarget::Exact { reps };
        }
        if let Some((lo, hi)) = text.split_once('-') {
            if let (Ok(min), Ok(max)) = (lo.trim().parse::<u32>(), hi.trim().parse::<u32>()) {
                return if min == max {
                    RepsTarget::Exact { reps: min }
                } else {
                    RepsTarget::Range {
                        min: min.min(max),
                        max: min.max(max),
                    }
                };
            }
        }
        RepsTarget::Freeform {
            text: text.to_string(),
        }
    }

    /// Lowest rep count the descriptor asks for, when it names one.
    pub fn min_reps(&self) -> Option<u32> {
        match self {
            RepsTarget::Exact { reps } => Some(*reps),
            RepsTarget::Range { min, .. } => Some(*min),
            RepsTarget::Amrap | RepsTarget::Freeform { .. } => None,
        }
    }
}

impl fmt::Display for RepsTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepsTarget::Exact { reps } => write!(f, "{reps}"),
            RepsTarget::Range { min, max } => write!(f, "{min}-{max}"),
            RepsTarget::Amrap => f.write_str("AMRAP"),
            RepsTarget::Freeform { text } => f.write_str(text),
        }
    }
}
