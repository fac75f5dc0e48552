//! Risk categories: a monotonic step function over the score range.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{EXCELLENT_FLOOR, FAIR_FLOOR, GOOD_FLOOR, POOR_FLOOR};

/// Ordinal risk label. Variants are declared worst-first so that the derived
/// `Ord` follows the score order.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ScoreCategory {
    #[serde(rename = "Very Poor")]
    VeryPoor,
    Poor,
    Fair,
    Good,
    Excellent,
}

impl ScoreCategory {
    /// All categories, worst first.
    pub const ALL: [ScoreCategory; 5] = [
        Self::VeryPoor,
        Self::Poor,
        Self::Fair,
        Self::Good,
        Self::Excellent,
    ];

    /// Bucket a score. Lower edges are inclusive.
    ///
    /// | Score       | Category  |
    /// |-------------|-----------|
    /// | 800 and up  | Excellent |
    /// | 600–799     | Good      |
    /// | 400–599     | Fair      |
    /// | 200–399     | Poor      |
    /// | below 200   | Very Poor |
    ///
    /// # Examples
    ///
    /// ```
    /// use credit_core::ScoreCategory;
    ///
    /// assert_eq!(ScoreCategory::from_score(199.0), ScoreCategory::VeryPoor);
    /// assert_eq!(ScoreCategory::from_score(200.0), ScoreCategory::Poor);
    /// assert_eq!(ScoreCategory::from_score(799.0), ScoreCategory::Good);
    /// assert_eq!(ScoreCategory::from_score(800.0), ScoreCategory::Excellent);
    /// ```
    pub fn from_score(score: f64) -> Self {
        if score >= EXCELLENT_FLOOR {
            Self::Excellent
        } else if score >= GOOD_FLOOR {
            Self::Good
        } else if score >= FAIR_FLOOR {
            Self::Fair
        } else if score >= POOR_FLOOR {
            Self::Poor
        } else {
            // Includes NaN.
            Self::VeryPoor
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Fair => "Fair",
            Self::Poor => "Poor",
            Self::VeryPoor => "Very Poor",
        }
    }
}

impl fmt::Display for ScoreCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
