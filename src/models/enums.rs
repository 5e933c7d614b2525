use std::fmt;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::ParseEnumError;

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(ParseEnumError {
                        name: stringify!($name),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(Gender {
    Male => "male",
    Female => "female",
});

str_enum!(AkiStatus {
    Ongoing => "ongoing",
    Improving => "improving",
    Resolved => "resolved",
});

str_enum!(DialysisType {
    Hemodialysis => "hemodialysis",
    Peritoneal => "peritoneal",
});

str_enum!(DialysisDuration {
    LessThanSix => "less_than_six_months",
    SixMonthsToYear => "six_months_to_year",
    MoreThanYear => "more_than_year",
});

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

/// CKD stage I through V. Ordered: a higher stage is worse kidney function.
/// Displays as its numeric value, which is what validation messages
/// interpolate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Stage {
    One = 1,
    Two = 2,
    Three = 3,
    Four = 4,
    Five = 5,
}

impl Stage {
    pub fn as_u8(&self) -> u8 {
        *self as u8
    }

    pub fn from_u8(value: u8) -> Result<Self, ParseEnumError> {
        match value {
            1 => Ok(Self::One),
            2 => Ok(Self::Two),
            3 => Ok(Self::Three),
            4 => Ok(Self::Four),
            5 => Ok(Self::Five),
            _ => Err(ParseEnumError {
                name: "Stage",
                value: value.to_string(),
            }),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

// ---------------------------------------------------------------------------
// Indication
// ---------------------------------------------------------------------------

/// Ternary prophylaxis indication. Always recomputed, never stored as an
/// independently mutated field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Indication {
    NotIndicated,
    Conditional,
    Indicated,
}

impl Indication {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotIndicated => "not_indicated",
            Self::Conditional => "conditional",
            Self::Indicated => "indicated",
        }
    }
}

// ---------------------------------------------------------------------------
// GoalUrate
// ---------------------------------------------------------------------------

/// Target serum urate. 6.0 mg/dL for most patients; 5.0 mg/dL for erosive
/// or tophaceous gout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GoalUrate {
    Five,
    #[default]
    Six,
}

impl GoalUrate {
    pub fn value(&self) -> Decimal {
        match self {
            Self::Five => dec!(5.0),
            Self::Six => dec!(6.0),
        }
    }
}
