//! Angle units.
//!
//! Observation tables store angles in degrees while the trigonometry works
//! in radians; the unit is carried in the type so the two never get mixed.
use std::{
    fmt::{Debug, Display},
    marker::PhantomData,
    str::FromStr,
};

/// Radian unit.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct URadian;

/// Degree unit.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct UDegree;

/// Unit trait for angle units.
pub trait AngleUnit: Debug + Copy + Clone {
    /// The name of the unit.
    const NAME: &'static str;

    /// The symbols of the unit, the first one is used for display.
    const SYMBOLS: &'static [&'static str];

    /// The conversion factor from radians.
    const FACTOR_FROM_RAD: f64;

    /// The conversion factor to radians.
    const FACTOR_TO_RAD: f64 = 1.0 / Self::FACTOR_FROM_RAD;

    /// The conversion factor from degrees.
    const FACTOR_FROM_DEG: f64;

    /// The conversion factor to degrees.
    const FACTOR_TO_DEG: f64 = 1.0 / Self::FACTOR_FROM_DEG;
}

impl AngleUnit for URadian {
    const NAME: &'static str = "radian";
    const SYMBOLS: &'static [&'static str] = &["rad", "rads", "radians"];
    const FACTOR_FROM_RAD: f64 = 1.0;
    const FACTOR_FROM_DEG: f64 = std::f64::consts::PI / 180.0;
}

impl AngleUnit for UDegree {
    const NAME: &'static str = "degree";
    const SYMBOLS: &'static [&'static str] = &["deg", "degs", "degrees", "°"];
    const FACTOR_FROM_RAD: f64 = 180.0 / std::f64::consts::PI;
    const FACTOR_FROM_DEG: f64 = 1.0;
}

/// Angle with unit.
#[derive(Copy, Clone)]
pub struct Angle<A: AngleUnit> {
    value: f64,
    unit: PhantomData<A>,
}

/// Angle in radians.
pub type Radians = Angle<URadian>;

/// Angle in degrees.
pub type Degrees = Angle<UDegree>;

impl<A: AngleUnit> Debug for Angle<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Angle {{ value: {}, unit: {} }}",
            self.value,
            A::SYMBOLS[0]
        )
    }
}

impl<A: AngleUnit> Display for Angle<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.value, A::SYMBOLS[0])
    }
}

impl<A: AngleUnit, B: AngleUnit> PartialEq<Angle<B>> for Angle<A> {
    fn eq(&self, other: &Angle<B>) -> bool {
        self.value * A::FACTOR_TO_RAD == other.value * B::FACTOR_TO_RAD
    }
}

impl<A: AngleUnit, B: AngleUnit> PartialOrd<Angle<B>> for Angle<A> {
    fn partial_cmp(&self, other: &Angle<B>) -> Option<std::cmp::Ordering> {
        (self.value * A::FACTOR_TO_RAD).partial_cmp(&(other.value * B::FACTOR_TO_RAD))
    }
}

impl<A: AngleUnit> Angle<A> {
    /// Creates a new angle with unit.
    pub const fn new(value: f64) -> Self {
        Angle {
            value,
            unit: PhantomData,
        }
    }

    /// Returns the value of the angle without unit.
    pub const fn value(&self) -> f64 { self.value }

    /// Converts the angle to radians.
    #[inline]
    pub fn to_radians(&self) -> Radians { Angle::new(self.value * A::FACTOR_TO_RAD) }

    /// Converts the angle to degrees.
    #[inline]
    pub fn to_degrees(&self) -> Degrees { Angle::new(self.value * A::FACTOR_TO_DEG) }

    /// Returns the value of the angle in radians.
    #[inline]
    pub fn as_radians_f64(&self) -> f64 { self.value * A::FACTOR_TO_RAD }
}

impl<A: AngleUnit> From<f64> for Angle<A> {
    fn from(value: f64) -> Self { Angle::new(value) }
}

impl<A: AngleUnit> FromStr for Angle<A> {
    type Err = &'static str;

    /// Parses strings such as `"1.5 deg"` or `"0.2rad"`. A bare number is
    /// interpreted in the unit of the target type.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let split = s
            .find(|c: char| !(c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E')))
            .unwrap_or(s.len());
        let value = s[..split]
            .trim()
            .parse::<f64>()
            .map_err(|_| "invalid angle value")?;
        let unit = s[split..].trim();
        if unit.is_empty() {
            Ok(Self::new(value))
        } else if URadian::SYMBOLS.contains(&unit) {
            Ok(Self::new(value * A::FACTOR_FROM_RAD))
        } else if UDegree::SYMBOLS.contains(&unit) {
            Ok(Self::new(value * A::FACTOR_FROM_DEG))
        } else {
            Err("invalid angle unit")
        }
    }
}

impl<A: AngleUnit> serde::Serialize for Angle<A> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de, A: AngleUnit> serde::Deserialize<'de> for Angle<A> {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Creates a new angle in degrees.
#[macro_export]
macro_rules! deg {
    ($value:expr) => {
        $crate::units::Degrees::new($value)
    };
}

/// Creates a new angle in radians.
#[macro_export]
macro_rules! rad {
    ($value:expr) => {
        $crate::units::Radians::new($value)
    };
}
