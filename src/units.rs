//! This module defines the physical quantities used in the model and the rules for combining them.
//!
//! Capacities are in million tonnes of steel per year, production in million tonnes of steel,
//! emissions in million tonnes of CO2 and emission factors in tonnes of CO2 per tonne of steel.
use float_cmp::{ApproxEq, F64Margin};
use serde::{Deserialize, Serialize};
use std::iter::Sum;
use std::ops::{Div, Mul};

macro_rules! unit_struct {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            PartialOrd,
            Default,
            Serialize,
            Deserialize,
            derive_more::Add,
            derive_more::Sub,
            derive_more::AddAssign,
        )]
        pub struct $name(pub f64);

        impl $name {
            /// Create a new quantity from an `f64` value
            pub fn new(value: f64) -> Self {
                Self(value)
            }

            /// The underlying value as an `f64`
            pub fn value(self) -> f64 {
                self.0
            }

            /// Whether the underlying value is finite
            pub fn is_finite(self) -> bool {
                self.0.is_finite()
            }
        }

        impl ApproxEq for $name {
            type Margin = F64Margin;

            fn approx_eq<M: Into<Self::Margin>>(self, other: Self, margin: M) -> bool {
                self.0.approx_eq(other.0, margin)
            }
        }

        impl Sum for $name {
            fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
                Self(iter.map(|x| x.0).sum())
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

macro_rules! impl_mul {
    ($Lhs:ty, $Rhs:ty, $Out:ty) => {
        impl Mul<$Rhs> for $Lhs {
            type Output = $Out;
            fn mul(self, rhs: $Rhs) -> $Out {
                <$Out>::new(self.0 * rhs.0)
            }
        }
        impl Mul<$Lhs> for $Rhs {
            type Output = $Out;
            fn mul(self, lhs: $Lhs) -> $Out {
                <$Out>::new(self.0 * lhs.0)
            }
        }
    };
}

macro_rules! impl_div {
    ($Lhs:ty, $Rhs:ty, $Out:ty) => {
        impl Div<$Rhs> for $Lhs {
            type Output = $Out;
            fn div(self, rhs: $Rhs) -> $Out {
                <$Out>::new(self.0 / rhs.0)
            }
        }
    };
}

unit_struct!(
    /// A dimensionless quantity, e.g. a utilisation rate or a share of production
    Dimensionless
);
unit_struct!(
    /// Rated plant capacity in million tonnes of steel per year
    Capacity
);
unit_struct!(
    /// Steel production in million tonnes
    Production
);
unit_struct!(
    /// CO2 emissions in million tonnes
    Emissions
);
unit_struct!(
    /// Tonnes of CO2 emitted per tonne of steel produced
    EmissionFactor
);

// Multiplication rules
impl_mul!(Capacity, Dimensionless, Production);
impl_mul!(Production, EmissionFactor, Emissions);

// Division rules
impl_div!(Emissions, Production, EmissionFactor);
impl_div!(Production, Production, Dimensionless);
impl_div!(Production, Capacity, Dimensionless);

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    #[test]
    fn test_capacity_times_rate() {
        assert_approx_eq!(
            Production,
            Capacity(100.0) * Dimensionless(0.8),
            Production(80.0)
        );
        assert_approx_eq!(
            Production,
            Dimensionless(0.8) * Capacity(100.0),
            Production(80.0)
        );
    }

    #[test]
    fn test_production_times_factor() {
        assert_approx_eq!(
            Emissions,
            Production(80.0) * EmissionFactor(2.0),
            Emissions(160.0)
        );
        assert_approx_eq!(
            EmissionFactor,
            Emissions(160.0) / Production(80.0),
            EmissionFactor(2.0)
        );
    }

    #[test]
    fn test_sum_and_add_assign() {
        let total: Production = [Production(1.0), Production(2.5)].into_iter().sum();
        assert_eq!(total, Production(3.5));

        let mut acc = Emissions::default();
        acc += Emissions(4.0);
        acc += Emissions(1.0);
        assert_eq!(acc, Emissions(5.0));
    }
}
