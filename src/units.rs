//! This module defines the physical and economic unit types used by the pipeline.
//!
//! Scalars which cross module boundaries (power curve entries, prices and market values) are wrapped
//! in these types so that, for example, a price cannot be passed where a power is expected. Bulk
//! array data is stored as plain `f64`.
#![allow(missing_docs)]

macro_rules! unit_struct {
    ($name:ident) => {
        /// Represents a type of quantity.
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            PartialOrd,
            Default,
            derive_more::Add,
            derive_more::Sub,
            serde::Serialize,
            serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub f64);

        impl $name {
            /// Creates a new instance of the unit type from a f64 value.
            pub fn new(val: f64) -> Self {
                Self(val)
            }

            /// Returns the value of the unit type as a f64.
            pub fn value(self) -> f64 {
                self.0
            }

            /// Whether the underlying value is finite
            pub fn is_finite(self) -> bool {
                self.0.is_finite()
            }

            /// Whether the underlying value is NaN (i.e. missing)
            pub fn is_nan(self) -> bool {
                self.0.is_nan()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl float_cmp::ApproxEq for $name {
            type Margin = float_cmp::F64Margin;

            fn approx_eq<M: Into<Self::Margin>>(self, other: Self, margin: M) -> bool {
                self.0.approx_eq(other.0, margin)
            }
        }
    };
}

macro_rules! impl_mul {
    ($Lhs:ty, $Rhs:ty, $Out:ty) => {
        impl std::ops::Mul<$Rhs> for $Lhs {
            type Output = $Out;
            fn mul(self, rhs: $Rhs) -> $Out {
                <$Out>::new(self.0 * rhs.0)
            }
        }
    };
}

macro_rules! impl_div {
    ($Lhs:ty, $Rhs:ty, $Out:ty) => {
        impl std::ops::Div<$Rhs> for $Lhs {
            type Output = $Out;
            fn div(self, rhs: $Rhs) -> $Out {
                <$Out>::new(self.0 / rhs.0)
            }
        }
    };
}

// Base quantities
unit_struct!(Dimensionless);
unit_struct!(WindSpeed);
unit_struct!(Power);

// Derived quantities
unit_struct!(MoneyPerEnergy);

// Division rules
impl_div!(Power, Power, Dimensionless);
impl_div!(MoneyPerEnergy, MoneyPerEnergy, Dimensionless);
impl_div!(WindSpeed, WindSpeed, Dimensionless);

// Multiplication rules
impl_mul!(Dimensionless, Dimensionless, Dimensionless);
impl_mul!(Dimensionless, Power, Power);
impl_mul!(Dimensionless, MoneyPerEnergy, MoneyPerEnergy);

impl Dimensionless {
    pub fn powi(self, rhs: i32) -> Self {
        Dimensionless(self.0.powi(rhs))
    }
}

impl From<f64> for Dimensionless {
    fn from(val: f64) -> Self {
        Self(val)
    }
}

impl From<Dimensionless> for f64 {
    fn from(val: Dimensionless) -> Self {
        val.0
    }
}
