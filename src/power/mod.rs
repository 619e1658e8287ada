//! Power model strategies.
//!
//! A power model is a pure function from a utilization fraction in `[0, 1]`
//! to instantaneous power draw in Watts. Parameters are fixed at
//! construction and the derived constants are precomputed, so a model is a
//! small `Copy` value safely shared across all cores and calls.

use crate::compute::ComputeError;
use crate::sim::PowerModelSpec;

/// Closed set of power model strategies. Every load-dependent variant
/// satisfies `compute_power(0) == static_power` and
/// `compute_power(1) == max_power` exactly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PowerModel {
    /// Fixed draw regardless of load (the static rating of a unit).
    Constant { power_w: f64 },
    /// `static + const * (100u)`
    Linear {
        static_power_w: f64,
        const_power_w: f64,
    },
    /// `static + const * (100u)^2`: idle hardware draws a static floor and
    /// the marginal cost per unit load grows with load.
    Square {
        static_power_w: f64,
        const_power_w: f64,
    },
    /// `static + const * (100u)^3`
    Cubic {
        static_power_w: f64,
        const_power_w: f64,
    },
}

impl PowerModel {
    pub fn constant(power_w: f64) -> Result<Self, ComputeError> {
        if !power_w.is_finite() || power_w < 0.0 {
            return Err(ComputeError::InvalidArgument(format!(
                "power must be a non-negative finite value, got {power_w}"
            )));
        }
        Ok(Self::Constant { power_w })
    }

    pub fn linear(max_power_w: f64, static_power_percent: f64) -> Result<Self, ComputeError> {
        let (static_power_w, dynamic) = split_power(max_power_w, static_power_percent)?;
        Ok(Self::Linear {
            static_power_w,
            const_power_w: dynamic / 100.0,
        })
    }

    pub fn square(max_power_w: f64, static_power_percent: f64) -> Result<Self, ComputeError> {
        let (static_power_w, dynamic) = split_power(max_power_w, static_power_percent)?;
        Ok(Self::Square {
            static_power_w,
            const_power_w: dynamic / 100f64.powi(2),
        })
    }

    pub fn cubic(max_power_w: f64, static_power_percent: f64) -> Result<Self, ComputeError> {
        let (static_power_w, dynamic) = split_power(max_power_w, static_power_percent)?;
        Ok(Self::Cubic {
            static_power_w,
            const_power_w: dynamic / 100f64.powi(3),
        })
    }

    pub fn from_spec(spec: &PowerModelSpec) -> Result<Self, ComputeError> {
        match *spec {
            PowerModelSpec::Constant { power_w } => Self::constant(power_w),
            PowerModelSpec::Linear {
                max_power_w,
                static_power_percent,
            } => Self::linear(max_power_w, static_power_percent),
            PowerModelSpec::Square {
                max_power_w,
                static_power_percent,
            } => Self::square(max_power_w, static_power_percent),
            PowerModelSpec::Cubic {
                max_power_w,
                static_power_percent,
            } => Self::cubic(max_power_w, static_power_percent),
        }
    }

    /// Instantaneous power draw at the given utilization.
    /// Utilization outside `[0, 1]` is rejected.
    pub fn compute_power(&self, utilization: f64) -> Result<f64, ComputeError> {
        if !utilization.is_finite() || !(0.0..=1.0).contains(&utilization) {
            return Err(ComputeError::InvalidArgument(format!(
                "utilization must be in [0, 1], got {utilization}"
            )));
        }
        Ok(self.power_unchecked(utilization))
    }

    /// Engine-internal path: the caller guarantees the range via clamping.
    pub(crate) fn power_clamped(&self, utilization: f64) -> f64 {
        self.power_unchecked(utilization.clamp(0.0, 1.0))
    }

    fn power_unchecked(&self, u: f64) -> f64 {
        match *self {
            Self::Constant { power_w } => power_w,
            Self::Linear {
                static_power_w,
                const_power_w,
            } => static_power_w + const_power_w * (100.0 * u),
            Self::Square {
                static_power_w,
                const_power_w,
            } => static_power_w + const_power_w * (100.0 * u).powi(2),
            Self::Cubic {
                static_power_w,
                const_power_w,
            } => static_power_w + const_power_w * (100.0 * u).powi(3),
        }
    }
}

fn split_power(max_power_w: f64, static_power_percent: f64) -> Result<(f64, f64), ComputeError> {
    if !max_power_w.is_finite() || max_power_w < 0.0 {
        return Err(ComputeError::InvalidArgument(format!(
            "max power must be a non-negative finite value, got {max_power_w}"
        )));
    }
    if !static_power_percent.is_finite() || !(0.0..=1.0).contains(&static_power_percent) {
        return Err(ComputeError::InvalidArgument(format!(
            "static power percent must be in [0, 1], got {static_power_percent}"
        )));
    }
    let static_power_w = static_power_percent * max_power_w;
    Ok((static_power_w, max_power_w - static_power_w))
}
