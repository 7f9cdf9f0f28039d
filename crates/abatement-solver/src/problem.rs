use thiserror::Error;

use crate::solution::Shortfall;

/// Default upper bound on the quantity of every action
pub const DEFAULT_CAP: f64 = 20.0;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProblemError {
    #[error("Problem has no actions")]
    NoActions,
    #[error("Problem has no pollutant targets")]
    NoTargets,
    #[error("Coefficient matrix has {found} rows but there are {expected} targets")]
    RowCount { expected: usize, found: usize },
    #[error("Coefficient row {row} has {found} entries but there are {expected} actions")]
    RowLength {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("Negative {field} at index {index}: {value}")]
    Negative {
        field: &'static str,
        index: usize,
        value: f64,
    },
    #[error("Non-finite {field} at index {index}")]
    NonFinite { field: &'static str, index: usize },
    #[error("Action cap must be positive and finite, got {0}")]
    InvalidCap(f64),
}

/// A least-cost abatement problem
///
/// Minimize `costs · x` subject to `coefficients · x >= targets` and
/// `0 <= x <= cap` for every action.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Problem {
    /// Unit cost of each action
    pub costs: Vec<f64>,
    /// One row per pollutant, one column per action
    pub coefficients: Vec<Vec<f64>>,
    /// Required reduction per pollutant
    pub targets: Vec<f64>,
    /// Upper bound applied to every action's quantity
    pub cap: f64,
}

impl Problem {
    pub fn new(costs: Vec<f64>, coefficients: Vec<Vec<f64>>, targets: Vec<f64>) -> Self {
        Self {
            costs,
            coefficients,
            targets,
            cap: DEFAULT_CAP,
        }
    }

    pub fn with_cap(mut self, cap: f64) -> Self {
        self.cap = cap;
        self
    }

    pub fn num_actions(&self) -> usize {
        self.costs.len()
    }

    pub fn num_pollutants(&self) -> usize {
        self.targets.len()
    }

    /// Check dimensions and signs before any numeric work is done
    pub fn validate(&self) -> Result<(), ProblemError> {
        let n = self.num_actions();
        let p = self.num_pollutants();

        if n == 0 {
            return Err(ProblemError::NoActions);
        }
        if p == 0 {
            return Err(ProblemError::NoTargets);
        }
        if self.coefficients.len() != p {
            return Err(ProblemError::RowCount {
                expected: p,
                found: self.coefficients.len(),
            });
        }
        for (row, coefs) in self.coefficients.iter().enumerate() {
            if coefs.len() != n {
                return Err(ProblemError::RowLength {
                    row,
                    expected: n,
                    found: coefs.len(),
                });
            }
        }
        if !(self.cap.is_finite() && self.cap > 0.0) {
            return Err(ProblemError::InvalidCap(self.cap));
        }

        check_values("cost", self.costs.iter().copied().enumerate())?;
        check_values("target", self.targets.iter().copied().enumerate())?;
        check_values(
            "coefficient",
            self.coefficients
                .iter()
                .flatten()
                .copied()
                .enumerate(),
        )?;

        Ok(())
    }

    /// Best reduction each pollutant can reach with every action at its cap
    pub fn achievable(&self) -> Vec<f64> {
        self.coefficients
            .iter()
            .map(|row| row.iter().sum::<f64>() * self.cap)
            .collect()
    }

    /// Targets out of reach even with every action at its cap, worst first
    ///
    /// Caps bound each action independently, so the problem is feasible
    /// exactly when this list is empty.
    pub fn shortfalls(&self, tolerance: f64) -> Vec<Shortfall> {
        let mut shortfalls: Vec<Shortfall> = self
            .achievable()
            .into_iter()
            .zip(&self.targets)
            .enumerate()
            .filter(|&(_, (achievable, &required))| required - achievable > tolerance)
            .map(|(pollutant, (achievable, &required))| Shortfall {
                pollutant,
                required,
                achievable,
                amount: required - achievable,
            })
            .collect();

        shortfalls.sort_by(|a, b| b.amount.total_cmp(&a.amount));
        shortfalls
    }

    /// Total reduction of each pollutant delivered by `values`
    pub fn reductions(&self, values: &[f64]) -> Vec<f64> {
        self.coefficients
            .iter()
            .map(|row| row.iter().zip(values).map(|(a, x)| a * x).sum())
            .collect()
    }

    /// Cost of a plan
    pub fn cost_of(&self, values: &[f64]) -> f64 {
        self.costs.iter().zip(values).map(|(c, x)| c * x).sum()
    }
}

fn check_values(
    field: &'static str,
    values: impl Iterator<Item = (usize, f64)>,
) -> Result<(), ProblemError> {
    for (index, value) in values {
        if !value.is_finite() {
            return Err(ProblemError::NonFinite { field, index });
        }
        if value < 0.0 {
            return Err(ProblemError::Negative { field, index, value });
        }
    }
    Ok(())
}
