use crate::tableau::Tableau;

/// The result of solving an abatement problem
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    /// Solution status
    pub status: SolutionStatus,
    /// Quantity chosen for each action
    pub values: Vec<f64>,
    /// Total cost of `values`
    pub objective_value: f64,
    /// Number of pivots performed
    pub iterations: usize,
    /// Tableau snapshots, from the initial tableau to the final one
    pub trace: Vec<Tableau>,
    /// Targets that cannot be reached (populated when infeasible)
    pub shortfalls: Vec<Shortfall>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SolutionStatus {
    /// An optimal plan was found
    Optimal,
    /// The targets cannot be met
    Infeasible,
    /// Pivoting stopped at the iteration limit; values come from the last tableau
    IterationLimit,
}

/// A pollutant target that no plan within the caps can reach
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Shortfall {
    /// Index of the pollutant
    pub pollutant: usize,
    /// Required reduction
    pub required: f64,
    /// Reduction with every action at its cap
    pub achievable: f64,
    /// How far the target is out of reach
    pub amount: f64,
}

impl Solution {
    pub fn infeasible(num_actions: usize, iterations: usize, trace: Vec<Tableau>) -> Self {
        Self {
            status: SolutionStatus::Infeasible,
            values: vec![0.0; num_actions],
            objective_value: f64::INFINITY,
            iterations,
            trace,
            shortfalls: Vec::new(),
        }
    }

    pub fn is_optimal(&self) -> bool {
        self.status == SolutionStatus::Optimal
    }

    /// Final tableau, if the trace was kept
    pub fn final_tableau(&self) -> Option<&Tableau> {
        self.trace.last()
    }
}
