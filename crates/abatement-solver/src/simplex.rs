use log::{debug, info, trace, warn};

use crate::solution::{Solution, SolutionStatus};
use crate::tableau::Tableau;

pub const DEFAULT_MAX_ITERATIONS: usize = 1000;
pub const DEFAULT_TOLERANCE: f64 = 1e-9;

/// Dense-tableau simplex engine
///
/// Pivots on the most negative objective-row coefficient (Dantzig's rule)
/// with a minimum-ratio row choice; ties go to the lowest index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Simplex {
    /// Maximum pivots before giving up
    max_iterations: usize,
    /// Tolerance for floating point comparisons
    tolerance: f64,
    /// Keep a snapshot of every tableau
    keep_trace: bool,
}

impl Default for Simplex {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tolerance: DEFAULT_TOLERANCE,
            keep_trace: true,
        }
    }
}

/// How a pivoting run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// No objective-row coefficient is negative
    Optimal,
    /// The entering column has no positive entry
    Unbounded,
    /// `max_iterations` pivots were performed
    IterationLimit,
}

/// Final state of a pivoting run
#[derive(Debug, Clone)]
pub struct Run {
    pub termination: Termination,
    pub tableau: Tableau,
    /// Snapshots from the initial tableau to the final one; empty when
    /// tracing is disabled
    pub trace: Vec<Tableau>,
    pub iterations: usize,
}

impl Simplex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    pub fn with_trace(mut self, keep: bool) -> Self {
        self.keep_trace = keep;
        self
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    /// Pivot `tableau` until it is optimal, unbounded, or out of iterations
    pub fn run(&self, mut tableau: Tableau) -> Run {
        let mut trace = Vec::new();
        self.record(&mut trace, &tableau);

        let mut iterations = 0;
        let termination = loop {
            let Some(pivot_col) = self.find_pivot_column(&tableau) else {
                break Termination::Optimal;
            };
            if iterations >= self.max_iterations {
                break Termination::IterationLimit;
            }
            let Some(pivot_row) = self.find_pivot_row(&tableau, pivot_col) else {
                debug!("column {} has no positive entry", pivot_col);
                break Termination::Unbounded;
            };

            debug!(
                "iteration {}: pivot on row {}, column {} ({})",
                iterations + 1,
                pivot_row,
                pivot_col,
                tableau.layout().column_label(pivot_col)
            );
            tableau.pivot(pivot_row, pivot_col);
            iterations += 1;
            self.record(&mut trace, &tableau);
        };

        info!("simplex stopped after {} iterations: {:?}", iterations, termination);
        Run {
            termination,
            tableau,
            trace,
            iterations,
        }
    }

    /// Solve a primal tableau and read back the first `num_decision_vars`
    /// columns as the plan
    ///
    /// The objective value is recomputed from `costs` rather than read off
    /// the tableau, whose objective row carries Big-M round-off.
    pub fn solve(&self, tableau: Tableau, num_decision_vars: usize, costs: &[f64]) -> Solution {
        let run = self.run(tableau);

        let status = match run.termination {
            Termination::Unbounded => {
                return Solution::infeasible(num_decision_vars, run.iterations, run.trace);
            }
            Termination::Optimal if run.tableau.has_positive_artificial(self.tolerance) => {
                warn!("artificial variable left in the basis, targets are unreachable");
                return Solution::infeasible(num_decision_vars, run.iterations, run.trace);
            }
            Termination::Optimal => SolutionStatus::Optimal,
            Termination::IterationLimit => {
                warn!("iteration limit of {} reached", self.max_iterations);
                SolutionStatus::IterationLimit
            }
        };

        let values = run.tableau.basic_values(0..num_decision_vars, self.tolerance);
        trace!("basic decision values: {:?}", values);
        let objective_value = costs.iter().zip(&values).map(|(c, x)| c * x).sum();

        Solution {
            status,
            values,
            objective_value,
            iterations: run.iterations,
            trace: run.trace,
            shortfalls: Vec::new(),
        }
    }

    fn record(&self, trace: &mut Vec<Tableau>, tableau: &Tableau) {
        if self.keep_trace {
            trace.push(tableau.clone());
        }
    }

    fn find_pivot_column(&self, tableau: &Tableau) -> Option<usize> {
        let rhs_col = tableau.layout().rhs;

        // Look for the most negative reduced cost (can improve objective)
        let mut min_val = -self.tolerance;
        let mut min_col = None;

        for (j, &value) in tableau.objective_row()[..rhs_col].iter().enumerate() {
            if value < min_val {
                min_val = value;
                min_col = Some(j);
            }
        }

        min_col
    }

    fn find_pivot_row(&self, tableau: &Tableau, col: usize) -> Option<usize> {
        let mut min_ratio = f64::INFINITY;
        let mut min_row = None;

        for (i, row) in tableau.constraint_rows().iter().enumerate() {
            let val = row[col];
            if val > self.tolerance {
                let ratio = tableau.rhs(i) / val;
                if ratio >= 0.0 && ratio < min_ratio {
                    min_ratio = ratio;
                    min_row = Some(i);
                }
            }
        }

        min_row
    }
}

#[cfg(test)]
mod tests {
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    use super::*;
    use crate::problem::Problem;
    use crate::tableau::{BigM, TableauBuilder};

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn solve(problem: &Problem) -> Solution {
        init_logger();
        let tableau = BigM::new().build(problem);
        Simplex::new().solve(tableau, problem.num_actions(), &problem.costs)
    }

    #[test]
    fn test_cheapest_action_alone() {
        let problem = Problem::new(vec![100.0, 1000.0], vec![vec![1.0, 1.0]], vec![10.0]);
        let solution = solve(&problem);

        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert_abs_diff_eq!(solution.values[0], 10.0, epsilon = 1e-9);
        assert_abs_diff_eq!(solution.values[1], 0.0, epsilon = 1e-9);
        assert_relative_eq!(solution.objective_value, 1000.0, max_relative = 1e-9);
        assert_eq!(solution.iterations, 1);
        assert_eq!(solution.trace.len(), 2);
    }

    #[test]
    fn test_single_action_single_pollutant() {
        let problem = Problem::new(vec![5.0], vec![vec![2.0]], vec![10.0]);
        let solution = solve(&problem);

        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert_abs_diff_eq!(solution.values[0], 5.0, epsilon = 1e-9);
        assert_relative_eq!(solution.objective_value, 25.0, max_relative = 1e-9);
    }

    #[test]
    fn test_cap_forces_second_action() {
        // Minimize: 2x + 3y
        // Subject to:
        //   x + y >= 4
        //   x, y <= 3
        // Optimal: x=3, y=1, obj=9
        let problem = Problem::new(vec![2.0, 3.0], vec![vec![1.0, 1.0]], vec![4.0]).with_cap(3.0);
        let solution = solve(&problem);

        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert_abs_diff_eq!(solution.values[0], 3.0, epsilon = 1e-9);
        assert_abs_diff_eq!(solution.values[1], 1.0, epsilon = 1e-9);
        assert_relative_eq!(solution.objective_value, 9.0, max_relative = 1e-9);
        assert_eq!(solution.iterations, 2);
    }

    #[test]
    fn test_action_without_reductions_stays_at_zero() {
        let problem = Problem::new(vec![48.0, 37.0, 35.0], vec![vec![1.0, 0.0, 3.0]], vec![49.0]);
        let solution = solve(&problem);

        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert_eq!(solution.values[1], 0.0);
        assert_abs_diff_eq!(solution.values[2], 49.0 / 3.0, epsilon = 1e-9);
        assert_relative_eq!(solution.objective_value, 35.0 * 49.0 / 3.0, max_relative = 1e-9);
    }

    #[test]
    fn test_unreachable_target() {
        let problem = Problem::new(vec![1.0], vec![vec![1.0]], vec![100.0]).with_cap(5.0);
        let solution = solve(&problem);

        assert_eq!(solution.status, SolutionStatus::Infeasible);
        assert_eq!(solution.objective_value, f64::INFINITY);
        assert_eq!(solution.values, vec![0.0]);
        assert_eq!(solution.trace.len(), solution.iterations + 1);
    }

    #[test]
    fn test_trace_starts_with_reduced_tableau() {
        let problem = Problem::new(
            vec![4.0, 1.0, 3.0],
            vec![vec![1.0, 0.5, 2.0], vec![0.0, 1.0, 1.0]],
            vec![12.0, 6.0],
        );
        let initial = BigM::new().build(&problem);
        let solution = Simplex::new().solve(initial.clone(), 3, &problem.costs);

        assert_eq!(solution.trace[0], initial);
        assert_eq!(solution.trace.len(), solution.iterations + 1);
    }

    #[test]
    fn test_pivots_keep_rhs_non_negative() {
        let problem = Problem::new(
            vec![4.0, 1.0, 3.0, 7.0],
            vec![
                vec![1.0, 0.5, 2.0, 0.0],
                vec![0.0, 1.0, 1.0, 3.0],
                vec![2.0, 0.0, 0.0, 1.0],
            ],
            vec![12.0, 30.0, 8.0],
        );
        let solution = solve(&problem);

        assert_eq!(solution.status, SolutionStatus::Optimal);
        for tableau in &solution.trace {
            for i in 0..tableau.layout().constraint_rows {
                assert!(tableau.rhs(i) >= -1e-9, "negative rhs {}", tableau.rhs(i));
            }
        }
    }

    #[test]
    fn test_objective_matches_tableau() {
        let problem = Problem::new(
            vec![40.0, 10.0, 30.0],
            vec![vec![1.0, 0.5, 2.0], vec![0.0, 1.0, 1.0]],
            vec![12.0, 6.0],
        );
        let solution = solve(&problem);
        let last = solution.final_tableau().unwrap();

        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert_relative_eq!(solution.objective_value, 180.0, max_relative = 1e-9);
        assert_relative_eq!(solution.objective_value, last.objective_value(), max_relative = 1e-6);
    }

    #[test]
    fn test_solve_is_deterministic() {
        let problem = Problem::new(
            vec![4.0, 1.0, 3.0],
            vec![vec![1.0, 0.5, 2.0], vec![0.0, 1.0, 1.0]],
            vec![12.0, 6.0],
        );
        let first = solve(&problem);
        let second = solve(&problem);

        assert_eq!(first.trace.len(), second.trace.len());
        assert_eq!(first.values, second.values);
        assert_eq!(first.objective_value, second.objective_value);
    }

    #[test]
    fn test_iteration_limit() {
        let problem = Problem::new(vec![2.0, 3.0], vec![vec![1.0, 1.0]], vec![4.0]).with_cap(3.0);
        let tableau = BigM::new().build(&problem);
        let solution = Simplex::new()
            .with_max_iterations(1)
            .solve(tableau, 2, &problem.costs);

        assert_eq!(solution.status, SolutionStatus::IterationLimit);
        assert_eq!(solution.iterations, 1);
        assert_eq!(solution.trace.len(), 2);
        // x is at its cap after the first pivot
        assert_abs_diff_eq!(solution.values[0], 3.0, epsilon = 1e-9);
    }

    #[test]
    fn test_trace_can_be_disabled() {
        let problem = Problem::new(vec![2.0, 3.0], vec![vec![1.0, 1.0]], vec![4.0]).with_cap(3.0);
        let tableau = BigM::new().build(&problem);
        let run = Simplex::new().with_trace(false).run(tableau);

        assert_eq!(run.termination, Termination::Optimal);
        assert_eq!(run.iterations, 2);
        assert!(run.trace.is_empty());
    }
}
