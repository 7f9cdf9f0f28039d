use log::{info, warn};

use crate::problem::{Problem, ProblemError};
use crate::simplex::{Simplex, Termination};
use crate::solution::{Solution, SolutionStatus};
use crate::tableau::{BigM, DualForm, Form, Tableau, TableauBuilder};

/// Tableau construction used by the [`Solver`]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Strategy {
    /// Primal tableau with Big-M artificial variables
    BigM(BigM),
    /// Dual tableau, primal plan read from the slack reduced costs
    Dual,
}

impl Default for Strategy {
    fn default() -> Self {
        Strategy::BigM(BigM::default())
    }
}

impl TableauBuilder for Strategy {
    fn build(&self, problem: &Problem) -> Tableau {
        match self {
            Strategy::BigM(big_m) => big_m.build(problem),
            Strategy::Dual => DualForm.build(problem),
        }
    }
}

/// Validates, builds and solves abatement problems
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Solver {
    simplex: Simplex,
    strategy: Strategy,
}

impl Solver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.simplex = self.simplex.with_max_iterations(max);
        self
    }

    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.simplex = self.simplex.with_tolerance(tol);
        self
    }

    pub fn with_trace(mut self, keep: bool) -> Self {
        self.simplex = self.simplex.with_trace(keep);
        self
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Solve the problem; shape errors are rejected before any pivoting
    pub fn solve(&self, problem: &Problem) -> Result<Solution, ProblemError> {
        problem.validate()?;
        info!(
            "solving {} actions against {} targets (cap {})",
            problem.num_actions(),
            problem.num_pollutants(),
            problem.cap
        );

        let tableau = self.strategy.build(problem);
        let mut solution = match tableau.layout().form {
            Form::Primal => self
                .simplex
                .solve(tableau, problem.num_actions(), &problem.costs),
            Form::Dual => self.solve_dual(tableau, problem),
        };

        if solution.status == SolutionStatus::Infeasible {
            solution.shortfalls = problem.shortfalls(self.simplex.tolerance());
        }
        Ok(solution)
    }

    fn solve_dual(&self, tableau: Tableau, problem: &Problem) -> Solution {
        let n = problem.num_actions();
        let run = self.simplex.run(tableau);

        let status = match run.termination {
            // An unbounded dual means no plan meets the targets
            Termination::Unbounded => return Solution::infeasible(n, run.iterations, run.trace),
            Termination::Optimal => SolutionStatus::Optimal,
            Termination::IterationLimit => {
                warn!("iteration limit of {} reached", self.simplex.max_iterations());
                SolutionStatus::IterationLimit
            }
        };

        let objective_row = run.tableau.objective_row();
        let values: Vec<f64> = run
            .tableau
            .layout()
            .slack
            .clone()
            .map(|col| objective_row[col].max(0.0))
            .collect();
        let objective_value = problem.cost_of(&values);

        Solution {
            status,
            values,
            objective_value,
            iterations: run.iterations,
            trace: run.trace,
            shortfalls: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    use super::*;

    fn both() -> [Solver; 2] {
        [Solver::new(), Solver::new().with_strategy(Strategy::Dual)]
    }

    /// Small deterministic generator for problem families
    struct Lcg(u64);

    impl Lcg {
        fn next(&mut self, bound: u64) -> u64 {
            self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            (self.0 >> 33) % bound
        }
    }

    #[test]
    fn test_strategies_agree_on_examples() {
        for solver in both() {
            let problem = Problem::new(vec![100.0, 1000.0], vec![vec![1.0, 1.0]], vec![10.0]);
            let solution = solver.solve(&problem).unwrap();
            assert_eq!(solution.status, SolutionStatus::Optimal);
            assert_abs_diff_eq!(solution.values[0], 10.0, epsilon = 1e-9);
            assert_abs_diff_eq!(solution.values[1], 0.0, epsilon = 1e-9);
            assert_relative_eq!(solution.objective_value, 1000.0, max_relative = 1e-9);

            let problem = Problem::new(vec![5.0], vec![vec![2.0]], vec![10.0]);
            let solution = solver.solve(&problem).unwrap();
            assert_eq!(solution.status, SolutionStatus::Optimal);
            assert_abs_diff_eq!(solution.values[0], 5.0, epsilon = 1e-9);
            assert_relative_eq!(solution.objective_value, 25.0, max_relative = 1e-9);

            let problem = Problem::new(vec![2.0, 3.0], vec![vec![1.0, 1.0]], vec![4.0]).with_cap(3.0);
            let solution = solver.solve(&problem).unwrap();
            assert_eq!(solution.status, SolutionStatus::Optimal);
            assert_abs_diff_eq!(solution.values[0], 3.0, epsilon = 1e-9);
            assert_abs_diff_eq!(solution.values[1], 1.0, epsilon = 1e-9);
            assert_eq!(solution.iterations, 2);
        }
    }

    #[test]
    fn test_infeasible_reports_shortfall() {
        for solver in both() {
            let problem = Problem::new(vec![1.0], vec![vec![1.0]], vec![100.0]).with_cap(5.0);
            let solution = solver.solve(&problem).unwrap();

            assert_eq!(solution.status, SolutionStatus::Infeasible);
            assert_eq!(solution.objective_value, f64::INFINITY);
            assert_eq!(solution.values, vec![0.0]);
            assert_eq!(solution.shortfalls.len(), 1);
            assert_eq!(solution.shortfalls[0].amount, 95.0);
            assert_eq!(solution.trace.len(), solution.iterations + 1);
        }
    }

    #[test]
    fn test_shape_error_aborts() {
        let problem = Problem::new(vec![1.0, 2.0], vec![vec![1.0]], vec![3.0]);
        let err = Solver::new().solve(&problem).unwrap_err();
        assert_eq!(err, ProblemError::RowLength { row: 0, expected: 2, found: 1 });
    }

    #[test]
    fn test_dual_trace_uses_dual_layout() {
        let problem = Problem::new(vec![2.0, 3.0], vec![vec![1.0, 1.0]], vec![4.0]).with_cap(3.0);
        let solution = Solver::new()
            .with_strategy(Strategy::Dual)
            .solve(&problem)
            .unwrap();

        let last = solution.final_tableau().unwrap();
        assert_eq!(last.layout().form, Form::Dual);
        assert_relative_eq!(last.objective_value(), 9.0, max_relative = 1e-9);
    }

    #[test]
    fn test_generated_problems() {
        let mut rng = Lcg(7);
        // Smaller penalty keeps round-off in the objective row below the tolerance
        let primal_solver = Solver::new().with_strategy(Strategy::BigM(BigM::new().with_penalty(1e5)));
        let dual_solver = Solver::new().with_strategy(Strategy::Dual);

        for _ in 0..12 {
            let n = 2 + rng.next(4) as usize;
            let p = 1 + rng.next(3) as usize;
            let costs: Vec<f64> = (0..n).map(|_| 1.0 + rng.next(50) as f64).collect();
            let coefficients: Vec<Vec<f64>> = (0..p)
                .map(|_| (0..n).map(|_| rng.next(4) as f64).collect())
                .collect();
            let targets: Vec<f64> = (0..p).map(|_| 1.0 + rng.next(60) as f64).collect();
            let problem = Problem::new(costs, coefficients, targets);

            let primal = primal_solver.solve(&problem).unwrap();
            let dual = dual_solver.solve(&problem).unwrap();
            let feasible = problem.shortfalls(1e-9).is_empty();

            for solution in [&primal, &dual] {
                assert!(solution.iterations <= 1000);
                assert_eq!(solution.trace.len(), solution.iterations + 1);
                if feasible {
                    assert_eq!(solution.status, SolutionStatus::Optimal);
                    for (reduction, target) in problem.reductions(&solution.values).iter().zip(&problem.targets) {
                        assert!(reduction + 1e-6 >= *target);
                    }
                    for &value in &solution.values {
                        assert!(value >= -1e-9 && value <= problem.cap + 1e-9);
                    }
                } else {
                    assert_eq!(solution.status, SolutionStatus::Infeasible);
                }
            }

            if feasible {
                assert_relative_eq!(primal.objective_value, dual.objective_value, max_relative = 1e-6);
            }
        }
    }
}
