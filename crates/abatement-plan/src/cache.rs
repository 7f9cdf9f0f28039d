use std::collections::HashMap;

use abatement_solver::{Problem, ProblemError, Solution, Solver};
use log::debug;

/// Exact identity of a problem instance
///
/// Floats are compared by bit pattern, so two problems share a key only when
/// every number is identical.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProblemKey {
    shape: (usize, usize),
    bits: Vec<u64>,
}

impl ProblemKey {
    pub fn new(problem: &Problem) -> Self {
        let bits = problem
            .costs
            .iter()
            .chain(problem.coefficients.iter().flatten())
            .chain(&problem.targets)
            .chain(std::iter::once(&problem.cap))
            .map(|v| v.to_bits())
            .collect();
        Self {
            shape: (problem.num_pollutants(), problem.num_actions()),
            bits,
        }
    }
}

/// Memoizes solutions of one solver, keyed by problem instance
#[derive(Debug, Clone, Default)]
pub struct SolveCache {
    solver: Solver,
    entries: HashMap<ProblemKey, Solution>,
    hits: usize,
}

impl SolveCache {
    pub fn new(solver: Solver) -> Self {
        Self {
            solver,
            entries: HashMap::new(),
            hits: 0,
        }
    }

    pub fn solver(&self) -> &Solver {
        &self.solver
    }

    /// Solve `problem`, reusing an earlier solution of the same instance
    pub fn solve(&mut self, problem: &Problem) -> Result<Solution, ProblemError> {
        let key = ProblemKey::new(problem);
        if let Some(solution) = self.entries.get(&key) {
            self.hits += 1;
            debug!("cache hit ({} total)", self.hits);
            return Ok(solution.clone());
        }

        let solution = self.solver.solve(problem)?;
        self.entries.insert(key, solution.clone());
        Ok(solution)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn problem() -> Problem {
        Problem::new(vec![100.0, 1000.0], vec![vec![1.0, 1.0]], vec![10.0])
    }

    #[test]
    fn test_repeat_solve_hits_cache() {
        let mut cache = SolveCache::default();
        let first = cache.solve(&problem()).unwrap();
        let second = cache.solve(&problem()).unwrap();

        assert_eq!(first, second);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.hits(), 1);
    }

    #[test]
    fn test_changed_input_misses() {
        let mut cache = SolveCache::default();
        cache.solve(&problem()).unwrap();
        cache.solve(&problem().with_cap(15.0)).unwrap();

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.hits(), 0);
        assert_ne!(ProblemKey::new(&problem()), ProblemKey::new(&problem().with_cap(15.0)));

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_errors_are_not_cached() {
        let mut cache = SolveCache::default();
        let bad = Problem::new(vec![1.0], vec![vec![1.0, 2.0]], vec![1.0]);

        assert!(cache.solve(&bad).is_err());
        assert!(cache.is_empty());
    }
}
