mod problem;
mod simplex;
mod solution;
mod solver;
mod tableau;

pub use problem::{DEFAULT_CAP, Problem, ProblemError};
pub use simplex::{DEFAULT_MAX_ITERATIONS, DEFAULT_TOLERANCE, Run, Simplex, Termination};
pub use solution::{Shortfall, Solution, SolutionStatus};
pub use solver::{Solver, Strategy};
pub use tableau::{BigM, DEFAULT_BIG_M, DualForm, Form, Layout, Tableau, TableauBuilder};
