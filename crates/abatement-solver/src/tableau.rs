use std::ops::Range;

use crate::problem::Problem;

/// Default penalty carried by artificial variables
pub const DEFAULT_BIG_M: f64 = 1e9;

/// Which linear program a tableau encodes
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Form {
    /// The cost-minimization problem itself, with Big-M artificials
    Primal,
    /// Its dual: maximize target value minus cap value
    Dual,
}

/// Column ownership of a tableau
///
/// Columns are laid out as `decision | surplus | slack | artificial | Z | RHS`
/// in primal form and `decision | cap duals | slack | Z | RHS` in dual form.
/// Groups that a form does not use are empty ranges.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub form: Form,
    pub decision: Range<usize>,
    pub surplus: Range<usize>,
    pub cap_duals: Range<usize>,
    pub slack: Range<usize>,
    pub artificial: Range<usize>,
    pub z: usize,
    pub rhs: usize,
    /// Number of rows above the objective row
    pub constraint_rows: usize,
}

impl Layout {
    pub fn primal(actions: usize, pollutants: usize) -> Self {
        let decision = 0..actions;
        let surplus = decision.end..decision.end + pollutants;
        let slack = surplus.end..surplus.end + actions;
        let artificial = slack.end..slack.end + pollutants;
        let z = artificial.end;
        Self {
            form: Form::Primal,
            cap_duals: slack.start..slack.start,
            decision,
            surplus,
            slack,
            artificial,
            z,
            rhs: z + 1,
            constraint_rows: pollutants + actions,
        }
    }

    pub fn dual(actions: usize, pollutants: usize) -> Self {
        let decision = 0..pollutants;
        let cap_duals = decision.end..decision.end + actions;
        let slack = cap_duals.end..cap_duals.end + actions;
        let z = slack.end;
        Self {
            form: Form::Dual,
            surplus: decision.end..decision.end,
            artificial: slack.end..slack.end,
            decision,
            cap_duals,
            slack,
            z,
            rhs: z + 1,
            constraint_rows: actions,
        }
    }

    pub fn num_rows(&self) -> usize {
        self.constraint_rows + 1
    }

    pub fn num_cols(&self) -> usize {
        self.rhs + 1
    }

    pub fn objective_row(&self) -> usize {
        self.constraint_rows
    }

    /// Short display name of a column, e.g. `x1`, `a2`, `Z`, `RHS`
    pub fn column_label(&self, col: usize) -> String {
        let decision = match self.form {
            Form::Primal => "x",
            Form::Dual => "y",
        };
        let groups = [
            (&self.decision, decision),
            (&self.surplus, "e"),
            (&self.cap_duals, "w"),
            (&self.slack, "s"),
            (&self.artificial, "a"),
        ];
        for (range, prefix) in groups {
            if range.contains(&col) {
                return format!("{}{}", prefix, col - range.start + 1);
            }
        }
        if col == self.z {
            "Z".to_string()
        } else {
            "RHS".to_string()
        }
    }
}

/// Dense simplex tableau; the last row is the objective row
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Tableau {
    data: Vec<Vec<f64>>,
    /// Basic column of each constraint row
    basis: Vec<usize>,
    layout: Layout,
}

impl Tableau {
    pub fn zeros(layout: Layout) -> Self {
        Self {
            data: vec![vec![0.0; layout.num_cols()]; layout.num_rows()],
            basis: vec![layout.rhs; layout.constraint_rows],
            layout,
        }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.data
    }

    pub fn basis(&self) -> &[usize] {
        &self.basis
    }

    pub fn num_rows(&self) -> usize {
        self.data.len()
    }

    pub fn num_cols(&self) -> usize {
        self.layout.num_cols()
    }

    pub fn constraint_rows(&self) -> &[Vec<f64>] {
        &self.data[..self.layout.constraint_rows]
    }

    pub fn objective_row(&self) -> &[f64] {
        &self.data[self.layout.objective_row()]
    }

    pub fn rhs(&self, row: usize) -> f64 {
        self.data[row][self.layout.rhs]
    }

    /// Objective value as recorded by the tableau itself
    ///
    /// The primal objective row carries `-cost` in its RHS; the dual one
    /// carries the dual value, which equals the cost at optimum.
    pub fn objective_value(&self) -> f64 {
        let rhs = self.rhs(self.layout.objective_row());
        match self.layout.form {
            Form::Primal => -rhs,
            Form::Dual => rhs,
        }
    }

    pub(crate) fn set(&mut self, row: usize, col: usize, value: f64) {
        self.data[row][col] = value;
    }

    pub(crate) fn set_basic(&mut self, row: usize, col: usize) {
        self.basis[row] = col;
    }

    /// `data[target] -= factor * data[source]` across every column
    pub(crate) fn subtract_row(&mut self, target: usize, source: usize, factor: f64) {
        if factor == 0.0 {
            return;
        }
        for j in 0..self.num_cols() {
            let delta = factor * self.data[source][j];
            self.data[target][j] -= delta;
        }
    }

    /// Gauss-Jordan step making `col` a unit column with its 1 in `row`
    pub(crate) fn pivot(&mut self, row: usize, col: usize) {
        self.basis[row] = col;

        let pivot_val = self.data[row][col];
        for value in &mut self.data[row] {
            *value /= pivot_val;
        }

        for i in 0..self.num_rows() {
            if i != row {
                let factor = self.data[i][col];
                self.subtract_row(i, row, factor);
            }
        }
    }

    /// Row holding the 1 of `col` when it is a unit column among the
    /// constraint rows and the basic variable of that row
    ///
    /// An action with no pollutant coefficients has the same unit column as
    /// its cap slack, so the scan alone cannot tell which one is basic.
    pub fn basic_row(&self, col: usize, tolerance: f64) -> Option<usize> {
        let mut found = None;
        for (i, row) in self.constraint_rows().iter().enumerate() {
            let value = row[col];
            if (value - 1.0).abs() <= tolerance && found.is_none() {
                found = Some(i);
            } else if value.abs() > tolerance {
                return None;
            }
        }
        found.filter(|&row| self.basis[row] == col)
    }

    /// Values of the variables in `cols`: RHS for basic columns, 0 otherwise
    pub fn basic_values(&self, cols: Range<usize>, tolerance: f64) -> Vec<f64> {
        cols.map(|col| match self.basic_row(col, tolerance) {
            Some(row) => self.rhs(row),
            None => 0.0,
        })
        .collect()
    }

    /// Whether an artificial variable is still basic at a positive level
    pub fn has_positive_artificial(&self, tolerance: f64) -> bool {
        self.basis
            .iter()
            .enumerate()
            .any(|(row, col)| self.layout.artificial.contains(col) && self.rhs(row) > tolerance)
    }
}

/// A way of turning a problem into an initial tableau
pub trait TableauBuilder {
    fn build(&self, problem: &Problem) -> Tableau;
}

/// Primal tableau with artificial variables penalized by a large constant
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BigM {
    penalty: f64,
}

impl Default for BigM {
    fn default() -> Self {
        Self {
            penalty: DEFAULT_BIG_M,
        }
    }
}

impl BigM {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_penalty(mut self, penalty: f64) -> Self {
        self.penalty = penalty;
        self
    }
}

impl TableauBuilder for BigM {
    fn build(&self, problem: &Problem) -> Tableau {
        let n = problem.num_actions();
        let p = problem.num_pollutants();
        let layout = Layout::primal(n, p);
        let rhs = layout.rhs;
        let obj = layout.objective_row();
        let (surplus, slack, artificial) = (
            layout.surplus.start,
            layout.slack.start,
            layout.artificial.start,
        );
        let z = layout.z;
        let mut tableau = Tableau::zeros(layout);

        // Pollutant targets: A x - e + a = b
        for (i, coefs) in problem.coefficients.iter().enumerate() {
            for (j, &coef) in coefs.iter().enumerate() {
                tableau.set(i, j, coef);
            }
            tableau.set(i, surplus + i, -1.0);
            tableau.set(i, artificial + i, 1.0);
            tableau.set(i, rhs, problem.targets[i]);
            tableau.set_basic(i, artificial + i);
        }

        // Caps: x + s = cap
        for j in 0..n {
            let row = p + j;
            tableau.set(row, j, 1.0);
            tableau.set(row, slack + j, 1.0);
            tableau.set(row, rhs, problem.cap);
            tableau.set_basic(row, slack + j);
        }

        for (j, &cost) in problem.costs.iter().enumerate() {
            tableau.set(obj, j, cost);
        }
        for i in 0..p {
            tableau.set(obj, artificial + i, self.penalty);
        }
        tableau.set(obj, z, 1.0);

        // Price out the basic artificials
        for i in 0..p {
            tableau.subtract_row(obj, i, self.penalty);
        }

        tableau
    }
}

/// Dual tableau: maximize `b·y - cap·Σw` subject to `Aᵀy - w <= c`
///
/// Non-negative costs make the all-slack basis feasible, so no artificial
/// variables are needed. The primal quantities are read from the reduced
/// costs of the slack columns.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DualForm;

impl TableauBuilder for DualForm {
    fn build(&self, problem: &Problem) -> Tableau {
        let n = problem.num_actions();
        let p = problem.num_pollutants();
        let layout = Layout::dual(n, p);
        let rhs = layout.rhs;
        let obj = layout.objective_row();
        let (cap_duals, slack, z) = (layout.cap_duals.start, layout.slack.start, layout.z);
        let mut tableau = Tableau::zeros(layout);

        for j in 0..n {
            for i in 0..p {
                tableau.set(j, i, problem.coefficients[i][j]);
            }
            tableau.set(j, cap_duals + j, -1.0);
            tableau.set(j, slack + j, 1.0);
            tableau.set(j, rhs, problem.costs[j]);
            tableau.set_basic(j, slack + j);
        }

        for (i, &target) in problem.targets.iter().enumerate() {
            tableau.set(obj, i, -target);
        }
        for j in 0..n {
            tableau.set(obj, cap_duals + j, problem.cap);
        }
        tableau.set(obj, z, 1.0);

        tableau
    }
}
