use std::fmt::Write as _;
use std::io::Write;
use std::path::Path;

use abatement_solver::{Solution, SolutionStatus, Tableau};
use serde::Serialize;

use crate::plan::Plan;

/// Units below this are treated as "not implemented"
pub const IMPLEMENTED_THRESHOLD: f64 = 1e-6;

/// One selected project in a solved plan
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub project: String,
    pub units: f64,
    pub total_cost: f64,
}

/// A target the selected projects cannot reach
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedShortfall {
    pub pollutant: String,
    pub required: f64,
    pub achievable: f64,
    pub amount: f64,
}

/// Solution of a plan, named for presentation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub status: SolutionStatus,
    pub total_cost: f64,
    pub iterations: usize,
    pub rows: Vec<ReportRow>,
    pub shortfalls: Vec<NamedShortfall>,
}

impl Report {
    pub fn new(plan: &Plan, solution: &Solution) -> Self {
        let rows = plan
            .projects
            .iter()
            .zip(&solution.values)
            .zip(&plan.problem.costs)
            .map(|((project, &units), &cost)| ReportRow {
                project: project.clone(),
                units,
                total_cost: units * cost,
            })
            .collect();

        let shortfalls = solution
            .shortfalls
            .iter()
            .map(|s| NamedShortfall {
                pollutant: plan.pollutants[s.pollutant].clone(),
                required: s.required,
                achievable: s.achievable,
                amount: s.amount,
            })
            .collect();

        Self {
            status: solution.status,
            total_cost: solution.objective_value,
            iterations: solution.iterations,
            rows,
            shortfalls,
        }
    }

    /// Projects with a non-negligible number of units
    pub fn implemented(&self) -> impl Iterator<Item = &ReportRow> {
        self.rows.iter().filter(|r| r.units > IMPLEMENTED_THRESHOLD)
    }

    pub fn implemented_count(&self) -> usize {
        self.implemented().count()
    }

    /// Write the implemented projects as CSV
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record(["Mitigation Project", "Project Units (x_i)", "Total Cost"])?;
        for row in self.implemented() {
            csv.write_record([
                row.project.clone(),
                format!("{:.4}", row.units),
                format!("{:.2}", row.total_cost),
            ])?;
        }
        csv.flush()?;
        Ok(())
    }

    pub fn save_csv(&self, path: impl AsRef<Path>) -> Result<(), csv::Error> {
        let file = std::fs::File::create(path)?;
        self.write_csv(file)
    }
}

/// Render a tableau as an aligned text table with labelled rows and columns
pub fn render_tableau(tableau: &Tableau) -> String {
    let layout = tableau.layout();
    let mut cells: Vec<Vec<String>> = Vec::with_capacity(tableau.num_rows() + 1);

    let mut header = vec!["basis".to_string()];
    header.extend((0..tableau.num_cols()).map(|col| layout.column_label(col)));
    cells.push(header);

    for (i, row) in tableau.rows().iter().enumerate() {
        let label = match tableau.basis().get(i) {
            Some(&col) => layout.column_label(col),
            None => "Z".to_string(),
        };
        let mut line = vec![label];
        line.extend(row.iter().map(|v| format_cell(*v)));
        cells.push(line);
    }

    let widths: Vec<usize> = (0..cells[0].len())
        .map(|c| cells.iter().map(|line| line[c].len()).max().unwrap_or(0))
        .collect();

    let mut out = String::new();
    for line in &cells {
        let padded: Vec<String> = line
            .iter()
            .zip(&widths)
            .map(|(cell, &w)| format!("{:>w$}", cell, w = w))
            .collect();
        let _ = writeln!(out, "{}", padded.join("  "));
    }
    out
}

/// Render every snapshot of a trace, numbered from iteration 0
pub fn render_trace(trace: &[Tableau]) -> String {
    let mut out = String::new();
    for (i, tableau) in trace.iter().enumerate() {
        let _ = writeln!(out, "Iteration {}", i);
        out.push_str(&render_tableau(tableau));
        out.push('\n');
    }
    out
}

fn format_cell(value: f64) -> String {
    // Avoid printing "-0.0000"
    if value.abs() < 5e-5 {
        "0".to_string()
    } else {
        format!("{:.4}", value)
    }
}
