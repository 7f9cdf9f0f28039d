//! WASM bindings for the abatement dashboard
//!
//! The browser loads the two CSV files as text, lets the user pick projects
//! and renders the report, charts and iteration tables from the JSON values
//! returned here.

use js_sys::Array;
use wasm_bindgen::prelude::*;

use abatement_solver::{Solver, Strategy, Tableau};

use crate::cache::SolveCache;
use crate::catalog::Catalog;
use crate::plan::Selection;
use crate::report::Report;

/// Report plus iteration tables for one solve
#[derive(serde::Serialize)]
struct SolveResult {
    report: Report,
    labels: Vec<String>,
    trace: Vec<Tableau>,
    csv: String,
}

/// Catalog and result cache kept alive across dashboard reruns
#[wasm_bindgen]
pub struct Dashboard {
    catalog: Catalog,
    cache: SolveCache,
}

#[wasm_bindgen]
impl Dashboard {
    /// Load the projects matrix and the targets table from CSV text
    #[wasm_bindgen(constructor)]
    pub fn new(projects_csv: &str, targets_csv: &str, dual: bool) -> Result<Dashboard, JsValue> {
        let catalog = Catalog::from_readers(projects_csv.as_bytes(), targets_csv.as_bytes())
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        let strategy = if dual { Strategy::Dual } else { Strategy::default() };
        Ok(Dashboard {
            catalog,
            cache: SolveCache::new(Solver::new().with_strategy(strategy)),
        })
    }

    /// Whether solves use the dual tableau
    pub fn dual(&self) -> bool {
        matches!(self.cache.solver().strategy(), Strategy::Dual)
    }

    /// Project names in catalog order
    pub fn project_names(&self) -> Array {
        self.catalog
            .project_names()
            .into_iter()
            .map(|name| JsValue::from_str(&name))
            .collect()
    }

    /// One project's cost and reductions, for the project inspector
    pub fn inspect(&self, name: &str) -> Result<JsValue, JsValue> {
        let project = self
            .catalog
            .project(name)
            .ok_or_else(|| JsValue::from_str(&format!("Unknown project: {}", name)))?;
        serde_wasm_bindgen::to_value(project).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// The whole catalog, for the input data tab
    pub fn catalog(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.catalog).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Solve for the selected project names with the given cap
    pub fn solve(&mut self, selected: Array, cap: f64) -> Result<JsValue, JsValue> {
        let selection = Selection::from_names(selected.iter().filter_map(|v| v.as_string()));
        let plan = self
            .catalog
            .compile_with_cap(&selection, cap)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        let solution = self
            .cache
            .solve(&plan.problem)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        let report = Report::new(&plan, &solution);
        let mut csv = Vec::new();
        report
            .write_csv(&mut csv)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        let labels = solution
            .trace
            .first()
            .map(|t| (0..t.num_cols()).map(|c| t.layout().column_label(c)).collect())
            .unwrap_or_default();

        let result = SolveResult {
            report,
            labels,
            trace: solution.trace,
            csv: String::from_utf8_lossy(&csv).into_owned(),
        };
        serde_wasm_bindgen::to_value(&result).map_err(|e| JsValue::from_str(&e.to_string()))
    }
}
