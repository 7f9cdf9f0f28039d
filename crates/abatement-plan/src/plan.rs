use std::collections::HashSet;

use abatement_solver::{DEFAULT_CAP, Problem};
use log::debug;

use crate::catalog::{Catalog, CatalogError};

/// Ordered set of projects chosen for a solve
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Selection {
    names: Vec<String>,
}

impl Selection {
    /// Every project of the catalog, in catalog order
    pub fn all(catalog: &Catalog) -> Self {
        Self {
            names: catalog.project_names(),
        }
    }

    /// The given projects in the given order; repeated names are kept once
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let names = names
            .into_iter()
            .map(Into::into)
            .filter(|name: &String| seen.insert(name.clone()))
            .collect();
        Self { names }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// A selection turned into solver input
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    /// Selected projects, one per decision variable
    pub projects: Vec<String>,
    /// Pollutants, one per target row
    pub pollutants: Vec<String>,
    pub problem: Problem,
}

impl Catalog {
    /// Build the problem for `selection` with the default action cap
    pub fn compile(&self, selection: &Selection) -> Result<Plan, CatalogError> {
        self.compile_with_cap(selection, DEFAULT_CAP)
    }

    /// Build the problem for `selection`, capping every project at `cap` units
    pub fn compile_with_cap(&self, selection: &Selection, cap: f64) -> Result<Plan, CatalogError> {
        if selection.is_empty() {
            return Err(CatalogError::EmptySelection);
        }

        let projects = selection
            .names()
            .iter()
            .map(|name| {
                self.project(name)
                    .ok_or_else(|| CatalogError::UnknownProject(name.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let costs = projects.iter().map(|p| p.cost).collect();
        let coefficients = (0..self.targets().len())
            .map(|i| projects.iter().map(|p| p.reductions[i]).collect())
            .collect();
        let targets = self.targets().iter().map(|t| t.value).collect();

        debug!("compiled {} projects with cap {}", projects.len(), cap);
        Ok(Plan {
            projects: selection.names().to_vec(),
            pollutants: self.pollutant_names(),
            problem: Problem::new(costs, coefficients, targets).with_cap(cap),
        })
    }
}
