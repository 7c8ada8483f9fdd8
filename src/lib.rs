pub mod builder;
pub mod constraints;
pub mod decode;
pub mod error;
pub mod model;
pub mod solver;
pub mod types;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::builder::build_model;
use crate::decode::{Layout, Plan, decode};
use crate::solver::{Diagnostics, GoodLp, Outcome, Solver};

pub use crate::error::{InvalidModelError, PlanError, SolverError};
pub use crate::types::{CostMatrix, Coverage, Linkage, PlantKind};

/// A bed of `bed_length` slots to fill with `plants`, scored by `costs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Problem {
    pub bed_length: usize,
    pub plants: Vec<PlantKind>,
    pub costs: CostMatrix,
    #[serde(default)]
    pub coverage: Coverage,
    #[serde(default)]
    pub linkage: Linkage,
}

/// A solved bed, as written back out to the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum Solution {
    #[serde(rename_all = "camelCase")]
    Optimal {
        layout: Vec<Option<String>>,
        counts: BTreeMap<String, u32>,
        objective: f64,
        realized_cost: f64,
        active_relations: usize,
        stats: Stats,
    },
    Infeasible { objective: f64, stats: Stats },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub wall_time_ms: f64,
    pub iterations: Option<u64>,
    pub nodes: Option<u64>,
}

impl From<Diagnostics> for Stats {
    fn from(diagnostics: Diagnostics) -> Self {
        Stats {
            wall_time_ms: diagnostics.wall_time.as_secs_f64() * 1000.0,
            iterations: diagnostics.iterations,
            nodes: diagnostics.nodes,
        }
    }
}

impl Problem {
    /// Reject input that cannot describe a bed. Whether the bounds can add up
    /// to `bed_length` is left to the solver.
    pub fn validate(&self) -> Result<(), InvalidModelError> {
        if self.plants.is_empty() {
            return Err(InvalidModelError::NoPlantKinds);
        }

        let mut seen = BTreeSet::new();
        for plant in &self.plants {
            if plant.min > plant.max {
                return Err(InvalidModelError::InvertedBounds {
                    name: plant.name.clone(),
                    min: plant.min,
                    max: plant.max,
                });
            }
            if !seen.insert(plant.name.as_str()) {
                return Err(InvalidModelError::DuplicateName(plant.name.clone()));
            }
        }

        self.costs.check_shape(self.plants.len())
    }

    /// Build, solve and decode the bed with the default `good_lp` engine.
    pub fn plan(&self) -> Result<Plan, PlanError> {
        self.plan_with(&GoodLp::new())
    }

    pub fn plan_with(&self, solver: &impl Solver) -> Result<Plan, PlanError> {
        let bed = build_model(self)?;
        let outcome = solver.solve(&bed.model)?;
        if let Outcome::Optimal(solved) = &outcome {
            let declared = bed.model.variables().len();
            if solved.values().len() != declared {
                return Err(SolverError::Backend(format!(
                    "solver returned {} values for {declared} variables",
                    solved.values().len()
                ))
                .into());
            }
        }
        Ok(decode(&bed, &self.costs, outcome))
    }

    pub fn solve(&self) -> Result<Solution, PlanError> {
        self.solve_with(&GoodLp::new())
    }

    pub fn solve_with(&self, solver: &impl Solver) -> Result<Solution, PlanError> {
        let plan = self.plan_with(solver)?;
        Ok(self.describe(plan))
    }

    /// Put plant names on a decoded plan.
    fn describe(&self, plan: Plan) -> Solution {
        match plan {
            Plan::Laid(layout) => {
                let Layout {
                    slots,
                    counts,
                    objective,
                    realized_cost,
                    active_relations,
                    diagnostics,
                } = layout;
                Solution::Optimal {
                    layout: slots
                        .iter()
                        .map(|slot| slot.map(|p| self.plants[p].name.clone()))
                        .collect(),
                    counts: self
                        .plants
                        .iter()
                        .zip(counts)
                        .map(|(plant, count)| (plant.name.clone(), count))
                        .collect(),
                    objective,
                    realized_cost,
                    active_relations,
                    stats: diagnostics.into(),
                }
            }
            Plan::Infeasible {
                objective,
                diagnostics,
            } => Solution::Infeasible {
                objective,
                stats: diagnostics.into(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{read_dir, read_to_string};
    use std::path::Path;

    /// What a fixture expects. Layouts are only pinned where the optimum is unique.
    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Expected {
        status: String,
        objective: Option<f64>,
        realized_cost: Option<f64>,
        counts: Option<BTreeMap<String, u32>>,
        layout: Option<Vec<Option<String>>>,
    }

    #[derive(Debug, Deserialize)]
    struct Fixture {
        expected: Expected,
    }

    // Helper function to run a test from a test file
    fn run_test_file(test_file: &Path) {
        println!("Running test for file: {:?}", test_file);

        let failure_message = format!("Failed to read test file: {}", test_file.display());
        let yaml_content = read_to_string(test_file).expect(&failure_message);

        // Split the file content at the "expected:" marker to separate input and expected output
        let parts: Vec<&str> = yaml_content.split("expected:").collect();

        let failure_message = format!("Failed to parse input YAML: {}", test_file.display());
        let input_yaml = parts.first().expect("No input found in test file").trim();
        let problem: Problem = serde_yaml::from_str(input_yaml).expect(&failure_message);

        let failure_message = format!("Failed to parse expected YAML: {}", test_file.display());
        let expected_yaml = format!("expected:{}", parts.get(1).expect(&failure_message));
        let fixture: Fixture = serde_yaml::from_str(&expected_yaml).expect(&failure_message);
        let expected = fixture.expected;

        let failure_message = format!("Failed to solve test file: {}", test_file.display());
        let solution = problem.solve().expect(&failure_message);
        println!("received: {}", serde_yaml::to_string(&solution).unwrap());

        match solution {
            Solution::Optimal {
                layout,
                counts,
                objective,
                realized_cost,
                ..
            } => {
                assert_eq!(expected.status, "optimal", "{}", test_file.display());
                if let Some(want) = expected.objective {
                    assert!((objective - want).abs() < 1e-6, "{}", test_file.display());
                }
                if let Some(want) = expected.realized_cost {
                    assert!((realized_cost - want).abs() < 1e-6, "{}", test_file.display());
                }
                if let Some(want) = expected.counts {
                    assert_eq!(counts, want, "{}", test_file.display());
                }
                if let Some(want) = expected.layout {
                    assert_eq!(layout, want, "{}", test_file.display());
                }
            }
            Solution::Infeasible { objective, .. } => {
                assert_eq!(expected.status, "infeasible", "{}", test_file.display());
                assert_eq!(objective, decode::NO_OBJECTIVE);
            }
        }
    }

    #[test]
    fn run_all_test_files() {
        // Read all files from the test_data directory
        let test_data_dir = Path::new("test_data");
        let mut entries: Vec<_> = read_dir(test_data_dir)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .filter(|path| {
                path.is_file() && path.extension().map(|ext| ext == "yaml").unwrap_or(false)
            })
            .collect();

        // Sort paths lexically by filename
        entries.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

        for path in entries {
            run_test_file(&path);
        }
    }

    #[test]
    fn validation_runs_before_the_solver() {
        let problem = Problem {
            bed_length: 2,
            plants: vec![PlantKind::new("pea", 0, 2), PlantKind::new("pea", 0, 2)],
            costs: CostMatrix::zeros(2),
            coverage: Coverage::Full,
            linkage: Linkage::UpperBound,
        };
        assert_eq!(
            problem.solve(),
            Err(PlanError::InvalidModel(InvalidModelError::DuplicateName(
                "pea".into()
            )))
        );

        let empty = Problem {
            plants: vec![],
            costs: CostMatrix::zeros(0),
            ..problem
        };
        assert_eq!(
            empty.validate(),
            Err(InvalidModelError::NoPlantKinds)
        );
    }

    #[test]
    fn solver_failures_stay_distinct_from_infeasibility() {
        struct Broken;
        impl Solver for Broken {
            fn solve(&self, _: &model::Model) -> Result<Outcome, SolverError> {
                Err(SolverError::Backend("out of licences".into()))
            }
        }

        let problem = Problem {
            bed_length: 1,
            plants: vec![PlantKind::new("kale", 1, 1)],
            costs: CostMatrix::zeros(1),
            coverage: Coverage::Full,
            linkage: Linkage::UpperBound,
        };
        assert_eq!(
            problem.solve_with(&Broken),
            Err(PlanError::Solver(SolverError::Backend(
                "out of licences".into()
            )))
        );
    }

    #[test]
    fn a_short_value_vector_is_a_solver_error() {
        struct Forgetful;
        impl Solver for Forgetful {
            fn solve(&self, model: &model::Model) -> Result<Outcome, SolverError> {
                let values = vec![1.0; model.variables().len() - 1];
                Ok(Outcome::Optimal(solver::SolvedModel::new(
                    values,
                    0.0,
                    Diagnostics::default(),
                )))
            }
        }

        let problem = Problem {
            bed_length: 2,
            plants: vec![PlantKind::new("chive", 2, 2)],
            costs: CostMatrix::zeros(1),
            coverage: Coverage::Full,
            linkage: Linkage::UpperBound,
        };
        assert!(matches!(
            problem.plan_with(&Forgetful),
            Err(PlanError::Solver(SolverError::Backend(_)))
        ));
    }

    #[test]
    fn infeasible_solutions_serialize_with_a_status_tag() {
        let problem = Problem {
            bed_length: 5,
            plants: vec![PlantKind::new("a", 3, 3), PlantKind::new("b", 3, 3)],
            costs: CostMatrix::zeros(2),
            coverage: Coverage::Full,
            linkage: Linkage::UpperBound,
        };
        let solution = problem.solve().unwrap();
        let yaml = serde_yaml::to_string(&solution).unwrap();
        assert!(yaml.starts_with("status: infeasible"), "{yaml}");
        assert!(yaml.contains("objective: 0.0"), "{yaml}");
    }
}
