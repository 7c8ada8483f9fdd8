use std::time::{Duration, Instant};

use good_lp::Solution as LpSolution;
use good_lp::solvers::SolutionStatus;
#[cfg(feature = "cbc")]
use good_lp::solvers::coin_cbc::coin_cbc;
#[cfg(feature = "microlp")]
use good_lp::solvers::microlp::microlp;
use good_lp::{
    Expression, ProblemVariables, ResolutionError, SolverModel, Variable, VariableDefinition,
    variable, variables,
};
use tracing::{info, warn};

use crate::error::SolverError;
use crate::model::{Comparison, Domain, LinearExpr, Model, VarDef, VarId};

#[cfg(not(any(feature = "cbc", feature = "microlp")))]
compile_error!("enable the `cbc` or the `microlp` feature to get a solver engine");

/// Anything that can minimise a [`Model`]. The whole model is handed over at
/// once and the backend lowers it onto its own variables and rows.
pub trait Solver {
    fn solve(&self, model: &Model) -> Result<Outcome, SolverError>;
}

/// Counters reported by the backend, passed through untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Diagnostics {
    pub wall_time: Duration,
    pub iterations: Option<u64>,
    pub nodes: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Optimal(SolvedModel),
    Infeasible(Diagnostics),
}

/// Variable values of an optimal solution, indexed by [`VarId`].
#[derive(Debug, Clone, PartialEq)]
pub struct SolvedModel {
    values: Vec<f64>,
    pub objective: f64,
    pub diagnostics: Diagnostics,
}

impl SolvedModel {
    pub fn new(values: Vec<f64>, objective: f64, diagnostics: Diagnostics) -> Self {
        Self {
            values,
            objective,
            diagnostics,
        }
    }

    pub fn value(&self, var: VarId) -> f64 {
        self.values[var.index()]
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

/// MILP engines reachable through `good_lp`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Engine {
    #[cfg(feature = "microlp")]
    MicroLp,
    #[cfg(feature = "cbc")]
    Cbc,
}

impl Default for Engine {
    #[cfg(feature = "cbc")]
    fn default() -> Self {
        Engine::Cbc
    }

    #[cfg(all(feature = "microlp", not(feature = "cbc")))]
    fn default() -> Self {
        Engine::MicroLp
    }
}

/// [`Solver`] backed by `good_lp`.
#[derive(Debug, Clone, Default)]
pub struct GoodLp {
    engine: Engine,
    time_limit: Option<Duration>,
}

impl GoodLp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn engine(mut self, engine: Engine) -> Self {
        self.engine = engine;
        self
    }

    /// Deadline handed to the engine. Engines without one ignore it.
    pub fn time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }
}

impl Solver for GoodLp {
    fn solve(&self, model: &Model) -> Result<Outcome, SolverError> {
        let (problem_vars, handles) = declare_variables(model.variables());
        let objective = to_expression(model.objective(), &handles);
        let constraints = create_constraints(model, &handles);

        let started = Instant::now();
        let result = match self.engine {
            #[cfg(feature = "microlp")]
            Engine::MicroLp => {
                if self.time_limit.is_some() {
                    warn!("microlp has no time limit; ignoring it");
                }
                solve_lowered(problem_vars.minimise(objective).using(microlp), constraints, &handles)
            }
            #[cfg(feature = "cbc")]
            Engine::Cbc => {
                #[allow(unused_mut)]
                let mut lp = problem_vars.minimise(objective).using(coin_cbc);
                #[cfg(not(debug_assertions))]
                lp.set_parameter("loglevel", "0");
                if let Some(limit) = self.time_limit {
                    lp.set_parameter("seconds", &limit.as_secs_f64().to_string());
                }
                solve_lowered(lp, constraints, &handles)
            }
        };
        let diagnostics = Diagnostics {
            wall_time: started.elapsed(),
            ..Diagnostics::default()
        };

        match result {
            Ok((SolutionStatus::Optimal, values)) => {
                let objective = model.objective().eval(&values);
                info!(engine = ?self.engine, objective, wall_time = ?diagnostics.wall_time, "optimal");
                Ok(Outcome::Optimal(SolvedModel::new(values, objective, diagnostics)))
            }
            Ok((status, _)) => {
                warn!(engine = ?self.engine, wall_time = ?diagnostics.wall_time, "stopped early");
                Err(SolverError::Stopped(stop_reason(status)))
            }
            Err(ResolutionError::Infeasible) => {
                info!(engine = ?self.engine, wall_time = ?diagnostics.wall_time, "infeasible");
                Ok(Outcome::Infeasible(diagnostics))
            }
            Err(ResolutionError::Unbounded) => Err(SolverError::Unbounded),
            Err(other) => Err(SolverError::Backend(other.to_string())),
        }
    }
}

fn declare_variables(defs: &[VarDef]) -> (ProblemVariables, Vec<Variable>) {
    let mut problem_vars = variables!();
    let handles = defs
        .iter()
        .map(|def| problem_vars.add(definition(def)))
        .collect();
    (problem_vars, handles)
}

fn definition(def: &VarDef) -> VariableDefinition {
    let named = variable().name(def.name.clone());
    match def.domain {
        Domain::Binary => named.binary(),
        Domain::Integer { min, max: None } => named.integer().min(min),
        Domain::Integer { min, max: Some(max) } => named.integer().min(min).max(max),
    }
}

fn to_expression(expr: &LinearExpr, handles: &[Variable]) -> Expression {
    expr.terms()
        .iter()
        .fold(Expression::from(expr.constant()), |sum, &(var, coeff)| {
            sum + handles[var.index()] * coeff
        })
}

fn create_constraints(model: &Model, handles: &[Variable]) -> Vec<good_lp::Constraint> {
    model
        .constraints()
        .iter()
        .map(|c| {
            let lhs = to_expression(&c.lhs, handles);
            match c.cmp {
                Comparison::Le => lhs.leq(c.rhs),
                Comparison::Ge => lhs.geq(c.rhs),
                Comparison::Eq => lhs.eq(c.rhs),
            }
        })
        .collect()
}

/// Add the constraints, solve, and read back every variable in declaration order
/// along with the status the engine finished in.
fn solve_lowered<M>(
    lp: M,
    constraints: Vec<good_lp::Constraint>,
    handles: &[Variable],
) -> Result<(SolutionStatus, Vec<f64>), ResolutionError>
where
    M: SolverModel<Error = ResolutionError>,
{
    let solution = constraints
        .into_iter()
        .fold(lp, |m, constraint| m.with(constraint))
        .solve()?;
    let values = handles.iter().map(|&v| solution.value(v)).collect();
    Ok((solution.status(), values))
}

/// Why a solve that returned values still has no proven optimum.
fn stop_reason(status: SolutionStatus) -> String {
    match status {
        SolutionStatus::Optimal => "optimal".to_owned(),
        SolutionStatus::TimeLimit => "time limit reached before optimality was proven".to_owned(),
        SolutionStatus::GapLimit => "gap limit reached before optimality was proven".to_owned(),
    }
}
