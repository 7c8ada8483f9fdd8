//! Backend-neutral MILP model.
//!
//! A [`ModelDraft`] collects variables, constraints and an objective, then
//! [`ModelDraft::build`] freezes them into a [`Model`] that solvers only read.
//! The objective is always minimised.

use std::fmt;

/// Handle to a variable declared on a [`ModelDraft`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarId(usize);

impl VarId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Domain {
    Binary,
    /// Integer in `[min, max]`, unbounded above when `max` is `None`.
    Integer { min: f64, max: Option<f64> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarDef {
    pub name: String,
    pub domain: Domain,
}

/// `Σ coeff * var + constant`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearExpr {
    terms: Vec<(VarId, f64)>,
    constant: f64,
}

impl LinearExpr {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unit-coefficient sum of `vars`.
    pub fn sum(vars: impl IntoIterator<Item = VarId>) -> Self {
        vars.into_iter()
            .fold(Self::new(), |sum, var| sum.plus(var, 1.0))
    }

    pub fn plus(mut self, var: VarId, coeff: f64) -> Self {
        self.terms.push((var, coeff));
        self
    }

    pub fn plus_constant(mut self, constant: f64) -> Self {
        self.constant += constant;
        self
    }

    pub fn terms(&self) -> &[(VarId, f64)] {
        &self.terms
    }

    pub fn constant(&self) -> f64 {
        self.constant
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn eval(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .fold(self.constant, |acc, &(var, coeff)| acc + coeff * values[var.0])
    }

    pub fn leq(self, rhs: f64) -> Constraint {
        Constraint::new(self, Comparison::Le, rhs)
    }

    pub fn geq(self, rhs: f64) -> Constraint {
        Constraint::new(self, Comparison::Ge, rhs)
    }

    pub fn eq(self, rhs: f64) -> Constraint {
        Constraint::new(self, Comparison::Eq, rhs)
    }
}

impl From<VarId> for LinearExpr {
    fn from(var: VarId) -> Self {
        Self::new().plus(var, 1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Le,
    Eq,
    Ge,
}

/// Which rule of the bed formulation a constraint row belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Family {
    Unlabelled,
    Coverage,
    Bounds,
    SlotUniqueness,
    CountLinkage,
    AdjacencyLinkage,
    AdjacencyTightening,
    RelationExclusivity,
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Family::Unlabelled => "unlabelled",
            Family::Coverage => "coverage",
            Family::Bounds => "bounds",
            Family::SlotUniqueness => "slot uniqueness",
            Family::CountLinkage => "count linkage",
            Family::AdjacencyLinkage => "adjacency linkage",
            Family::AdjacencyTightening => "adjacency tightening",
            Family::RelationExclusivity => "relation exclusivity",
        };
        f.write_str(name)
    }
}

/// `lhs (<=|==|>=) rhs`
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub family: Family,
    pub lhs: LinearExpr,
    pub cmp: Comparison,
    pub rhs: f64,
}

impl Constraint {
    pub fn new(lhs: LinearExpr, cmp: Comparison, rhs: f64) -> Self {
        Self {
            family: Family::Unlabelled,
            lhs,
            cmp,
            rhs,
        }
    }

    pub fn tagged(mut self, family: Family) -> Self {
        self.family = family;
        self
    }

    pub fn holds(&self, values: &[f64], tolerance: f64) -> bool {
        let lhs = self.lhs.eval(values);
        match self.cmp {
            Comparison::Le => lhs <= self.rhs + tolerance,
            Comparison::Ge => lhs >= self.rhs - tolerance,
            Comparison::Eq => (lhs - self.rhs).abs() <= tolerance,
        }
    }
}

/// Mutable stage of model construction.
#[derive(Debug, Clone, Default)]
pub struct ModelDraft {
    variables: Vec<VarDef>,
    constraints: Vec<Constraint>,
    objective: LinearExpr,
}

impl ModelDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: impl Into<String>, domain: Domain) -> VarId {
        self.variables.push(VarDef {
            name: name.into(),
            domain,
        });
        VarId(self.variables.len() - 1)
    }

    pub fn with(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn minimise(mut self, objective: LinearExpr) -> Self {
        self.objective = objective;
        self
    }

    pub fn build(self) -> Model {
        Model {
            variables: self.variables,
            constraints: self.constraints,
            objective: self.objective,
        }
    }
}

/// A complete minimisation problem, ready for a [`crate::solver::Solver`].
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    variables: Vec<VarDef>,
    constraints: Vec<Constraint>,
    objective: LinearExpr,
}

impl Model {
    pub fn variables(&self) -> &[VarDef] {
        &self.variables
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn objective(&self) -> &LinearExpr {
        &self.objective
    }

    pub fn family_size(&self, family: Family) -> usize {
        self.constraints
            .iter()
            .filter(|c| c.family == family)
            .count()
    }

    /// Constraint rows that `values` breaks. Variable domains are not checked.
    pub fn violations(&self, values: &[f64]) -> Vec<&Constraint> {
        const TOLERANCE: f64 = 1e-6;
        self.constraints
            .iter()
            .filter(|c| !c.holds(values, TOLERANCE))
            .collect()
    }

    /// Whether `values` respects every variable domain and every constraint.
    pub fn is_feasible(&self, values: &[f64]) -> bool {
        const TOLERANCE: f64 = 1e-6;
        values.len() == self.variables.len()
            && self
                .variables
                .iter()
                .zip(values)
                .all(|(def, &v)| in_domain(def.domain, v, TOLERANCE))
            && self.violations(values).is_empty()
    }
}

fn in_domain(domain: Domain, value: f64, tolerance: f64) -> bool {
    let integral = (value - value.round()).abs() <= tolerance;
    match domain {
        Domain::Binary => integral && (-tolerance..=1.0 + tolerance).contains(&value),
        Domain::Integer { min, max } => {
            integral && value >= min - tolerance && max.is_none_or(|m| value <= m + tolerance)
        }
    }
}
