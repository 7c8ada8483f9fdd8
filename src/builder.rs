use tracing::debug;

use crate::Problem;
use crate::constraints::{
    constrain_adjacency_linkage, constrain_count_bounds, constrain_count_linkage,
    constrain_full_coverage, constrain_relation_exclusivity, constrain_slot_uniqueness,
};
use crate::error::InvalidModelError;
use crate::model::{Domain, Family, LinearExpr, Model, ModelDraft, VarId};
use crate::types::CostMatrix;

/// Typed lookups for every variable of a bed model.
///
/// * `count[p]`: slots given to kind `p`
/// * `assign[p][x]`: kind `p` occupies slot `x`
/// * `adj[p][q][x]`: the pair `(p, q)` is charged at the boundary between `x` and `x + 1`
#[derive(Debug, Clone, PartialEq)]
pub struct BedVariables {
    count: Vec<VarId>,
    assign: Vec<Vec<VarId>>,
    adj: Vec<Vec<Vec<VarId>>>,
    slots: usize,
}

impl BedVariables {
    fn declare(draft: &mut ModelDraft, kinds: usize, slots: usize) -> Self {
        let unbounded = Domain::Integer {
            min: 0.0,
            max: None,
        };
        let count = (0..kinds)
            .map(|p| draft.add(format!("v[{p}]"), unbounded))
            .collect();

        let assign = (0..kinds)
            .map(|p| {
                (0..slots)
                    .map(|x| draft.add(format!("a[{p}][{x}]"), Domain::Binary))
                    .collect()
            })
            .collect();

        let boundaries = slots.saturating_sub(1);
        let adj = (0..kinds)
            .map(|p| {
                (0..kinds)
                    .map(|q| {
                        (0..boundaries)
                            .map(|x| draft.add(format!("y[{p}][{q}][{x}]"), Domain::Binary))
                            .collect()
                    })
                    .collect()
            })
            .collect();

        Self {
            count,
            assign,
            adj,
            slots,
        }
    }

    pub fn kinds(&self) -> usize {
        self.count.len()
    }

    pub fn slots(&self) -> usize {
        self.slots
    }

    /// Boundaries between consecutive slots.
    pub fn boundaries(&self) -> usize {
        self.slots.saturating_sub(1)
    }

    pub fn count(&self, kind: usize) -> VarId {
        self.count[kind]
    }

    pub fn assign(&self, kind: usize, slot: usize) -> VarId {
        self.assign[kind][slot]
    }

    pub fn adj(&self, before: usize, after: usize, boundary: usize) -> VarId {
        self.adj[before][after][boundary]
    }

    /// All `assign` variables of one kind, in slot order.
    pub fn placements(&self, kind: usize) -> impl Iterator<Item = VarId> + '_ {
        self.assign[kind].iter().copied()
    }

    /// All `assign` variables of one slot, in kind order.
    pub fn occupants(&self, slot: usize) -> impl Iterator<Item = VarId> + '_ {
        self.assign.iter().map(move |row| row[slot])
    }

    /// All `adj` variables of one boundary.
    pub fn relations(&self, boundary: usize) -> impl Iterator<Item = VarId> + '_ {
        self.adj
            .iter()
            .flat_map(move |row| row.iter().map(move |col| col[boundary]))
    }

    /// A value vector describing `sequence`, with exactly the occurring pairs charged.
    #[cfg(test)]
    pub(crate) fn values_for(&self, model: &Model, sequence: &[Option<usize>]) -> Vec<f64> {
        let mut values = vec![0.0; model.variables().len()];
        for (slot, kind) in sequence.iter().enumerate() {
            if let Some(kind) = *kind {
                values[self.assign(kind, slot).index()] = 1.0;
                values[self.count(kind).index()] += 1.0;
            }
        }
        for (boundary, pair) in sequence.windows(2).enumerate() {
            if let (Some(p), Some(q)) = (pair[0], pair[1]) {
                values[self.adj(p, q, boundary).index()] = 1.0;
            }
        }
        values
    }
}

/// A built model together with the handles needed to read its solution.
#[derive(Debug, Clone, PartialEq)]
pub struct BedModel {
    pub model: Model,
    pub vars: BedVariables,
}

/// Validate `problem` and encode it as a MILP model.
pub fn build_model(problem: &Problem) -> Result<BedModel, InvalidModelError> {
    problem.validate()?;

    let mut draft = ModelDraft::new();
    let vars = BedVariables::declare(&mut draft, problem.plants.len(), problem.bed_length);

    let objective = create_objective_function(&vars, &problem.costs);
    let draft = draft.minimise(objective);

    // Add constraints
    let draft = constrain_full_coverage(draft, problem.coverage, problem.bed_length, &vars);
    let draft = constrain_count_bounds(draft, &problem.plants, &vars);
    let draft = constrain_slot_uniqueness(draft, &vars);
    let draft = constrain_count_linkage(draft, &vars);
    let draft = constrain_adjacency_linkage(draft, problem.linkage, &vars);
    let draft = constrain_relation_exclusivity(draft, &vars);

    let model = draft.build();
    debug!(
        variables = model.variables().len(),
        constraints = model.constraints().len(),
        linkage_rows = model.family_size(Family::AdjacencyLinkage),
        "built bed model"
    );

    Ok(BedModel { model, vars })
}

/// `Σ_p Σ_q Σ_x cost[p][q] * adj[p][q][x]`; zero-cost pairs are left out.
fn create_objective_function(vars: &BedVariables, costs: &CostMatrix) -> LinearExpr {
    let kinds = vars.kinds();
    (0..kinds)
        .flat_map(|p| (0..kinds).map(move |q| (p, q)))
        .filter(|&(p, q)| costs.get(p, q) != 0.0)
        .fold(LinearExpr::new(), |sum, (p, q)| {
            (0..vars.boundaries()).fold(sum, |sum, x| sum.plus(vars.adj(p, q, x), costs.get(p, q)))
        })
}
