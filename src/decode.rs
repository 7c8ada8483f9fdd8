use tracing::warn;

use crate::builder::BedModel;
use crate::solver::{Diagnostics, Outcome, SolvedModel};
use crate::types::CostMatrix;

/// Placeholder objective reported when no layout exists.
pub const NO_OBJECTIVE: f64 = 0.0;

/// What a solve produced, read back in bed terms.
#[derive(Debug, Clone, PartialEq)]
pub enum Plan {
    Laid(Layout),
    Infeasible {
        objective: f64,
        diagnostics: Diagnostics,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    /// Kind index per slot, `None` for an empty slot.
    pub slots: Vec<Option<usize>>,
    /// Slots per kind, as solved for the count variables.
    pub counts: Vec<u32>,
    /// Value of the model objective, including any spurious adjacency credit.
    pub objective: f64,
    /// Cost of the decoded sequence, read straight off the cost matrix.
    pub realized_cost: f64,
    /// Adjacency indicators the solver switched on.
    pub active_relations: usize,
    pub diagnostics: Diagnostics,
}

/// Turn a solver outcome back into a plan. Infeasibility yields no partial layout.
pub fn decode(bed: &BedModel, costs: &CostMatrix, outcome: Outcome) -> Plan {
    match outcome {
        Outcome::Optimal(solved) => Plan::Laid(create_layout(bed, costs, &solved)),
        Outcome::Infeasible(diagnostics) => Plan::Infeasible {
            objective: NO_OBJECTIVE,
            diagnostics,
        },
    }
}

fn create_layout(bed: &BedModel, costs: &CostMatrix, solved: &SolvedModel) -> Layout {
    let vars = &bed.vars;

    let slots: Vec<Option<usize>> = (0..vars.slots())
        .map(|x| occupant_of(bed, solved, x))
        .collect();

    let counts = (0..vars.kinds())
        .map(|p| solved.value(vars.count(p)).round().max(0.0) as u32)
        .collect();

    let active_relations = (0..vars.boundaries())
        .flat_map(|x| vars.relations(x))
        .filter(|&var| is_set(solved.value(var)))
        .count();

    Layout {
        realized_cost: costs.sequence_cost(&slots),
        slots,
        counts,
        objective: solved.objective,
        active_relations,
        diagnostics: solved.diagnostics,
    }
}

fn is_set(value: f64) -> bool {
    value > 0.5
}

fn occupant_of(bed: &BedModel, solved: &SolvedModel, slot: usize) -> Option<usize> {
    let present: Vec<(usize, f64)> = bed
        .vars
        .occupants(slot)
        .map(|var| solved.value(var))
        .enumerate()
        .filter(|&(_, value)| is_set(value))
        .collect();

    if present.len() > 1 {
        warn!(slot, kinds = ?present, "several kinds claim one slot, keeping the strongest");
    }
    present
        .into_iter()
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(kind, _)| kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Problem;
    use crate::builder::build_model;
    use crate::types::{Coverage, Linkage, PlantKind};

    fn problem() -> Problem {
        Problem {
            bed_length: 3,
            plants: vec![PlantKind::new("leek", 0, 3), PlantKind::new("carrot", 0, 3)],
            costs: CostMatrix::zeros(2).with(0, 1, -2.0).with(1, 0, 1.0),
            coverage: Coverage::Partial,
            linkage: Linkage::UpperBound,
        }
    }

    fn optimal(values: Vec<f64>, objective: f64) -> Outcome {
        Outcome::Optimal(SolvedModel::new(values, objective, Diagnostics::default()))
    }

    #[test]
    fn reads_back_a_full_layout() {
        let problem = problem();
        let bed = build_model(&problem).unwrap();
        let values = bed
            .vars
            .values_for(&bed.model, &[Some(0), Some(1), Some(0)]);

        let Plan::Laid(layout) = decode(&bed, &problem.costs, optimal(values, -1.0)) else {
            panic!("expected a layout");
        };
        assert_eq!(layout.slots, vec![Some(0), Some(1), Some(0)]);
        assert_eq!(layout.counts, vec![2, 1]);
        assert_eq!(layout.objective, -1.0);
        assert_eq!(layout.realized_cost, -1.0);
        assert_eq!(layout.active_relations, 2);
    }

    #[test]
    fn tolerates_empty_and_noisy_slots() {
        let problem = problem();
        let bed = build_model(&problem).unwrap();
        let mut values = bed.vars.values_for(&bed.model, &[Some(1), None, Some(0)]);
        values[bed.vars.assign(0, 0).index()] = 0.999_999;
        values[bed.vars.assign(1, 0).index()] = 0.6;
        values[bed.vars.assign(1, 2).index()] = 1e-9;

        let Plan::Laid(layout) = decode(&bed, &problem.costs, optimal(values, 0.0)) else {
            panic!("expected a layout");
        };
        assert_eq!(layout.slots, vec![Some(0), None, Some(0)]);
        assert_eq!(layout.realized_cost, 0.0);
    }

    #[test]
    fn exposes_spurious_credit() {
        let problem = problem();
        let bed = build_model(&problem).unwrap();
        let mut values = bed.vars.values_for(&bed.model, &[Some(0), None, None]);
        values[bed.vars.adj(0, 1, 0).index()] = 1.0;

        let Plan::Laid(layout) = decode(&bed, &problem.costs, optimal(values, -2.0)) else {
            panic!("expected a layout");
        };
        assert_eq!(layout.objective, -2.0);
        assert_eq!(layout.realized_cost, 0.0);
        assert_eq!(layout.active_relations, 1);
    }

    #[test]
    fn infeasibility_carries_no_layout() {
        let problem = problem();
        let bed = build_model(&problem).unwrap();
        let diagnostics = Diagnostics {
            nodes: Some(7),
            ..Diagnostics::default()
        };

        assert_eq!(
            decode(&bed, &problem.costs, Outcome::Infeasible(diagnostics)),
            Plan::Infeasible {
                objective: NO_OBJECTIVE,
                diagnostics
            }
        );
    }
}
