//! The constraint families of the bed formulation.
//!
//! Each family is a separate function that folds its rows into a
//! [`ModelDraft`], so any one of them can be checked on its own.

use crate::builder::BedVariables;
use crate::model::{Family, LinearExpr, ModelDraft};
use crate::types::{Coverage, Linkage, PlantKind};

/// `Σ_p count[p] = N`, or `≤ N` when empty slots are allowed.
pub fn constrain_full_coverage(
    draft: ModelDraft,
    coverage: Coverage,
    bed_length: usize,
    vars: &BedVariables,
) -> ModelDraft {
    let planted = LinearExpr::sum((0..vars.kinds()).map(|p| vars.count(p)));
    let constraint = match coverage {
        Coverage::Full => planted.eq(bed_length as f64),
        Coverage::Partial => planted.leq(bed_length as f64),
    };
    draft.with(constraint.tagged(Family::Coverage))
}

/// `min[p] ≤ count[p] ≤ max[p]`
pub fn constrain_count_bounds(
    draft: ModelDraft,
    plants: &[PlantKind],
    vars: &BedVariables,
) -> ModelDraft {
    plants.iter().enumerate().fold(draft, |d, (p, plant)| {
        let count = LinearExpr::from(vars.count(p));
        d.with(count.clone().geq(plant.min as f64).tagged(Family::Bounds))
            .with(count.leq(plant.max as f64).tagged(Family::Bounds))
    })
}

/// `Σ_p assign[p][x] ≤ 1` for every slot.
pub fn constrain_slot_uniqueness(draft: ModelDraft, vars: &BedVariables) -> ModelDraft {
    (0..vars.slots()).fold(draft, |d, x| {
        let occupants = LinearExpr::sum(vars.occupants(x));
        d.with(occupants.leq(1.0).tagged(Family::SlotUniqueness))
    })
}

/// `count[p] = Σ_x assign[p][x]`
pub fn constrain_count_linkage(draft: ModelDraft, vars: &BedVariables) -> ModelDraft {
    (0..vars.kinds()).fold(draft, |d, p| {
        let placed = LinearExpr::sum(vars.placements(p)).plus(vars.count(p), -1.0);
        d.with(placed.eq(0.0).tagged(Family::CountLinkage))
    })
}

/// `assign[p][x] + assign[q][x+1] ≤ adj[p][q][x] + 1` for every boundary and ordered pair.
///
/// With [`Linkage::Exact`] the indicator is also bounded by each of its two
/// placements, so it is 1 exactly when the pair occurs.
pub fn constrain_adjacency_linkage(
    draft: ModelDraft,
    linkage: Linkage,
    vars: &BedVariables,
) -> ModelDraft {
    let kinds = vars.kinds();
    let triples = (0..vars.boundaries())
        .flat_map(|x| (0..kinds).flat_map(move |p| (0..kinds).map(move |q| (p, q, x))));

    triples.fold(draft, |d, (p, q, x)| {
        let before = vars.assign(p, x);
        let after = vars.assign(q, x + 1);
        let relation = vars.adj(p, q, x);

        let both_present = LinearExpr::sum([before, after]).plus(relation, -1.0);
        let d = d.with(both_present.leq(1.0).tagged(Family::AdjacencyLinkage));

        match linkage {
            Linkage::UpperBound => d,
            Linkage::Exact => {
                let needs_before = LinearExpr::from(relation).plus(before, -1.0);
                let needs_after = LinearExpr::from(relation).plus(after, -1.0);
                d.with(needs_before.leq(0.0).tagged(Family::AdjacencyTightening))
                    .with(needs_after.leq(0.0).tagged(Family::AdjacencyTightening))
            }
        }
    })
}

/// `Σ_p Σ_q adj[p][q][x] ≤ 1` for every boundary.
pub fn constrain_relation_exclusivity(draft: ModelDraft, vars: &BedVariables) -> ModelDraft {
    (0..vars.boundaries()).fold(draft, |d, x| {
        let relations = LinearExpr::sum(vars.relations(x));
        d.with(relations.leq(1.0).tagged(Family::RelationExclusivity))
    })
}
