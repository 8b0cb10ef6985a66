//! Relation weighting for the triple sampling loop.

use kgforge_schema::{GenRng, RelationId};
use rand::distr::weighted::WeightedIndex;

/// Sampling distribution over relations.
#[derive(Debug, Clone)]
pub struct RelationWeights {
    relations: Vec<RelationId>,
    weights: Vec<f64>,
    /// Per-relation triple caps, only set below one triple per relation.
    quotas: Option<Vec<usize>>,
    index: Option<WeightedIndex<f64>>,
}

impl RelationWeights {
    /// Distribute `num_triples` across `relations`.
    ///
    /// Below one triple per relation, each of the first `num_triples`
    /// relations gets a quota of one triple and the rest get none. Otherwise
    /// weights are normal draws centered on the per-relation mean with a
    /// spread of `(1 - balance) * mean`, normalized, floored at machine
    /// epsilon and normalized again.
    pub fn new(relations: &[RelationId], num_triples: u32, balance: f64, rng: &mut GenRng) -> Self {
        let n = relations.len();
        let mut quotas = None;
        let weights: Vec<f64> = if n == 0 {
            Vec::new()
        } else if (num_triples as usize) < n {
            let caps: Vec<usize> = (0..n).map(|i| usize::from(i < num_triples as usize)).collect();
            let weights = caps.iter().map(|&cap| cap as f64).collect();
            quotas = Some(caps);
            weights
        } else {
            let mean = f64::from(num_triples / n as u32);
            let spread = (1.0 - balance) * mean;
            let raw: Vec<f64> = (0..n).map(|_| rng.normal(mean, spread)).collect();
            normalize_clipped(&raw)
        };

        let index = WeightedIndex::new(weights.iter().copied()).ok();
        Self {
            relations: relations.to_vec(),
            weights,
            quotas,
            index,
        }
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_none()
    }

    pub fn sample(&self, rng: &mut GenRng) -> Option<RelationId> {
        let index = self.index.as_ref()?;
        self.relations.get(rng.weighted(index)).copied()
    }

    /// Most triples `relation` may receive; `None` when uncapped.
    pub fn quota(&self, relation: RelationId) -> Option<usize> {
        let slot = self.relations.iter().position(|r| *r == relation)?;
        self.quotas.as_ref()?.get(slot).copied()
    }

    /// Stop drawing `relation`.
    pub fn exhaust(&mut self, relation: RelationId) {
        let Some(slot) = self.relations.iter().position(|r| *r == relation) else {
            return;
        };
        if let Some(weight) = self.weights.get_mut(slot) {
            *weight = 0.0;
        }
        self.index = WeightedIndex::new(self.weights.iter().copied()).ok();
    }
}

fn normalize_clipped(raw: &[f64]) -> Vec<f64> {
    let total: f64 = raw.iter().sum();
    let normalized: Vec<f64> = if total > 0.0 {
        raw.iter().map(|w| w / total).collect()
    } else {
        vec![1.0 / raw.len() as f64; raw.len()]
    };
    let clipped: Vec<f64> = normalized
        .into_iter()
        .map(|w| w.clamp(f64::EPSILON, 1.0))
        .collect();
    let total: f64 = clipped.iter().sum();
    clipped.into_iter().map(|w| w / total).collect()
}
