use loanlab_core::{Frame, LabResult};
use loanlab_models::{ParamSet, ParamValue};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::cross_validate::{cross_validate, Probabilistic};
use crate::kfold::StratifiedKFold;

/// Named hyperparameter axes; candidates are the cartesian product.
#[derive(Debug, Clone, Default)]
pub struct ParamGrid {
    entries: Vec<(String, Vec<ParamValue>)>,
}

impl ParamGrid {
    pub fn new() -> Self {
        ParamGrid::default()
    }

    pub fn with(mut self, name: impl Into<String>, values: Vec<ParamValue>) -> Self {
        self.entries.push((name.into(), values));
        self
    }

    /// Total number of combinations.
    pub fn len(&self) -> usize {
        self.entries.iter().map(|(_, v)| v.len().max(1)).product()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Decode combination `index` in mixed radix, so sampling can pick
    /// candidates without materializing the whole product.
    fn combination_at(&self, mut index: usize) -> ParamSet {
        let mut params = Vec::with_capacity(self.entries.len());
        for (name, values) in &self.entries {
            let radix = values.len().max(1);
            params.push((name.clone(), values[index % radix].clone()));
            index /= radix;
        }
        params
    }

    pub fn combinations(&self) -> Vec<ParamSet> {
        (0..self.len()).map(|i| self.combination_at(i)).collect()
    }
}

/// One evaluated parameter combination.
#[derive(Debug, Clone)]
pub struct CandidateResult {
    pub params: ParamSet,
    pub mean_test_score: f64,
    pub std_test_score: f64,
    pub mean_fit_time: f64,
    pub mean_score_time: f64,
    /// 1 = best mean test score; ties share a rank.
    pub rank: usize,
}

/// All candidates of one search, ranked best-first.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub candidates: Vec<CandidateResult>,
}

impl SearchOutcome {
    pub fn best(&self) -> &CandidateResult {
        &self.candidates[0]
    }

    /// Mean test score per candidate, in evaluation order kept by rank.
    pub fn mean_test_scores(&self) -> Vec<f64> {
        self.candidates.iter().map(|c| c.mean_test_score).collect()
    }
}

fn rank_candidates(mut candidates: Vec<CandidateResult>) -> Vec<CandidateResult> {
    candidates.sort_by(|a, b| {
        b.mean_test_score
            .partial_cmp(&a.mean_test_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let mut prev_score = f64::NAN;
    let mut prev_rank = 0;
    for (i, c) in candidates.iter_mut().enumerate() {
        if c.mean_test_score == prev_score {
            c.rank = prev_rank;
        } else {
            c.rank = i + 1;
            prev_rank = c.rank;
            prev_score = c.mean_test_score;
        }
    }
    candidates
}

fn evaluate<P, F, S>(
    factory: &F,
    params: ParamSet,
    x: &Frame,
    y: &[f64],
    cv: &StratifiedKFold,
    scorer: &S,
) -> LabResult<CandidateResult>
where
    P: Probabilistic,
    F: Fn(&ParamSet) -> LabResult<P> + Sync,
    S: Fn(&[f64], &[f64]) -> f64 + Sync,
{
    let scores = cross_validate(|| factory(&params), x, y, cv, scorer)?;
    Ok(CandidateResult {
        params,
        mean_test_score: scores.mean_score(),
        std_test_score: scores.std_score(),
        mean_fit_time: mean(&scores.fit_times),
        mean_score_time: mean(&scores.score_times),
        rank: 0,
    })
}

/// Exhaustive search over every grid combination.
pub fn grid_search<P, F, S>(
    factory: F,
    grid: &ParamGrid,
    x: &Frame,
    y: &[f64],
    cv: &StratifiedKFold,
    scorer: S,
) -> LabResult<SearchOutcome>
where
    P: Probabilistic,
    F: Fn(&ParamSet) -> LabResult<P> + Sync,
    S: Fn(&[f64], &[f64]) -> f64 + Sync,
{
    let mut candidates = Vec::with_capacity(grid.len());
    for params in grid.combinations() {
        candidates.push(evaluate(&factory, params, x, y, cv, &scorer)?);
    }
    Ok(SearchOutcome {
        candidates: rank_candidates(candidates),
    })
}

/// Seeded search over `n_iter` distinct combinations. Evaluates the full
/// grid when it is smaller than `n_iter`.
pub fn randomized_search<P, F, S>(
    factory: F,
    grid: &ParamGrid,
    x: &Frame,
    y: &[f64],
    cv: &StratifiedKFold,
    scorer: S,
    n_iter: usize,
    seed: u64,
) -> LabResult<SearchOutcome>
where
    P: Probabilistic,
    F: Fn(&ParamSet) -> LabResult<P> + Sync,
    S: Fn(&[f64], &[f64]) -> f64 + Sync,
{
    let total = grid.len();
    let picks: Vec<usize> = if total <= n_iter {
        (0..total).collect()
    } else {
        let mut all: Vec<usize> = (0..total).collect();
        let mut rng = StdRng::seed_from_u64(seed);
        all.shuffle(&mut rng);
        all.truncate(n_iter);
        all
    };

    let mut candidates = Vec::with_capacity(picks.len());
    for index in picks {
        let params = grid.combination_at(index);
        candidates.push(evaluate(&factory, params, x, y, cv, &scorer)?);
    }
    Ok(SearchOutcome {
        candidates: rank_candidates(candidates),
    })
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}
