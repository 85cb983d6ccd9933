use loanlab_core::{LabError, LabResult};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Stratified k-fold splitter: every fold preserves the class ratio of the
/// full label vector. The fixed seed makes fold assignments reproducible
/// across experiments, so scores stay comparable between runs.
#[derive(Debug, Clone, Copy)]
pub struct StratifiedKFold {
    pub n_splits: usize,
    pub shuffle: bool,
    pub seed: u64,
}

impl StratifiedKFold {
    pub fn new(n_splits: usize, shuffle: bool, seed: u64) -> Self {
        StratifiedKFold {
            n_splits,
            shuffle,
            seed,
        }
    }

    /// (train, test) index pairs, one per fold.
    pub fn split(&self, y: &[f64]) -> LabResult<Vec<(Vec<usize>, Vec<usize>)>> {
        if self.n_splits < 2 {
            return Err(LabError::InvalidParam {
                name: "n_splits".to_string(),
                reason: "need at least 2 folds".to_string(),
            });
        }

        let mut pos: Vec<usize> = (0..y.len()).filter(|&i| y[i] > 0.5).collect();
        let mut neg: Vec<usize> = (0..y.len()).filter(|&i| y[i] <= 0.5).collect();

        let smallest = pos.len().min(neg.len());
        if smallest < self.n_splits {
            return Err(LabError::InvalidOperation(format!(
                "cannot stratify {} folds with a class of {} samples",
                self.n_splits, smallest
            )));
        }

        if self.shuffle {
            let mut rng = StdRng::seed_from_u64(self.seed);
            pos.shuffle(&mut rng);
            neg.shuffle(&mut rng);
        }

        // Round-robin assignment keeps per-fold class counts within one.
        let mut test_folds: Vec<Vec<usize>> = vec![Vec::new(); self.n_splits];
        for class in [&pos, &neg] {
            for (i, &idx) in class.iter().enumerate() {
                test_folds[i % self.n_splits].push(idx);
            }
        }

        let folds = test_folds
            .into_iter()
            .map(|mut test| {
                test.sort_unstable();
                let mut train: Vec<usize> = (0..y.len())
                    .filter(|i| test.binary_search(i).is_err())
                    .collect();
                train.sort_unstable();
                (train, test)
            })
            .collect();
        Ok(folds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(pos: usize, neg: usize) -> Vec<f64> {
        let mut y = vec![1.0; pos];
        y.extend(vec![0.0; neg]);
        y
    }

    #[test]
    fn test_folds_partition_all_rows() {
        let y = labels(10, 20);
        let cv = StratifiedKFold::new(5, true, 42);
        let folds = cv.split(&y).unwrap();
        assert_eq!(folds.len(), 5);

        let mut seen: Vec<usize> = folds.iter().flat_map(|(_, t)| t.clone()).collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..30).collect::<Vec<_>>());

        for (train, test) in &folds {
            assert_eq!(train.len() + test.len(), 30);
            assert!(train.iter().all(|i| !test.contains(i)));
        }
    }

    #[test]
    fn test_folds_are_stratified() {
        let y = labels(10, 20);
        let cv = StratifiedKFold::new(5, true, 42);
        for (_, test) in cv.split(&y).unwrap() {
            let pos = test.iter().filter(|&&i| y[i] > 0.5).count();
            assert_eq!(pos, 2, "each fold holds a third positives");
            assert_eq!(test.len(), 6);
        }
    }

    #[test]
    fn test_split_is_reproducible() {
        let y = labels(8, 12);
        let cv = StratifiedKFold::new(4, true, 7);
        assert_eq!(cv.split(&y).unwrap(), cv.split(&y).unwrap());

        let other = StratifiedKFold::new(4, true, 8);
        assert_ne!(cv.split(&y).unwrap(), other.split(&y).unwrap());
    }

    #[test]
    fn test_too_few_samples_rejected() {
        let y = labels(2, 20);
        let cv = StratifiedKFold::new(5, true, 42);
        assert!(cv.split(&y).is_err());
    }
}
