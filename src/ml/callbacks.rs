// ============================================================
// Layer 5 — Training Callbacks
// ============================================================
// EarlyStopping watches a lower-is-better loss and stops once
// `patience` epochs pass without improvement.

#[derive(Debug, Clone)]
pub struct EarlyStopping {
    patience: usize,
    best: f64,
    best_epoch: usize,
    bad_epochs: usize,
}

impl EarlyStopping {
    pub fn new(patience: usize) -> Self {
        Self {
            patience,
            best: f64::INFINITY,
            best_epoch: 0,
            bad_epochs: 0,
        }
    }

    /// Record this epoch's loss; returns true if it is a new best.
    pub fn observe(&mut self, epoch: usize, loss: f64) -> bool {
        if loss < self.best {
            self.best = loss;
            self.best_epoch = epoch;
            self.bad_epochs = 0;
            true
        } else {
            self.bad_epochs += 1;
            false
        }
    }

    pub fn should_stop(&self) -> bool {
        self.bad_epochs >= self.patience
    }

    pub fn best(&self) -> f64 {
        self.best
    }

    pub fn best_epoch(&self) -> usize {
        self.best_epoch
    }
}
