//! Bounded probe history and the moving-average forecaster.

use std::collections::VecDeque;

/// How many sample/prediction pairs are kept per proxy.
pub const BUFFER_LENGTH: usize = 60;
/// Moving-average interval used to make predictions.
pub const MA_PERIOD: usize = 9;

/// Simple moving average over the `period` most recent samples.
///
/// `samples` is ordered most-recent-first and is the buffer *before* the
/// sample being recorded is inserted, so the forecast lags the measurement
/// it is stored alongside. Returns 0.0 while there is not enough history.
pub fn moving_average(samples: &VecDeque<f64>, period: usize) -> f64 {
    if period == 0 || samples.len() < period {
        return 0.0;
    }
    samples.iter().take(period).sum::<f64>() / period as f64
}

/// Fixed-capacity history of one proxy: parallel sample and prediction
/// sequences, most-recent-first. Appending at the front evicts at the back
/// once the buffer is full; there is no other mutation path.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    samples: VecDeque<f64>,
    predictions: VecDeque<f64>,
    capacity: usize,
    period: usize,
}

impl HistoryBuffer {
    pub fn new(capacity: usize, period: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity + 1),
            predictions: VecDeque::with_capacity(capacity + 1),
            capacity,
            period,
        }
    }

    /// Rebuild a buffer from persisted pairs, most-recent-first. Pairs past
    /// the capacity are discarded so the length bound holds from load on.
    pub fn from_pairs(pairs: Vec<(f64, f64)>, capacity: usize, period: usize) -> Self {
        let mut buf = Self::new(capacity, period);
        for (sample, prediction) in pairs.into_iter().take(capacity) {
            buf.samples.push_back(sample);
            buf.predictions.push_back(prediction);
        }
        buf
    }

    /// Record one measurement: derive its forecast from the samples already
    /// held, push both at the front, evict the oldest pair when over capacity.
    pub fn append(&mut self, sample: f64) {
        let prediction = moving_average(&self.samples, self.period);
        self.samples.push_front(sample);
        self.predictions.push_front(prediction);
        if self.samples.len() > self.capacity {
            self.samples.pop_back();
            self.predictions.pop_back();
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Most recent sample/prediction pair, if any.
    pub fn latest(&self) -> Option<(f64, f64)> {
        Some((*self.samples.front()?, *self.predictions.front()?))
    }

    /// All pairs, most-recent-first.
    pub fn pairs(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.samples
            .iter()
            .copied()
            .zip(self.predictions.iter().copied())
    }
}
