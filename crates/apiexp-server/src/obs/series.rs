//! Labeled series storage.
//!
//! Each metric owns one vector: a `DashMap` from [`LabelKey`] to an atomic
//! f64. Series are created lazily on first write and are never removed;
//! windowed vectors are reset by zeroing values in place so previously seen
//! label combinations keep reporting `0`.

use std::sync::atomic::{AtomicU64, Ordering};

use apiexp_core::LabelKey;
use dashmap::DashMap;

/// f64 stored as its bit pattern; `add` is a CAS loop so concurrent adds are
/// never lost and readers never see a partial write.
#[derive(Debug)]
pub struct AtomicF64(AtomicU64);

impl AtomicF64 {
    pub fn new(v: f64) -> Self {
        Self(AtomicU64::new(v.to_bits()))
    }

    pub fn get(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Relaxed))
    }

    pub fn set(&self, v: f64) {
        self.0.store(v.to_bits(), Ordering::Relaxed);
    }

    pub fn add(&self, v: f64) {
        let mut current = self.0.load(Ordering::Relaxed);
        loop {
            let next = (f64::from_bits(current) + v).to_bits();
            match self
                .0
                .compare_exchange_weak(current, next, Ordering::Relaxed, Ordering::Relaxed)
            {
                Ok(_) => return,
                Err(actual) => current = actual,
            }
        }
    }
}

#[derive(Debug, Default)]
struct SeriesMap {
    map: DashMap<LabelKey, AtomicF64>,
}

impl SeriesMap {
    fn add(&self, key: LabelKey, v: f64) {
        if let Some(series) = self.map.get(&key) {
            series.add(v);
            return;
        }
        self.map
            .entry(key)
            .or_insert_with(|| AtomicF64::new(0.0))
            .add(v);
    }

    fn get(&self, key: &LabelKey) -> Option<f64> {
        self.map.get(key).map(|s| s.get())
    }

    fn zero_all(&self) {
        for r in self.map.iter() {
            r.value().set(0.0);
        }
    }

    /// Sorted by label key for deterministic exposition.
    fn samples(&self) -> Vec<(LabelKey, f64)> {
        let mut out: Vec<(LabelKey, f64)> = self
            .map
            .iter()
            .map(|r| (r.key().clone(), r.value().get()))
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }
}

/// Monotonic series; never reset.
#[derive(Debug, Default)]
pub struct CounterVec {
    inner: SeriesMap,
}

impl CounterVec {
    /// Increment by 1.
    pub fn inc(&self, key: LabelKey) {
        self.add(key, 1.0);
    }

    /// Negative deltas are ignored.
    pub fn add(&self, key: LabelKey, v: f64) {
        if v < 0.0 {
            return;
        }
        self.inner.add(key, v);
    }

    pub fn get(&self, key: &LabelKey) -> Option<f64> {
        self.inner.get(key)
    }

    pub fn samples(&self) -> Vec<(LabelKey, f64)> {
        self.inner.samples()
    }
}

/// Windowed series, zeroed in place by [`GaugeVec::reset`].
#[derive(Debug, Default)]
pub struct GaugeVec {
    inner: SeriesMap,
}

impl GaugeVec {
    pub fn inc(&self, key: LabelKey) {
        self.add(key, 1.0);
    }

    pub fn add(&self, key: LabelKey, v: f64) {
        self.inner.add(key, v);
    }

    pub fn get(&self, key: &LabelKey) -> Option<f64> {
        self.inner.get(key)
    }

    /// Zero every known series; label keys are kept.
    pub fn reset(&self) {
        self.inner.zero_all();
    }

    pub fn samples(&self) -> Vec<(LabelKey, f64)> {
        self.inner.samples()
    }
}

/// The typed storage behind one metric.
#[derive(Debug)]
pub enum SeriesStore {
    Counter(CounterVec),
    Gauge(GaugeVec),
}

impl SeriesStore {
    pub fn add(&self, key: LabelKey, v: f64) {
        match self {
            SeriesStore::Counter(c) => c.add(key, v),
            SeriesStore::Gauge(g) => g.add(key, v),
        }
    }

    pub fn get(&self, key: &LabelKey) -> Option<f64> {
        match self {
            SeriesStore::Counter(c) => c.get(key),
            SeriesStore::Gauge(g) => g.get(key),
        }
    }

    pub fn samples(&self) -> Vec<(LabelKey, f64)> {
        match self {
            SeriesStore::Counter(c) => c.samples(),
            SeriesStore::Gauge(g) => g.samples(),
        }
    }
}
