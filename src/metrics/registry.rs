use std::collections::BTreeMap;

use crate::error::MetricsError;

use super::types::{MetricId, MetricKind, names};

/// Ids of the metrics every run records.
#[derive(Debug, Clone, Copy)]
pub struct Builtins {
    pub http_reqs: MetricId,
    pub http_req_duration: MetricId,
    pub http_req_failed: MetricId,
    pub data_received: MetricId,
    pub iterations: MetricId,
    pub iteration_duration: MetricId,
    pub checks: MetricId,
}

const BUILTIN_METRICS: [(&str, MetricKind); 7] = [
    (names::HTTP_REQS, MetricKind::Counter),
    (names::HTTP_REQ_DURATION, MetricKind::Trend),
    (names::HTTP_REQ_FAILED, MetricKind::Rate),
    (names::DATA_RECEIVED, MetricKind::Counter),
    (names::ITERATIONS, MetricKind::Counter),
    (names::ITERATION_DURATION, MetricKind::Trend),
    (names::CHECKS, MetricKind::Rate),
];

#[derive(Debug, Clone)]
pub struct MetricEntry {
    pub name: String,
    pub kind: MetricKind,
}

/// Name → id/kind table, fixed once the scenario is loaded.
#[derive(Debug, Clone)]
pub struct MetricRegistry {
    entries: Vec<MetricEntry>,
    index: BTreeMap<String, MetricId>,
    builtins: Builtins,
}

impl MetricRegistry {
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut entries = Vec::with_capacity(BUILTIN_METRICS.len());
        let mut index = BTreeMap::new();
        for (position, (name, kind)) in BUILTIN_METRICS.iter().enumerate() {
            entries.push(MetricEntry {
                name: (*name).to_owned(),
                kind: *kind,
            });
            index.insert((*name).to_owned(), MetricId(position));
        }
        let id = |name: &str| index.get(name).copied().unwrap_or(MetricId(0));
        let builtins = Builtins {
            http_reqs: id(names::HTTP_REQS),
            http_req_duration: id(names::HTTP_REQ_DURATION),
            http_req_failed: id(names::HTTP_REQ_FAILED),
            data_received: id(names::DATA_RECEIVED),
            iterations: id(names::ITERATIONS),
            iteration_duration: id(names::ITERATION_DURATION),
            checks: id(names::CHECKS),
        };
        Self {
            entries,
            index,
            builtins,
        }
    }

    #[must_use]
    pub fn is_builtin(name: &str) -> bool {
        BUILTIN_METRICS
            .iter()
            .any(|(builtin, _)| *builtin == name)
    }

    /// Registers a custom metric, returning the existing id if the name is
    /// already known with the same kind.
    ///
    /// # Errors
    ///
    /// Returns an error when the name is registered with a different kind.
    pub fn register(&mut self, name: &str, kind: MetricKind) -> Result<MetricId, MetricsError> {
        if let Some(existing) = self.index.get(name) {
            let same_kind = self
                .entries
                .get(existing.index())
                .is_some_and(|entry| entry.kind == kind);
            if !same_kind {
                return Err(MetricsError::KindConflict {
                    name: name.to_owned(),
                });
            }
            return Ok(*existing);
        }
        let id = MetricId(self.entries.len());
        self.entries.push(MetricEntry {
            name: name.to_owned(),
            kind,
        });
        self.index.insert(name.to_owned(), id);
        Ok(id)
    }

    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<(MetricId, MetricKind)> {
        let id = self.index.get(name)?;
        let entry = self.entries.get(id.index())?;
        Some((*id, entry.kind))
    }

    #[must_use]
    pub const fn builtins(&self) -> &Builtins {
        &self.builtins
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &MetricEntry> {
        self.entries.iter()
    }
}

impl Default for MetricRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}
