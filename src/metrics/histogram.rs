use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use hdrhistogram::Histogram;
use hdrhistogram::serialization::{Deserializer, Serializer, V2Serializer};
use std::io::Cursor;

use crate::error::MetricsError;

/// Auto-resizing HDR histogram of durations in microseconds.
#[derive(Debug, Clone)]
pub struct LatencyHistogram {
    hist: Histogram<u64>,
}

impl LatencyHistogram {
    /// Create a new latency histogram with three significant digits.
    ///
    /// # Errors
    ///
    /// Returns an error if the histogram cannot be created.
    pub fn new() -> Result<Self, MetricsError> {
        let hist = Histogram::<u64>::new(3).map_err(|err| MetricsError::Histogram {
            context: "create",
            source: Box::new(err),
        })?;
        Ok(Self { hist })
    }

    /// Record a duration in microseconds.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be recorded.
    pub fn record(&mut self, micros: u64) -> Result<(), MetricsError> {
        self.hist
            .record(micros.max(1))
            .map_err(|err| MetricsError::Histogram {
                context: "record",
                source: Box::new(err),
            })
    }

    /// Merge another histogram into this one.
    ///
    /// # Errors
    ///
    /// Returns an error if the merge fails.
    pub fn merge(&mut self, other: &LatencyHistogram) -> Result<(), MetricsError> {
        self.hist
            .add(&other.hist)
            .map_err(|err| MetricsError::Histogram {
                context: "merge",
                source: Box::new(err),
            })
    }

    /// Value at `quantile` (0.0..=1.0) in microseconds; 0 when empty.
    #[must_use]
    pub fn value_at_quantile(&self, quantile: f64) -> u64 {
        if self.count() == 0 {
            return 0;
        }
        self.hist.value_at_quantile(quantile.clamp(0.0, 1.0))
    }

    #[must_use]
    pub fn count(&self) -> u64 {
        self.hist.len()
    }

    /// Encode the histogram as base64.
    ///
    /// # Errors
    ///
    /// Returns an error if the histogram cannot be serialized.
    pub fn encode_base64(&self) -> Result<String, MetricsError> {
        let mut buffer = Vec::new();
        V2Serializer::new()
            .serialize(&self.hist, &mut buffer)
            .map_err(|err| MetricsError::Histogram {
                context: "serialize",
                source: Box::new(err),
            })?;
        Ok(B64.encode(buffer))
    }

    /// Decode a base64 histogram payload.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload cannot be decoded or deserialized.
    pub fn decode_base64(encoded: &str) -> Result<Self, MetricsError> {
        let bytes = B64
            .decode(encoded.as_bytes())
            .map_err(|err| MetricsError::DecodeBase64 { source: err })?;
        let mut cursor = Cursor::new(bytes);
        let hist: Histogram<u64> =
            Deserializer::new()
                .deserialize(&mut cursor)
                .map_err(|err| MetricsError::Histogram {
                    context: "deserialize",
                    source: Box::new(err),
                })?;
        Ok(Self { hist })
    }
}
