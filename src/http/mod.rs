//! Request execution: the transport seam and the per-step executor.
mod executor;
mod transport;

#[cfg(test)]
pub(crate) mod test_support;

pub use executor::{ExecutionRecord, RequestExecutor};
pub use transport::{ReqwestTransport, RequestSpec, Transport, TransportResponse};
