//! Parsing of the Prometheus text exposition format.
//!
//! Blockchain nodes publish their counters on a `/metrics` endpoint in the
//! Prometheus text format. This module turns that raw text into either a
//! single named counter value ([`extract_counter`]) or the full list of
//! structured samples ([`parse_samples`]).
//!
//! Typical usage:
//!
//! ```
//! use node_verifier::metrics::extract_counter;
//!
//! let text = "# TYPE aptos_consensus_last_committed_version gauge\n\
//!             aptos_consensus_last_committed_version 8299\n";
//! let version = extract_counter(text, "aptos_consensus_last_committed_version").unwrap();
//! assert_eq!(version, 8299);
//! ```

pub mod parser;

pub use parser::{MetricSample, ParseError, extract_counter, parse_samples};
