//! # aztarna - Footprinting Scanner for Robot Middleware
//!
//! aztarna probes network addresses for robot middleware masters and records
//! what it finds: the host, the nodes running on it, their topics, services
//! and parameters, and the publish/subscribe graph between them.
//!
//! ## Features
//!
//! - **Flexible Targeting**: Address files, CIDR ranges, or piped input
//! - **Bounded Concurrency**: A ceiling on in-flight probes that can be changed mid-run
//! - **Launch Pacing**: Optional limit on probe starts per second
//! - **Cancellation**: Drain or abort in-flight probes, always keeping a partial report
//! - **Pluggable Strategies**: Protocol probes implement [`ScanStrategy`]
//! - **Multiple Output Formats**: Plain text, JSON, and CSV
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use aztarna::config::ScanSettings;
//! use aztarna::scanner::{CancelToken, Scanner, TcpConnectStrategy};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut scanner = Scanner::new(ScanSettings::default().with_rate(256))?;
//!     scanner.load_range("192.168.1.0/24")?;
//!
//!     let strategy = Arc::new(TcpConnectStrategy::new(Duration::from_secs(2)));
//!     let report = scanner.scan(strategy, &CancelToken::new()).await?;
//!     println!("{}", report.summary());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`model`] - Hosts, nodes, topics and their communications
//! - [`targets`] - Address population from files, readers and ranges
//! - [`scanner`] - The rate-bounded engine and the strategy contract
//! - [`observer`] - Scan telemetry
//! - [`config`] - Scan settings
//! - [`output`] - Report rendering
//! - [`error`] - Error types

pub mod banner;
pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod observer;
pub mod output;
pub mod scanner;
pub mod targets;
pub mod types;

// Re-export commonly used types
pub use config::ScanSettings;
pub use error::{ProbeError, ScanError};
pub use model::{Communication, Host, Node, NodeId, Parameter, Service, Topic};
pub use observer::{ScanObserver, TracingObserver};
pub use scanner::{CancelPolicy, CancelToken, ScanReport, ScanStrategy, Scanner};
pub use types::ScanId;
