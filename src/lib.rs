//! # churn-guard: customer-churn MLOps loop
//!
//! Trains churn classifiers, tracks every run, and keeps the best model in
//! production:
//!
//! ```text
//! train -> track run -> select top run -> register -> compare -> promote | skip
//!                                                                  |
//!                                     batch predict <- Production alias
//! ```
//!
//! ## Design Principles (Toyota Way Aligned)
//!
//! - **Jidoka**: A challenger is promoted only when it beats production on
//!   both F1 and ROC AUC
//! - **Muda elimination**: Non-selected runs are pruned after each selection
//! - **Poka-Yoke safety**: Every workflow reports failures in its outcome
//!   instead of aborting the service
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use churn_guard::config::load_config;
//! use churn_guard::context::ServiceContext;
//!
//! let context = ServiceContext::from_config(load_config(None)?)?;
//! let report = context.train()?;
//! println!("test f1 = {:.3}", report.test.f1);
//!
//! let outcome = context.deploy();
//! println!("deployed: {:?}", outcome.deployed());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod config;
pub mod context;
pub mod data;
pub mod deploy;
pub mod error;
pub mod experiment;
pub mod metrics;
pub mod model;
pub mod registry;
pub mod server;
pub mod storage;
pub mod train;

pub use error::{Error, Result};
