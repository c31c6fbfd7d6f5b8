#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(
    missing_debug_implementations,
    clippy::print_stderr,
    clippy::print_stdout
)]

//! # parquet-scaffold
//!
//! Turns Parquet files into ClickHouse tables and Django REST endpoints.
//!
//! 1. Infer
//!
//!     The column names and kinds of a Parquet file become a declarative
//!     [`TableConfig`], persisted as JSON next to the data.
//!
//! 2. Provision
//!
//!     The config is turned into a `CREATE TABLE IF NOT EXISTS` statement with
//!     a synthetic `dna_id` key, and existing tables are reconciled against it.
//!     All rows of the file are then loaded in one insert.
//!
//! 3. Scaffold
//!
//!     Django's `inspectdb` reflects the loaded tables, and models,
//!     serializers, views and routes are generated for every reflected model.
//!
//! ## A quick taste
//!
//! ```no_run
//! # async fn function() -> parquet_scaffold::Result<()> {
//! use parquet_scaffold::{
//!     ConfigBuilder, TableProvisioner,
//!     store::{ClickHouseStore, ConnectOptions},
//! };
//!
//! let store = ClickHouseStore::connect(ConnectOptions::new("http://localhost:8123")?)?;
//! let config = ConfigBuilder::default().build_from_parquet("data/Trades.parquet")?;
//! config.write("configs/Trades_config.json")?;
//!
//! let provisioner = TableProvisioner::new(&store);
//! provisioner.provision(&config).await?;
//! provisioner.bulk_load(&config, "data/Trades.parquet").await?;
//! # Ok(())
//! # }
//! ```
//!
//! Tests can swap ClickHouse for `store::MockStore` with the `mock` feature.

pub mod config;
pub mod dataset;
pub mod error;
pub mod kind;
pub mod orchestrator;
pub mod provision;
pub mod reflect;
pub mod store;

pub use config::*;
pub use error::*;
pub use kind::*;
pub use orchestrator::*;
pub use provision::*;
pub use reflect::*;

pub use parquet_scaffold_codegen as codegen;
