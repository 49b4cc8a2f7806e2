//! `rn-store`: durable storage of a built [`RoadGraph`](rn_graph::RoadGraph).
//!
//! A graph is normally rebuilt from segments on every start; the writers here
//! persist one build so it can be inspected or loaded by other tools.
//!
//! | Feature   | Backend | Files created                  |
//! |-----------|---------|--------------------------------|
//! | *(none)*  | CSV     | `vertices.csv`, `ways.csv`     |
//! | `sqlite`  | SQLite  | `topology.db`                  |
//!
//! All backends implement [`GraphWriter`].
//!
//! # Usage
//!
//! ```rust,ignore
//! use rn_store::{CsvGraphWriter, GraphWriter};
//!
//! let mut writer = CsvGraphWriter::new(Path::new("./export"))?;
//! writer.write_graph(&snapshot.graph)?;
//! writer.finish()?;
//! ```

pub mod csv_writer;
pub mod error;
pub mod writer;

#[cfg(feature = "sqlite")]
pub mod sqlite;


pub use csv_writer::CsvGraphWriter;
pub use error::{StoreError, StoreResult};
pub use writer::GraphWriter;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteGraphWriter;
