//! SQLite storage backend (feature `sqlite`).
//!
//! Creates `topology.db` in the target directory with two tables,
//! `topology_vertices` and `topology_ways`, mirroring the CSV columns.
//! Writing replaces any rows left by a previous export.

use std::path::Path;

use rusqlite::Connection;
use wkt::ToWkt;

use rn_core::VertexId;
use rn_graph::RoadGraph;

use crate::StoreResult;
use crate::writer::GraphWriter;

pub const DB_FILE: &str = "topology.db";

/// Writes a road graph to an SQLite database.
pub struct SqliteGraphWriter {
    conn:     Connection,
    finished: bool,
}

impl SqliteGraphWriter {
    /// Open (or create) `topology.db` in `dir` and initialise the schema.
    pub fn new(dir: &Path) -> StoreResult<Self> {
        std::fs::create_dir_all(dir)?;
        let conn = Connection::open(dir.join(DB_FILE))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous  = NORMAL;
             CREATE TABLE IF NOT EXISTS topology_vertices (
                 id         INTEGER PRIMARY KEY,
                 lon        REAL    NOT NULL,
                 lat        REAL    NOT NULL,
                 out_degree INTEGER NOT NULL,
                 in_degree  INTEGER NOT NULL
             );
             CREATE TABLE IF NOT EXISTS topology_ways (
                 id             INTEGER PRIMARY KEY,
                 source_id      INTEGER,
                 source         INTEGER NOT NULL REFERENCES topology_vertices (id),
                 target         INTEGER NOT NULL REFERENCES topology_vertices (id),
                 class          TEXT,
                 length_m       REAL    NOT NULL,
                 cost_s         REAL    NOT NULL,
                 reverse_cost_s REAL    NOT NULL,
                 wkt            TEXT    NOT NULL
             );
             CREATE INDEX IF NOT EXISTS topology_ways_source ON topology_ways (source);
             CREATE INDEX IF NOT EXISTS topology_ways_target ON topology_ways (target);",
        )?;

        Ok(Self { conn, finished: false })
    }
}

impl GraphWriter for SqliteGraphWriter {
    fn write_vertices(&mut self, graph: &RoadGraph) -> StoreResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM topology_vertices", [])?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO topology_vertices (id, lon, lat, out_degree, in_degree) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for (i, v) in graph.vertices.iter().enumerate() {
                let id = VertexId(i as u32);
                stmt.execute(rusqlite::params![
                    i as i64,
                    v.point.lon,
                    v.point.lat,
                    graph.outgoing(id).len() as i64,
                    graph.incoming(id).len() as i64,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn write_ways(&mut self, graph: &RoadGraph) -> StoreResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM topology_ways", [])?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO topology_ways \
                 (id, source_id, source, target, class, length_m, cost_s, reverse_cost_s, wkt) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )?;
            for (i, e) in graph.edges.iter().enumerate() {
                stmt.execute(rusqlite::params![
                    i as i64,
                    e.source_id,
                    e.source.0,
                    e.target.0,
                    e.class.as_deref(),
                    e.length_m,
                    e.cost_s,
                    e.reverse_cost_s,
                    e.geometry.wkt_string(),
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn finish(&mut self) -> StoreResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
        Ok(())
    }
}
