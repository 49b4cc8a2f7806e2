//! CSV storage backend.
//!
//! Creates two files in the target directory:
//!
//! ```text
//! vertices.csv   id,lon,lat,out_degree,in_degree
//! ways.csv       id,source_id,source,target,class,length_m,cost_s,reverse_cost_s,wkt
//! ```
//!
//! `reverse_cost_s` is `-1` for one-way ways.  `source_id` and `class` are
//! empty when unknown.

use std::fs::File;
use std::path::Path;

use csv::Writer;
use wkt::ToWkt;

use rn_core::VertexId;
use rn_graph::RoadGraph;

use crate::StoreResult;
use crate::writer::GraphWriter;

pub const VERTICES_FILE: &str = "vertices.csv";
pub const WAYS_FILE: &str = "ways.csv";

/// Writes a road graph to two CSV files.
pub struct CsvGraphWriter {
    vertices: Writer<File>,
    ways:     Writer<File>,
    finished: bool,
}

impl CsvGraphWriter {
    /// Create `dir` if needed, open the two files, and write the header rows.
    pub fn new(dir: &Path) -> StoreResult<Self> {
        std::fs::create_dir_all(dir)?;

        let mut vertices = Writer::from_path(dir.join(VERTICES_FILE))?;
        vertices.write_record(["id", "lon", "lat", "out_degree", "in_degree"])?;

        let mut ways = Writer::from_path(dir.join(WAYS_FILE))?;
        ways.write_record([
            "id",
            "source_id",
            "source",
            "target",
            "class",
            "length_m",
            "cost_s",
            "reverse_cost_s",
            "wkt",
        ])?;

        Ok(Self { vertices, ways, finished: false })
    }
}

impl GraphWriter for CsvGraphWriter {
    fn write_vertices(&mut self, graph: &RoadGraph) -> StoreResult<()> {
        for (i, v) in graph.vertices.iter().enumerate() {
            let id = VertexId(i as u32);
            self.vertices.write_record(&[
                i.to_string(),
                v.point.lon.to_string(),
                v.point.lat.to_string(),
                graph.outgoing(id).len().to_string(),
                graph.incoming(id).len().to_string(),
            ])?;
        }
        Ok(())
    }

    fn write_ways(&mut self, graph: &RoadGraph) -> StoreResult<()> {
        for (i, e) in graph.edges.iter().enumerate() {
            self.ways.write_record(&[
                i.to_string(),
                e.source_id.map(|s| s.to_string()).unwrap_or_default(),
                e.source.0.to_string(),
                e.target.0.to_string(),
                e.class.clone().unwrap_or_default(),
                e.length_m.to_string(),
                e.cost_s.to_string(),
                e.reverse_cost_s.to_string(),
                e.geometry.wkt_string(),
            ])?;
        }
        Ok(())
    }

    fn finish(&mut self) -> StoreResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.vertices.flush()?;
        self.ways.flush()?;
        Ok(())
    }
}
