// Pipeline entry points: load -> normalize -> filter -> aggregate -> compile -> render

use std::collections::HashMap;
use std::io::Read;

use tracing::{debug, info};

use crate::aggregate::{aggregate, Aggregation, GroupingMode, YearRange};
use crate::compiler::compile_chart;
use crate::config::ChartConfig;
use crate::data::PlotData;
use crate::error::{ChartError, Result};
use crate::filter::{filter, FilterSpec};
use crate::graph;
use crate::ir::SceneGraph;
use crate::schema::{normalize, Record, Schema};
use crate::OutputFormat;

/// Aggregations kept per session before the oldest is evicted
pub const DEFAULT_CACHE_ENTRIES: usize = 16;

/// Read delimited text or a JSON array of objects, sniffed from the first
/// non-whitespace byte
pub fn load_data<R: Read>(mut reader: R, delimiter: u8) -> Result<PlotData> {
    let mut text = String::new();
    reader
        .read_to_string(&mut text)
        .map_err(|e| ChartError::Input(e.to_string()))?;

    let data = match text.trim_start().chars().next() {
        Some('[') | Some('{') => {
            let value: serde_json::Value = serde_json::from_str(&text)?;
            PlotData::from_json(&value)?
        }
        Some(_) => PlotData::from_reader(text.as_bytes(), delimiter)?,
        None => return Err(ChartError::Input("Input is empty".to_string())),
    };

    info!(rows = data.rows.len(), columns = data.headers.len(), "Read input");
    Ok(data)
}

/// Exact parameters of one aggregation
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AggregateQuery {
    pub range: YearRange,
    pub grouping: GroupingMode,
    pub filter: Option<FilterSpec>,
}

struct CachedAggregation {
    aggregation: Aggregation,
    inserted: u64,
}

/// A rendered chart
#[derive(Debug, Clone, PartialEq)]
pub enum Artifact {
    Png(Vec<u8>),
    Svg(String),
}

impl Artifact {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Artifact::Png(bytes) => bytes,
            Artifact::Svg(text) => text.as_bytes(),
        }
    }
}

/// Loaded records plus a bounded memo of the aggregations computed over them.
/// Repeated renders with different cosmetics reuse the cached buckets.
pub struct ChartSession {
    records: Vec<Record>,
    cache: HashMap<AggregateQuery, CachedAggregation>,
    max_entries: usize,
    sequence: u64,
}

impl ChartSession {
    pub fn new(records: Vec<Record>) -> Self {
        Self::with_capacity(records, DEFAULT_CACHE_ENTRIES)
    }

    pub fn with_capacity(records: Vec<Record>, max_entries: usize) -> Self {
        Self {
            records,
            cache: HashMap::new(),
            max_entries: max_entries.max(1),
            sequence: 0,
        }
    }

    /// Normalize raw input into a new session
    pub fn load(data: &PlotData, schema: &Schema) -> Result<Self> {
        let records = normalize(data, schema)?;
        info!(
            records = records.len(),
            dropped = data.rows.len() - records.len(),
            "Normalized input"
        );
        Ok(Self::new(records))
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn cached_entries(&self) -> usize {
        self.cache.len()
    }

    /// Query implied by a config; no year range means the span of the data
    pub fn query_for(&self, config: &ChartConfig) -> Result<AggregateQuery> {
        let range = match config.years {
            Some(range) => range,
            None => YearRange::spanning(&self.records)
                .ok_or_else(|| ChartError::Input("No rows with a parseable date".to_string()))?,
        };

        Ok(AggregateQuery {
            range,
            grouping: config.grouping(),
            filter: config.filter.clone().filter(|f| !f.is_identity()),
        })
    }

    /// Filter and aggregate, memoized on the exact query
    pub fn aggregate(&mut self, query: &AggregateQuery) -> Result<Aggregation> {
        if let Some(hit) = self.cache.get(query) {
            debug!(range = ?query.range, "Aggregation cache hit");
            return Ok(hit.aggregation.clone());
        }

        if let Some(spec) = &query.filter {
            if !self.records.iter().any(|r| r.has_field(&spec.column)) {
                return Err(ChartError::ColumnNotFound(spec.column.trim().to_string()));
            }
        }

        let kept = filter(&self.records, query.filter.as_ref());
        debug!(kept = kept.len(), total = self.records.len(), "Filtered records");
        let aggregation = aggregate(&kept, query.range, &query.grouping)?;

        if self.cache.len() >= self.max_entries {
            if let Some(victim) = self
                .cache
                .iter()
                .min_by_key(|(_, v)| v.inserted)
                .map(|(k, _)| k.clone())
            {
                self.cache.remove(&victim);
            }
        }
        self.sequence += 1;
        self.cache.insert(
            query.clone(),
            CachedAggregation {
                aggregation: aggregation.clone(),
                inserted: self.sequence,
            },
        );

        Ok(aggregation)
    }

    /// Build the scene graph for a config
    pub fn compile(&mut self, config: &ChartConfig) -> Result<SceneGraph> {
        config.validate()?;
        let query = self.query_for(config)?;
        let aggregation = self.aggregate(&query)?;
        let scene = compile_chart(&aggregation, config)?;
        info!(
            buckets = aggregation.rows.len(),
            commands = scene.commands.len(),
            "Compiled chart"
        );
        Ok(scene)
    }

    /// Build and render in the configured output format
    pub fn render(&mut self, config: &ChartConfig) -> Result<Artifact> {
        let scene = self.compile(config)?;
        let artifact = match config.render.format {
            OutputFormat::Png => Artifact::Png(graph::render_png(&scene, &config.render)?),
            OutputFormat::Svg => Artifact::Svg(graph::render_svg(&scene)?),
        };
        info!(bytes = artifact.as_bytes().len(), "Rendered chart");
        Ok(artifact)
    }
}

/// One-shot pipeline over already loaded input; the config is validated
/// when the session compiles it
pub fn render_chart(data: &PlotData, config: &ChartConfig) -> Result<Artifact> {
    ChartSession::load(data, &config.schema)?.render(config)
}
