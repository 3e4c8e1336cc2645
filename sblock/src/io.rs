//! Model readers and writers.
//!
//! Two serialized forms are supported:
//!
//! * plain text, one directive per line (`#` starts a comment):
//!
//! ```text
//! model uncorrected     # or "degree"; optional
//! blocks 2              # number of blocks
//! vertices 4            # attaches a graph with 4 nodes
//! node 0 1              # node 0 belongs to block 1
//! edge 0 1              # undirected edge, listed once; implies a graph
//! ```
//!
//! * JSON, the serde form of [`ModelRecord`].
//!
//! A model without any `node` entries is randomly initialised over its
//! graph. Every reader validates the partition before a model is built, so
//! a failed read never yields a partial model.

use crate::blockmodel::Blockmodel;
use crate::common_io::{file_ext, open_buf_reader, open_buf_writer};
use crate::error::BlockmodelError;
use crate::graph::{Edge, UndirectedGraph};
use crate::model::ModelVariant;
use anyhow::Context;
use log::{debug, info};
use mcmc_util::RandomSource;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::io::{BufRead, Write};
use std::sync::Arc;

/// Serialization formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Discard on write; not readable
    Null,
    /// Line-oriented plain text
    Plain,
    /// JSON
    Json,
}

impl Format {
    /// `Json` for `*.json` (optionally gzipped), `Plain` otherwise.
    pub fn from_path(path: &str) -> Format {
        match file_ext(path).as_deref() {
            Some("json") => Format::Json,
            _ => Format::Plain,
        }
    }
}

/// Settings applied while turning a serialized model into a [`Blockmodel`].
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Overrides the edge model stored in the input
    pub variant: Option<ModelVariant>,
    /// Number of blocks when the input does not state it
    pub num_blocks: Option<usize>,
    /// Seed for random initialisation of a missing partition
    pub init_seed: u64,
}

/// Graph part of a serialized model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphRecord {
    /// Number of nodes
    pub vertices: usize,
    /// Undirected edges, each listed once
    #[serde(default)]
    pub edges: Vec<Edge>,
}

/// Format-independent serialized model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelRecord {
    /// Edge model
    #[serde(default)]
    pub model: Option<ModelVariant>,
    /// Number of blocks
    #[serde(default)]
    pub num_blocks: Option<usize>,
    /// Informational only; recomputed on load
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_likelihood: Option<f64>,
    /// Block of each node
    #[serde(default)]
    pub partition: Option<Vec<usize>>,
    /// Attached graph
    #[serde(default)]
    pub graph: Option<GraphRecord>,
}

impl ModelRecord {
    /// Snapshot of `model`
    pub fn from_blockmodel(model: &Blockmodel) -> Self {
        ModelRecord {
            model: Some(model.variant()),
            num_blocks: Some(model.num_blocks()),
            log_likelihood: Some(model.log_likelihood()),
            partition: Some(model.partition().to_vec()),
            graph: model.graph().map(|g| GraphRecord {
                vertices: g.num_nodes(),
                edges: g.edges().to_vec(),
            }),
        }
    }

    /// Validate and build the model.
    pub fn into_blockmodel(self, options: &LoadOptions) -> anyhow::Result<Blockmodel> {
        let variant = options.variant.or(self.model).unwrap_or_default();

        let graph = match self.graph {
            Some(g) => Some(Arc::new(UndirectedGraph::from_edges(g.vertices, &g.edges)?)),
            None => None,
        };

        match self.partition {
            Some(partition) => {
                let num_blocks = self
                    .num_blocks
                    .or(options.num_blocks)
                    .unwrap_or_else(|| partition.iter().max().map_or(1, |&b| b + 1));
                Ok(Blockmodel::new(graph, num_blocks, partition, variant)?)
            }
            None => {
                let graph = graph.ok_or(BlockmodelError::NoGraph).context(
                    "cannot initialise a partition: no node assignments and no graph given",
                )?;
                let num_blocks = options.num_blocks.or(self.num_blocks).ok_or_else(|| {
                    anyhow::anyhow!("cannot initialise a partition: number of blocks unknown")
                })?;
                info!(
                    "no partition given; assigning {} nodes to {} random blocks",
                    graph.num_nodes(),
                    num_blocks
                );
                let mut rng = RandomSource::new(options.init_seed);
                Ok(Blockmodel::random(graph, num_blocks, variant, &mut rng)?)
            }
        }
    }
}

/// Deserializes a block model from a stream.
pub trait ModelReader {
    /// Read a complete, validated model
    fn read(&self, input: &mut dyn BufRead) -> anyhow::Result<Blockmodel>;
}

/// Serializes a block model to a stream.
pub trait ModelWriter {
    /// Write `model` to `output`
    fn write(&self, model: &Blockmodel, output: &mut dyn Write) -> anyhow::Result<()>;
}

/// Reader for the plain text format
#[derive(Debug, Clone, Default)]
pub struct PlainTextReader {
    /// Load settings
    pub options: LoadOptions,
}

/// Reader for the JSON format
#[derive(Debug, Clone, Default)]
pub struct JsonReader {
    /// Load settings
    pub options: LoadOptions,
}

/// Writer for the plain text format
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextWriter;

/// Writer for the JSON format
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonWriter;

/// Writer that discards its input
#[derive(Debug, Clone, Copy, Default)]
pub struct NullWriter;

impl PlainTextReader {
    /// Parse the plain text format into a record.
    pub fn parse(input: &mut dyn BufRead) -> anyhow::Result<ModelRecord> {
        let mut record = ModelRecord::default();
        let mut vertices: Option<usize> = None;
        let mut edges: Vec<Edge> = vec![];
        let mut seen_edges: HashSet<Edge> = HashSet::new();
        let mut entries: Vec<Option<usize>> = vec![];
        let mut any_node = false;

        for (i, line) in input.lines().enumerate() {
            let line_no = i + 1;
            let line = line.with_context(|| format!("line {}: unreadable", line_no))?;
            let content = line.split('#').next().unwrap_or("").trim();
            if content.is_empty() {
                continue;
            }

            let words: Vec<&str> = content.split_whitespace().collect();
            let ints = |n: usize| -> anyhow::Result<Vec<usize>> {
                if words.len() != n + 1 {
                    anyhow::bail!(
                        "line {}: '{}' expects {} argument(s), found {}",
                        line_no,
                        words[0],
                        n,
                        words.len() - 1
                    );
                }
                words[1..]
                    .iter()
                    .map(|w| {
                        w.parse::<usize>().with_context(|| {
                            format!("line {}: '{}' is not a non-negative integer", line_no, w)
                        })
                    })
                    .collect()
            };

            match words[0] {
                "model" => {
                    if words.len() != 2 {
                        anyhow::bail!("line {}: 'model' expects one argument", line_no);
                    }
                    let variant = words[1]
                        .parse::<ModelVariant>()
                        .with_context(|| format!("line {}", line_no))?;
                    record.model = Some(variant);
                }
                "blocks" => record.num_blocks = Some(ints(1)?[0]),
                "vertices" => vertices = Some(ints(1)?[0]),
                "node" => {
                    let args = ints(2)?;
                    let (node, block) = (args[0], args[1]);
                    if node >= entries.len() {
                        entries.resize(node + 1, None);
                    }
                    if entries[node].is_some() {
                        return Err(BlockmodelError::DuplicateNode(node))
                            .with_context(|| format!("line {}", line_no));
                    }
                    entries[node] = Some(block);
                    any_node = true;
                }
                "edge" => {
                    let args = ints(2)?;
                    let (u, v) = (args[0], args[1]);
                    if !seen_edges.insert((u.min(v), u.max(v))) {
                        return Err(BlockmodelError::DuplicateEdge {
                            u: u.min(v),
                            v: u.max(v),
                        })
                        .with_context(|| format!("line {}", line_no));
                    }
                    edges.push((u, v));
                }
                other => anyhow::bail!("line {}: unknown directive '{}'", line_no, other),
            }
        }

        let has_graph = vertices.is_some() || !edges.is_empty();

        if has_graph {
            let n = match vertices {
                Some(n) => n,
                None => edges
                    .iter()
                    .map(|&(u, v)| u.max(v) + 1)
                    .max()
                    .unwrap_or(0)
                    .max(entries.len()),
            };
            record.graph = Some(GraphRecord { vertices: n, edges });
            if entries.len() > n {
                return Err(BlockmodelError::NodeOutOfRange {
                    node: entries.len() - 1,
                    num_nodes: n,
                }
                .into());
            }
            if any_node {
                entries.resize(n, None);
            }
        }

        if any_node {
            let mut partition = Vec::with_capacity(entries.len());
            for (node, entry) in entries.into_iter().enumerate() {
                partition.push(entry.ok_or(BlockmodelError::MissingNode(node))?);
            }
            record.partition = Some(partition);
        }

        Ok(record)
    }
}

impl ModelReader for PlainTextReader {
    fn read(&self, input: &mut dyn BufRead) -> anyhow::Result<Blockmodel> {
        Self::parse(input)?.into_blockmodel(&self.options)
    }
}

impl ModelReader for JsonReader {
    fn read(&self, input: &mut dyn BufRead) -> anyhow::Result<Blockmodel> {
        let record: ModelRecord =
            serde_json::from_reader(input).context("malformed JSON block model")?;
        record.into_blockmodel(&self.options)
    }
}

impl ModelWriter for PlainTextWriter {
    fn write(&self, model: &Blockmodel, output: &mut dyn Write) -> anyhow::Result<()> {
        writeln!(output, "# log-likelihood: {}", model.log_likelihood())?;
        writeln!(output, "model {}", model.variant())?;
        writeln!(output, "blocks {}", model.num_blocks())?;
        if let Some(g) = model.graph() {
            writeln!(output, "vertices {}", g.num_nodes())?;
        }
        for (node, block) in model.partition().iter().enumerate() {
            writeln!(output, "node {} {}", node, block)?;
        }
        if let Some(g) = model.graph() {
            for &(u, v) in g.edges() {
                writeln!(output, "edge {} {}", u, v)?;
            }
        }
        output.flush()?;
        Ok(())
    }
}

impl ModelWriter for JsonWriter {
    fn write(&self, model: &Blockmodel, output: &mut dyn Write) -> anyhow::Result<()> {
        let record = ModelRecord::from_blockmodel(model);
        serde_json::to_writer_pretty(&mut *output, &record)?;
        writeln!(output)?;
        output.flush()?;
        Ok(())
    }
}

impl ModelWriter for NullWriter {
    fn write(&self, _model: &Blockmodel, _output: &mut dyn Write) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Reader for `format`
pub fn reader_for(format: Format, options: LoadOptions) -> anyhow::Result<Box<dyn ModelReader>> {
    match format {
        Format::Plain => Ok(Box::new(PlainTextReader { options })),
        Format::Json => Ok(Box::new(JsonReader { options })),
        Format::Null => anyhow::bail!("the null format cannot be read"),
    }
}

/// Writer for `format`
pub fn writer_for(format: Format) -> Box<dyn ModelWriter> {
    match format {
        Format::Plain => Box::new(PlainTextWriter),
        Format::Json => Box::new(JsonWriter),
        Format::Null => Box::new(NullWriter),
    }
}

/// Read a model from `input_file` (`-` for stdin); the format follows the
/// file extension.
pub fn read_model(input_file: &str, options: LoadOptions) -> anyhow::Result<Blockmodel> {
    let format = Format::from_path(input_file);
    debug!("reading {:?} model from {}", format, input_file);
    let reader = reader_for(format, options)?;
    let mut buf = open_buf_reader(input_file)
        .with_context(|| format!("Cannot read input file: {}", input_file))?;
    reader
        .read(&mut buf)
        .with_context(|| format!("Cannot read input file: {}", input_file))
}

/// Write `model` to `output_file` (`-` for stdout) in `format`.
pub fn write_model(model: &Blockmodel, output_file: &str, format: Format) -> anyhow::Result<()> {
    if format == Format::Null {
        return NullWriter.write(model, &mut std::io::sink());
    }
    let mut buf = open_buf_writer(output_file)
        .with_context(|| format!("Cannot write output file: {}", output_file))?;
    writer_for(format).write(model, &mut buf)
}

/// Read pinned `node block` pairs, one per line (`#` comments allowed).
///
/// Repeating a pair is harmless; pinning a node to two different blocks
/// fails on the conflicting line.
pub fn read_labels(input: &mut dyn BufRead) -> anyhow::Result<Vec<(usize, usize)>> {
    let mut labels = vec![];
    let mut pinned: HashMap<usize, usize> = HashMap::new();
    for (i, line) in input.lines().enumerate() {
        let line = line?;
        let content = line.split('#').next().unwrap_or("").trim();
        if content.is_empty() {
            continue;
        }
        let words: Vec<&str> = content.split_whitespace().collect();
        if words.len() != 2 {
            anyhow::bail!("line {}: expected 'node block', found '{}'", i + 1, content);
        }
        let node = words[0]
            .parse::<usize>()
            .with_context(|| format!("line {}: invalid node '{}'", i + 1, words[0]))?;
        let block = words[1]
            .parse::<usize>()
            .with_context(|| format!("line {}: invalid block '{}'", i + 1, words[1]))?;
        match pinned.get(&node) {
            Some(&prev) if prev != block => anyhow::bail!(
                "line {}: node {} is already pinned to block {}, not {}",
                i + 1,
                node,
                prev,
                block
            ),
            Some(_) => continue,
            None => {
                pinned.insert(node, block);
                labels.push((node, block));
            }
        }
    }
    Ok(labels)
}

/// Read a labels file (`-` for stdin)
pub fn read_labels_file(labels_file: &str) -> anyhow::Result<Vec<(usize, usize)>> {
    let mut buf = open_buf_reader(labels_file)
        .with_context(|| format!("Cannot read labels file: {}", labels_file))?;
    read_labels(&mut buf).with_context(|| format!("Cannot read labels file: {}", labels_file))
}
