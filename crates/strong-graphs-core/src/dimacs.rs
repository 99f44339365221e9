//! Extended DIMACS shortest-path format.
//!
//! Node ids are 1-based on disk and 0-based in memory.

use std::io::{self, BufRead, Write};

use thiserror::Error;

use crate::error::NetworkError;
use crate::generator::Instance;
use crate::network::{Network, NodeId};
use crate::params::InstanceConfig;

#[derive(Debug, Error)]
pub enum DimacsError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error(transparent)]
    Network(#[from] NetworkError),
}

fn parse_error(line: usize, message: impl Into<String>) -> DimacsError {
    DimacsError::Parse {
        line,
        message: message.into(),
    }
}

/// `strong-graph-<n>-<m>-<sum of distances>`, also used as the file name.
pub fn title(instance: &Instance) -> String {
    format!(
        "strong-graph-{}-{}-{}",
        instance.node_count(),
        instance.arc_count(),
        instance.sum_of_distances()
    )
}

pub fn write_instance<W: Write>(
    writer: &mut W,
    instance: &Instance,
    config: Option<&InstanceConfig>,
) -> Result<(), DimacsError> {
    writeln!(writer, "c Strong graph for shortest paths problem")?;
    writeln!(writer, "c extended DIMACS format")?;
    writeln!(writer, "c")?;
    writeln!(writer, "t {}", title(instance))?;
    writeln!(writer, "c")?;
    if let Some(config) = config {
        writeln!(writer, "c density {}", config.density)?;
        writeln!(writer, "c negative ratio {}", config.negative_ratio)?;
        writeln!(writer, "c weights [{}, {}]", config.lower, config.upper)?;
        writeln!(writer, "c seed {}", config.seed)?;
        writeln!(writer, "c")?;
    }
    writeln!(
        writer,
        "p sp {:10} {:10}",
        instance.node_count(),
        instance.arc_count()
    )?;
    writeln!(writer, "c")?;
    writeln!(writer, "n {:10}", instance.source + 1)?;
    writeln!(writer, "c")?;
    for arc in instance.network.arcs() {
        writeln!(writer, "a {:10} {:10} {:10}", arc.tail + 1, arc.head + 1, arc.weight)?;
    }
    writer.flush()?;
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DimacsInstance {
    pub title: Option<String>,
    pub node_count: u32,
    pub source: NodeId,
    pub arcs: Vec<(NodeId, NodeId, i64)>,
}

impl DimacsInstance {
    pub fn to_network(&self) -> Result<Network, NetworkError> {
        let mut network = Network::with_nodes(self.node_count);
        for &(u, v, w) in &self.arcs {
            network.add_arc(u, v, w)?;
        }
        Ok(network)
    }
}

fn parse_node(token: Option<&str>, line: usize, node_count: u32) -> Result<NodeId, DimacsError> {
    let raw = token.ok_or_else(|| parse_error(line, "missing node id"))?;
    let id: u32 = raw
        .parse()
        .map_err(|_| parse_error(line, format!("bad node id {raw:?}")))?;
    if id == 0 || id > node_count {
        return Err(parse_error(line, format!("node id {id} outside [1, {node_count}]")));
    }
    Ok(id - 1)
}

pub fn read_instance<R: BufRead>(reader: R) -> Result<DimacsInstance, DimacsError> {
    let mut title = None;
    let mut problem: Option<(u32, usize)> = None;
    let mut source = None;
    let mut arcs = Vec::new();
    let mut line_no = 0;

    for line in reader.lines() {
        line_no += 1;
        let line = line?;
        let mut tokens = line.split_whitespace();
        match tokens.next() {
            None | Some("c") => {}
            Some("t") => title = Some(tokens.collect::<Vec<_>>().join(" ")),
            Some("p") => {
                if problem.is_some() {
                    return Err(parse_error(line_no, "second problem line"));
                }
                if tokens.next() != Some("sp") {
                    return Err(parse_error(line_no, "expected `p sp <n> <m>`"));
                }
                let n = tokens
                    .next()
                    .and_then(|t| t.parse::<u32>().ok())
                    .ok_or_else(|| parse_error(line_no, "bad node count"))?;
                let m = tokens
                    .next()
                    .and_then(|t| t.parse::<usize>().ok())
                    .ok_or_else(|| parse_error(line_no, "bad arc count"))?;
                problem = Some((n, m));
                arcs.reserve(m);
            }
            Some("n") => {
                let (n, _) = problem.ok_or_else(|| parse_error(line_no, "source before problem line"))?;
                source = Some(parse_node(tokens.next(), line_no, n)?);
            }
            Some("a") => {
                let (n, _) = problem.ok_or_else(|| parse_error(line_no, "arc before problem line"))?;
                let u = parse_node(tokens.next(), line_no, n)?;
                let v = parse_node(tokens.next(), line_no, n)?;
                let raw = tokens
                    .next()
                    .ok_or_else(|| parse_error(line_no, "missing arc weight"))?;
                let w: i64 = raw
                    .parse()
                    .map_err(|_| parse_error(line_no, format!("bad arc weight {raw:?}")))?;
                arcs.push((u, v, w));
            }
            Some(other) => {
                return Err(parse_error(line_no, format!("unknown line type {other:?}")));
            }
        }
    }

    // End-of-input problems point at the last line read.
    let (node_count, arc_count) = problem.ok_or_else(|| parse_error(line_no, "missing problem line"))?;
    let source = source.ok_or_else(|| parse_error(line_no, "missing source line"))?;
    if arcs.len() != arc_count {
        return Err(parse_error(
            line_no,
            format!("problem line declares {arc_count} arcs, found {}", arcs.len()),
        ));
    }
    Ok(DimacsInstance {
        title,
        node_count,
        source,
        arcs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::generate;
    use crate::weights::UniformWeights;

    #[test]
    fn writes_fixed_width_lines() {
        let instance = generate(3, 5, 8, 0.0, &UniformWeights::default()).unwrap();
        let mut out = Vec::new();
        write_instance(&mut out, &instance, None).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "c Strong graph for shortest paths problem");
        assert_eq!(lines[3], format!("t {}", title(&instance)));
        assert!(lines.contains(&"p sp          5          8"));
        let arc_lines = lines.iter().filter(|line| line.starts_with("a ")).count();
        assert_eq!(arc_lines, 8);
        assert!(lines
            .iter()
            .filter(|line| line.starts_with("a "))
            .all(|line| line.len() == 2 + 10 + 1 + 10 + 1 + 10));
    }

    #[test]
    fn parser_reports_malformed_input() {
        let missing = read_instance("c only comments\n".as_bytes());
        assert!(matches!(missing, Err(DimacsError::Parse { .. })));

        let bad_arc = "p sp 3 1\na 1 4 5\n";
        assert!(matches!(
            read_instance(bad_arc.as_bytes()),
            Err(DimacsError::Parse { line: 2, .. })
        ));

        let short = "p sp 3 2\nn 1\na 1 2 5\n";
        assert!(matches!(
            read_instance(short.as_bytes()),
            Err(DimacsError::Parse { line: 3, .. })
        ));

        let sourceless = "p sp 3 1\na 1 2 5\nc end\n";
        assert!(matches!(
            read_instance(sourceless.as_bytes()),
            Err(DimacsError::Parse { line: 3, .. })
        ));

        let ok = "c x\nt demo\np sp 3 2\nn 2\na 1 2 -5\na 2 3 0\n";
        let parsed = read_instance(ok.as_bytes()).unwrap();
        assert_eq!(parsed.title.as_deref(), Some("demo"));
        assert_eq!(parsed.source, 1);
        assert_eq!(parsed.arcs, vec![(0, 1, -5), (1, 2, 0)]);
        assert_eq!(parsed.to_network().unwrap().arc_count(), 2);
    }
}
