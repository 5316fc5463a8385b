//! Reporting: fragment descriptions and output sinks.
//!
//! The search reports fragments through a [`Reporter`]; the crate ships a
//! writer emitting one CSV line per fragment (with an optional identifier
//! file listing the containing hosts) and a collector backing the tests.
//! Descriptions are a generic linear notation derived from the subgraph's
//! canonical edge order: branches in parentheses, ring closures as digit
//! pairs, chain nodes in brackets.

use std::io;
use std::io::Write;

use crate::graph::Graph;
use crate::types::{base, is_special, is_wildcard, Recoder, TypeRegistry};

/// Everything reported about one fragment.
#[derive(Clone, Debug)]
pub struct FragmentReport {
    /// Sequential fragment identifier (1-based).
    pub id: usize,
    /// Linear notation of the subgraph.
    pub description: String,
    pub nodes: usize,
    pub edges: usize,
    /// Absolute focus support.
    pub supp_focus: usize,
    /// Focus support as a percentage of the focus group size.
    pub rel_focus: f64,
    /// Absolute complement support.
    pub supp_compl: usize,
    /// Complement support as a percentage of the complement group size.
    pub rel_compl: f64,
    /// Names of the host graphs containing the fragment.
    pub hosts: Vec<String>,
    /// Whether the fragment carries a variable-length chain.
    pub chain: bool,
}

/// Sink for reported fragments.
pub trait Reporter {
    fn fragment(&mut self, report: &FragmentReport) -> io::Result<()>;
}

/// Collects all reports in memory.
#[derive(Debug, Default)]
pub struct CollectReporter {
    pub fragments: Vec<FragmentReport>,
}

impl CollectReporter {
    pub fn new() -> Self {
        CollectReporter::default()
    }
}

impl Reporter for CollectReporter {
    fn fragment(&mut self, report: &FragmentReport) -> io::Result<()> {
        self.fragments.push(report.clone());
        Ok(())
    }
}

/// Writes one CSV line per fragment, and optionally an identifier file
/// mapping fragment ids to their host graphs.
pub struct WriteReporter<W: Write> {
    out: W,
    ids: Option<Box<dyn Write>>,
}

impl<W: Write> WriteReporter<W> {
    pub fn new(mut out: W) -> io::Result<Self> {
        writeln!(out, "id,description,nodes,edges,s_abs,s_rel,c_abs,c_rel")?;
        Ok(WriteReporter { out, ids: None })
    }

    /// Additionally write `<id>:<host>[,<host>…]` lines to `ids`.
    pub fn with_identifiers(mut self, mut ids: Box<dyn Write>) -> io::Result<Self> {
        writeln!(ids, "id:list")?;
        self.ids = Some(ids);
        Ok(self)
    }

    /// Flush both sinks.
    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()?;
        if let Some(ids) = &mut self.ids {
            ids.flush()?;
        }
        Ok(())
    }
}

impl<W: Write> Reporter for WriteReporter<W> {
    fn fragment(&mut self, r: &FragmentReport) -> io::Result<()> {
        writeln!(
            self.out,
            "{},{},{},{},{},{:.2},{},{:.2}",
            r.id,
            r.description,
            r.nodes,
            r.edges,
            r.supp_focus,
            r.rel_focus,
            r.supp_compl,
            r.rel_compl
        )?;
        if let Some(ids) = &mut self.ids {
            writeln!(ids, "{}:{}", r.id, r.hosts.join(","))?;
        }
        Ok(())
    }
}

/// Render a subgraph as a linear notation, resolving type names through the
/// registries and undoing the frequency recoding.
pub fn describe(
    g: &Graph,
    nodes: Option<&TypeRegistry>,
    edges: Option<&TypeRegistry>,
    recoder: Option<&Recoder>,
) -> String {
    if g.node_count() == 0 {
        return String::new();
    }
    // tree edges in canonical order; the rest are ring closures
    let n = g.node_count();
    let mut seen = vec![false; n];
    seen[0] = true;
    let mut children: Vec<Vec<(usize, usize)>> = vec![Vec::new(); n];
    let mut closures: Vec<Vec<(usize, usize)>> = vec![Vec::new(); n];
    let mut closure_cnt = 0usize;
    for (e, edge) in g.edges().enumerate() {
        let (a, b) = (edge.src(), edge.dst());
        let (from, to) = if seen[a] && !seen[b] {
            (a, b)
        } else if seen[b] && !seen[a] {
            (b, a)
        } else {
            closure_cnt += 1;
            closures[a].push((e, closure_cnt));
            closures[b].push((e, closure_cnt));
            continue;
        };
        seen[to] = true;
        children[from].push((e, to));
    }

    let node_token = |v: usize| -> String {
        let typ = g.node(v).typ();
        let decoded = recoder.map_or(typ, |rc| rc.decode(typ));
        let name = nodes
            .and_then(|reg| reg.name(decoded).map(str::to_string))
            .unwrap_or_else(|| format!("#{}", base(decoded)));
        let name = if is_wildcard(typ) {
            "*".to_string()
        } else {
            name
        };
        if is_special(typ) {
            format!("[{name}]n")
        } else {
            name
        }
    };
    let edge_token = |e: usize| -> String {
        let typ = base(g.edge(e).typ());
        match edges.and_then(|reg| reg.name(typ).map(str::to_string)) {
            Some(name) => format!("-{name}-"),
            None if typ == 0 => "-".to_string(),
            None => format!("-{typ}-"),
        }
    };

    fn render(
        v: usize,
        children: &[Vec<(usize, usize)>],
        closures: &[Vec<(usize, usize)>],
        node_token: &dyn Fn(usize) -> String,
        edge_token: &dyn Fn(usize) -> String,
        out: &mut String,
    ) {
        out.push_str(&node_token(v));
        for &(_, num) in &closures[v] {
            out.push_str(&num.to_string());
        }
        let kids = &children[v];
        for (k, &(e, w)) in kids.iter().enumerate() {
            let last = k + 1 == kids.len();
            if !last {
                out.push('(');
            }
            out.push_str(&edge_token(e));
            render(w, children, closures, node_token, edge_token, out);
            if !last {
                out.push(')');
            }
        }
    }

    let mut out = String::new();
    render(
        0,
        &children,
        &closures,
        &node_token,
        &edge_token,
        &mut out,
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(types: &[u32]) -> Graph {
        let mut g = Graph::new();
        let n: Vec<usize> = types.iter().map(|&t| g.add_node(t)).collect();
        for w in n.windows(2) {
            g.add_edge(w[0], w[1], 0);
        }
        g
    }

    #[test]
    fn describe_path_with_names() {
        let reg = TypeRegistry::fixed(["A", "B", "C"]);
        let g = path(&[0, 1, 2]);
        assert_eq!(describe(&g, Some(&reg), None, None), "A-B-C");
    }

    #[test]
    fn describe_branch_and_ring() {
        let reg = TypeRegistry::fixed(["A", "B", "C", "D"]);
        let mut g = path(&[0, 1, 2]);
        let d = g.add_node(3);
        g.add_edge(1, d, 0);
        assert_eq!(describe(&g, Some(&reg), None, None), "A-B(-C)-D");

        let mut ring = Graph::new();
        let n: Vec<usize> = (0..3).map(|_| ring.add_node(0)).collect();
        ring.add_edge(n[0], n[1], 0);
        ring.add_edge(n[0], n[2], 0);
        ring.add_edge(n[1], n[2], 0);
        assert_eq!(describe(&ring, Some(&reg), None, None), "A(-A1)-A1");
    }

    #[test]
    fn describe_without_registry_uses_codes() {
        let g = path(&[4, 7]);
        assert_eq!(describe(&g, None, None, None), "#4-#7");
    }

    #[test]
    fn write_reporter_formats_lines() {
        let mut buf = Vec::new();
        {
            let mut rep = WriteReporter::new(&mut buf).unwrap();
            rep.fragment(&FragmentReport {
                id: 1,
                description: "A-B".into(),
                nodes: 2,
                edges: 1,
                supp_focus: 3,
                rel_focus: 100.0,
                supp_compl: 0,
                rel_compl: 0.0,
                hosts: vec!["m1".into()],
                chain: false,
            })
            .unwrap();
        }
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("id,description"));
        assert!(text.contains("1,A-B,2,1,3,100.00,0,0.00"));
    }
}
