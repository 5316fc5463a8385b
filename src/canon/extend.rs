//! Restricted extension generation.
//!
//! Given a fragment's subgraph and one of its embeddings, enumerate the
//! extension candidates the canonical form admits: single edges (to a new
//! node or closing a ring), whole marked rings, and variable-length chains.
//! Each candidate carries the concrete host edges/nodes that realize it, so
//! the caller can extend the embedding without a renewed search, plus a
//! comparable signature used to merge candidates across embeddings.

use std::cmp::Ordering;

use smallvec::SmallVec;

use crate::canon::{cmp_tuple, rmpath_of, CfKind, EdgeTuple};
use crate::embed::Embedding;
use crate::graph::Graph;
use crate::types::{base, is_special, SPECIAL};

/// Insertion-position state for equivalent ring variants.
///
/// `pos1`/`pos2` are the edge-array positions at which the first and last
/// new ring edge are spliced in; they range over `[lo1, max]` and
/// `[lo2, max]`, interleaving the new edges with existing equivalent edges
/// while keeping each group's internal order.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RingVars {
    pub pos1: usize,
    pub lo1: usize,
    pub pos2: usize,
    pub lo2: usize,
    /// The append position (number of parent edges); the maximum legal
    /// value for both positions.
    pub max: usize,
}

/// One extension candidate.
#[derive(Clone, Debug)]
pub struct ExtCand {
    /// Source node role in the fragment.
    pub src: usize,
    /// Closure target role; `None` for extensions towards new nodes.
    pub dst: Option<usize>,
    /// Type of the first added edge.
    pub etyp: u32,
    /// Type of the first added node (or of the closure target).
    pub ntyp: u32,
    /// 0 = single edge, `+k` = ring of `k` nodes, `-k` = chain of `k` nodes.
    pub size: i32,
    /// Whether this single edge could start a chain (bridge of the chain
    /// edge type towards a chain node type).
    pub chain_start: bool,
    /// Types of all added edges, in insertion order.
    pub edge_typs: SmallVec<[u32; 8]>,
    /// `(src, dst)` roles of all added edges in the child's role space;
    /// roles `>=` the parent's node count refer to added nodes.
    pub edge_roles: SmallVec<[(u32, u32); 8]>,
    /// Types of all added nodes.
    pub node_typs: SmallVec<[u32; 8]>,
    /// Host edge realizing each added edge.
    pub host_edges: SmallVec<[usize; 8]>,
    /// Host node realizing each added node.
    pub host_nodes: SmallVec<[usize; 8]>,
    /// Equivalent-variant positions for ring extensions.
    pub vars: Option<RingVars>,
}

impl ExtCand {
    /// Comparable dedup signature: candidates with equal signatures denote
    /// the same child fragment and have their embeddings merged.
    ///
    /// Chains deliberately exclude their length: runs of different lengths
    /// belong to one variable-length chain child.
    pub fn sig(&self) -> Vec<u64> {
        let mut key = Vec::with_capacity(8 + 3 * self.edge_typs.len());
        key.push(self.src as u64);
        key.push(match self.dst {
            Some(d) => d as u64 + 1,
            None => 0,
        });
        let class: u64 = if self.size < 0 {
            2
        } else if self.size > 0 {
            1
        } else {
            0
        };
        key.push(class);
        key.push(self.etyp as u64);
        key.push(self.ntyp as u64);
        if self.size > 0 {
            key.push(self.size as u64);
            for (&t, &(s, d)) in self.edge_typs.iter().zip(self.edge_roles.iter()) {
                key.push(t as u64);
                key.push(((s as u64) << 32) | d as u64);
            }
            for &t in &self.node_typs {
                key.push(t as u64);
            }
            if let Some(v) = self.vars {
                key.push(v.pos1 as u64);
                key.push(v.pos2 as u64);
            }
        }
        key
    }
}

/// A closed walk along one ring bit.
#[derive(Clone, Debug)]
pub struct RingWalk {
    /// Host edges in walk order; the first is the starting edge.
    pub edges: SmallVec<[usize; 8]>,
    /// Host nodes in walk order, beginning with the anchor.
    pub nodes: SmallVec<[usize; 8]>,
}

/// A maximal chain run in the host.
#[derive(Clone, Debug)]
pub struct ChainWalk {
    /// Run edges, starting with the edge leaving the anchor.
    pub edges: SmallVec<[usize; 8]>,
    /// Run nodes (all of the chain's node type).
    pub nodes: SmallVec<[usize; 8]>,
}

/// Options steering extension generation.
#[derive(Clone, Debug)]
pub struct ExtOpts {
    /// Allow single-edge extensions.
    pub edge: bool,
    /// Allow ring extensions; ring edges are then only added whole-ring.
    pub ring: bool,
    /// Allow variable-length chain extensions.
    pub chain: bool,
    /// Generate all extensions, ignoring the CF source restriction.
    pub allexts: bool,
    /// Extend only orbit representatives.
    pub orbits: bool,
    /// Emit equivalent ring variants.
    pub eqvars: bool,
    pub rgmin: usize,
    pub rgmax: usize,
    /// Chain node type (base).
    pub cnode: u32,
    /// Chain edge type (base).
    pub cedge: u32,
    /// Maximum fragment size in nodes.
    pub max_nodes: usize,
    /// Index of the parent's own first extension edge; edges before it are
    /// immovable for variant interleaving.
    pub idx: usize,
}

/// Walk the cycle carrying `bit`, starting from `anchor` along `first`.
///
/// Returns `None` when the bit does not span a unique closed walk (which
/// can happen when distinct rings were collapsed onto one bit).
pub(crate) fn ring_walk(host: &Graph, anchor: usize, first: usize, bit: u32) -> Option<RingWalk> {
    let mask = 1u64 << bit;
    let mut edges: SmallVec<[usize; 8]> = SmallVec::new();
    let mut nodes: SmallVec<[usize; 8]> = SmallVec::new();
    edges.push(first);
    nodes.push(anchor);
    let mut prev = first;
    let mut cur = host.edge(first).other(anchor);
    while cur != anchor {
        if edges.len() > 64 {
            return None;
        }
        nodes.push(cur);
        let mut next = None;
        for &e in host.incident(cur) {
            if e != prev && host.edge(e).rings() & mask != 0 {
                if next.is_some() {
                    return None;
                }
                next = Some(e);
            }
        }
        let e = next?;
        edges.push(e);
        cur = host.edge(e).other(cur);
        prev = e;
    }
    Some(RingWalk { edges, nodes })
}

/// All distinct ring walks through `anchor` starting along `first`.
///
/// Several bits spelling the same edge set are collapsed onto the lowest
/// one. The mirror walk (starting along the ring's other edge at `anchor`)
/// is not filtered here; the orientation test discards it later.
pub(crate) fn ring_walks(host: &Graph, anchor: usize, first: usize) -> Vec<RingWalk> {
    let mut out = Vec::new();
    let mut seen: Vec<Vec<usize>> = Vec::new();
    let mut bits = host.edge(first).rings();
    while bits != 0 {
        let bit = bits.trailing_zeros();
        bits &= bits - 1;
        if let Some(walk) = ring_walk(host, anchor, first, bit) {
            let mut set: Vec<usize> = walk.edges.iter().copied().collect();
            set.sort_unstable();
            if !seen.contains(&set) {
                seen.push(set);
                out.push(walk);
            }
        }
    }
    out
}

/// Follow a chain run from `anchor` along `first` (already verified to be a
/// bridge of the chain edge type towards a chain-typed node).
///
/// The run extends while the next node is a degree-2 chain node whose other
/// edge is again a chain-type bridge; a run of at least two nodes makes a
/// variable-length chain.
pub(crate) fn chain_run(
    host: &Graph,
    anchor: usize,
    first: usize,
    cnode: u32,
    cedge: u32,
) -> Option<ChainWalk> {
    let mut edges: SmallVec<[usize; 8]> = SmallVec::new();
    let mut nodes: SmallVec<[usize; 8]> = SmallVec::new();
    edges.push(first);
    let mut cur = host.edge(first).other(anchor);
    let mut prev = first;
    loop {
        nodes.push(cur);
        if host.node(cur).degree() != 2 {
            break;
        }
        let &next = host
            .incident(cur)
            .iter()
            .find(|&&e| e != prev)
            .expect("degree-2 node has another edge");
        let nedge = host.edge(next);
        let far = nedge.other(cur);
        if !nedge.is_bridge() || base(nedge.typ()) != cedge || base(host.node(far).typ()) != cnode {
            break;
        }
        edges.push(next);
        prev = next;
        cur = far;
        if nodes.len() > 512 {
            break;
        }
    }
    if nodes.len() >= 2 {
        Some(ChainWalk { edges, nodes })
    } else {
        None
    }
}

/// The node roles the canonical form allows as extension sources.
pub(crate) fn allowed_sources(kind: CfKind, sub: &Graph, opts: &ExtOpts) -> Vec<usize> {
    if opts.allexts {
        return (0..sub.node_count()).collect();
    }
    if sub.edge_count() == 0 {
        return vec![0];
    }
    match kind {
        CfKind::Breadth1 | CfKind::Breadth2 => {
            let max_src = sub.edge(sub.edge_count() - 1).src();
            (max_src..sub.node_count()).collect()
        }
        CfKind::Depth => rmpath_of(&super::current_seq(sub)),
    }
}

/// The last edge's tuple, for the same-source ordering constraint.
fn last_tuple(sub: &Graph) -> Option<EdgeTuple> {
    let cnt = sub.edge_count();
    if cnt == 0 {
        return None;
    }
    let seq = super::current_seq(sub);
    Some(seq[cnt - 1])
}

/// Whether a candidate edge at `src` respects the breadth CF rule that an
/// edge at the same source as the previous step must not be smaller.
fn source_order_ok(
    kind: CfKind,
    last: Option<EdgeTuple>,
    src: usize,
    etyp: u32,
    dtyp: u32,
    dst: usize,
    forward: bool,
) -> bool {
    if !kind.is_breadth() {
        return true;
    }
    let last = match last {
        Some(t) => t,
        None => return true,
    };
    if src != last.src {
        return true;
    }
    let cand = EdgeTuple {
        src,
        dst,
        etyp,
        dtyp,
        forward,
    };
    cmp_tuple(kind, &cand, &last) != Ordering::Less
}

/// Find the role of a host node within an embedding.
#[inline]
fn role_of(emb: &Embedding, host_node: usize) -> Option<usize> {
    emb.nodes.iter().position(|&n| n == host_node)
}

/// Enumerate the extension candidates of `emb` under the canonical form.
pub(crate) fn extensions(
    kind: CfKind,
    sub: &Graph,
    host: &Graph,
    emb: &Embedding,
    opts: &ExtOpts,
    out: &mut Vec<ExtCand>,
) {
    debug_assert!(!emb.is_packed());
    let parent_n = sub.node_count() as u32;
    let last = last_tuple(sub);

    for src in allowed_sources(kind, sub, opts) {
        if opts.orbits && sub.node(src).orbit() != src {
            continue;
        }
        let anchor = emb.nodes[src];
        for &he in host.incident(anchor) {
            if emb.edges.contains(&he) {
                continue;
            }
            let edge = host.edge(he);
            let far = edge.other(anchor);

            if opts.ring && edge.rings() != 0 {
                // ring edges enter whole-ring only
                ring_extensions(kind, sub, host, emb, opts, src, anchor, he, last, out);
                continue;
            }
            if !opts.edge {
                continue;
            }
            match role_of(emb, far) {
                Some(dstrole) => {
                    // closing edge; must lead forward
                    if kind.is_breadth() {
                        if dstrole <= src {
                            continue;
                        }
                    } else {
                        // depth: closures leave the rightmost node only
                        let path = rmpath_of(&super::current_seq(sub));
                        if Some(&src) != path.last() || !path.contains(&dstrole) {
                            continue;
                        }
                    }
                    let dtyp = sub.node(dstrole).typ();
                    if !source_order_ok(kind, last, src, edge.typ(), dtyp, dstrole, false) {
                        continue;
                    }
                    out.push(ExtCand {
                        src,
                        dst: Some(dstrole),
                        etyp: edge.typ(),
                        ntyp: dtyp,
                        size: 0,
                        chain_start: false,
                        edge_typs: SmallVec::from_slice(&[edge.typ()]),
                        edge_roles: SmallVec::from_slice(&[(src as u32, dstrole as u32)]),
                        node_typs: SmallVec::new(),
                        host_edges: SmallVec::from_slice(&[he]),
                        host_nodes: SmallVec::new(),
                        vars: None,
                    });
                }
                None => {
                    if sub.node_count() >= opts.max_nodes {
                        continue;
                    }
                    let ftyp = host.node(far).typ();
                    let chainish = opts.chain
                        && edge.is_bridge()
                        && base(edge.typ()) == opts.cedge
                        && base(ftyp) == opts.cnode;
                    // a chain never grows by its own types; longer runs are
                    // covered by longer prefixes of the same chain
                    if chainish && is_special(sub.node(src).typ()) {
                        continue;
                    }
                    if !source_order_ok(
                        kind,
                        last,
                        src,
                        edge.typ(),
                        ftyp,
                        sub.node_count(),
                        true,
                    ) {
                        continue;
                    }
                    if chainish {
                        if let Some(run) = chain_run(host, anchor, he, opts.cnode, opts.cedge) {
                            out.push(ExtCand {
                                src,
                                dst: None,
                                etyp: edge.typ(),
                                ntyp: ftyp | SPECIAL,
                                size: -(run.nodes.len() as i32),
                                chain_start: false,
                                edge_typs: SmallVec::from_slice(&[edge.typ()]),
                                edge_roles: SmallVec::from_slice(&[(src as u32, parent_n)]),
                                node_typs: SmallVec::from_slice(&[ftyp | SPECIAL]),
                                host_edges: run.edges,
                                host_nodes: run.nodes,
                                vars: None,
                            });
                            continue;
                        }
                    }
                    out.push(ExtCand {
                        src,
                        dst: None,
                        etyp: edge.typ(),
                        ntyp: ftyp,
                        size: 0,
                        chain_start: chainish,
                        edge_typs: SmallVec::from_slice(&[edge.typ()]),
                        edge_roles: SmallVec::from_slice(&[(src as u32, parent_n)]),
                        node_typs: SmallVec::from_slice(&[ftyp]),
                        host_edges: SmallVec::from_slice(&[he]),
                        host_nodes: SmallVec::from_slice(&[far]),
                        vars: None,
                    });
                }
            }
        }
    }
}

/// Emit ring extension candidates for one incident ring edge.
#[allow(clippy::too_many_arguments)]
fn ring_extensions(
    kind: CfKind,
    sub: &Graph,
    host: &Graph,
    emb: &Embedding,
    opts: &ExtOpts,
    src: usize,
    anchor: usize,
    he: usize,
    last: Option<EdgeTuple>,
    out: &mut Vec<ExtCand>,
) {
    let parent_n = sub.node_count();
    for walk in ring_walks(host, anchor, he) {
        let len = walk.nodes.len();
        if len < opts.rgmin || len > opts.rgmax {
            continue;
        }
        // the source must be the smallest mapped role on the ring
        let mut min_role = usize::MAX;
        for &n in &walk.nodes {
            if let Some(r) = role_of(emb, n) {
                min_role = min_role.min(r);
            }
        }
        if min_role != src {
            continue;
        }
        if !orientation_canonic(host, &walk) {
            continue;
        }
        // assign roles: mapped nodes keep theirs, new ones get fresh roles
        // in walk order
        let mut node_typs: SmallVec<[u32; 8]> = SmallVec::new();
        let mut host_nodes: SmallVec<[usize; 8]> = SmallVec::new();
        let mut roles: SmallVec<[u32; 8]> = SmallVec::new();
        for &n in &walk.nodes {
            match role_of(emb, n) {
                Some(r) => roles.push(r as u32),
                None => {
                    let r = parent_n + host_nodes.len();
                    host_nodes.push(n);
                    node_typs.push(host.node(n).typ());
                    roles.push(r as u32);
                }
            }
        }
        if parent_n + host_nodes.len() > opts.max_nodes {
            continue;
        }
        let mut edge_typs: SmallVec<[u32; 8]> = SmallVec::new();
        let mut edge_roles: SmallVec<[(u32, u32); 8]> = SmallVec::new();
        let mut host_edges: SmallVec<[usize; 8]> = SmallVec::new();
        for (k, &e) in walk.edges.iter().enumerate() {
            if emb.edges.contains(&e) {
                continue;
            }
            let a = roles[k];
            let b = roles[(k + 1) % len];
            let (a, b) = if a <= b { (a, b) } else { (b, a) };
            edge_typs.push(host.edge(e).typ());
            edge_roles.push((a, b));
            host_edges.push(e);
        }
        if host_edges.is_empty() {
            continue;
        }
        let first_typ = edge_typs[0];
        let first_ntyp = if host_nodes.is_empty() {
            sub.node(edge_roles[0].1 as usize).typ()
        } else {
            node_typs[0]
        };
        if !source_order_ok(
            kind,
            last,
            src,
            first_typ,
            first_ntyp,
            edge_roles[0].1 as usize,
            edge_roles[0].1 as usize >= parent_n,
        ) {
            continue;
        }
        let base_cand = ExtCand {
            src,
            dst: None,
            etyp: first_typ,
            ntyp: first_ntyp,
            size: len as i32,
            chain_start: false,
            edge_typs,
            edge_roles,
            node_typs,
            host_edges,
            host_nodes,
            vars: None,
        };
        if opts.eqvars {
            for vars in ring_variants(sub, opts, &base_cand) {
                let mut cand = base_cand.clone();
                cand.vars = Some(vars);
                out.push(cand);
            }
        } else {
            out.push(base_cand);
        }
    }
}

/// Whether the walk direction spells the smaller of the two ring words.
fn orientation_canonic(host: &Graph, walk: &RingWalk) -> bool {
    let len = walk.edges.len();
    for k in 0..len {
        let fwd_e = host.edge(walk.edges[k]).typ();
        let rev_e = host.edge(walk.edges[len - 1 - k]).typ();
        match fwd_e.cmp(&rev_e) {
            Ordering::Less => return true,
            Ordering::Greater => return false,
            Ordering::Equal => {}
        }
        let fwd_n = host.node(walk.nodes[(k + 1) % len]).typ();
        let rev_n = host.node(walk.nodes[len - 1 - k]).typ();
        match fwd_n.cmp(&rev_n) {
            Ordering::Less => return true,
            Ordering::Greater => return false,
            Ordering::Equal => {}
        }
    }
    true
}

/// Insertion positions of the first and last new ring edge relative to the
/// existing equivalent edges.
///
/// Interleavings with an equivalent group (`lo < max`) all reduce to one
/// canonical suffix order during adaptation, so a single variant with the
/// group bounds recorded suffices; the bounds still discriminate rings
/// attaching next to equivalent edges from plain ones in the signature.
fn ring_variants(sub: &Graph, opts: &ExtOpts, cand: &ExtCand) -> Vec<RingVars> {
    let max = sub.edge_count();
    let parent_n = sub.node_count() as u32;
    let far_typ = |roles: (u32, u32)| -> u32 {
        if roles.1 >= parent_n {
            cand.node_typs[(roles.1 - parent_n) as usize]
        } else {
            sub.node(roles.1 as usize).typ()
        }
    };
    let first = cand.edge_roles[0];
    let lo1 = equiv_group_start(sub, opts.idx, first, cand.edge_typs[0], far_typ(first));
    let last = cand.edge_roles[cand.edge_roles.len() - 1];
    let lo2 = equiv_group_start(
        sub,
        opts.idx,
        last,
        cand.edge_typs[cand.edge_typs.len() - 1],
        far_typ(last),
    );
    vec![RingVars {
        pos1: max,
        lo1,
        pos2: max,
        lo2,
        max,
    }]
}

/// The earliest movable position among the parent edges equivalent to a new
/// edge: same source role, same edge type, same far node type.
fn equiv_group_start(sub: &Graph, idx: usize, roles: (u32, u32), etyp: u32, dtyp: u32) -> usize {
    let src = roles.0.min(roles.1) as usize;
    for p in idx..sub.edge_count() {
        let e = sub.edge(p);
        if e.src() == src && e.typ() == etyp && sub.node(e.dst()).typ() == dtyp {
            return p;
        }
    }
    sub.edge_count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embed::{embed, Group};

    fn ring6(etyp: u32) -> Graph {
        let mut g = Graph::new();
        let n: Vec<usize> = (0..6).map(|_| g.add_node(0)).collect();
        for i in 0..6 {
            g.add_edge(n[i], n[(i + 1) % 6], etyp);
        }
        g.mark_rings(3, 8).unwrap();
        g.prepare();
        g
    }

    fn opts() -> ExtOpts {
        ExtOpts {
            edge: true,
            ring: false,
            chain: false,
            allexts: false,
            orbits: false,
            eqvars: false,
            rgmin: 3,
            rgmax: 8,
            cnode: 0,
            cedge: 0,
            max_nodes: 32,
            idx: 0,
        }
    }

    #[test]
    fn single_node_extensions() {
        let mut host = Graph::new();
        let a = host.add_node(0);
        let b = host.add_node(1);
        host.add_edge(a, b, 7);
        host.prepare();
        let sub = Graph::single(0);
        let embs = embed(&host, 0, Group::Focus, &sub);
        let mut out = Vec::new();
        extensions(CfKind::Breadth1, &sub, &host, &embs[0], &opts(), &mut out);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].etyp, 7);
        assert_eq!(out[0].ntyp, 1);
        assert_eq!(out[0].host_nodes.as_slice(), &[b]);
    }

    #[test]
    fn breadth_restriction_blocks_small_sources() {
        // path 0-1-2 embedded in a star: extensions may only leave the
        // maximum source (role 1) or later roles
        let mut host = Graph::new();
        let c = host.add_node(0);
        let mut leaves = Vec::new();
        for _ in 0..3 {
            let v = host.add_node(1);
            host.add_edge(c, v, 0);
            leaves.push(v);
        }
        host.prepare();
        let mut sub = Graph::new();
        let x = sub.add_node(1);
        let y = sub.add_node(0);
        sub.add_edge(x, y, 0);
        sub.prepare();
        let embs = embed(&host, 0, Group::Focus, &sub);
        let mut out = Vec::new();
        extensions(CfKind::Breadth1, &sub, &host, &embs[0], &opts(), &mut out);
        // both remaining star edges extend from role 1 (the center)
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|c| c.src == 1));
    }

    #[test]
    fn ring_walk_closes() {
        let host = ring6(1);
        let walk = ring_walk(&host, 0, 0, 0).unwrap();
        assert_eq!(walk.edges.len(), 6);
        assert_eq!(walk.nodes.len(), 6);
        assert_eq!(walk.nodes[0], 0);
    }

    #[test]
    fn ring_extension_from_seed() {
        let host = ring6(1);
        let sub = Graph::single(0);
        let embs = embed(&host, 0, Group::Focus, &sub);
        let mut o = opts();
        o.ring = true;
        let mut out = Vec::new();
        extensions(CfKind::Breadth1, &sub, &host, &embs[0], &o, &mut out);
        // only whole-ring candidates; plain edges along the ring suppressed.
        // the uniform ring is a palindrome, so both directions qualify and
        // share one signature
        assert!(!out.is_empty());
        assert!(out.iter().all(|c| c.size == 6));
        assert!(out.iter().all(|c| c.sig() == out[0].sig()));
        assert_eq!(out[0].host_nodes.len(), 5);
        assert_eq!(out[0].host_edges.len(), 6);
    }

    #[test]
    fn chain_run_coalesces() {
        // A - C - C - B with every edge a bridge
        let mut host = Graph::new();
        let a = host.add_node(2);
        let c1 = host.add_node(0);
        let c2 = host.add_node(0);
        let b = host.add_node(3);
        host.add_edge(a, c1, 1);
        host.add_edge(c1, c2, 1);
        host.add_edge(c2, b, 1);
        host.mark_bridges();
        host.prepare();
        let run = chain_run(&host, a, 0, 0, 1).unwrap();
        assert_eq!(run.nodes.as_slice(), &[c1, c2]);
        assert_eq!(run.edges.len(), 2);
        // from B the run looks the same, mirrored
        let run = chain_run(&host, b, 2, 0, 1).unwrap();
        assert_eq!(run.nodes.as_slice(), &[c2, c1]);
    }
}
