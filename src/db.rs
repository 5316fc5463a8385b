//! The graph database: named, valued host graphs split into two groups.

use crate::embed::Group;
use crate::graph::Graph;

/// One database entry: a host graph with its name and numeric value.
#[derive(Clone, Debug)]
pub struct DatabaseGraph {
    pub name: String,
    pub value: f64,
    pub group: Group,
    pub graph: Graph,
}

/// The ordered collection of host graphs.
#[derive(Clone, Debug, Default)]
pub struct Database {
    graphs: Vec<DatabaseGraph>,
}

impl Database {
    pub fn new() -> Self {
        Database::default()
    }

    /// Add a host graph; `value > threshold` (XOR `invert`) selects the
    /// complement group.
    pub fn add(&mut self, name: String, value: f64, threshold: f64, invert: bool, graph: Graph) {
        let above = value > threshold;
        let group = if above != invert {
            Group::Compl
        } else {
            Group::Focus
        };
        self.graphs.push(DatabaseGraph {
            name,
            value,
            group,
            graph,
        });
    }

    pub fn len(&self) -> usize {
        self.graphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graphs.is_empty()
    }

    pub fn graph(&self, id: usize) -> &DatabaseGraph {
        &self.graphs[id]
    }

    pub fn iter(&self) -> impl Iterator<Item = &DatabaseGraph> {
        self.graphs.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut DatabaseGraph> {
        self.graphs.iter_mut()
    }

    /// Number of graphs in a group.
    pub fn group_size(&self, group: Group) -> usize {
        self.graphs.iter().filter(|g| g.group == group).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_splits_groups() {
        let mut db = Database::new();
        db.add("a".into(), 0.0, 0.5, false, Graph::single(0));
        db.add("b".into(), 1.0, 0.5, false, Graph::single(0));
        assert_eq!(db.graph(0).group, Group::Focus);
        assert_eq!(db.graph(1).group, Group::Compl);
        assert_eq!(db.group_size(Group::Focus), 1);

        let mut db = Database::new();
        db.add("a".into(), 1.0, 0.5, true, Graph::single(0));
        assert_eq!(db.graph(0).group, Group::Focus);
    }
}
