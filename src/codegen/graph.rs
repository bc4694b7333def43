use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ID(usize);

#[derive(Debug, Clone)]
pub struct Node<T> {
    id: ID,
    val: T,
    adj: BTreeSet<ID>,
}

impl<T> Node<T> {
    pub fn id(&self) -> ID {
        self.id
    }

    pub fn val(&self) -> &T {
        &self.val
    }

    fn new(val: T, id: ID) -> Self {
        Node {
            id,
            val,
            adj: BTreeSet::new(),
        }
    }

    /// Neighbours in ascending id order.
    pub fn adj(&self) -> impl Iterator<Item = ID> + '_ {
        self.adj.iter().copied()
    }

    pub fn degree(&self) -> usize {
        self.adj.len()
    }
}

impl<T> PartialEq for Node<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for Node<T> {}

/// Undirected graph without self loops. Nodes are addressed by the `ID`
/// returned from `insert`, which is their position in insertion order.
#[derive(Debug, Clone)]
pub struct Graph<T> {
    nodes: Vec<Node<T>>,
}

impl<T> Graph<T> {
    pub fn new() -> Self {
        Graph { nodes: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Graph {
            nodes: Vec::with_capacity(capacity),
        }
    }

    pub fn get(&self, id: ID) -> &Node<T> {
        &self.nodes[id.0]
    }

    pub fn insert(&mut self, val: T) -> ID {
        let id = self.nodes.len();
        self.nodes.push(Node::new(val, ID(id)));
        ID(id)
    }

    /// Returns false if the edge already existed or `one == other`.
    pub fn double_link(&mut self, one: ID, other: ID) -> bool {
        if one == other {
            return false;
        }
        let inserted = self.nodes[one.0].adj.insert(other);
        self.nodes[other.0].adj.insert(one);
        inserted
    }

    pub fn is_linked(&self, one: ID, other: ID) -> bool {
        self.nodes[one.0].adj.contains(&other)
    }

    pub fn nodes(&self) -> &[Node<T>] {
        &self.nodes
    }

    pub fn edge_count(&self) -> usize {
        self.nodes.iter().map(Node::degree).sum::<usize>() / 2
    }
}

impl<T> Default for Graph<T> {
    fn default() -> Self {
        Self::new()
    }
}
