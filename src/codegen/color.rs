use std::collections::{BTreeMap, HashSet};

use log::debug;

use super::{graph::ID, interference::InterferenceGraph};

/// Colors are numbered from 1.
pub type Color = usize;

type LiveID = ID;
type SimplifyWorkList = Vec<LiveID>;
type SpillWorkList = Vec<LiveID>;
type SelectStack = Vec<LiveID>;
type Colors = BTreeMap<LiveID, Color>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Coloring {
    pub colors: Colors,
    /// Spill candidates in node order.
    pub spilled: Vec<LiveID>,
}

/// Single simplify/select pass over `interference` with `k` colors.
///
/// Nodes with fewer than `k` neighbours go on the select stack; every other
/// node is a spill candidate straight away, and the graph is not rebuilt
/// after removing them. Popping the stack assigns each node the lowest color
/// its already colored neighbours leave free.
pub fn color(interference: &InterferenceGraph, k: usize) -> Coloring {
    let (simplify_work_list, mut spill_work_list) = make_work_list(interference, k);

    let mut colors = Colors::new();
    assign_colors(interference, simplify_work_list, k, &mut colors, &mut spill_work_list);

    debug!(
        "graph coloring done (k={}): {} colored, {} spilled",
        k,
        colors.len(),
        spill_work_list.len()
    );

    Coloring {
        colors,
        spilled: spill_work_list,
    }
}

/// Splits the nodes by degree, keeping node order in both lists.
fn make_work_list(interference: &InterferenceGraph, k: usize) -> (SimplifyWorkList, SpillWorkList) {
    let mut simplify_work_list = SimplifyWorkList::new();
    let mut spill_work_list = SpillWorkList::new();
    for node in interference.nodes() {
        if node.degree() < k {
            simplify_work_list.push(node.id());
        } else {
            spill_work_list.push(node.id());
        }
    }

    (simplify_work_list, spill_work_list)
}

fn assign_colors(
    interference: &InterferenceGraph,
    mut select_stack: SelectStack,
    k: usize,
    colors: &mut Colors,
    spill_work_list: &mut SpillWorkList,
) {
    while let Some(id) = select_stack.pop() {
        let used: HashSet<Color> = interference
            .graph_ref()
            .get(id)
            .adj()
            .filter_map(|adj| colors.get(&adj).copied())
            .collect();

        match (1..=k).find(|c| !used.contains(c)) {
            Some(c) => {
                colors.insert(id, c);
            }
            None => spill_work_list.push(id),
        }
    }
}
