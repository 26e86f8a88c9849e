//! A graph for resolving table offsets

use std::{
    cmp::Reverse,
    collections::{BTreeMap, BinaryHeap, HashMap},
};

use crate::write::TableData;

/// An identifier for an object in the compilation graph.
///
/// Identifiers are assigned in the order objects are first added, so a
/// subtable always has a smaller id than the tables that point to it.
#[derive(Debug, Clone, Copy, PartialOrd, Ord, Hash, PartialEq, Eq)]
pub(crate) struct ObjectId(u32);

/// A store of serialized objects; identical objects share an id.
#[derive(Debug, Default)]
pub(crate) struct ObjectStore {
    objects: HashMap<TableData, ObjectId>,
}

impl ObjectStore {
    pub(crate) fn add(&mut self, data: TableData) -> ObjectId {
        let next = ObjectId(self.objects.len() as u32);
        *self.objects.entry(data).or_insert(next)
    }
}

/// A graph of subtables, starting at a single root.
///
/// This determines the final write order for the subtables.
pub(crate) struct Graph {
    objects: BTreeMap<ObjectId, TableData>,
    /// the number of offsets pointing at each object
    parent_count: HashMap<ObjectId, usize>,
    order: Vec<ObjectId>,
    root: ObjectId,
}

impl Graph {
    pub(crate) fn from_obj_store(store: ObjectStore, root: ObjectId) -> Self {
        let objects: BTreeMap<_, _> = store.objects.into_iter().map(|(k, v)| (v, k)).collect();
        let mut parent_count = HashMap::new();
        for obj in objects.values() {
            for link in &obj.offsets {
                *parent_count.entry(link.object).or_insert(0) += 1;
            }
        }
        Graph {
            objects,
            parent_count,
            order: Vec::new(),
            root,
        }
    }

    /// Order the objects so that every table precedes its subtables.
    ///
    /// All offsets are forward offsets, so any topological order can be
    /// written.
    pub(crate) fn topological_sort(&mut self) {
        let mut queue = BinaryHeap::new();
        let mut removed_edges: HashMap<ObjectId, usize> = HashMap::new();
        self.order.clear();
        queue.push(Reverse(self.root));

        while let Some(Reverse(id)) = queue.pop() {
            self.order.push(id);
            let Some(next) = self.objects.get(&id) else {
                continue;
            };
            for link in &next.offsets {
                let seen_edges = removed_edges.entry(link.object).or_insert(0);
                *seen_edges += 1;
                // if the target of this link has no other incoming links, add
                // to the queue
                if Some(&*seen_edges) == self.parent_count.get(&link.object) {
                    queue.push(Reverse(link.object));
                }
            }
        }
        if self.order.len() != self.objects.len() {
            log::debug!(
                "dropping {} unreachable objects",
                self.objects.len() - self.order.len()
            );
        }
    }

    /// Write out the sorted graph.
    ///
    /// Returns `None` if an offset does not fit in 32 bits.
    pub(crate) fn serialize(&self) -> Option<Vec<u8>> {
        let mut positions = HashMap::new();
        let mut out = Vec::new();

        // first pass: write out bytes, record positions of tables
        for id in &self.order {
            let node = self.objects.get(id)?;
            positions.insert(*id, out.len());
            out.extend_from_slice(&node.bytes);
        }

        // second pass: write offsets
        for id in &self.order {
            let node = self.objects.get(id)?;
            let table_head = *positions.get(id)?;
            for offset in &node.offsets {
                let target = *positions.get(&offset.object)?;
                let resolved = u32::try_from(target.checked_sub(table_head)?).ok()?;
                let pos = table_head + offset.pos as usize;
                out.get_mut(pos..pos + 4)?
                    .copy_from_slice(&resolved.to_be_bytes());
            }
        }
        Some(out)
    }
}
