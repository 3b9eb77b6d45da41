// crates/kryon-core/src/tree.rs
//! Rebuilds parent/child links from the flat pre-order element list.
//!
//! Records only carry their own child count, so structure comes from a stack
//! of open parents: an element belongs to the nearest open parent that still
//! expects children. When the writer's child offset table is present it is
//! checked against the positional result, and a parent whose children never
//! arrive is rejected instead of producing a silently wrong tree.

use crate::format::HeaderFlags;
use crate::{ElementRecord, ElementType, KryonError, Result};
use tracing::warn;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeNode {
    pub parent: Option<usize>,
    pub children: Vec<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementTree {
    pub nodes: Vec<TreeNode>,
    pub roots: Vec<usize>,
}

impl ElementTree {
    pub fn children(&self, index: usize) -> &[usize] {
        self.nodes.get(index).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn parent(&self, index: usize) -> Option<usize> {
        self.nodes.get(index).and_then(|n| n.parent)
    }

    /// Depth-first, parents before children.
    pub fn pre_order(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<usize> = self.roots.iter().rev().copied().collect();
        while let Some(index) = stack.pop() {
            order.push(index);
            stack.extend(self.children(index).iter().rev());
        }
        order
    }
}

pub fn assemble_tree(records: &[ElementRecord], flags: HeaderFlags) -> Result<ElementTree> {
    let mut nodes = vec![TreeNode::default(); records.len()];
    let mut roots = Vec::new();
    let mut open: Vec<usize> = Vec::new();

    for (index, record) in records.iter().enumerate() {
        while let Some(&top) = open.last() {
            if nodes[top].children.len() == records[top].child_count as usize {
                open.pop();
            } else {
                break;
            }
        }

        match open.last().copied() {
            Some(parent) => {
                let slot = nodes[parent].children.len();
                check_child_offset(records, parent, slot, index)?;
                nodes[parent].children.push(index);
                nodes[index].parent = Some(parent);
            }
            None => roots.push(index),
        }

        if record.child_count > 0 {
            open.push(index);
        }
    }

    for &parent in &open {
        let declared = records[parent].child_count as usize;
        let attached = nodes[parent].children.len();
        if attached < declared {
            return Err(KryonError::MalformedTree(format!(
                "element {} declares {} children but only {} follow it",
                parent, declared, attached
            )));
        }
    }

    let mut tree = ElementTree { nodes, roots };
    if flags.contains(HeaderFlags::HAS_APP) {
        force_app_root(records, &mut tree);
    }
    Ok(tree)
}

fn check_child_offset(records: &[ElementRecord], parent: usize, slot: usize, child: usize) -> Result<()> {
    let Some(&relative) = records[parent].child_offsets.get(slot) else {
        return Ok(());
    };
    if relative == 0 {
        return Ok(());
    }
    let expected = records[parent].offset as u64 + relative as u64;
    let actual = records[child].offset as u64;
    if expected != actual {
        return Err(KryonError::MalformedTree(format!(
            "child {} of element {} sits at offset {} but the parent points to {}",
            slot, parent, actual, expected
        )));
    }
    Ok(())
}

/// With an App root, every other structural root is moved beneath it.
fn force_app_root(records: &[ElementRecord], tree: &mut ElementTree) {
    let Some(first) = records.first() else { return };
    if first.element_type != ElementType::App {
        return;
    }
    let strays: Vec<usize> = tree.roots.iter().copied().filter(|&root| root != 0).collect();
    if !strays.is_empty() {
        warn!("Re-parenting {} stray root element(s) under the App element", strays.len());
    }
    for stray in strays {
        tree.nodes[stray].parent = Some(0);
        tree.nodes[0].children.push(stray);
    }
    tree.roots = vec![0];
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(element_type: ElementType, child_count: u8) -> ElementRecord {
        let mut record = ElementRecord::new(element_type);
        record.child_count = child_count;
        record
    }

    #[test]
    fn rebuilds_pre_order_nesting() {
        let records = vec![
            record(ElementType::Container, 2), // A
            record(ElementType::Text, 0),      // B
            record(ElementType::Container, 1), // C
            record(ElementType::Text, 0),      // D
        ];
        let tree = assemble_tree(&records, HeaderFlags::empty()).unwrap();
        assert_eq!(tree.roots, vec![0]);
        assert_eq!(tree.children(0), &[1, 2]);
        assert_eq!(tree.children(2), &[3]);
        assert_eq!(tree.parent(3), Some(2));
        assert_eq!(tree.pre_order(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn siblings_after_closed_subtree_become_roots() {
        let records = vec![
            record(ElementType::Container, 1),
            record(ElementType::Text, 0),
            record(ElementType::Container, 0),
        ];
        let tree = assemble_tree(&records, HeaderFlags::empty()).unwrap();
        assert_eq!(tree.roots, vec![0, 2]);
    }

    #[test]
    fn missing_children_are_rejected() {
        let records = vec![record(ElementType::Container, 3), record(ElementType::Text, 0)];
        let err = assemble_tree(&records, HeaderFlags::empty()).unwrap_err();
        assert!(matches!(err, KryonError::MalformedTree(_)));
    }

    #[test]
    fn child_offsets_must_match_positions() {
        let mut parent = record(ElementType::Container, 1);
        parent.offset = 42;
        parent.child_offsets = vec![19];
        let mut child = record(ElementType::Text, 0);
        child.offset = 80;
        let err = assemble_tree(&[parent.clone(), child.clone()], HeaderFlags::empty()).unwrap_err();
        assert!(matches!(err, KryonError::MalformedTree(_)));

        child.offset = 61;
        assert!(assemble_tree(&[parent, child], HeaderFlags::empty()).is_ok());
    }

    #[test]
    fn app_root_adopts_stray_roots() {
        let records = vec![
            record(ElementType::App, 1),
            record(ElementType::Container, 0),
            record(ElementType::Text, 0),
        ];
        let tree = assemble_tree(&records, HeaderFlags::HAS_APP).unwrap();
        assert_eq!(tree.roots, vec![0]);
        assert_eq!(tree.children(0), &[1, 2]);
        assert_eq!(tree.parent(2), Some(0));
    }
}
