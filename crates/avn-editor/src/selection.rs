//! Editor selection.
//!
//! An insertion-ordered set of entities. The `selected` flags on graph
//! entities mirror it and are only ever rewritten by [`SelectionModel::sync_flags`].

use avn_core::model::{EntityRef, StoryGraph};

/// How a batch of entities combines with the current selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    Set,
    Add,
    Remove,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionModel {
    items: Vec<EntityRef>,
}

impl SelectionModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, entities: &[EntityRef], mode: SelectionMode) {
        match mode {
            SelectionMode::Set => {
                self.items.clear();
                self.extend(entities);
            }
            SelectionMode::Add => self.extend(entities),
            SelectionMode::Remove => self.items.retain(|e| !entities.contains(e)),
        }
    }

    fn extend(&mut self, entities: &[EntityRef]) {
        for e in entities {
            if !self.items.contains(e) {
                self.items.push(*e);
            }
        }
    }

    /// Flip one entity in or out.
    pub fn toggle(&mut self, entity: EntityRef) {
        if let Some(pos) = self.items.iter().position(|e| *e == entity) {
            self.items.remove(pos);
        } else {
            self.items.push(entity);
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn contains(&self, entity: EntityRef) -> bool {
        self.items.contains(&entity)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntityRef> {
        self.items.iter()
    }

    /// The single entity inspector actions apply to. Only defined while at
    /// most one entity is selected.
    pub fn primary(&self) -> Option<EntityRef> {
        match self.items.as_slice() {
            [only] => Some(*only),
            _ => None,
        }
    }

    /// Drop entries whose entity no longer exists.
    pub fn retain_existing(&mut self, graph: &StoryGraph) {
        self.items.retain(|e| match e {
            EntityRef::Node(id) => graph.contains_node(*id),
            EntityRef::Edge(id) => graph.edge(*id).is_some(),
            EntityRef::Decoration(id) => graph.decoration(*id).is_some(),
        });
    }

    /// Rewrite every `selected` flag in the graph to match this set.
    pub fn sync_flags(&self, graph: &mut StoryGraph) {
        for node in graph.graph.node_weights_mut() {
            node.selected = self.items.contains(&EntityRef::Node(node.id));
        }
        for edge in graph.graph.edge_weights_mut() {
            edge.selected = self.items.contains(&EntityRef::Edge(edge.id));
        }
        for deco in &mut graph.decorations {
            deco.selected = self.items.contains(&EntityRef::Decoration(deco.id));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use avn_core::id::NodeId;
    use avn_core::model::{Point, StoryNode};
    use pretty_assertions::assert_eq;

    fn n(id: &str) -> EntityRef {
        EntityRef::Node(NodeId::intern(id))
    }

    #[test]
    fn modes_combine_as_sets() {
        let mut sel = SelectionModel::new();
        sel.update(&[n("s_1")], SelectionMode::Set);
        sel.update(&[n("s_2")], SelectionMode::Add);
        assert_eq!(sel.iter().copied().collect::<Vec<_>>(), vec![n("s_1"), n("s_2")]);

        sel.update(&[n("s_1"), n("s_3")], SelectionMode::Remove);
        assert_eq!(sel.iter().copied().collect::<Vec<_>>(), vec![n("s_2")]);

        sel.update(&[n("s_3")], SelectionMode::Set);
        assert_eq!(sel.iter().copied().collect::<Vec<_>>(), vec![n("s_3")]);
    }

    #[test]
    fn add_does_not_duplicate() {
        let mut sel = SelectionModel::new();
        sel.update(&[n("s_a"), n("s_a")], SelectionMode::Add);
        sel.update(&[n("s_a")], SelectionMode::Add);
        assert_eq!(sel.len(), 1);
    }

    #[test]
    fn primary_only_for_single() {
        let mut sel = SelectionModel::new();
        assert_eq!(sel.primary(), None);
        sel.toggle(n("s_p"));
        assert_eq!(sel.primary(), Some(n("s_p")));
        sel.toggle(n("s_q"));
        assert_eq!(sel.primary(), None);
        sel.toggle(n("s_p"));
        assert_eq!(sel.primary(), Some(n("s_q")));
    }

    #[test]
    fn flags_follow_the_set() {
        let mut g = StoryGraph::new();
        g.add_node(StoryNode::new(NodeId::intern("s_f1"), "1", Point::default()));
        g.add_node(StoryNode::new(NodeId::intern("s_f2"), "2", Point::default()));
        let mut sel = SelectionModel::new();
        sel.update(&[n("s_f1")], SelectionMode::Set);
        sel.sync_flags(&mut g);
        assert!(g.get_by_id(NodeId::intern("s_f1")).unwrap().selected);
        sel.update(&[n("s_f2")], SelectionMode::Set);
        sel.sync_flags(&mut g);
        assert!(!g.get_by_id(NodeId::intern("s_f1")).unwrap().selected);
        assert!(g.get_by_id(NodeId::intern("s_f2")).unwrap().selected);

        g.remove_node(NodeId::intern("s_f2"));
        sel.retain_existing(&g);
        assert!(sel.is_empty());
    }
}
