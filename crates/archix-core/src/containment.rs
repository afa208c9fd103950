//! Placement of nodes into containers and the "promote to outermost" walk.
//!
//! Every node is in at most one container at a time. Placing a node elsewhere detaches it from
//! its previous group first, so nothing is ever listed under two containers.

use crate::architecture::Architecture;
use crate::model::{GroupId, HostId, InstanceId, NodeRef};

impl Architecture {
    /// The container one level further out: the host for a hosted instance, otherwise the
    /// enclosing group.
    pub fn next_outer_ancestor(&self, node: NodeRef) -> Option<NodeRef> {
        if let NodeRef::Instance(id) = node {
            if let Some(host) = self[id].host {
                return Some(NodeRef::Host(host));
            }
        }
        self.parent(node).map(NodeRef::Group)
    }

    /// The node that has to be registered directly under a system for `node` to be rendered.
    pub fn outermost(&self, node: NodeRef) -> NodeRef {
        let mut current = node;
        while let Some(outer) = self.next_outer_ancestor(current) {
            current = outer;
        }
        current
    }

    /// Ancestors of `node`, innermost first.
    pub fn ancestors(&self, node: NodeRef) -> impl Iterator<Item = NodeRef> + '_ {
        std::iter::successors(self.next_outer_ancestor(node), |&n| self.next_outer_ancestor(n))
    }

    pub(crate) fn place_in_group(&mut self, node: NodeRef, group: GroupId) {
        // A hosted instance is represented in groups by its host.
        let node = match node {
            NodeRef::Instance(id) => self[id].host.map_or(node, NodeRef::Host),
            other => other,
        };

        if self.parent(node) == Some(group) {
            return;
        }
        if self.would_enclose_itself(node, group) {
            tracing::debug!(
                node = %self.element_id(node),
                group = %self[group].id,
                "ignoring placement of a group inside itself"
            );
            return;
        }

        self.detach(node);
        self.groups[group.0].children.push(node);
        self.parents.insert(node, group);
    }

    pub(crate) fn place_on_host(&mut self, instance: InstanceId, host: HostId) {
        if self[instance].host == Some(host) {
            return;
        }
        if let Some(previous) = self[instance].host {
            self.hosts[previous.0].instances.retain(|&i| i != instance);
        }

        // The host takes over the instance's slot in its group.
        if let Some(group) = self.parents.remove(&NodeRef::Instance(instance)) {
            let host_node = NodeRef::Host(host);
            if self.parent(host_node) == Some(group) {
                self.groups[group.0]
                    .children
                    .retain(|&c| c != NodeRef::Instance(instance));
            } else {
                self.detach(host_node);
                let children = &mut self.groups[group.0].children;
                match children
                    .iter()
                    .position(|&c| c == NodeRef::Instance(instance))
                {
                    Some(pos) => children[pos] = host_node,
                    None => children.push(host_node),
                }
                self.parents.insert(host_node, group);
            }
        }

        self.hosts[host.0].instances.push(instance);
        self.instances[instance.0].host = Some(host);
    }

    fn detach(&mut self, node: NodeRef) {
        if let Some(previous) = self.parents.remove(&node) {
            self.groups[previous.0].children.retain(|&c| c != node);
        }
    }

    /// True when `group` is `node` itself or sits somewhere inside it.
    fn would_enclose_itself(&self, node: NodeRef, group: GroupId) -> bool {
        let NodeRef::Group(_) = node else {
            return false;
        };
        let target = NodeRef::Group(group);
        target == node || self.ancestors(target).any(|n| n == node)
    }
}

#[cfg(test)]
mod tests {
    use crate::architecture::Architecture;
    use crate::model::NodeRef;

    #[test]
    fn plain_instance_is_its_own_outermost() {
        let mut arch = Architecture::new();
        let i = arch.instance("solo").id();
        assert_eq!(arch.outermost(i.into()), NodeRef::Instance(i));
        assert_eq!(arch.next_outer_ancestor(i.into()), None);
    }

    #[test]
    fn host_placement_takes_precedence_over_group() {
        let mut arch = Architecture::new();
        let outer = arch.named_group("outer").id();
        let inner = arch.named_group("inner").within(outer).id();
        let h = arch.host().within(inner).id();
        let i = arch.instance("svc").on(h).id();

        let chain: Vec<NodeRef> = arch.ancestors(i.into()).collect();
        assert_eq!(
            chain,
            vec![
                NodeRef::Host(h),
                NodeRef::Group(inner),
                NodeRef::Group(outer)
            ]
        );
        assert_eq!(arch.outermost(i.into()), NodeRef::Group(outer));
    }

    #[test]
    fn hosting_a_grouped_instance_moves_the_host_into_its_slot() {
        let mut arch = Architecture::new();
        let g = arch.named_group("g").id();
        let before = arch.instance("before").within(g).id();
        let i = arch.instance("svc").within(g).id();
        let after = arch.instance("after").within(g).id();
        let h = arch.host().id();

        arch.instance_mut(i).on(h);

        assert_eq!(
            arch[g].children(),
            &[
                NodeRef::Instance(before),
                NodeRef::Host(h),
                NodeRef::Instance(after)
            ]
        );
        assert_eq!(arch.parent(NodeRef::Instance(i)), None);
        assert_eq!(arch.parent(NodeRef::Host(h)), Some(g));
        assert_eq!(arch[h].instances(), &[i]);
    }

    #[test]
    fn hosting_an_instance_whose_host_is_already_grouped_does_not_duplicate() {
        let mut arch = Architecture::new();
        let g = arch.named_group("g").id();
        let h = arch.host().within(g).id();
        let i = arch.instance("svc").within(g).id();

        arch.instance_mut(i).on(h);

        assert_eq!(arch[g].children(), &[NodeRef::Host(h)]);
    }

    #[test]
    fn grouping_a_hosted_instance_groups_its_host() {
        let mut arch = Architecture::new();
        let g = arch.group().id();
        let h = arch.host().id();
        let i = arch.instance("svc").on(h).within(g).id();

        assert_eq!(arch[g].children(), &[NodeRef::Host(h)]);
        assert_eq!(arch.outermost(i.into()), NodeRef::Group(g));
    }

    #[test]
    fn moving_between_groups_leaves_a_single_parent() {
        let mut arch = Architecture::new();
        let g1 = arch.group().id();
        let g2 = arch.group().id();
        let i = arch.instance("svc").within(g1).within(g2).id();

        assert!(arch[g1].children().is_empty());
        assert_eq!(arch[g2].children(), &[NodeRef::Instance(i)]);
        assert_eq!(arch.parent(i.into()), Some(g2));
    }

    #[test]
    fn rehosting_removes_the_instance_from_the_previous_host() {
        let mut arch = Architecture::new();
        let h1 = arch.host().id();
        let h2 = arch.host().id();
        let i = arch.instance("svc").on(h1).on(h2).id();

        assert!(arch[h1].instances().is_empty());
        assert_eq!(arch[h2].instances(), &[i]);
        assert_eq!(arch[i].host(), Some(h2));
    }

    #[test]
    fn group_cycles_are_ignored() {
        let mut arch = Architecture::new();
        let outer = arch.group().id();
        let inner = arch.group().within(outer).id();

        arch.group_mut(outer).within(inner);
        arch.group_mut(inner).within(inner);

        assert_eq!(arch.parent(outer.into()), None);
        assert_eq!(arch.parent(inner.into()), Some(outer));
        assert_eq!(arch.outermost(inner.into()), NodeRef::Group(outer));
    }
}
