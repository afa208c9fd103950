use crate::id::{ElementId, IdAllocator};
use crate::link::LinkMut;
use crate::model::{
    ChainId, Group, GroupId, Host, HostId, Instance, InstanceId, Link, LinkId, NodeRef,
};
use crate::theme::Theme;
use rustc_hash::FxHashMap;
use std::ops::Index;

/// A build session: owns every declared entity, the id counter and the render theme.
///
/// Entities are never removed. Containers own their children through ordered lists; the
/// child-to-group relation is kept in a side table and only used to walk outwards.
#[derive(Debug, Default)]
pub struct Architecture {
    pub(crate) ids: IdAllocator,
    theme: Theme,
    pub(crate) instances: Vec<Instance>,
    pub(crate) hosts: Vec<Host>,
    pub(crate) groups: Vec<Group>,
    pub(crate) links: Vec<Link>,
    pub(crate) chains: Vec<Vec<LinkId>>,
    pub(crate) parents: FxHashMap<NodeRef, GroupId>,
}

impl Architecture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub(crate) fn allocate(&self, prefix: &'static str) -> ElementId {
        self.ids.allocate(prefix)
    }

    pub fn instance(&mut self, name: impl Into<String>) -> InstanceMut<'_> {
        let id = InstanceId(self.instances.len());
        let element = self.allocate("instance");
        self.instances.push(Instance::new(element, name.into()));
        InstanceMut { arch: self, id }
    }

    pub fn instance_mut(&mut self, id: InstanceId) -> InstanceMut<'_> {
        InstanceMut { arch: self, id }
    }

    pub fn host(&mut self) -> HostMut<'_> {
        let id = HostId(self.hosts.len());
        let element = self.allocate("host");
        self.hosts.push(Host::new(element));
        HostMut { arch: self, id }
    }

    pub fn host_mut(&mut self, id: HostId) -> HostMut<'_> {
        HostMut { arch: self, id }
    }

    /// An unnamed group, rendered as an invisible boundary.
    pub fn group(&mut self) -> GroupMut<'_> {
        self.new_group(None)
    }

    pub fn named_group(&mut self, name: impl Into<String>) -> GroupMut<'_> {
        self.new_group(Some(name.into()))
    }

    fn new_group(&mut self, name: Option<String>) -> GroupMut<'_> {
        let id = GroupId(self.groups.len());
        let element = self.allocate("group");
        self.groups.push(Group::new(element, name));
        GroupMut { arch: self, id }
    }

    pub fn group_mut(&mut self, id: GroupId) -> GroupMut<'_> {
        GroupMut { arch: self, id }
    }

    /// Own multiplicity, or inherited from a replicated host.
    pub fn is_actually_multiple(&self, id: InstanceId) -> bool {
        let instance = &self[id];
        instance.multiple || instance.host.is_some_and(|host| self[host].multiple)
    }

    /// Group directly containing `node`, if any.
    pub fn parent(&self, node: NodeRef) -> Option<GroupId> {
        self.parents.get(&node).copied()
    }

    /// Element id of any node.
    pub fn element_id(&self, node: NodeRef) -> ElementId {
        match node {
            NodeRef::Instance(id) => self[id].id,
            NodeRef::Host(id) => self[id].id,
            NodeRef::Group(id) => self[id].id,
        }
    }

    pub fn chain(&self, chain: ChainId) -> &[LinkId] {
        &self.chains[chain.0]
    }

    pub fn instances(&self) -> impl Iterator<Item = (InstanceId, &Instance)> {
        self.instances
            .iter()
            .enumerate()
            .map(|(idx, instance)| (InstanceId(idx), instance))
    }

    pub fn hosts(&self) -> impl Iterator<Item = (HostId, &Host)> {
        self.hosts
            .iter()
            .enumerate()
            .map(|(idx, host)| (HostId(idx), host))
    }

    pub fn groups(&self) -> impl Iterator<Item = (GroupId, &Group)> {
        self.groups
            .iter()
            .enumerate()
            .map(|(idx, group)| (GroupId(idx), group))
    }

    pub fn links(&self) -> impl Iterator<Item = (LinkId, &Link)> {
        self.links
            .iter()
            .enumerate()
            .map(|(idx, link)| (LinkId(idx), link))
    }
}

impl Index<InstanceId> for Architecture {
    type Output = Instance;

    fn index(&self, index: InstanceId) -> &Self::Output {
        &self.instances[index.0]
    }
}

impl Index<HostId> for Architecture {
    type Output = Host;

    fn index(&self, index: HostId) -> &Self::Output {
        &self.hosts[index.0]
    }
}

impl Index<GroupId> for Architecture {
    type Output = Group;

    fn index(&self, index: GroupId) -> &Self::Output {
        &self.groups[index.0]
    }
}

impl Index<LinkId> for Architecture {
    type Output = Link;

    fn index(&self, index: LinkId) -> &Self::Output {
        &self.links[index.0]
    }
}

/// Builder view over one instance.
#[derive(Debug)]
pub struct InstanceMut<'a> {
    arch: &'a mut Architecture,
    id: InstanceId,
}

impl<'a> InstanceMut<'a> {
    pub fn id(&self) -> InstanceId {
        self.id
    }

    /// Appends label text, typically the technology. `<BR/>` starts a new line.
    pub fn details(self, text: &str) -> Self {
        self.arch.instances[self.id.0].details.push_str(text);
        self
    }

    /// Marks the instance as a replicated set.
    pub fn multiple(self) -> Self {
        self.arch.instances[self.id.0].multiple = true;
        self
    }

    /// Runs the instance on `host`. If the instance sat in a group, the host takes its place
    /// there.
    pub fn on(self, host: HostId) -> Self {
        self.arch.place_on_host(self.id, host);
        self
    }

    /// Places the instance (its host, when it has one) in `group`.
    pub fn within(self, group: GroupId) -> Self {
        self.arch.place_in_group(NodeRef::Instance(self.id), group);
        self
    }

    pub fn to(self, target: InstanceId) -> LinkMut<'a> {
        let Self { arch, id } = self;
        arch.to(id, target)
    }

    pub fn with(self, target: InstanceId) -> LinkMut<'a> {
        let Self { arch, id } = self;
        arch.with(id, target)
    }

    pub fn configuration(self, target: InstanceId) -> LinkMut<'a> {
        let Self { arch, id } = self;
        arch.configuration(id, target)
    }

    pub fn registry(self, target: InstanceId) -> LinkMut<'a> {
        self.configuration(target)
    }

    pub fn creates(self, target: InstanceId) -> LinkMut<'a> {
        let Self { arch, id } = self;
        arch.creates(id, target)
    }
}

impl From<InstanceMut<'_>> for InstanceId {
    fn from(value: InstanceMut<'_>) -> Self {
        value.id
    }
}

/// Builder view over one host.
#[derive(Debug)]
pub struct HostMut<'a> {
    arch: &'a mut Architecture,
    id: HostId,
}

impl HostMut<'_> {
    pub fn id(&self) -> HostId {
        self.id
    }

    /// Marks the host as a replicated fleet; its instances inherit the multiplicity.
    pub fn multiple(self) -> Self {
        self.arch.hosts[self.id.0].multiple = true;
        self
    }

    pub fn contains(self, instances: impl IntoIterator<Item = InstanceId>) -> Self {
        for instance in instances {
            self.arch.place_on_host(instance, self.id);
        }
        self
    }

    pub fn within(self, group: GroupId) -> Self {
        self.arch.place_in_group(NodeRef::Host(self.id), group);
        self
    }
}

impl From<HostMut<'_>> for HostId {
    fn from(value: HostMut<'_>) -> Self {
        value.id
    }
}

/// Builder view over one group.
#[derive(Debug)]
pub struct GroupMut<'a> {
    arch: &'a mut Architecture,
    id: GroupId,
}

impl GroupMut<'_> {
    pub fn id(&self) -> GroupId {
        self.id
    }

    /// Nests this group in `parent`.
    pub fn within(self, parent: GroupId) -> Self {
        self.arch.place_in_group(NodeRef::Group(self.id), parent);
        self
    }

    pub fn add(self, node: impl Into<NodeRef>) -> Self {
        self.arch.place_in_group(node.into(), self.id);
        self
    }
}

impl From<GroupMut<'_>> for GroupId {
    fn from(value: GroupMut<'_>) -> Self {
        value.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_follow_creation_order_across_entity_kinds() {
        let mut arch = Architecture::new();
        let i1 = arch.instance("a").id();
        let h1 = arch.host().id();
        let g1 = arch.named_group("g").id();
        let i2 = arch.instance("b").id();

        let ids = [
            arch[i1].id(),
            arch[h1].id(),
            arch[g1].id(),
            arch[i2].id(),
        ];
        assert_eq!(ids[0].to_string(), "instance_100");
        assert_eq!(ids[1].to_string(), "host_101");
        assert_eq!(ids[2].to_string(), "group_102");
        assert_eq!(ids[3].to_string(), "instance_103");
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn details_accumulate() {
        let mut arch = Architecture::new();
        let i = arch.instance("db").details("postgres").details("<BR/>14").id();
        assert_eq!(arch[i].details(), Some("postgres<BR/>14"));

        let bare = arch.instance("cache").id();
        assert_eq!(arch[bare].details(), None);
    }

    #[test]
    fn multiplicity_is_inherited_from_host() {
        let mut arch = Architecture::new();
        let fleet = arch.host().multiple().id();
        let single_host = arch.host().id();
        let i = arch.instance("worker").on(fleet).id();
        let j = arch.instance("api").multiple().on(single_host).id();
        let k = arch.instance("batch").on(single_host).id();

        assert!(!arch[i].is_multiple());
        assert!(arch.is_actually_multiple(i));
        assert!(arch.is_actually_multiple(j));
        assert!(!arch.is_actually_multiple(k));
    }

    #[test]
    fn multiplicity_follows_later_host_changes() {
        let mut arch = Architecture::new();
        let h = arch.host().id();
        let i = arch.instance("worker").on(h).id();
        assert!(!arch.is_actually_multiple(i));

        arch.host_mut(h).multiple();
        assert!(arch.is_actually_multiple(i));
    }
}
