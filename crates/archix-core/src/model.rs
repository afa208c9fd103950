//! Entity records stored in an [`Architecture`](crate::Architecture) session.
//!
//! Records are read-only from the outside; they change through the builder views
//! (`InstanceMut`, `HostMut`, `GroupMut`, `LinkMut`).

use crate::id::ElementId;

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub(crate) usize);

        impl $name {
            pub fn index(self) -> usize {
                self.0
            }
        }
    };
}

handle!(
    /// Handle to an [`Instance`].
    InstanceId
);
handle!(
    /// Handle to a [`Host`].
    HostId
);
handle!(
    /// Handle to a [`Group`].
    GroupId
);
handle!(
    /// Handle to a [`Link`].
    LinkId
);
handle!(ChainId);

/// Anything that can be placed inside a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeRef {
    Instance(InstanceId),
    Host(HostId),
    Group(GroupId),
}

impl From<InstanceId> for NodeRef {
    fn from(value: InstanceId) -> Self {
        Self::Instance(value)
    }
}

impl From<HostId> for NodeRef {
    fn from(value: HostId) -> Self {
        Self::Host(value)
    }
}

impl From<GroupId> for NodeRef {
    fn from(value: GroupId) -> Self {
        Self::Group(value)
    }
}

/// A process or deployable unit.
#[derive(Debug, Clone)]
pub struct Instance {
    pub(crate) id: ElementId,
    pub(crate) name: String,
    pub(crate) details: String,
    pub(crate) host: Option<HostId>,
    pub(crate) multiple: bool,
}

impl Instance {
    pub(crate) fn new(id: ElementId, name: String) -> Self {
        Self {
            id,
            name,
            details: String::new(),
            host: None,
            multiple: false,
        }
    }

    pub fn id(&self) -> ElementId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Accumulated detail text, `None` when nothing was added.
    pub fn details(&self) -> Option<&str> {
        (!self.details.is_empty()).then_some(self.details.as_str())
    }

    pub fn host(&self) -> Option<HostId> {
        self.host
    }

    /// Own multiplicity, ignoring the host. See
    /// [`Architecture::is_actually_multiple`](crate::Architecture::is_actually_multiple).
    pub fn is_multiple(&self) -> bool {
        self.multiple
    }
}

/// An execution environment containing instances.
#[derive(Debug, Clone)]
pub struct Host {
    pub(crate) id: ElementId,
    pub(crate) instances: Vec<InstanceId>,
    pub(crate) multiple: bool,
}

impl Host {
    pub(crate) fn new(id: ElementId) -> Self {
        Self {
            id,
            instances: Vec::new(),
            multiple: false,
        }
    }

    pub fn id(&self) -> ElementId {
        self.id
    }

    pub fn instances(&self) -> &[InstanceId] {
        &self.instances
    }

    pub fn is_multiple(&self) -> bool {
        self.multiple
    }
}

/// An organizational boundary. Unnamed groups only influence layout.
#[derive(Debug, Clone)]
pub struct Group {
    pub(crate) id: ElementId,
    pub(crate) name: Option<String>,
    pub(crate) children: Vec<NodeRef>,
}

impl Group {
    pub(crate) fn new(id: ElementId, name: Option<String>) -> Self {
        Self {
            id,
            name,
            children: Vec::new(),
        }
    }

    pub fn id(&self) -> ElementId {
        self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn children(&self) -> &[NodeRef] {
        &self.children
    }
}

/// A usage relationship from `source` to `target`.
#[derive(Debug, Clone)]
pub struct Link {
    pub(crate) id: ElementId,
    pub(crate) source: InstanceId,
    pub(crate) target: InstanceId,
    pub(crate) chain: ChainId,
    pub(crate) label: Option<String>,
    pub(crate) bidirectional: bool,
    pub(crate) configuration: bool,
    pub(crate) creation: bool,
    pub(crate) dynamic: bool,
    pub(crate) multiple: bool,
}

impl Link {
    pub fn id(&self) -> ElementId {
        self.id
    }

    pub fn source(&self) -> InstanceId {
        self.source
    }

    pub fn target(&self) -> InstanceId {
        self.target
    }

    pub fn chain(&self) -> ChainId {
        self.chain
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn is_bidirectional(&self) -> bool {
        self.bidirectional
    }

    /// Registry/discovery style control link.
    pub fn is_configuration(&self) -> bool {
        self.configuration
    }

    /// Provisioning/deployment link.
    pub fn is_creation(&self) -> bool {
        self.creation
    }

    /// Discovered at runtime.
    pub fn is_dynamic(&self) -> bool {
        self.dynamic
    }

    pub fn is_multiple(&self) -> bool {
        self.multiple
    }
}
