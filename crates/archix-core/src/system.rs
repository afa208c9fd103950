use crate::architecture::Architecture;
use crate::id::ElementId;
use crate::model::{LinkId, NodeRef};
use indexmap::IndexSet;
use rustc_hash::FxBuildHasher;

/// One renderable variant of an architecture.
///
/// A system borrows its session immutably, so nothing can be declared between registering
/// links and rendering.
#[derive(Debug, Clone)]
pub struct System<'a> {
    arch: &'a Architecture,
    id: ElementId,
    name: String,
    nodes: IndexSet<NodeRef, FxBuildHasher>,
    links: IndexSet<LinkId, FxBuildHasher>,
    processors: Option<Vec<String>>,
}

impl Architecture {
    pub fn system(&self, name: impl Into<String>) -> System<'_> {
        System {
            arch: self,
            id: self.allocate("system"),
            name: name.into(),
            nodes: IndexSet::default(),
            links: IndexSet::default(),
            processors: None,
        }
    }
}

impl<'a> System<'a> {
    pub fn id(&self) -> ElementId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn architecture(&self) -> &'a Architecture {
        self.arch
    }

    /// Registers every link of each given link's chain, together with the outermost
    /// containers of their endpoints.
    pub fn is(mut self, links: impl IntoIterator<Item = LinkId>) -> Self {
        let arch = self.arch;
        for link in links {
            for &member in arch.chain(arch[link].chain) {
                self.register(NodeRef::Instance(arch[member].source));
                self.register(NodeRef::Instance(arch[member].target));
                self.links.insert(member);
            }
        }
        self
    }

    /// Registers nodes that should be drawn even without links.
    pub fn contains<N: Into<NodeRef>>(mut self, nodes: impl IntoIterator<Item = N>) -> Self {
        for node in nodes {
            self.register(node.into());
        }
        self
    }

    /// Restricts rendering to the named processors.
    pub fn only<I, S>(mut self, processors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.processors = Some(processors.into_iter().map(Into::into).collect());
        self
    }

    /// Whether this system is rendered under `processor` (`None` for the identity processor).
    pub fn renders(&self, processor: Option<&str>) -> bool {
        match (&self.processors, processor) {
            (None, _) => true,
            (Some(allowed), Some(name)) => allowed.iter().any(|p| p == name),
            (Some(_), None) => false,
        }
    }

    /// Top-level nodes in registration order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeRef> + '_ {
        self.nodes.iter().copied()
    }

    /// Registered links in declaration order.
    pub fn links(&self) -> impl Iterator<Item = LinkId> + '_ {
        self.links.iter().copied()
    }

    pub fn render(&self) -> String {
        crate::render::render_system(self)
    }

    fn register(&mut self, node: NodeRef) {
        let root = self.arch.outermost(node);
        if self.nodes.insert(root) {
            tracing::debug!(
                system = %self.name,
                node = %self.arch.element_id(root),
                "registered top-level node"
            );
        }
    }
}
