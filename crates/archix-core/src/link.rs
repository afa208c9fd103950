//! Link declaration, modifiers and chaining.

use crate::architecture::Architecture;
use crate::model::{ChainId, InstanceId, Link, LinkId};

impl Architecture {
    fn new_link(&mut self, source: InstanceId, target: InstanceId, chain: Option<ChainId>) -> LinkId {
        let link = LinkId(self.links.len());
        let chain = match chain {
            Some(chain) => {
                self.chains[chain.0].push(link);
                chain
            }
            None => {
                self.chains.push(vec![link]);
                ChainId(self.chains.len() - 1)
            }
        };
        let id = self.allocate("link");
        let multiple = self.is_actually_multiple(target);
        self.links.push(Link {
            id,
            source,
            target,
            chain,
            label: None,
            bidirectional: false,
            configuration: false,
            creation: false,
            dynamic: false,
            multiple,
        });
        link
    }

    /// Declares that `source` uses `target`. The link is multiple when the target is.
    pub fn to(&mut self, source: InstanceId, target: InstanceId) -> LinkMut<'_> {
        let id = self.new_link(source, target, None);
        LinkMut { arch: self, id }
    }

    /// Declares a bidirectional link; multiple when either side is.
    pub fn with(&mut self, source: InstanceId, target: InstanceId) -> LinkMut<'_> {
        self.to(source, target).bidirectional()
    }

    /// Declares `target` as a registry/discovery service for `source`.
    pub fn configuration(&mut self, source: InstanceId, target: InstanceId) -> LinkMut<'_> {
        self.to(source, target).configuration()
    }

    /// Declares that `source` deploys or provisions `target`.
    pub fn creates(&mut self, source: InstanceId, target: InstanceId) -> LinkMut<'_> {
        self.to(source, target).creation()
    }

    pub fn link_mut(&mut self, id: LinkId) -> LinkMut<'_> {
        LinkMut { arch: self, id }
    }
}

/// Builder view over one link. Modifiers are idempotent.
#[derive(Debug)]
pub struct LinkMut<'a> {
    arch: &'a mut Architecture,
    id: LinkId,
}

impl<'a> LinkMut<'a> {
    pub fn id(&self) -> LinkId {
        self.id
    }

    fn link(&mut self) -> &mut Link {
        &mut self.arch.links[self.id.0]
    }

    /// Continues the path from this link's target to `next`. Returns the new link, which
    /// shares this link's chain.
    pub fn to(self, next: InstanceId) -> LinkMut<'a> {
        let Self { arch, id } = self;
        let Link { target, chain, .. } = arch.links[id.0];
        let id = arch.new_link(target, next, Some(chain));
        LinkMut { arch, id }
    }

    pub fn bidirectional(mut self) -> Self {
        let (source, target) = {
            let link = self.link();
            link.bidirectional = true;
            (link.source, link.target)
        };
        let multiple =
            self.arch.is_actually_multiple(source) || self.arch.is_actually_multiple(target);
        self.link().multiple = multiple;
        self
    }

    pub fn configuration(mut self) -> Self {
        self.link().configuration = true;
        self
    }

    pub fn registry(self) -> Self {
        self.configuration()
    }

    pub fn creation(mut self) -> Self {
        self.link().creation = true;
        self
    }

    pub fn deploy(self) -> Self {
        self.creation()
    }

    pub fn dynamic(mut self) -> Self {
        self.link().dynamic = true;
        self
    }

    pub fn discovered(self) -> Self {
        self.dynamic()
    }

    /// Forces a single (non-replicated) rendering regardless of the endpoints.
    pub fn single(mut self) -> Self {
        self.link().multiple = false;
        self
    }

    pub fn name(mut self, label: impl Into<String>) -> Self {
        self.link().label = Some(label.into());
        self
    }
}

impl From<LinkMut<'_>> for LinkId {
    fn from(value: LinkMut<'_>) -> Self {
        value.id
    }
}
