//! Topology documents: the declarative (JSON/YAML) way to describe an architecture.
//!
//! ```yaml
//! groups:
//!   - { id: backend, name: Backend }
//! hosts:
//!   - { id: vm, multiple: true, within: backend }
//! instances:
//!   - { id: api, name: API, on: vm }
//!   - { id: db, name: Postgres }
//! systems:
//!   - name: storage
//!     links:
//!       - { path: [api, db] }
//! ```

use crate::details::details;
use crate::generate::{GenerateOptions, GenerateReport, Processor, Provider, generate};
use crate::graphviz::DotRenderer;
use crate::{
    Architecture, Error, GroupId, HostId, InstanceId, LinkId, LinkMut, NodeRef, Result, System,
    Theme,
};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Document {
    /// Overrides `options.theme` when set.
    pub theme: Option<Theme>,
    pub options: GenerateOptions,
    pub groups: Vec<GroupSpec>,
    pub hosts: Vec<HostSpec>,
    pub instances: Vec<InstanceSpec>,
    pub processors: Vec<ProcessorSpec>,
    pub systems: Vec<SystemSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupSpec {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub within: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HostSpec {
    pub id: String,
    #[serde(default)]
    pub multiple: bool,
    #[serde(default)]
    pub within: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InstanceSpec {
    pub id: String,
    /// Display label; the id when absent.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub multiple: bool,
    #[serde(default)]
    pub within: Option<String>,
    #[serde(default)]
    pub on: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProcessorSpec {
    pub name: String,
    #[serde(default)]
    pub details: Vec<LabelSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LabelSpec {
    pub targets: Vec<String>,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SystemSpec {
    pub name: String,
    /// Processor names this system is rendered under. All of them when absent.
    #[serde(default)]
    pub only: Option<Vec<String>>,
    #[serde(default)]
    pub links: Vec<LinkSpec>,
    /// Nodes shown even when no link reaches them.
    #[serde(default)]
    pub contains: Vec<String>,
}

/// A path of instances. Flags apply to every link of the path; the label goes on the last one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LinkSpec {
    pub path: Vec<String>,
    #[serde(default)]
    pub kind: LinkKind,
    #[serde(default)]
    pub bidirectional: bool,
    #[serde(default)]
    pub dynamic: bool,
    #[serde(default)]
    pub single: bool,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkKind {
    #[default]
    Uses,
    Configuration,
    Creation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    /// YAML for `.yaml`/`.yml`, JSON otherwise.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                Self::Yaml
            }
            _ => Self::Json,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeKind {
    Group,
    Host,
    Instance,
}

impl NodeKind {
    fn as_str(self) -> &'static str {
        match self {
            NodeKind::Group => "group",
            NodeKind::Host => "host",
            NodeKind::Instance => "instance",
        }
    }
}

/// What a declared document resolves to inside one session.
#[derive(Debug, Default)]
pub struct DocumentHandles {
    nodes: FxHashMap<String, NodeRef>,
    systems: Vec<Vec<LinkId>>,
}

impl DocumentHandles {
    pub fn node(&self, id: &str) -> Option<NodeRef> {
        self.nodes.get(id).copied()
    }

    pub fn group(&self, id: &str) -> Option<GroupId> {
        match self.node(id)? {
            NodeRef::Group(g) => Some(g),
            _ => None,
        }
    }

    pub fn host(&self, id: &str) -> Option<HostId> {
        match self.node(id)? {
            NodeRef::Host(h) => Some(h),
            _ => None,
        }
    }

    pub fn instance(&self, id: &str) -> Option<InstanceId> {
        match self.node(id)? {
            NodeRef::Instance(i) => Some(i),
            _ => None,
        }
    }

    /// The first link of every path declared for the `index`-th system.
    pub fn system_links(&self, index: usize) -> &[LinkId] {
        self.systems.get(index).map(Vec::as_slice).unwrap_or_default()
    }

    fn instances<'s>(&self, ids: impl IntoIterator<Item = &'s String>) -> Vec<InstanceId> {
        ids.into_iter().filter_map(|id| self.instance(id)).collect()
    }

    /// Every id of a link path, or `None` when one of them is not a declared instance.
    fn path(&self, ids: &[String]) -> Option<Vec<InstanceId>> {
        ids.iter().map(|id| self.instance(id)).collect()
    }
}

impl Document {
    pub fn parse(text: &str, format: DocumentFormat) -> Result<Self> {
        let doc: Self = match format {
            DocumentFormat::Json => serde_json::from_str(text)?,
            DocumentFormat::Yaml => serde_yaml::from_str(text)?,
        };
        doc.validate()?;
        Ok(doc)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        Self::parse(text, DocumentFormat::Json)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        Self::parse(text, DocumentFormat::Yaml)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        tracing::debug!(path = %path.display(), "loading topology document");
        Self::parse(&text, DocumentFormat::from_path(path))
    }

    /// Checks that every reference names a declared element of the right kind.
    pub fn validate(&self) -> Result<()> {
        let mut kinds: FxHashMap<&str, NodeKind> = FxHashMap::default();
        let declared = self
            .groups
            .iter()
            .map(|g| (g.id.as_str(), NodeKind::Group))
            .chain(self.hosts.iter().map(|h| (h.id.as_str(), NodeKind::Host)))
            .chain(
                self.instances
                    .iter()
                    .map(|i| (i.id.as_str(), NodeKind::Instance)),
            );
        for (id, kind) in declared {
            if id.is_empty() {
                return Err(Error::document(format!("{} with an empty id", kind.as_str())));
            }
            if kinds.insert(id, kind).is_some() {
                return Err(Error::document(format!("duplicate id `{id}`")));
            }
        }

        let require = |id: &str, kind: NodeKind, context: &dyn Fn() -> String| -> Result<()> {
            match kinds.get(id) {
                Some(found) if *found == kind => Ok(()),
                Some(found) => Err(Error::document(format!(
                    "`{id}` is a {}, expected a {} ({})",
                    found.as_str(),
                    kind.as_str(),
                    context()
                ))),
                None => Err(Error::document(format!(
                    "unknown {} `{id}` ({})",
                    kind.as_str(),
                    context()
                ))),
            }
        };

        for g in &self.groups {
            if let Some(parent) = &g.within {
                require(parent, NodeKind::Group, &|| format!("group `{}`", g.id))?;
            }
        }
        for h in &self.hosts {
            if let Some(parent) = &h.within {
                require(parent, NodeKind::Group, &|| format!("host `{}`", h.id))?;
            }
        }
        for i in &self.instances {
            if let Some(parent) = &i.within {
                require(parent, NodeKind::Group, &|| format!("instance `{}`", i.id))?;
            }
            if let Some(host) = &i.on {
                require(host, NodeKind::Host, &|| format!("instance `{}`", i.id))?;
            }
        }
        for p in &self.processors {
            for label in &p.details {
                for target in &label.targets {
                    require(target, NodeKind::Instance, &|| format!("processor `{}`", p.name))?;
                }
            }
        }
        for s in &self.systems {
            for link in &s.links {
                if link.path.len() < 2 {
                    return Err(Error::document(format!(
                        "system `{}` has a link path with fewer than two instances",
                        s.name
                    )));
                }
                for id in &link.path {
                    require(id, NodeKind::Instance, &|| format!("system `{}`", s.name))?;
                }
            }
            for id in &s.contains {
                if !kinds.contains_key(id.as_str()) {
                    return Err(Error::document(format!(
                        "unknown node `{id}` (system `{}`)",
                        s.name
                    )));
                }
            }
            for name in s.only.iter().flatten() {
                if !self.processors.iter().any(|p| &p.name == name) {
                    tracing::warn!(system = %s.name, processor = %name, "restricted to an undeclared processor");
                }
            }
        }
        Ok(())
    }

    /// Generation options with the document theme applied.
    pub fn options(&self) -> GenerateOptions {
        let mut options = self.options.clone();
        if self.theme.is_some() {
            options.theme = self.theme;
        }
        options
    }

    /// Declares every element and every system's links in `arch`.
    ///
    /// References that do not resolve are skipped; [`Document::validate`] reports them. A link
    /// path with an unresolved id is dropped whole rather than shortened.
    pub fn declare(&self, arch: &mut Architecture) -> DocumentHandles {
        let mut handles = DocumentHandles::default();

        for g in &self.groups {
            let group = match &g.name {
                Some(name) => arch.named_group(name.as_str()).id(),
                None => arch.group().id(),
            };
            handles.nodes.insert(g.id.clone(), group.into());
        }
        for h in &self.hosts {
            let mut host = arch.host();
            if h.multiple {
                host = host.multiple();
            }
            handles.nodes.insert(h.id.clone(), host.id().into());
        }
        for i in &self.instances {
            let mut instance = arch.instance(i.name.as_deref().unwrap_or(&i.id));
            if let Some(details) = &i.details {
                instance = instance.details(details);
            }
            if i.multiple {
                instance = instance.multiple();
            }
            handles.nodes.insert(i.id.clone(), instance.id().into());
        }

        for g in &self.groups {
            if let (Some(group), Some(parent)) = (
                handles.group(&g.id),
                g.within.as_deref().and_then(|p| handles.group(p)),
            ) {
                arch.group_mut(group).within(parent);
            }
        }
        for h in &self.hosts {
            if let (Some(host), Some(parent)) = (
                handles.host(&h.id),
                h.within.as_deref().and_then(|p| handles.group(p)),
            ) {
                arch.host_mut(host).within(parent);
            }
        }
        for i in &self.instances {
            if let (Some(instance), Some(parent)) = (
                handles.instance(&i.id),
                i.within.as_deref().and_then(|p| handles.group(p)),
            ) {
                arch.instance_mut(instance).within(parent);
            }
        }
        for i in &self.instances {
            if let (Some(instance), Some(host)) = (
                handles.instance(&i.id),
                i.on.as_deref().and_then(|h| handles.host(h)),
            ) {
                arch.instance_mut(instance).on(host);
            }
        }

        for s in &self.systems {
            let links = s
                .links
                .iter()
                .filter_map(|spec| {
                    let Some(path) = handles.path(&spec.path) else {
                        tracing::warn!(system = %s.name, path = ?spec.path, "skipping link with an unresolved instance");
                        return None;
                    };
                    spec.declare(arch, &path)
                })
                .collect();
            handles.systems.push(links);
        }
        handles
    }

    /// DOT text of every system, rendered in a single session without processors.
    pub fn render_dot(&self) -> Vec<(String, String)> {
        let mut arch = Architecture::new().with_theme(self.options().theme());
        let handles = self.declare(&mut arch);
        self.systems
            .iter()
            .enumerate()
            .map(|(index, spec)| {
                let dot = spec.select(&arch, &handles, index).render();
                (spec.name.clone(), dot)
            })
            .collect()
    }

    pub fn providers(self: &Arc<Self>) -> Vec<Provider<DocumentHandles>> {
        (0..self.systems.len())
            .map(|index| {
                let doc = Arc::clone(self);
                Provider::new(move |arch, handles: &DocumentHandles| {
                    doc.systems[index].select(arch, handles, index)
                })
            })
            .collect()
    }

    pub fn processors(self: &Arc<Self>) -> Vec<Processor<DocumentHandles>> {
        (0..self.processors.len())
            .map(|index| {
                let doc = Arc::clone(self);
                let name = self.processors[index].name.clone();
                Processor::new(name, move |arch, handles: &DocumentHandles| {
                    let spec = &doc.processors[index];
                    let labels = spec
                        .details
                        .iter()
                        .map(|l| (handles.instances(&l.targets), l.text.as_str()));
                    details(arch, &spec.name, labels);
                })
            })
            .collect()
    }

    /// Runs [`generate`] over every system and processor of the document.
    pub fn generate(&self, renderer: &dyn DotRenderer) -> GenerateReport {
        let doc = Arc::new(self.clone());
        let providers = doc.providers();
        let processors = doc.processors();
        let model = {
            let doc = Arc::clone(&doc);
            move |arch: &mut Architecture| doc.declare(arch)
        };
        generate(model, &providers, &processors, &doc.options(), renderer)
    }
}

impl SystemSpec {
    fn select<'a>(
        &self,
        arch: &'a Architecture,
        handles: &DocumentHandles,
        index: usize,
    ) -> System<'a> {
        let mut system = arch
            .system(self.name.as_str())
            .is(handles.system_links(index).iter().copied());
        if !self.contains.is_empty() {
            system = system.contains(self.contains.iter().filter_map(|id| handles.node(id)));
        }
        if let Some(only) = &self.only {
            system = system.only(only.iter().cloned());
        }
        system
    }
}

impl LinkSpec {
    fn declare(&self, arch: &mut Architecture, path: &[InstanceId]) -> Option<LinkId> {
        let [first, second, rest @ ..] = path else {
            return None;
        };
        let mut link = self.decorate(arch.to(*first, *second));
        let head = link.id();
        for &next in rest {
            link = self.decorate(link.to(next));
        }
        if let Some(label) = &self.label {
            link.name(label.as_str());
        }
        Some(head)
    }

    fn decorate<'a>(&self, link: LinkMut<'a>) -> LinkMut<'a> {
        let mut link = match self.kind {
            LinkKind::Uses => link,
            LinkKind::Configuration => link.configuration(),
            LinkKind::Creation => link.creation(),
        };
        if self.dynamic {
            link = link.dynamic();
        }
        if self.bidirectional {
            link = link.bidirectional();
        }
        if self.single {
            link = link.single();
        }
        link
    }
}
