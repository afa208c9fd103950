//! Graphviz DOT output.
//!
//! The output is fully determined by the session state: containers are written in registration
//! order, children in insertion order, and every edge points from the lower element id to the
//! higher one.

use crate::architecture::Architecture;
use crate::model::{GroupId, HostId, InstanceId, Link, LinkId, NodeRef};
use crate::system::System;
use crate::theme::Palette;
use std::borrow::Cow;
use std::fmt::Write as _;

const INDENT: &str = " ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrowDirection {
    Forward,
    Back,
    Both,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    Solid,
    Dashed,
    Dotted,
}

/// Display form of a link, independent of declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanonicalEdge {
    /// Endpoint with the lower element id.
    pub tail: InstanceId,
    pub head: InstanceId,
    /// The declared source is `head`.
    pub backwards: bool,
    pub direction: ArrowDirection,
    pub line: LineStyle,
    /// Drawn in the accent color (configuration or dynamic links).
    pub accent: bool,
    /// Drawn with a doubled stroke to suggest fan-out.
    pub striped: bool,
}

impl CanonicalEdge {
    pub fn of(arch: &Architecture, link: &Link) -> Self {
        let (tail, head, backwards) = if arch[link.source].id < arch[link.target].id {
            (link.source, link.target, false)
        } else {
            (link.target, link.source, true)
        };
        // Only self-links reach here with `tail == head`; they keep the declared direction.
        let backwards = backwards && tail != head;

        let direction = if link.bidirectional {
            ArrowDirection::Both
        } else if backwards {
            ArrowDirection::Back
        } else {
            ArrowDirection::Forward
        };
        let line = if link.configuration {
            LineStyle::Dashed
        } else if link.creation {
            LineStyle::Dotted
        } else {
            LineStyle::Solid
        };

        Self {
            tail,
            head,
            backwards,
            direction,
            line,
            accent: link.configuration || link.dynamic,
            striped: link.multiple && !link.creation,
        }
    }
}

pub(crate) fn render_system(system: &System<'_>) -> String {
    let arch = system.architecture();
    tracing::debug!(
        system = %system.name(),
        theme = %arch.theme(),
        "rendering system"
    );
    let mut writer = DotWriter {
        arch,
        colors: arch.theme().palette(),
        out: String::new(),
    };
    writer.system(system);
    writer.out
}

struct DotWriter<'a> {
    arch: &'a Architecture,
    colors: &'static Palette,
    out: String,
}

impl DotWriter<'_> {
    fn system(&mut self, system: &System<'_>) {
        let c = self.colors;
        self.out.push_str("digraph {\n");
        let _ = writeln!(
            &mut self.out,
            r#" graph [ tooltip = " ", fontname = helvetica, nodesep = 0.5, label = <{}<BR/><BR/><BR/>>, labelloc=top, fontcolor = {}, bgcolor = {}, labeljust=left, fontsize = 10 ]"#,
            system.name(),
            c.label,
            c.background
        );
        let _ = writeln!(
            &mut self.out,
            r#" node [ tooltip = " ", fontname = helvetica, shape = box, style = "filled,rounded", color = {}, fontcolor = {}, fillcolor = invis, fontsize = 14 ]"#,
            c.line, c.node_font
        );
        let _ = writeln!(
            &mut self.out,
            r#" edge [ tooltip = " ", fontname = helvetica, fontcolor = "{0}", color = "{0}" , fontsize = 10 ]"#,
            bare(c.line)
        );
        for node in system.nodes() {
            self.node(node, INDENT);
        }
        for link in system.links() {
            self.link(link, INDENT);
        }
        self.out.push('}');
    }

    fn node(&mut self, node: NodeRef, pad: &str) {
        match node {
            NodeRef::Instance(id) => self.instance(id, pad),
            NodeRef::Host(id) => self.host(id, pad),
            NodeRef::Group(id) => self.group(id, pad),
        }
    }

    fn instance(&mut self, id: InstanceId, pad: &str) {
        let c = self.colors;
        let arch = self.arch;
        let instance = &arch[id];
        let _ = write!(
            &mut self.out,
            r#"{pad}{} [ label = <<TABLE BORDER="0"><TR><TD>{}</TD></TR>"#,
            instance.id, instance.name
        );
        if let Some(details) = instance.details() {
            let _ = write!(
                &mut self.out,
                r#"<TR><TD><FONT POINT-SIZE="10">{details}</FONT></TD></TR>"#
            );
        }
        self.out.push_str("</TABLE>>");
        if instance.multiple {
            let _ = write!(
                &mut self.out,
                ", fontcolor = {}, fillcolor = {}",
                c.node_font, c.replicated_fill
            );
        }
        self.out.push_str(" ];\n");
    }

    fn host(&mut self, id: HostId, pad: &str) {
        let c = self.colors;
        let arch = self.arch;
        let host = &arch[id];
        let filled = if host.multiple { ",style=filled" } else { "" };
        let _ = writeln!(&mut self.out, "{pad}subgraph cluster_{} {{", host.id);
        let _ = writeln!(
            &mut self.out,
            r#"{pad} graph [ tooltip = " ", style=solid, label="", penwidth = 2, color = {}, fillcolor={} {filled} ];"#,
            c.border, c.host_fill
        );
        let inner = format!("{pad}{INDENT}");
        for &instance in &host.instances {
            self.instance(instance, &inner);
        }
        let _ = writeln!(&mut self.out, "{pad}}}");
    }

    fn group(&mut self, id: GroupId, pad: &str) {
        let c = self.colors;
        let arch = self.arch;
        let group = &arch[id];
        let style = match &group.name {
            Some(name) => format!(
                r#"label="{}", style=dashed, color={}, fontcolor={}"#,
                escape_quotes(name),
                c.border,
                c.label
            ),
            None => r#"label="", color=invis"#.to_string(),
        };
        let _ = writeln!(&mut self.out, "{pad}subgraph cluster_{} {{", group.id);
        let _ = writeln!(&mut self.out, "{pad} graph [ {style} ];");
        let inner = format!("{pad}{INDENT}");
        for &child in &group.children {
            self.node(child, &inner);
        }
        let _ = writeln!(&mut self.out, "{pad}}}");
    }

    fn link(&mut self, id: LinkId, pad: &str) {
        let c = self.colors;
        let arch = self.arch;
        let link = &arch[id];
        let edge = CanonicalEdge::of(arch, link);

        let mut options: Vec<String> = Vec::new();
        match edge.direction {
            ArrowDirection::Both => options.push("dir = both".to_string()),
            ArrowDirection::Back => options.push("dir = back".to_string()),
            ArrowDirection::Forward => {}
        }
        match edge.line {
            LineStyle::Dashed => options.push("style = dashed".to_string()),
            LineStyle::Dotted => options.push("style = dotted".to_string()),
            LineStyle::Solid => {}
        }
        if let Some(label) = &link.label {
            options.push(format!(r#"label = " {} ""#, escape_quotes(label)));
        }
        let color = if edge.accent {
            let accent = bare(c.accent);
            options.push(format!(r#"fontcolor = "{accent}""#));
            accent
        } else {
            bare(c.line)
        };
        if edge.striped {
            options.push(format!(r#"color = "{color}:{color}""#));
        } else if edge.accent {
            options.push(format!(r#"color = "{color}""#));
        }

        let _ = writeln!(
            &mut self.out,
            "{pad}{} -> {} [ {} ];",
            arch[edge.tail].id,
            arch[edge.head].id,
            options.join(", ")
        );
    }
}

/// Escapes `"` for use inside a quoted DOT string. HTML labels (`<...>`) are written as is.
fn escape_quotes(text: &str) -> Cow<'_, str> {
    if text.contains('"') {
        Cow::Owned(text.replace('"', "\\\""))
    } else {
        Cow::Borrowed(text)
    }
}

/// Strips the quotes palette entries carry for DOT, for use inside an already quoted value.
fn bare(color: &str) -> &str {
    color.trim_matches('"')
}
