//! Color palettes used by the DOT renderer.
//!
//! Values are emitted verbatim into DOT attributes, so colors that are not plain Graphviz color
//! names carry their own quotes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    /// Fill of replicated instances.
    pub replicated_fill: &'static str,
    /// Default node outline and edge color.
    pub line: &'static str,
    /// Fill of replicated hosts.
    pub host_fill: &'static str,
    /// Host and named group borders.
    pub border: &'static str,
    /// Graph title and group labels.
    pub label: &'static str,
    pub background: &'static str,
    /// Configuration and dynamic links.
    pub accent: &'static str,
    /// Instance label text.
    pub node_font: &'static str,
}

pub const DARK: Palette = Palette {
    replicated_fill: "\"#302315\"",
    line: "bisque",
    host_fill: "darkslategray",
    border: "lightcyan4",
    label: "lightcyan3",
    background: "grey12",
    accent: "aquamarine",
    node_font: "\"#FFF4E7\"",
};

pub const LIGHT: Palette = Palette {
    replicated_fill: "bisque",
    line: "bisque4",
    host_fill: "lightcyan2",
    border: "lightcyan3",
    label: "\"#616f6f\"",
    background: "white",
    accent: "deepskyblue4",
    node_font: "\"#534b40\"",
};

/// Global style selection, resolved once per session before anything is rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// For static documents and image files.
    #[default]
    Dark,
    /// For interactive (HTML) display.
    Light,
}

impl Theme {
    pub fn palette(self) -> &'static Palette {
        match self {
            Theme::Dark => &DARK,
            Theme::Light => &LIGHT,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Theme::Dark => write!(f, "dark"),
            Theme::Light => write!(f, "light"),
        }
    }
}

impl FromStr for Theme {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dark" => Ok(Self::Dark),
            "light" => Ok(Self::Light),
            _ => Err(()),
        }
    }
}
