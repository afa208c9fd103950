//! Graphviz invocation. DOT text goes in, image bytes come out.

use crate::{Error, Result};
use std::io::Write as _;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::str::FromStr;

/// Turns a DOT document into an image.
pub trait DotRenderer {
    fn render(&self, dot: &str) -> Result<Vec<u8>>;

    /// File extension of the produced images.
    fn extension(&self) -> &str {
        "svg"
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ImageFormat {
    #[default]
    Svg,
    Png,
    Pdf,
}

impl ImageFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            ImageFormat::Svg => "svg",
            ImageFormat::Png => "png",
            ImageFormat::Pdf => "pdf",
        }
    }
}

impl FromStr for ImageFormat {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "svg" => Ok(Self::Svg),
            "png" => Ok(Self::Png),
            "pdf" => Ok(Self::Pdf),
            _ => Err(()),
        }
    }
}

/// Pipes DOT through a locally installed Graphviz binary.
#[derive(Debug, Clone)]
pub struct GraphvizCommand {
    program: String,
    format: ImageFormat,
}

impl Default for GraphvizCommand {
    fn default() -> Self {
        Self {
            program: "dot".to_string(),
            format: ImageFormat::Svg,
        }
    }
}

impl GraphvizCommand {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn with_format(mut self, format: ImageFormat) -> Self {
        self.format = format;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn process_error(&self, source: std::io::Error) -> Error {
        Error::Process {
            program: self.program.clone(),
            source,
        }
    }
}

impl DotRenderer for GraphvizCommand {
    fn render(&self, dot: &str) -> Result<Vec<u8>> {
        let mut child = Command::new(&self.program)
            .arg(format!("-T{}", self.format.as_str()))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.process_error(e))?;

        // Feed stdin from another thread: Graphviz may fill the stdout pipe before it has
        // read all of its input.
        let stdin = child.stdin.take();
        let output = std::thread::scope(|scope| {
            let writer = scope.spawn(move || match stdin {
                Some(mut stdin) => stdin.write_all(dot.as_bytes()),
                None => Ok(()),
            });
            let output = child.wait_with_output();
            let written = writer
                .join()
                .unwrap_or_else(|_| Err(std::io::Error::other("stdin writer panicked")));
            written.and(output)
        })
        .map_err(|e| self.process_error(e))?;

        if !output.status.success() {
            return Err(Error::Graphviz {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output.stdout)
    }

    fn extension(&self) -> &str {
        self.format.as_str()
    }
}

/// Starts `program -Tpng -o <png> <dot>` without waiting for it.
pub(crate) fn spawn_png(program: &str, dot_path: &Path, png_path: &Path) -> Result<Child> {
    Command::new(program)
        .arg("-Tpng")
        .arg("-o")
        .arg(png_path)
        .arg(dot_path)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| Error::Process {
            program: program.to_string(),
            source,
        })
}
