//! Variant driver: renders every system under every processor.
//!
//! Each combination gets a fresh [`Architecture`]: the model closure declares the topology and
//! returns whatever handles the processors and providers need, the processor decorates the
//! session, and the provider selects a [`System`] out of it.

use crate::graphviz::{self, DotRenderer};
use crate::grid::Grid;
use crate::{Architecture, Error, System, Theme};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Child;

type ApplyFn<H> = dyn Fn(&mut Architecture, &H);
type BuildFn<H> = dyn for<'a> Fn(&'a Architecture, &H) -> System<'a>;

/// A named view that decorates a session before rendering (labels, extra details, ...).
pub struct Processor<H> {
    name: Option<String>,
    apply: Box<ApplyFn<H>>,
}

impl<H: 'static> Processor<H> {
    pub fn new(name: impl Into<String>, apply: impl Fn(&mut Architecture, &H) + 'static) -> Self {
        Self {
            name: Some(name.into()),
            apply: Box::new(apply),
        }
    }

    /// Leaves the session untouched. Used when no processors are given.
    pub fn identity() -> Self {
        Self {
            name: None,
            apply: Box::new(|_, _| {}),
        }
    }
}

impl<H> Processor<H> {
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn apply(&self, arch: &mut Architecture, handles: &H) {
        (self.apply)(arch, handles);
    }
}

impl<H> std::fmt::Debug for Processor<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Processor").field("name", &self.name).finish()
    }
}

/// Selects one system out of a declared session.
pub struct Provider<H> {
    build: Box<BuildFn<H>>,
}

impl<H: 'static> Provider<H> {
    pub fn new<F>(build: F) -> Self
    where
        F: for<'a> Fn(&'a Architecture, &H) -> System<'a> + 'static,
    {
        Self {
            build: Box::new(build),
        }
    }
}

impl<H> Provider<H> {
    pub fn build<'a>(&self, arch: &'a Architecture, handles: &H) -> System<'a> {
        (self.build)(arch, handles)
    }
}

impl<H> std::fmt::Debug for Provider<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provider").finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenerateOptions {
    /// Write `.dot` files and let a background Graphviz process produce PNGs.
    pub native: bool,
    /// Add processor and system titles to the grid.
    pub header: bool,
    /// Collect SVGs into an HTML table instead of writing files.
    pub grid: bool,
    pub out_dir: PathBuf,
    /// Defaults to light in grid mode, dark otherwise.
    pub theme: Option<Theme>,
    /// Graphviz binary spawned in native mode.
    pub dot_program: String,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            native: false,
            header: false,
            grid: false,
            out_dir: PathBuf::from("target"),
            theme: None,
            dot_program: "dot".to_string(),
        }
    }
}

impl GenerateOptions {
    pub fn theme(&self) -> Theme {
        self.theme
            .unwrap_or(if self.grid { Theme::Light } else { Theme::Dark })
    }
}

#[derive(Debug, Default)]
pub struct GenerateReport {
    /// Files written, plus PNGs reported by finished Graphviz processes.
    pub outputs: Vec<PathBuf>,
    /// The assembled HTML table in grid mode.
    pub grid: Option<String>,
    /// Combinations left out by a system's processor restriction.
    pub skipped: usize,
    pub errors: Vec<Error>,
}

impl GenerateReport {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    fn fail(&mut self, name: &str, err: Error) {
        tracing::error!(variant = name, error = %err, "variant failed");
        self.errors.push(err);
    }
}

/// Renders every provider under every processor. With no processors, the identity processor
/// is used.
///
/// Collaborator failures are logged and collected in the report; the remaining variants are
/// still produced. Grid mode needs an SVG renderer and produces nothing otherwise.
pub fn generate<H, M>(
    model: M,
    providers: &[Provider<H>],
    processors: &[Processor<H>],
    options: &GenerateOptions,
    renderer: &dyn DotRenderer,
) -> GenerateReport
where
    H: 'static,
    M: Fn(&mut Architecture) -> H,
{
    let identity = [Processor::identity()];
    let processors = if processors.is_empty() {
        &identity[..]
    } else {
        processors
    };

    let theme = options.theme();
    let mut report = GenerateReport::default();
    if options.grid && renderer.extension() != "svg" {
        report.fail(
            "grid",
            Error::GridFormat {
                extension: renderer.extension().to_string(),
            },
        );
        return report;
    }
    let mut grid = options.grid.then(|| Grid::new(options.header));
    let mut pending: Vec<(String, PathBuf, Child)> = Vec::new();

    for provider in providers {
        let mut row_started = false;
        for processor in processors {
            let mut arch = Architecture::new().with_theme(theme);
            let handles = model(&mut arch);
            processor.apply(&mut arch, &handles);

            let mut system = provider.build(&arch, &handles);
            let system_name = system.name().to_string();
            let name = match processor.name() {
                Some(p) => format!("{system_name}-{p}"),
                None => system_name.clone(),
            };
            if providers.len() == 1 {
                if processors.len() == 1 {
                    system.set_name(" ");
                } else {
                    system.set_name(processor.name().unwrap_or_default());
                }
            } else {
                system.set_name(name.as_str());
            }

            let rendered = system.renders(processor.name());
            if !rendered {
                tracing::debug!(variant = %name, "skipped by processor restriction");
                report.skipped += 1;
            }
            let dot = system.render();

            if let Some(grid) = grid.as_mut() {
                if !row_started {
                    grid.start_row(&system_name);
                    row_started = true;
                }
                grid.column(processor.name().unwrap_or_default());
                let cell = if rendered {
                    match renderer.render(&dot) {
                        Ok(image) => String::from_utf8_lossy(&image).into_owned(),
                        Err(err) => {
                            report.fail(&name, err);
                            String::new()
                        }
                    }
                } else {
                    String::new()
                };
                grid.cell(&cell);
            } else if !rendered {
                continue;
            } else if !options.native {
                let path = options
                    .out_dir
                    .join(format!("{name}.{}", renderer.extension()));
                match render_to_file(renderer, &dot, &path) {
                    Ok(()) => {
                        tracing::info!(path = %path.display(), "wrote {name}");
                        report.outputs.push(path);
                    }
                    Err(err) => report.fail(&name, err),
                }
            } else {
                let dot_path = options.out_dir.join(format!("{name}.dot"));
                let png_path = options.out_dir.join(format!("{name}.png"));
                if let Err(err) = write_file(&dot_path, dot.as_bytes()) {
                    report.fail(&name, err);
                    continue;
                }
                report.outputs.push(dot_path.clone());
                match graphviz::spawn_png(&options.dot_program, &dot_path, &png_path) {
                    Ok(child) => pending.push((name, png_path, child)),
                    Err(err) => report.fail(&name, err),
                }
            }
        }
    }

    for (name, png_path, child) in pending {
        match child.wait_with_output() {
            Err(source) => report.fail(
                &name,
                Error::Process {
                    program: options.dot_program.clone(),
                    source,
                },
            ),
            Ok(output) if !output.status.success() => report.fail(
                &name,
                Error::Graphviz {
                    program: options.dot_program.clone(),
                    status: output.status.to_string(),
                    stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
                },
            ),
            Ok(output) => {
                tracing::info!("{name}");
                let stdout = String::from_utf8_lossy(&output.stdout);
                let stderr = String::from_utf8_lossy(&output.stderr);
                if stdout.len() > 2 {
                    tracing::info!("{stdout}");
                }
                if stderr.len() > 2 {
                    tracing::warn!("{stderr}");
                }
                report.outputs.push(png_path);
            }
        }
    }

    report.grid = grid.map(Grid::finish);
    report
}

fn render_to_file(renderer: &dyn DotRenderer, dot: &str, path: &Path) -> crate::Result<()> {
    let image = renderer.render(dot)?;
    write_file(path, &image)
}

fn write_file(path: &Path, bytes: &[u8]) -> crate::Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
    }
    std::fs::write(path, bytes).map_err(|e| Error::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_defaults_to_the_light_palette() {
        let options = GenerateOptions {
            grid: true,
            ..Default::default()
        };
        assert_eq!(options.theme(), Theme::Light);
        assert_eq!(GenerateOptions::default().theme(), Theme::Dark);

        let options = GenerateOptions {
            grid: true,
            theme: Some(Theme::Dark),
            ..Default::default()
        };
        assert_eq!(options.theme(), Theme::Dark);
    }

    #[test]
    fn options_deserialize_with_defaults() {
        let options: GenerateOptions =
            serde_json::from_str(r#"{ "native": true, "out_dir": "out" }"#).unwrap();
        assert!(options.native);
        assert!(!options.grid);
        assert_eq!(options.out_dir, PathBuf::from("out"));
        assert_eq!(options.dot_program, "dot");
    }

    #[test]
    fn identity_processor_has_no_name() {
        let p: Processor<()> = Processor::identity();
        assert_eq!(p.name(), None);
        let mut arch = Architecture::new();
        p.apply(&mut arch, &());
        assert_eq!(arch.instances().count(), 0);
    }
}
