#![forbid(unsafe_code)]

use archix::{Document, GraphvizCommand, ImageFormat, Theme};
use std::io::Read;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

#[derive(Debug)]
enum CliError {
    Usage(&'static str),
    Io(std::io::Error),
    Write {
        path: String,
        source: std::io::Error,
    },
    Archix(archix::Error),
    Failed(usize),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Write { path, source } => write!(f, "failed to write {path}: {source}"),
            CliError::Archix(err) => write!(f, "{err}"),
            CliError::Failed(n) => write!(f, "{n} variant(s) failed to render"),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<archix::Error> for CliError {
    fn from(value: archix::Error) -> Self {
        Self::Archix(value)
    }
}

#[derive(Debug, Default)]
struct Args {
    input: Option<String>,
    theme: Option<Theme>,
    format: ImageFormat,
    native: bool,
    grid: bool,
    header: bool,
    out_dir: Option<String>,
    html: Option<String>,
    dot: bool,
}

fn usage() -> &'static str {
    "archix-cli\n\
\n\
USAGE:\n\
  archix-cli [render] [--theme dark|light] [--format svg|png|pdf] [--native] [--grid] [--header] [--out-dir <dir>] [--html <path>] [--dot] [<path>|-]\n\
\n\
NOTES:\n\
  - If <path> is omitted or '-', a JSON or YAML document is read from stdin.\n\
  - Files ending in .yaml/.yml are read as YAML, anything else as JSON.\n\
  - --dot prints the DOT text of every system instead of calling Graphviz.\n\
  - --html writes the grid table to a file (implies --grid); otherwise the grid is printed.\n\
  - --grid and --html only work with --format svg.\n\
  - Command-line flags override the document's options.\n\
  - Set RUST_LOG (e.g. RUST_LOG=archix=debug) for more output.\n\
"
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args::default();

    let mut it = argv.iter().skip(1);
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "render" => {}
            "--native" => args.native = true,
            "--grid" => args.grid = true,
            "--header" => args.header = true,
            "--dot" => args.dot = true,
            "--theme" => {
                let Some(theme) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.theme = Some(theme.parse().map_err(|_| CliError::Usage(usage()))?);
            }
            "--format" => {
                let Some(fmt) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.format = fmt
                    .parse::<ImageFormat>()
                    .map_err(|_| CliError::Usage(usage()))?;
            }
            "--out-dir" => {
                let Some(dir) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.out_dir = Some(dir.clone());
            }
            "--html" => {
                let Some(out) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.html = Some(out.clone());
                args.grid = true;
            }
            "-" => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.input = Some("-".to_string());
            }
            other if other.starts_with('-') => return Err(CliError::Usage(usage())),
            path => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.input = Some(path.to_string());
            }
        }
    }
    // Grid cells inline the rendered images as markup.
    if args.grid && args.format != ImageFormat::Svg {
        return Err(CliError::Usage(usage()));
    }

    Ok(args)
}

fn load_document(input: Option<&str>) -> Result<Document, CliError> {
    match input {
        None | Some("-") => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            // YAML also accepts JSON documents.
            Ok(Document::from_yaml_str(&buf)?)
        }
        Some(path) => Ok(Document::load(path)?),
    }
}

fn run(args: Args) -> Result<(), CliError> {
    let mut doc = load_document(args.input.as_deref())?;
    if args.theme.is_some() {
        doc.theme = args.theme;
    }
    doc.options.native |= args.native;
    doc.options.grid |= args.grid;
    doc.options.header |= args.header;
    if let Some(dir) = args.out_dir {
        doc.options.out_dir = dir.into();
    }

    if args.dot {
        for (name, dot) in doc.render_dot() {
            println!("// {name}");
            println!("{dot}");
        }
        return Ok(());
    }

    let renderer = GraphvizCommand::new().with_format(args.format);
    let report = doc.generate(&renderer);

    if let Some(html) = report.grid.as_deref() {
        match args.html.as_deref() {
            Some(path) => {
                std::fs::write(path, html).map_err(|source| CliError::Write {
                    path: path.to_string(),
                    source,
                })?;
                println!("{path}");
            }
            None => println!("{html}"),
        }
    }
    for path in &report.outputs {
        println!("{}", path.display());
    }
    tracing::debug!(
        outputs = report.outputs.len(),
        skipped = report.skipped,
        "generation finished"
    );

    if report.errors.is_empty() {
        Ok(())
    } else {
        Err(CliError::Failed(report.errors.len()))
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

fn main() {
    let args = match parse_args(&std::env::args().collect::<Vec<_>>()) {
        Ok(v) => v,
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };
    init_tracing();

    if let Err(err) = run(args) {
        eprintln!("{err}");
        std::process::exit(1);
    }
}
