use archix::{
    Architecture, Document, DotRenderer, Error, GenerateOptions, InstanceId, LinkId, Processor,
    Provider, Result, Theme, details, generate,
};
use std::cell::RefCell;
use std::path::Path;

/// Records every DOT document and answers with a tiny SVG.
#[derive(Default)]
struct FakeRenderer {
    seen: RefCell<Vec<String>>,
}

impl DotRenderer for FakeRenderer {
    fn render(&self, dot: &str) -> Result<Vec<u8>> {
        let mut seen = self.seen.borrow_mut();
        seen.push(dot.to_string());
        Ok(format!("<svg>{}</svg>", seen.len()).into_bytes())
    }
}

impl FakeRenderer {
    fn dots(&self) -> Vec<String> {
        self.seen.borrow().clone()
    }
}

struct FailingRenderer;

impl DotRenderer for FailingRenderer {
    fn render(&self, _dot: &str) -> Result<Vec<u8>> {
        Err(Error::Graphviz {
            program: "fake".to_string(),
            status: "exit status: 1".to_string(),
            stderr: "syntax error".to_string(),
        })
    }
}

struct Shop {
    api: InstanceId,
    db: InstanceId,
    storage: LinkId,
    cache: LinkId,
}

fn shop(arch: &mut Architecture) -> Shop {
    let api = arch.instance("api").id();
    let db = arch.instance("db").id();
    let redis = arch.instance("redis").id();
    let storage = arch.to(api, db).id();
    let cache = arch.to(api, redis).id();
    Shop {
        api,
        db,
        storage,
        cache,
    }
}

fn storage_view() -> Provider<Shop> {
    Provider::new(|arch, h: &Shop| arch.system("storage").is([h.storage]))
}

fn cache_view() -> Provider<Shop> {
    Provider::new(|arch, h: &Shop| arch.system("cache").is([h.cache]))
}

fn tech() -> Processor<Shop> {
    Processor::new("tech", |arch, h: &Shop| {
        details(
            arch,
            "tech",
            [(vec![h.api], "<BR/>rust"), (vec![h.db], "<BR/>postgres")],
        );
    })
}

fn team() -> Processor<Shop> {
    Processor::new("team", |arch, h: &Shop| {
        details(arch, "team", [(vec![h.api, h.db], "<BR/>core")]);
    })
}

fn options_in(dir: &Path) -> GenerateOptions {
    GenerateOptions {
        out_dir: dir.to_path_buf(),
        ..Default::default()
    }
}

fn graph_title(dot: &str) -> &str {
    let start = dot.find("label = <").map(|i| i + "label = <".len()).unwrap_or(0);
    let end = dot[start..].find("<BR/>").map(|i| start + i).unwrap_or(start);
    &dot[start..end]
}

#[test]
fn single_view_writes_one_untitled_svg() {
    let dir = tempfile::tempdir().unwrap();
    let renderer = FakeRenderer::default();

    let report = generate(shop, &[storage_view()], &[], &options_in(dir.path()), &renderer);

    assert!(report.is_success(), "{:?}", report.errors);
    let path = dir.path().join("storage.svg");
    assert_eq!(report.outputs, vec![path.clone()]);
    assert_eq!(std::fs::read_to_string(path).unwrap(), "<svg>1</svg>");

    let dots = renderer.dots();
    assert_eq!(dots.len(), 1);
    assert_eq!(graph_title(&dots[0]), " ");
    assert!(dots[0].contains("bgcolor = grey12"));
}

#[test]
fn one_view_under_several_processors_is_titled_by_processor() {
    let dir = tempfile::tempdir().unwrap();
    let renderer = FakeRenderer::default();

    let report = generate(
        shop,
        &[storage_view()],
        &[tech(), team()],
        &options_in(dir.path()),
        &renderer,
    );

    assert!(report.is_success(), "{:?}", report.errors);
    assert!(dir.path().join("storage-tech.svg").is_file());
    assert!(dir.path().join("storage-team.svg").is_file());

    let dots = renderer.dots();
    assert_eq!(graph_title(&dots[0]), "tech");
    assert_eq!(graph_title(&dots[1]), "team");
    assert!(dots[0].contains("rust"));
    assert!(dots[1].contains("core"));
}

#[test]
fn every_variant_starts_from_a_fresh_session() {
    let dir = tempfile::tempdir().unwrap();
    let renderer = FakeRenderer::default();

    generate(
        shop,
        &[storage_view()],
        &[tech(), team()],
        &options_in(dir.path()),
        &renderer,
    );

    let dots = renderer.dots();
    assert!(!dots[1].contains("rust"), "{}", dots[1]);
    assert!(dots[0].contains("instance_100 ["));
    assert!(dots[1].contains("instance_100 ["));
}

#[test]
fn several_views_are_titled_by_output_name() {
    let dir = tempfile::tempdir().unwrap();
    let renderer = FakeRenderer::default();

    let report = generate(
        shop,
        &[storage_view(), cache_view()],
        &[tech()],
        &options_in(dir.path()),
        &renderer,
    );

    assert_eq!(report.outputs.len(), 2);
    let titles: Vec<String> = renderer
        .dots()
        .iter()
        .map(|d| graph_title(d).to_string())
        .collect();
    assert_eq!(titles, vec!["storage-tech", "cache-tech"]);
}

#[test]
fn restricted_systems_skip_other_processors() {
    let dir = tempfile::tempdir().unwrap();
    let renderer = FakeRenderer::default();
    let restricted = Provider::new(|arch, h: &Shop| arch.system("storage").is([h.storage]).only(["team"]));

    let report = generate(
        shop,
        &[restricted],
        &[tech(), team()],
        &options_in(dir.path()),
        &renderer,
    );

    assert_eq!(report.skipped, 1);
    assert!(!dir.path().join("storage-tech.svg").exists());
    assert!(dir.path().join("storage-team.svg").is_file());
}

#[test]
fn grid_collects_svgs_in_a_light_table() {
    let renderer = FakeRenderer::default();
    let options = GenerateOptions {
        grid: true,
        header: true,
        out_dir: "unused".into(),
        ..Default::default()
    };

    let report = generate(
        shop,
        &[storage_view(), cache_view()],
        &[tech(), team()],
        &options,
        &renderer,
    );

    let html = report.grid.expect("grid output");
    assert!(html.starts_with("<table class='archix-table'>"));
    assert!(html.contains("<tr><th></th><th>tech</th><th>team</th></tr>"));
    assert!(html.contains("<tr><th>storage</th><td><svg>1</svg></td><td><svg>2</svg></td></tr>"));
    assert!(html.contains("<tr><th>cache</th><td><svg>3</svg></td><td><svg>4</svg></td></tr>"));
    assert!(report.outputs.is_empty());
    assert!(renderer.dots().iter().all(|d| d.contains("bgcolor = white")));
}

#[test]
fn explicit_theme_wins_in_grid_mode() {
    let renderer = FakeRenderer::default();
    let options = GenerateOptions {
        grid: true,
        theme: Some(Theme::Dark),
        ..Default::default()
    };

    generate(shop, &[storage_view()], &[], &options, &renderer);
    assert!(renderer.dots()[0].contains("bgcolor = grey12"));
}

#[test]
fn renderer_failures_are_collected_and_generation_continues() {
    let dir = tempfile::tempdir().unwrap();

    let report = generate(
        shop,
        &[storage_view(), cache_view()],
        &[],
        &options_in(dir.path()),
        &FailingRenderer,
    );

    assert_eq!(report.errors.len(), 2);
    assert!(!report.is_success());
    assert!(report.errors[0].to_string().contains("syntax error"));
}

#[test]
fn native_mode_writes_dot_files_before_spawning_graphviz() {
    let dir = tempfile::tempdir().unwrap();
    let options = GenerateOptions {
        native: true,
        dot_program: "archix-test-no-such-graphviz".to_string(),
        ..options_in(dir.path())
    };

    let report = generate(
        shop,
        &[storage_view()],
        &[],
        &options,
        &FakeRenderer::default(),
    );

    let dot = std::fs::read_to_string(dir.path().join("storage.dot")).unwrap();
    assert!(dot.starts_with("digraph {"));
    assert_eq!(report.errors.len(), 1);
    assert!(matches!(report.errors[0], Error::Process { .. }));
    assert!(!dir.path().join("storage.png").exists());
}

#[test]
fn documents_generate_every_system_and_processor() {
    let dir = tempfile::tempdir().unwrap();
    let doc = Document::from_yaml_str(&format!(
        r#"
options:
  out_dir: {}
instances:
  - {{ id: api }}
  - {{ id: db }}
  - {{ id: queue, multiple: true }}
processors:
  - {{ name: tech, details: [{{ targets: [api], text: "<BR/>rust" }}] }}
  - {{ name: team, details: [{{ targets: [api, db], text: "<BR/>core" }}] }}
systems:
  - {{ name: storage, links: [{{ path: [api, db] }}] }}
  - {{ name: events, only: [team], links: [{{ path: [api, queue], dynamic: true }}] }}
"#,
        dir.path().display()
    ))
    .unwrap();

    let renderer = FakeRenderer::default();
    let report = doc.generate(&renderer);

    assert!(report.is_success(), "{:?}", report.errors);
    assert_eq!(report.skipped, 1);
    for name in ["storage-tech", "storage-team", "events-team"] {
        assert!(dir.path().join(format!("{name}.svg")).is_file(), "{name}");
    }
    assert!(!dir.path().join("events-tech.svg").exists());
}

/// Answers with PNG bytes.
#[derive(Default)]
struct PngRenderer {
    calls: RefCell<usize>,
}

impl DotRenderer for PngRenderer {
    fn render(&self, _dot: &str) -> Result<Vec<u8>> {
        *self.calls.borrow_mut() += 1;
        Ok(vec![0x89, b'P', b'N', b'G', 0xff, 0xfe])
    }

    fn extension(&self) -> &str {
        "png"
    }
}

#[test]
fn grid_refuses_renderers_that_do_not_produce_svg() {
    let renderer = PngRenderer::default();
    let options = GenerateOptions {
        grid: true,
        ..Default::default()
    };

    let report = generate(shop, &[storage_view()], &[], &options, &renderer);

    assert_eq!(report.grid, None);
    assert_eq!(report.errors.len(), 1);
    assert!(
        matches!(&report.errors[0], Error::GridFormat { extension } if extension == "png"),
        "{:?}",
        report.errors
    );
    assert_eq!(*renderer.calls.borrow(), 0);
}

#[test]
fn non_svg_renderers_still_write_image_files() {
    let dir = tempfile::tempdir().unwrap();
    let report = generate(
        shop,
        &[storage_view()],
        &[],
        &options_in(dir.path()),
        &PngRenderer::default(),
    );

    assert!(report.is_success(), "{:?}", report.errors);
    let png = std::fs::read(dir.path().join("storage.png")).unwrap();
    assert!(png.starts_with(&[0x89, b'P', b'N', b'G']));
}

#[cfg(unix)]
#[test]
fn native_mode_collects_the_png_of_a_finished_graphviz_run() {
    use std::os::unix::fs::PermissionsExt as _;

    let dir = tempfile::tempdir().unwrap();
    // Invoked as `<program> -Tpng -o <png> <dot>`.
    let program = dir.path().join("fake-dot.sh");
    std::fs::write(
        &program,
        "#!/bin/sh\ntouch \"$3\"\necho \"rendered $4\"\necho \"warning: fake\" >&2\n",
    )
    .unwrap();
    std::fs::set_permissions(&program, std::fs::Permissions::from_mode(0o755)).unwrap();

    let options = GenerateOptions {
        native: true,
        dot_program: program.to_string_lossy().into_owned(),
        ..options_in(dir.path())
    };
    let report = generate(
        shop,
        &[storage_view(), cache_view()],
        &[],
        &options,
        &FakeRenderer::default(),
    );

    assert!(report.is_success(), "{:?}", report.errors);
    let expected: Vec<_> = ["storage.dot", "cache.dot", "storage.png", "cache.png"]
        .iter()
        .map(|f| dir.path().join(f))
        .collect();
    assert_eq!(report.outputs, expected);
    assert!(dir.path().join("storage.png").is_file());
    assert!(dir.path().join("cache.png").is_file());
}

#[cfg(unix)]
#[test]
fn native_mode_reports_graphviz_exit_failures() {
    use std::os::unix::fs::PermissionsExt as _;

    let dir = tempfile::tempdir().unwrap();
    let program = dir.path().join("broken-dot.sh");
    std::fs::write(&program, "#!/bin/sh\necho \"syntax error in line 1\" >&2\nexit 1\n").unwrap();
    std::fs::set_permissions(&program, std::fs::Permissions::from_mode(0o755)).unwrap();

    let options = GenerateOptions {
        native: true,
        dot_program: program.to_string_lossy().into_owned(),
        ..options_in(dir.path())
    };
    let report = generate(shop, &[storage_view()], &[], &options, &FakeRenderer::default());

    assert_eq!(report.outputs, vec![dir.path().join("storage.dot")]);
    assert_eq!(report.errors.len(), 1);
    assert!(
        report.errors[0].to_string().contains("syntax error in line 1"),
        "{}",
        report.errors[0]
    );
}
