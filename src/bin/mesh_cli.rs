use std::path::Path;

use mesh_query_engine::engine::UdimTile;
use mesh_query_engine::geom::Point3;
use mesh_query_engine::io::read_obj;
use mesh_query_engine::selection::{ComponentKind, SelectMode, parse_component_selection};
use mesh_query_engine::{MeshProvider, MeshQueryEngine, MeshSnapshot, Space, debug_log};
use serde::Serialize;

const USAGE: &str = r#"mesh_cli (mesh-query-engine)

USAGE:
  mesh_cli info <mesh.obj> [options]
  mesh_cli uv <mesh.obj> <u> <v> [options]
  mesh_cli closest <mesh.obj> <x> <y> <z> [options]
  mesh_cli march <mesh.obj> <vertex>... [options]
  mesh_cli neighbours <mesh.obj> <vertex>... [options]
  mesh_cli udim <mesh.obj> [options]
  mesh_cli select <mesh.obj> <component path>... [options]

OPTIONS:
  --uv-set <name>         UV set to query (default: the current set)
  --space <object|world>  Reference frame for `info` bounds (default: object)
  --json                  Print results as JSON
  -h, --help              Show this help
"#;

fn main() {
    mesh_query_engine::init_logger();
    if let Err(err) = run() {
        eprintln!("mesh_cli error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut args = Args::new(args);

    let Some(command) = args.next() else {
        print_usage();
        return Ok(());
    };
    if matches!(command.as_str(), "-h" | "--help" | "help") {
        print_usage();
        return Ok(());
    }

    let options = Options::parse(&mut args)?;
    if options.help {
        print_usage();
        return Ok(());
    }
    debug_log!("mesh_cli {command} {:?}", options.positional);

    let mut positional = options.positional.iter().map(String::as_str);
    let path = positional
        .next()
        .ok_or_else(|| format!("missing mesh path\n\n{USAGE}"))?;
    let rest: Vec<&str> = positional.collect();
    let mesh = load(Path::new(path))?;
    let mut engine = MeshQueryEngine::new(mesh);

    let output = match command.as_str() {
        "info" => cmd_info(&mut engine, &options),
        "uv" => cmd_uv(&mut engine, &options, &rest),
        "closest" => cmd_closest(&mut engine, &options, &rest),
        "march" => cmd_march(&mut engine, &options, &rest),
        "neighbours" | "neighbors" => cmd_neighbours(&mut engine, &options, &rest),
        "udim" => cmd_udim(&mut engine, &options),
        "select" => cmd_select(&engine, &options, &rest),
        other => Err(format!("unknown command `{other}`\n\n{USAGE}")),
    }?;
    println!("{output}");
    Ok(())
}

fn print_usage() {
    println!("{USAGE}");
}

fn load(path: &Path) -> Result<MeshSnapshot, String> {
    read_obj(path).map_err(|e| format!("read {}: {e}", path.display()))
}

#[derive(Debug, Default)]
struct Options {
    uv_set: Option<String>,
    space: Space,
    json: bool,
    help: bool,
    positional: Vec<String>,
}

impl Options {
    fn parse(args: &mut Args) -> Result<Self, String> {
        let mut options = Self::default();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--uv-set" => options.uv_set = Some(args.value("--uv-set")?),
                "--space" => options.space = args.value("--space")?.parse()?,
                "--json" => options.json = true,
                "-h" | "--help" => options.help = true,
                flag if flag.starts_with("--") => {
                    return Err(format!("unknown option `{flag}`\n\n{USAGE}"));
                }
                _ => options.positional.push(arg),
            }
        }
        Ok(options)
    }

    fn uv_set(&self) -> Option<&str> {
        self.uv_set.as_deref()
    }

    fn render<T: Serialize>(
        &self,
        value: &T,
        text: impl FnOnce() -> String,
    ) -> Result<String, String> {
        if self.json {
            serde_json::to_string_pretty(value).map_err(|e| format!("json: {e}"))
        } else {
            Ok(text())
        }
    }
}

type Engine = MeshQueryEngine<MeshSnapshot>;

#[derive(Serialize)]
struct InfoReport<'a> {
    name: &'a str,
    space: Space,
    bounds: Option<[[f64; 3]; 2]>,
    uv_sets: Vec<&'a str>,
    current_uv_set: Option<&'a str>,
    diagnostics: mesh_query_engine::engine::MeshDiagnostics,
}

fn cmd_info(engine: &mut Engine, options: &Options) -> Result<String, String> {
    let bounds = engine
        .bounding_box(options.space)
        .map_err(|e| e.to_string())?
        .map(|bbox| [bbox.min.to_array(), bbox.max.to_array()]);
    let diagnostics = engine.diagnostics().map_err(|e| e.to_string())?;
    let mesh = engine.provider();
    let report = InfoReport {
        name: mesh.name(),
        space: options.space,
        bounds,
        uv_sets: mesh.uv_set_names().collect(),
        current_uv_set: mesh.current_uv_set(),
        diagnostics,
    };

    options.render(&report, || {
        let mut text = format!("{} ({} space)\n", report.name, report.space);
        match report.bounds {
            Some([min, max]) => text.push_str(&format!("  Bounds: {min:?} .. {max:?}\n")),
            None => text.push_str("  Bounds: empty\n"),
        }
        text.push_str(&format!(
            "  UV sets: {} (current: {})\n",
            report.uv_sets.join(", "),
            report.current_uv_set.unwrap_or("none")
        ));
        text.push_str(&report.diagnostics.to_string());
        text.trim_end().to_owned()
    })
}

fn cmd_uv(engine: &mut Engine, options: &Options, rest: &[&str]) -> Result<String, String> {
    let [u, v] = parse_numbers::<2>(rest, "<u> <v>")?;
    let hit = engine
        .get_closest_at_uv(u, v, options.uv_set())
        .map_err(|e| e.to_string())?;
    options.render(&hit, || match hit {
        Some(hit) => format!(
            "point {:?} in triangle {:?} (weights {:?})",
            hit.point.to_array(),
            hit.triangle,
            hit.barycentric
        ),
        None => format!("({u}, {v}) is outside the UV layout"),
    })
}

fn cmd_closest(engine: &mut Engine, options: &Options, rest: &[&str]) -> Result<String, String> {
    let [x, y, z] = parse_numbers::<3>(rest, "<x> <y> <z>")?;
    let hits = engine
        .point_on_mesh([Point3::new(x, y, z)], options.uv_set())
        .map_err(|e| e.to_string())?;
    let hit = hits.first().ok_or("mesh has no triangles")?;
    options.render(hit, || {
        format!(
            "point {:?} on face {} at distance {:.6}, uv ({}, {})",
            hit.surface.point.to_array(),
            hit.surface.face,
            hit.surface.distance,
            hit.u,
            hit.v
        )
    })
}

fn cmd_march(engine: &mut Engine, options: &Options, rest: &[&str]) -> Result<String, String> {
    let seeds = parse_ids(rest)?;
    let rings = engine.march_vert_array(&seeds).map_err(|e| e.to_string())?;
    options.render(&rings, || {
        rings
            .iter()
            .enumerate()
            .map(|(depth, ring)| format!("{depth}: {ring:?}"))
            .collect::<Vec<_>>()
            .join("\n")
    })
}

fn cmd_neighbours(engine: &mut Engine, options: &Options, rest: &[&str]) -> Result<String, String> {
    let ids = parse_ids(rest)?;
    let neighbours = engine.get_neighbour_verts(&ids).map_err(|e| e.to_string())?;
    options.render(&neighbours, || format!("{neighbours:?}"))
}

fn cmd_udim(engine: &mut Engine, options: &Options) -> Result<String, String> {
    #[derive(Serialize)]
    struct UdimReport {
        tile: Option<UdimTile>,
        number: Option<i64>,
    }

    let tile = engine
        .get_uv_udim(options.uv_set())
        .map_err(|e| e.to_string())?;
    let report = UdimReport {
        tile,
        number: tile.map(UdimTile::number),
    };
    options.render(&report, || match tile {
        Some(tile) => format!("UDIM {} (tile {}, {})", tile.number(), tile.u, tile.v),
        None => "UV layout spans more than one UDIM tile".to_owned(),
    })
}

fn cmd_select(engine: &Engine, options: &Options, rest: &[&str]) -> Result<String, String> {
    let selection = parse_component_selection(rest).map_err(|e| e.to_string())?;
    let name = engine.provider().name();
    if selection.mesh != name {
        return Err(format!("selection names `{}`, loaded mesh is `{name}`", selection.mesh));
    }
    let mut paths: Vec<String> = Vec::new();
    let ids = &selection.ids;
    match selection.kind {
        ComponentKind::Vertex => engine.select_verts(ids, &mut paths, SelectMode::Replace),
        ComponentKind::Edge => engine.select_edges(ids, &mut paths, SelectMode::Replace),
        ComponentKind::Face => engine.select_faces(ids, &mut paths, SelectMode::Replace),
    }
    .map_err(|e| e.to_string())?;
    options.render(&paths, || paths.join("\n"))
}

fn parse_numbers<const N: usize>(rest: &[&str], expected: &str) -> Result<[f64; N], String> {
    if rest.len() != N {
        return Err(format!("expected {expected}\n\n{USAGE}"));
    }
    let mut values = [0.0; N];
    for (slot, text) in values.iter_mut().zip(rest) {
        *slot = text
            .parse()
            .map_err(|_| format!("invalid number `{text}`"))?;
    }
    Ok(values)
}

fn parse_ids(rest: &[&str]) -> Result<Vec<usize>, String> {
    rest.iter()
        .map(|text| {
            text.parse()
                .map_err(|_| format!("invalid vertex id `{text}`"))
        })
        .collect()
}

struct Args {
    args: Vec<String>,
    pos: usize,
}

impl Args {
    fn new(args: Vec<String>) -> Self {
        Self { args, pos: 0 }
    }

    fn next(&mut self) -> Option<String> {
        let arg = self.args.get(self.pos)?.clone();
        self.pos += 1;
        Some(arg)
    }

    fn value(&mut self, flag: &str) -> Result<String, String> {
        self.next()
            .ok_or_else(|| format!("missing value for {flag}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plane() -> Engine {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/plane.obj");
        MeshQueryEngine::new(load(&path).expect("plane fixture"))
    }

    fn options(args: &[&str]) -> Options {
        let mut args = Args::new(args.iter().map(|a| (*a).to_owned()).collect());
        Options::parse(&mut args).expect("options")
    }

    #[test]
    fn options_split_flags_from_positionals() {
        let parsed = options(&["plane.obj", "--json", "--uv-set", "map1", "--space", "world"]);
        assert!(parsed.json);
        assert_eq!(parsed.uv_set(), Some("map1"));
        assert_eq!(parsed.space, Space::World);
        assert_eq!(parsed.positional, vec!["plane.obj"]);

        let mut args = Args::new(vec!["--uv-set".to_owned()]);
        assert!(Options::parse(&mut args).is_err());
    }

    #[test]
    fn uv_command_prints_the_containing_triangle() {
        let mut engine = plane();
        let text = cmd_uv(&mut engine, &options(&[]), &["0.25", "0.5"]).expect("uv");
        assert!(text.starts_with("point ["), "{text}");
        assert!(text.contains("in triangle ["), "{text}");

        let json = cmd_uv(&mut engine, &options(&["--json"]), &["0.25", "0.5"]).expect("uv");
        let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");
        let x = value["point"]["x"].as_f64().expect("x");
        assert!((x - 0.5).abs() < 1e-9);

        let outside = cmd_uv(&mut engine, &options(&[]), &["5", "5"]).expect("uv");
        assert_eq!(outside, "(5, 5) is outside the UV layout");

        assert!(cmd_uv(&mut engine, &options(&[]), &["0.5"]).is_err());
    }

    #[test]
    fn udim_and_select_commands() {
        let mut engine = plane();
        assert_eq!(
            cmd_udim(&mut engine, &options(&[])).expect("udim"),
            "UDIM 1001 (tile 0, 0)"
        );
        assert_eq!(
            cmd_select(&engine, &options(&[]), &["plane.vtx[1:2]"]).expect("select"),
            "plane.vtx[1]\nplane.vtx[2]"
        );
        assert!(cmd_select(&engine, &options(&[]), &["other.vtx[0]"]).is_err());
        assert!(cmd_select(&engine, &options(&[]), &["plane.f[9]"]).is_err());
    }

    #[test]
    fn march_and_info_commands() {
        let mut engine = plane();
        assert_eq!(
            cmd_march(&mut engine, &options(&[]), &["0"]).expect("march"),
            "0: [0]\n1: [1, 3]\n2: [2, 4]\n3: [5]"
        );
        let info = cmd_info(&mut engine, &options(&[])).expect("info");
        assert!(info.starts_with("plane (object space)"), "{info}");
        assert!(info.contains("UV sets: map1 (current: map1)"), "{info}");
    }
}
