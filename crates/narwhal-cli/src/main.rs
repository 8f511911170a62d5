use narwhal::raster::{self, RasterOptions};
use narwhal::render::HitGeometry;
use narwhal::{Headless, HeadlessError, Plot, ToolScript, Tooltip};
use serde::Serialize;
use std::io::{Read, Write};
use std::str::FromStr;
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
enum CliError {
    Usage(&'static str),
    Io(std::io::Error),
    Headless(HeadlessError),
    Raster(raster::RasterError),
    Json(serde_json::Error),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Headless(err) => write!(f, "{err}"),
            CliError::Raster(err) => write!(f, "{err}"),
            CliError::Json(err) => write!(f, "JSON error: {err}"),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<HeadlessError> for CliError {
    fn from(value: HeadlessError) -> Self {
        Self::Headless(value)
    }
}

impl From<narwhal::render::Error> for CliError {
    fn from(value: narwhal::render::Error) -> Self {
        Self::Headless(value.into())
    }
}

impl From<raster::RasterError> for CliError {
    fn from(value: raster::RasterError) -> Self {
        Self::Raster(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

#[derive(Debug, Clone, Copy, Default)]
enum Command {
    #[default]
    Render,
    Replay,
    Hit,
}

#[derive(Debug, Clone, Copy, Default)]
enum RenderFormat {
    #[default]
    Svg,
    Png,
    Jpeg,
    Pdf,
}

impl RenderFormat {
    fn extension(self) -> &'static str {
        match self {
            RenderFormat::Svg => "svg",
            RenderFormat::Png => "png",
            RenderFormat::Jpeg => "jpg",
            RenderFormat::Pdf => "pdf",
        }
    }
}

impl FromStr for RenderFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "svg" => Ok(Self::Svg),
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            "pdf" => Ok(Self::Pdf),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Default)]
struct Args {
    command: Command,
    input: Option<String>,
    pretty: bool,
    render_format: RenderFormat,
    render_scale: f32,
    background: Option<String>,
    out: Option<String>,
    events: Option<String>,
    svg: Option<String>,
    sx: Option<f64>,
    sy: Option<f64>,
    renderer: Option<usize>,
}

#[derive(Serialize)]
struct ReplayOut<'a> {
    sources: serde_json::Value,
    tooltips: Vec<&'a Tooltip>,
}

#[derive(Serialize)]
struct HitOut {
    renderer: usize,
    name: String,
    selection: narwhal::model::Selection,
}

fn usage() -> &'static str {
    "narwhal-cli\n\
\n\
USAGE:\n\
  narwhal-cli [render] [--format svg|png|jpg|pdf] [--scale <n>] [--background <css-color>] [--out <path>] [<scene.json>|-]\n\
  narwhal-cli replay --events <script.json> [--pretty] [--svg <path>] [<scene.json>|-]\n\
  narwhal-cli hit --sx <x> --sy <y> [--renderer <n>] [--pretty] [<scene.json>|-]\n\
\n\
NOTES:\n\
  - If the scene path is omitted or '-', the scene is read from stdin.\n\
  - render prints SVG to stdout by default; use --out to write a file.\n\
  - PNG/JPG/PDF output defaults to writing next to the input file (or ./out.<ext> for stdin).\n\
  - replay applies {\"tools\": [...], \"active\": n, \"events\": [...]} and prints the resulting\n\
    sources and tooltips as JSON.\n\
  - hit prints the point hit-test selection of each renderer (or only --renderer) as JSON.\n\
  - NARWHAL_LOG sets the log filter (default: warn); logs go to stderr.\n\
"
}

fn next_value<'a>(it: &mut impl Iterator<Item = &'a String>) -> Result<&'a String, CliError> {
    it.next().ok_or(CliError::Usage(usage()))
}

fn parse_number<T: FromStr>(value: &str) -> Result<T, CliError> {
    value.parse::<T>().map_err(|_| CliError::Usage(usage()))
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args {
        render_scale: 1.0,
        ..Default::default()
    };

    let mut it = argv.iter().skip(1);
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "render" => args.command = Command::Render,
            "replay" => args.command = Command::Replay,
            "hit" => args.command = Command::Hit,
            "--pretty" => args.pretty = true,
            "--format" => {
                args.render_format = next_value(&mut it)?
                    .parse::<RenderFormat>()
                    .map_err(|_| CliError::Usage(usage()))?;
            }
            "--scale" => {
                args.render_scale = parse_number(next_value(&mut it)?)?;
                if !(args.render_scale.is_finite() && args.render_scale > 0.0) {
                    return Err(CliError::Usage(usage()));
                }
            }
            "--background" => {
                let bg = next_value(&mut it)?;
                if !bg.trim().is_empty() {
                    args.background = Some(bg.trim().to_string());
                }
            }
            "--out" => args.out = Some(next_value(&mut it)?.clone()),
            "--events" => args.events = Some(next_value(&mut it)?.clone()),
            "--svg" => args.svg = Some(next_value(&mut it)?.clone()),
            "--sx" => args.sx = Some(parse_number(next_value(&mut it)?)?),
            "--sy" => args.sy = Some(parse_number(next_value(&mut it)?)?),
            "--renderer" => args.renderer = Some(parse_number(next_value(&mut it)?)?),
            "--" => {
                if let Some(rest) = it.next() {
                    if args.input.is_some() {
                        return Err(CliError::Usage(usage()));
                    }
                    args.input = Some(rest.clone());
                }
                if it.next().is_some() {
                    return Err(CliError::Usage(usage()));
                }
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

    match args.command {
        Command::Replay if args.events.is_none() => return Err(CliError::Usage(usage())),
        Command::Hit if args.sx.is_none() || args.sy.is_none() => {
            return Err(CliError::Usage(usage()));
        }
        _ => {}
    }
    Ok(args)
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("NARWHAL_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn read_input(input: Option<&str>) -> Result<String, CliError> {
    match input {
        None | Some("-") => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
        Some(path) => Ok(std::fs::read_to_string(path)?),
    }
}

fn write_json(value: &impl Serialize, pretty: bool) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    if pretty {
        serde_json::to_writer_pretty(&mut stdout, value)?;
    } else {
        serde_json::to_writer(&mut stdout, value)?;
    }
    writeln!(stdout)?;
    Ok(())
}

fn write_text(text: &str, out: Option<&str>) -> Result<(), CliError> {
    match out {
        None | Some("-") => {
            print!("{text}");
            Ok(())
        }
        Some(path) => Ok(std::fs::write(path, text)?),
    }
}

fn write_bytes(bytes: &[u8], out: &str) -> Result<(), CliError> {
    if out == "-" {
        std::io::stdout().lock().write_all(bytes)?;
    } else {
        std::fs::write(out, bytes)?;
    }
    Ok(())
}

fn default_raster_out_path(input: Option<&str>, ext: &str) -> std::path::PathBuf {
    match input {
        Some(path) if path != "-" => std::path::PathBuf::from(path).with_extension(ext),
        _ => std::path::PathBuf::from(format!("out.{ext}")),
    }
}

fn render(plot: &Plot, args: &Args) -> Result<(), CliError> {
    let options = RasterOptions {
        scale: args.render_scale,
        background: args.background.clone(),
        ..RasterOptions::default()
    };
    let bytes = match args.render_format {
        RenderFormat::Svg => return write_text(&plot.render_svg()?, args.out.as_deref()),
        RenderFormat::Png => raster::render_png_sync(plot, &options)?,
        RenderFormat::Jpeg => raster::render_jpeg_sync(plot, &options)?,
        RenderFormat::Pdf => raster::render_pdf_sync(plot)?,
    };
    let out = args.out.clone().unwrap_or_else(|| {
        default_raster_out_path(args.input.as_deref(), args.render_format.extension())
            .to_string_lossy()
            .to_string()
    });
    write_bytes(&bytes, &out)
}

fn run(args: Args) -> Result<(), CliError> {
    let headless = Headless::new();
    let scene = read_input(args.input.as_deref())?;
    tracing::debug!(command = ?args.command, bytes = scene.len(), "scene loaded");

    match args.command {
        Command::Render => {
            let plot = headless.load_scene(&scene)?;
            render(&plot, &args)
        }
        Command::Replay => {
            let script = std::fs::read_to_string(args.events.as_deref().unwrap_or_default())?;
            let script = ToolScript::from_json(&script)?;
            let session = headless.replay_sync(&scene, &script)?;
            if let Some(path) = args.svg.as_deref() {
                std::fs::write(path, session.plot.render_svg()?)?;
            }
            let out = ReplayOut {
                sources: session.sources_json()?,
                tooltips: session.tooltips(),
            };
            write_json(&out, args.pretty)
        }
        Command::Hit => {
            let mut plot = headless.load_scene(&scene)?;
            let hit = HitGeometry::point(args.sx.unwrap_or_default(), args.sy.unwrap_or_default());
            let ids: Vec<usize> = match args.renderer {
                Some(id) => vec![id],
                None => (0..plot.renderers().len()).collect(),
            };
            let mut out = Vec::with_capacity(ids.len());
            for id in ids {
                let selection = plot.hit_test(id, &hit)?;
                out.push(HitOut {
                    renderer: id,
                    name: plot.renderer(id)?.name.clone(),
                    selection,
                });
            }
            write_json(&out, args.pretty)
        }
    }
}

fn main() {
    init_logging();
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

    if let Err(err) = run(args) {
        eprintln!("{err}");
        std::process::exit(1);
    }
}
