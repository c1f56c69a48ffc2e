use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use fogmask::{
    Bounds, ConvexPolygon, FogOfWar, FogOfWarOpts, Footprint, InMemoryMaskSink, MaskSnapshot,
    MeshFootprint, OrientedBox, PaintOpts, Point, Vec2, Vec3,
};

#[derive(Parser, Debug)]
#[command(name = "fogmask", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a timed paint scenario and write the final mask as a grayscale PNG.
    Simulate(SimulateArgs),
    /// Print statistics about a saved mask snapshot.
    Inspect(InspectArgs),
}

#[derive(Parser, Debug)]
struct SimulateArgs {
    /// Scenario JSON.
    #[arg(long)]
    scenario: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Which buffer to write to the PNG.
    #[arg(long, value_enum, default_value_t = Layer::Raw)]
    layer: Layer,

    /// Also write the final mask as a snapshot JSON.
    #[arg(long)]
    snapshot: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct InspectArgs {
    /// Snapshot JSON written by `simulate --snapshot`.
    #[arg(long)]
    snapshot: PathBuf,

    /// Optional PNG rendering of the snapshot.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Layer {
    Raw,
    Blurred,
}

/// Scenario file: engine options plus paint operations at given clock times.
#[derive(Debug, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct Scenario {
    #[serde(default)]
    opts: FogOfWarOpts,
    #[serde(default = "default_fps")]
    fps: f64,
    duration: f64,
    #[serde(default)]
    ops: Vec<TimedOp>,
}

fn default_fps() -> f64 {
    30.0
}

#[derive(Debug, serde::Deserialize)]
struct TimedOp {
    at: f64,
    op: Op,
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
enum Op {
    Paint {
        shape: ShapeSpec,
        alpha: f32,
        #[serde(default)]
        opts: Option<PaintOpts>,
    },
    Reset {
        shape: ShapeSpec,
        #[serde(default = "opaque")]
        alpha: f32,
    },
    ResetAll {
        #[serde(default = "opaque")]
        alpha: f32,
    },
}

fn opaque() -> f32 {
    1.0
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
enum ShapeSpec {
    Circle {
        center: [f64; 2],
        radius: f64,
    },
    Bounds {
        center: [f64; 2],
        extents: [f64; 2],
    },
    OrientedBox {
        center: [f64; 2],
        half_extents: [f64; 2],
        #[serde(default)]
        yaw: f64,
    },
    Polygon {
        points: Vec<[f64; 2]>,
    },
    Mesh {
        vertices: Vec<[f64; 2]>,
        indices: Vec<u32>,
    },
}

impl ShapeSpec {
    fn footprint(&self) -> anyhow::Result<Footprint> {
        let xz = |p: [f64; 2]| Vec3::xz(p[0], p[1]);
        Ok(match self {
            Self::Circle { center, radius } => Footprint::circle(xz(*center), *radius),
            Self::Bounds { center, extents } => {
                Bounds::new(xz(*center), Vec3::new(extents[0], 0.0, extents[1]))?.into()
            }
            Self::OrientedBox {
                center,
                half_extents,
                yaw,
            } => OrientedBox::new(
                xz(*center),
                Vec2::new(half_extents[0], half_extents[1]),
                *yaw,
            )?
            .into(),
            Self::Polygon { points } => ConvexPolygon::new(
                points.iter().map(|p| Point::new(p[0], p[1])).collect(),
                0.0,
            )?
            .into(),
            Self::Mesh { vertices, indices } => MeshFootprint::new(
                vertices.iter().copied().map(xz).collect(),
                indices.clone(),
            )
            .into(),
        })
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Simulate(args) => cmd_simulate(args),
        Command::Inspect(args) => cmd_inspect(args),
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let f = File::open(path).with_context(|| format!("open '{}'", path.display()))?;
    serde_json::from_reader(BufReader::new(f)).with_context(|| format!("parse '{}'", path.display()))
}

fn cmd_simulate(args: SimulateArgs) -> anyhow::Result<()> {
    let mut scenario: Scenario = read_json(&args.scenario)?;
    if !scenario.fps.is_finite() || scenario.fps <= 0.0 {
        anyhow::bail!("scenario fps must be > 0");
    }
    if !scenario.duration.is_finite() || scenario.duration < 0.0 {
        anyhow::bail!("scenario duration must be >= 0");
    }
    scenario.ops.sort_by(|a, b| a.at.total_cmp(&b.at));

    let sink = InMemoryMaskSink::new();
    let fog = FogOfWar::new(scenario.opts, sink.clone())?;
    let defaults = fog.paint_defaults();

    let dt = 1.0 / scenario.fps;
    let frames = (scenario.duration * scenario.fps).ceil() as u64;
    let mut pending = scenario.ops.iter().peekable();
    for frame in 0..=frames {
        let now = (frame as f64 * dt).min(scenario.duration);
        while let Some(op) = pending.next_if(|op| op.at <= now) {
            apply_op(&fog, op, defaults)?;
        }
        fog.wait_idle();
        fog.tick(now);
    }
    fog.wait_idle();
    fog.tick(scenario.duration);

    let (width, height, bytes) = match args.layer {
        Layer::Raw => {
            let snap = fog.snapshot().context("fog is disabled in the scenario")?;
            (snap.width, snap.height, snap.opacity)
        }
        Layer::Blurred => {
            let up = sink.last_upload().context("no upload was recorded")?;
            let blurred = up
                .blurred
                .context("blur is disabled in the scenario options")?;
            (up.width, up.height, blurred)
        }
    };
    write_png(&args.out, width, height, &bytes)?;

    if let Some(path) = &args.snapshot {
        let snap = fog.snapshot().context("fog is disabled in the scenario")?;
        let json = serde_json::to_vec(&snap).context("serialize snapshot")?;
        std::fs::write(path, json).with_context(|| format!("write '{}'", path.display()))?;
    }

    let stats = fog.pool_stats();
    eprintln!(
        "wrote {} ({}x{}, live transitions {}, dropped {})",
        args.out.display(),
        width,
        height,
        stats.live,
        stats.dropped
    );
    Ok(())
}

fn apply_op(fog: &FogOfWar, timed: &TimedOp, defaults: PaintOpts) -> anyhow::Result<()> {
    match &timed.op {
        Op::Paint { shape, alpha, opts } => fog.set_alpha_at(
            shape.footprint()?,
            *alpha,
            opts.unwrap_or(defaults),
            timed.at,
        )?,
        Op::Reset { shape, alpha } => fog.reset_alpha(shape.footprint()?, *alpha)?,
        Op::ResetAll { alpha } => fog.reset_all(*alpha),
    }
    Ok(())
}

fn cmd_inspect(args: InspectArgs) -> anyhow::Result<()> {
    let snap: MaskSnapshot = read_json(&args.snapshot)?;
    snap.validate()?;

    let min = snap.opacity.iter().copied().min().unwrap_or(255);
    let max = snap.opacity.iter().copied().max().unwrap_or(255);
    let sum: u64 = snap.opacity.iter().map(|&v| u64::from(v)).sum();
    let mean = sum as f64 / snap.opacity.len() as f64;
    let revealed = snap.opacity.iter().filter(|&&v| v < 255).count();
    let clear = snap.opacity.iter().filter(|&&v| v == 0).count();

    println!("size: {}x{}", snap.width, snap.height);
    println!("opacity: min {min} max {max} mean {mean:.2}");
    println!("revealed cells: {revealed} (fully clear {clear})");

    if let Some(out) = &args.out {
        write_png(out, snap.width, snap.height, &snap.opacity)?;
        eprintln!("wrote {}", out.display());
    }
    Ok(())
}

fn write_png(path: &Path, width: u32, height: u32, bytes: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    image::save_buffer_with_format(
        path,
        bytes,
        width,
        height,
        image::ColorType::L8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", path.display()))
}
