use std::{
    fs::File,
    io::{BufWriter, IsTerminal as _, Write},
    path::{Path, PathBuf},
    sync::Arc,
    time::Instant,
};

use anyhow::Context as _;
use barrace::{
    BarTransition, DateDisplay, Ease, Keyframe, Phase, PlaybackController, PlaybackHooks,
    ProjectionOptions, RaceConfig, TransitionTracker, WallClock, load_observations, project_with,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "barrace", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the keyframe sequence and write it as JSON.
    Keyframes(KeyframesArgs),
    /// Print the projection (scales + ranked rows) of one keyframe as JSON.
    Frame(FrameArgs),
    /// Play the race in the terminal.
    Play(PlayArgs),
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// Input dataset JSON (observations or sales records).
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Optional config JSON; flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Keyframes per observation interval (>= 1).
    #[arg(long)]
    slices: Option<usize>,
}

#[derive(Parser, Debug)]
struct KeyframesArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Output path; stdout when omitted.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Keyframe index (0-based).
    #[arg(long)]
    frame: usize,

    /// Number of bars shown.
    #[arg(long)]
    top: Option<usize>,

    /// Chart width in pixels, margins included.
    #[arg(long)]
    width: Option<f64>,

    /// Chart height in pixels, margins included.
    #[arg(long)]
    height: Option<f64>,
}

#[derive(Parser, Debug)]
struct PlayArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Number of bars shown.
    #[arg(long)]
    top: Option<usize>,

    /// Milliseconds between keyframes.
    #[arg(long = "interval-ms")]
    interval_ms: Option<u64>,

    /// Redraws per keyframe interval, tweening bars in between.
    #[arg(long, default_value_t = 4)]
    substeps: u32,

    /// Terminal columns used by the longest bar.
    #[arg(long, default_value_t = 60)]
    columns: usize,

    /// Easing of the in-between redraws (linear, out_cubic, ...).
    #[arg(long)]
    ease: Option<Ease>,

    /// How the date header is printed.
    #[arg(long, value_enum)]
    date: Option<DateChoice>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum DateChoice {
    Month,
    Year,
    Both,
}

impl From<DateChoice> for DateDisplay {
    fn from(c: DateChoice) -> Self {
        match c {
            DateChoice::Month => DateDisplay::Month,
            DateChoice::Year => DateDisplay::Year,
            DateChoice::Both => DateDisplay::Both,
        }
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.cmd {
        Command::Keyframes(args) => cmd_keyframes(args),
        Command::Frame(args) => cmd_frame(args),
        Command::Play(args) => cmd_play(args),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(common: &CommonArgs) -> anyhow::Result<RaceConfig> {
    let mut cfg = match &common.config {
        Some(path) => RaceConfig::load(path)?,
        None => RaceConfig::default(),
    };
    if let Some(slices) = common.slices {
        cfg.slice_count = slices;
    }
    Ok(cfg)
}

fn build(common: &CommonArgs, cfg: &RaceConfig) -> anyhow::Result<Vec<Keyframe>> {
    cfg.validate()?;
    let observations = load_observations(&common.in_path)
        .with_context(|| format!("load dataset '{}'", common.in_path.display()))?;
    Ok(cfg.builder()?.build(&observations))
}

fn cmd_keyframes(args: KeyframesArgs) -> anyhow::Result<()> {
    let cfg = load_config(&args.common)?;
    let keyframes = build(&args.common, &cfg)?;

    match &args.out {
        Some(path) => {
            create_parent_dir(path)?;
            let f = File::create(path)
                .with_context(|| format!("create output '{}'", path.display()))?;
            let mut w = BufWriter::new(f);
            serde_json::to_writer_pretty(&mut w, &keyframes).with_context(|| "write keyframes")?;
            w.flush()?;
            eprintln!("wrote {} keyframes to {}", keyframes.len(), path.display());
        }
        None => {
            let mut out = std::io::stdout().lock();
            serde_json::to_writer_pretty(&mut out, &keyframes)
                .with_context(|| "write keyframes")?;
            writeln!(out)?;
        }
    }
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let mut cfg = load_config(&args.common)?;
    if let Some(top) = args.top {
        cfg.top_n = top;
    }
    if let Some(width) = args.width {
        cfg.layout.width = width;
    }
    if let Some(height) = args.height {
        cfg.layout.height = height;
    }

    let keyframes = build(&args.common, &cfg)?;
    let Some(kf) = keyframes.get(args.frame) else {
        anyhow::bail!(
            "frame {} is out of bounds ({} keyframes)",
            args.frame,
            keyframes.len()
        );
    };

    let projection = project_with(kf, &cfg.projection_options());
    let ticks = projection
        .value_scale
        .ticks(cfg.layout.suggested_tick_count());
    let doc = serde_json::json!({
        "frame": args.frame,
        "date": kf.date,
        "label": kf.date.label(cfg.date_display),
        "synthetic": kf.synthetic,
        "ticks": ticks,
        "projection": projection,
    });

    let mut out = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, &doc).with_context(|| "write projection")?;
    writeln!(out)?;
    Ok(())
}

fn cmd_play(args: PlayArgs) -> anyhow::Result<()> {
    let mut cfg = load_config(&args.common)?;
    if let Some(top) = args.top {
        cfg.top_n = top;
    }
    if let Some(ms) = args.interval_ms {
        cfg.tick_interval_ms = ms;
    }
    if let Some(ease) = args.ease {
        cfg.ease = ease;
    }
    if let Some(date) = args.date {
        cfg.date_display = date.into();
    }

    let keyframes = build(&args.common, &cfg)?;
    if keyframes.is_empty() {
        eprintln!("nothing to animate");
        return Ok(());
    }
    let keyframes: Arc<[Keyframe]> = keyframes.into();
    let opts = cfg.projection_options();
    let interval = cfg.tick_interval();
    let substeps = args.substeps.max(1);

    let mut ctl = PlaybackController::new(keyframes, WallClock::new()).with_interval(interval)?;
    ctl.subscribe(
        PlaybackHooks::new()
            .on_start(|| tracing::info!("playing"))
            .on_stop(|| tracing::info!("stopped")),
    );

    let view = TerminalView {
        columns: args.columns,
        x_max: opts.x_max,
        ease: cfg.ease,
        clear: std::io::stdout().is_terminal(),
    };
    let mut tracker = TransitionTracker::new();
    let mut out = std::io::stdout().lock();

    ctl.start();
    let mut transitions = next_transitions(&ctl, &mut tracker, &opts);
    let mut label = current_label(&ctl, cfg.date_display);

    while let Some((_, deadline)) = ctl.clock().next_deadline() {
        for s in 1..=substeps {
            let remaining = interval * (substeps - s) / substeps;
            sleep_until(deadline.checked_sub(remaining).unwrap_or(deadline));
            let t = f64::from(s) / f64::from(substeps);
            view.draw(&mut out, &label, &transitions, t)?;
        }

        sleep_until(deadline);
        while let Some(id) = ctl.clock_mut().pop_expired(Instant::now()) {
            ctl.on_timer(id);
        }
        if !ctl.playing() {
            break;
        }
        transitions = next_transitions(&ctl, &mut tracker, &opts);
        label = current_label(&ctl, cfg.date_display);
    }

    ctl.dispose();
    Ok(())
}

fn next_transitions(
    ctl: &PlaybackController<WallClock>,
    tracker: &mut TransitionTracker,
    opts: &ProjectionOptions,
) -> Vec<BarTransition> {
    match ctl.current_keyframe() {
        Some(kf) => tracker.update(&project_with(kf, opts), ctl.generation()),
        None => Vec::new(),
    }
}

fn current_label(ctl: &PlaybackController<WallClock>, display: DateDisplay) -> String {
    ctl.current_keyframe()
        .map(|kf| kf.date.label(display))
        .unwrap_or_default()
}

fn sleep_until(at: Instant) {
    let now = Instant::now();
    if at > now {
        std::thread::sleep(at - now);
    }
}

struct TerminalView {
    columns: usize,
    x_max: f64,
    ease: Ease,
    clear: bool,
}

impl TerminalView {
    fn draw(
        &self,
        out: &mut impl Write,
        label: &str,
        transitions: &[BarTransition],
        t: f64,
    ) -> anyhow::Result<()> {
        let mut bars: Vec<_> = transitions
            .iter()
            .map(|tr| (tr, tr.sample(t, self.ease)))
            .filter(|(tr, g)| tr.phase != Phase::Exit || g.width > 0.0)
            .collect();
        bars.sort_by(|a, b| a.1.y.total_cmp(&b.1.y));

        let name_width = bars.iter().map(|(tr, _)| tr.name.chars().count()).max().unwrap_or(0);

        if self.clear {
            write!(out, "\x1b[H\x1b[2J")?;
        }
        writeln!(out, "{label}")?;
        for (tr, g) in bars {
            let cells = if self.x_max > 0.0 {
                ((g.width / self.x_max) * self.columns as f64).round().max(0.0) as usize
            } else {
                0
            };
            writeln!(
                out,
                "{:>name_width$} {} {:.0}",
                tr.name,
                "#".repeat(cells.min(self.columns)),
                g.value
            )?;
        }
        out.flush()?;
        Ok(())
    }
}

fn create_parent_dir(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    Ok(())
}
