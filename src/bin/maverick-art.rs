use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

use maverick_art::{
    AssetBundle, AssetSource, Background, BackendKind, NoiseFidelity, RenderRequest, Settings,
    Viewport, create_backend,
};

#[derive(Parser, Debug)]
#[command(name = "maverick-art", version)]
struct Cli {
    /// Optional JSON settings file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Asset directory (overrides settings).
    #[arg(long, global = true)]
    assets: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render one artwork as a PNG.
    Render(RenderArgs),
    /// Print the icon layout for a signature as JSON.
    Layout(LayoutArgs),
    /// Run the HTTP service.
    Serve(ServeArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    #[arg(long)]
    name: String,

    /// Pre-formatted date label, e.g. "January 1, 2025".
    #[arg(long)]
    date: String,

    #[arg(long)]
    signature: String,

    /// 1-based signer number.
    #[arg(long)]
    signer: u32,

    #[arg(long)]
    mobile: bool,

    /// White base fill instead of the paper texture.
    #[arg(long)]
    white: bool,

    #[arg(long, value_enum, default_value_t = BackendChoice::Native)]
    backend: BackendChoice,

    #[arg(long, value_enum)]
    noise: Option<NoiseChoice>,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct LayoutArgs {
    #[arg(long)]
    signature: String,

    #[arg(long)]
    mobile: bool,

    #[arg(long, value_enum)]
    noise: Option<NoiseChoice>,

    /// Icons available to the layout.
    #[arg(long, default_value_t = 71)]
    icons: usize,
}

#[derive(Parser, Debug)]
struct ServeArgs {
    /// Listen address (overrides settings).
    #[arg(long)]
    bind: Option<String>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum BackendChoice {
    Native,
    Headless,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum NoiseChoice {
    Coherent,
    Fast,
}

impl From<NoiseChoice> for NoiseFidelity {
    fn from(n: NoiseChoice) -> Self {
        match n {
            NoiseChoice::Coherent => Self::Coherent,
            NoiseChoice::Fast => Self::Fast,
        }
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(root) = cli.assets {
        settings.assets_root = root;
    }

    match cli.cmd {
        Command::Render(args) => cmd_render(args, settings),
        Command::Layout(args) => cmd_layout(args, &settings),
        Command::Serve(args) => cmd_serve(args, settings),
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn cmd_render(args: RenderArgs, mut settings: Settings) -> anyhow::Result<()> {
    if let Some(n) = args.noise {
        settings.noise = n.into();
    }
    let request = RenderRequest {
        display_name: args.name,
        date_label: args.date,
        signature_text: args.signature,
        signer_ordinal: args.signer,
        background: Background::from_white_flag(args.white),
        viewport: Viewport::from_is_mobile(args.mobile),
    };
    // Reject bad input before touching the asset directory.
    request.validate()?;

    let backend_settings = settings.backend_settings();
    let (kind, source) = match args.backend {
        BackendChoice::Native => {
            let bundle = AssetBundle::load(&settings.assets_root, &settings.manifest)
                .with_context(|| {
                    format!("load assets from '{}'", settings.assets_root.display())
                })?;
            (BackendKind::Native, AssetSource::Shared(bundle.into()))
        }
        BackendChoice::Headless => (
            BackendKind::Headless,
            AssetSource::Directory {
                root: settings.assets_root.clone(),
                manifest: settings.manifest.clone(),
            },
        ),
    };
    let backend = create_backend(kind, source, &backend_settings)?;
    let art = backend.render(&request)?;

    write_output(&args.out, &art.png)?;
    eprintln!(
        "wrote {} ({}x{}, layers: {})",
        args.out.display(),
        art.width,
        art.height,
        art.report
            .layers
            .iter()
            .map(|l| l.as_str())
            .collect::<Vec<_>>()
            .join(",")
    );
    Ok(())
}

fn write_output(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(path, bytes).with_context(|| format!("write png '{}'", path.display()))
}

fn cmd_layout(args: LayoutArgs, settings: &Settings) -> anyhow::Result<()> {
    let fidelity = args.noise.map(NoiseFidelity::from).unwrap_or(settings.noise);
    let seed = maverick_art::derive_seed(&args.signature);
    let geometry = Viewport::from_is_mobile(args.mobile).geometry();
    let mut rng = fidelity.random(seed);
    let layout = maverick_art::layout_icons(
        &mut rng,
        f64::from(geometry.art_width),
        f64::from(geometry.art_height),
        args.icons,
    );
    let out = serde_json::json!({
        "seed": seed,
        "viewport": Viewport::from_is_mobile(args.mobile),
        "noise": fidelity,
        "layout": layout,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn cmd_serve(args: ServeArgs, mut settings: Settings) -> anyhow::Result<()> {
    if let Some(bind) = args.bind {
        settings.bind = bind;
    }
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("build tokio runtime")?;
    rt.block_on(maverick_art::server::serve(settings))
}
