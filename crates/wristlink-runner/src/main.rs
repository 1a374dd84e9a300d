use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;
use wristlink_asset::{AssetCodec, AssetFormat, EncodedAsset, Geometry, SourceImage};
use wristlink_metrics::{describe_metrics, metric_defs};
use wristlink_protocol::ResponseDispatcher;
use wristlink_runner::{Link, RunnerConfig, RunnerError, TransferSummary};
use wristlink_transfer::{TransferKind, TransferParams, TransferState};

/// Drive the wristlink stack against a simulated watch.
#[derive(Parser, Debug)]
#[command(name = "wristlink", version)]
struct Cli {
    /// YAML configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Encode an asset and stream it to the simulated watch.
    Transfer {
        /// Image for custom dials, a prebuilt dial file for market dials,
        /// any file for resources.
        input: PathBuf,
        #[arg(long, value_enum, default_value_t = KindOpt::Custom)]
        kind: KindOpt,
        /// Send bare RGB565 instead of a compressed container (custom dials).
        #[arg(long)]
        raw: bool,
        /// Catalogue number for market dials.
        #[arg(long, default_value_t = 0)]
        dial_num: u16,
    },
    /// Decode inbound frames given as hex and print the resulting state.
    Inspect {
        /// Frames such as `5150` or `e0020003 00`.
        #[arg(required = true)]
        frames: Vec<String>,
    },
    /// Encode an image for the configured screen and write it out.
    EncodeImage {
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        #[arg(long)]
        raw: bool,
    },
    /// List the metrics this stack records.
    Metrics,
    /// Print the effective configuration.
    Config,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum KindOpt {
    /// Caller-drawn watch face.
    Custom,
    /// Catalogue watch face.
    Market,
    /// Firmware resource file.
    Resource,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    describe_metrics();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => RunnerConfig::load(path)?,
        None => RunnerConfig::default(),
    };

    match cli.cmd {
        Cmd::Transfer {
            input,
            kind,
            raw,
            dial_num,
        } => transfer(&config, &input, kind, raw, dial_num),
        Cmd::Inspect { frames } => Ok(inspect(&frames)?),
        Cmd::EncodeImage { input, output, raw } => encode_image(&config, &input, &output, raw),
        Cmd::Metrics => {
            for metric in metric_defs::ALL {
                println!(
                    "{:<36} {:<9} {:<6} {}",
                    metric.name,
                    metric.kind,
                    metric.unit_str(),
                    metric.description
                );
            }
            Ok(())
        }
        Cmd::Config => {
            print!("{}", config.to_yaml()?);
            Ok(())
        }
    }
}

fn transfer(
    config: &RunnerConfig,
    input: &Path,
    kind: KindOpt,
    raw: bool,
    dial_num: u16,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut link = Link::new(config);
    let state = link.query_device()?;
    if let Some(info) = &state.device_info {
        info!(
            "connected to watch {} (firmware {})",
            info.serial,
            info.firmware_version()
        );
    }

    let (asset, transfer_kind, params) = match kind {
        KindOpt::Resource => (
            EncodedAsset::raw(std::fs::read(input)?),
            TransferKind::ResourceUpgrade,
            TransferParams::default(),
        ),
        // Catalogue dials arrive prebuilt and go out untouched.
        KindOpt::Market => (
            EncodedAsset::new(std::fs::read(input)?, AssetFormat::Container),
            TransferKind::MarketDial,
            TransferParams::market_dial(dial_num),
        ),
        KindOpt::Custom => {
            let codec = AssetCodec::new(config.codec.clone());
            let image = SourceImage::open(input)?;
            let asset = link.encode_for_device(&codec, &image, raw)?;
            (
                asset,
                TransferKind::MarketDial,
                TransferParams::custom_dial(config.dial_style),
            )
        }
    };

    let summary = link.run_transfer(&asset, transfer_kind, params)?;
    print_summary(&summary);
    if summary.state != TransferState::Completed {
        return Err(format!("transfer ended {}", summary.state).into());
    }
    Ok(())
}

fn print_summary(summary: &TransferSummary) {
    println!("state: {}", summary.state);
    println!("bytes: {}", summary.total_bytes);
    println!("packets: {}", summary.total_packets);
    println!("acks dropped: {}", summary.watch.acks_dropped);
    println!("received: {}", hex::encode(&summary.watch.asset));
    if let Some(progress) = &summary.last_progress {
        println!(
            "progress: {}/{} ({:.0}%)",
            progress.current_packet,
            progress.total_packets,
            progress.percentage * 100.0
        );
    }
    if let Some(kind) = summary.failure {
        println!("failure: {}", kind);
    }
}

fn inspect(frames: &[String]) -> Result<(), RunnerError> {
    let dispatcher = ResponseDispatcher::new();
    for text in frames {
        let cleaned: String = text.chars().filter(|c| !c.is_whitespace()).collect();
        let bytes = hex::decode(&cleaned)?;
        match dispatcher.handle_inbound(&bytes) {
            Ok(event) => println!("{}: {:?}", cleaned, event),
            Err(e) => println!("{}: error: {}", cleaned, e),
        }
    }
    print!("{}", serde_yaml::to_string(&*dispatcher.snapshot())?);
    Ok(())
}

fn encode_image(
    config: &RunnerConfig,
    input: &Path,
    output: &Path,
    raw: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let codec = AssetCodec::new(config.codec.clone());
    let image = SourceImage::open(input)?;
    let target = Geometry::from(config.device.screen());
    let asset = if raw {
        codec.encode_raw(&image, target)?
    } else {
        codec.encode_watch_face(&image, target)?
    };
    std::fs::write(output, &asset.bytes)?;
    println!(
        "wrote {} bytes ({:?}, {}) to {}",
        asset.total_len,
        asset.format,
        target,
        output.display()
    );
    Ok(())
}
