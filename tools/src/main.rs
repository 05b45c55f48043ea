use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use glob::Pattern;
use layerdata_tools::{format_report_pretty, inspect_packet, synth_packet, SynthOptions};
use log::info;
use wire::LayerType;

#[derive(Parser)]
#[command(
    name = "layerdata-tools",
    version,
    about = "Layer packet inspection and synthesis tools"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Inspect packet structure and sizes.
    Inspect {
        /// Path to the packet bytes, or a directory of packets.
        packet_path: PathBuf,
        /// Optional glob filter when inspecting a directory.
        #[arg(long)]
        glob: Option<String>,
        /// Sort inspected packets.
        #[arg(long, value_enum)]
        sort: Option<InspectSort>,
        /// Limit the number of inspected packets (after sorting).
        #[arg(long)]
        limit: Option<usize>,
        /// Output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Pretty)]
        format: OutputFormat,
    },
    /// Synthesize a layer packet from a generated field.
    Synth {
        /// Layer to produce.
        #[arg(long, value_enum)]
        layer: SynthLayer,
        /// Use the extended (variable-size region) type code.
        #[arg(long)]
        extended: bool,
        /// Output file for the packet bytes.
        #[arg(long)]
        out: PathBuf,
        /// Land patches per region edge.
        #[arg(long, default_value_t = 16)]
        patches_per_edge: u32,
        /// Patch edge length.
        #[arg(long, default_value_t = wire::NORMAL_PATCH_SIZE)]
        patch_size: u8,
        /// DCT pre-quantization exponent (2..=17).
        #[arg(long, default_value_t = 10)]
        prequant: u8,
        /// High-frequency coefficients dropped per patch.
        #[arg(long, default_value_t = 0)]
        postquant: usize,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum InspectSort {
    Size,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Json,
    Pretty,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SynthLayer {
    Land,
    Wind,
    Cloud,
}

impl SynthLayer {
    const fn layer_type(self, extended: bool) -> LayerType {
        match (self, extended) {
            (Self::Land, false) => LayerType::Land,
            (Self::Land, true) => LayerType::ExtendedLand,
            (Self::Wind, false) => LayerType::Wind,
            (Self::Wind, true) => LayerType::ExtendedWind,
            (Self::Cloud, false) => LayerType::Cloud,
            (Self::Cloud, true) => LayerType::ExtendedCloud,
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Command::Inspect {
            packet_path,
            glob,
            sort,
            limit,
            format,
        } => {
            if packet_path.is_dir() {
                let entries = collect_packet_entries(&packet_path, glob.as_deref())?;
                let mut entries = maybe_sort_entries(entries, sort);
                let limit = limit.or(sort.map(|InspectSort::Size| 10));
                if let Some(limit) = limit {
                    entries.truncate(limit);
                }
                for entry in entries {
                    println!("== {} ({} bytes) ==", entry.path.display(), entry.size);
                    inspect_file(&entry.path, format)?;
                }
            } else {
                inspect_file(&packet_path, format)?;
            }
        }
        Command::Synth {
            layer,
            extended,
            out,
            patches_per_edge,
            patch_size,
            prequant,
            postquant,
        } => {
            let options = SynthOptions {
                patches_per_edge,
                patch_size,
                prequant,
                postquant,
            };
            let layer = layer.layer_type(extended);
            let bytes = synth_packet(layer, &options)
                .with_context(|| format!("synthesize {layer:?} packet"))?;
            fs::write(&out, &bytes).with_context(|| format!("write {}", out.display()))?;
            info!("wrote {} bytes to {}", bytes.len(), out.display());
        }
    }
    Ok(())
}

fn inspect_file(path: &Path, format: OutputFormat) -> Result<()> {
    let bytes = fs::read(path).with_context(|| format!("read packet {}", path.display()))?;
    let report = inspect_packet(&bytes, &wire::Limits::default())
        .with_context(|| format!("inspect {}", path.display()))?;
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&report).context("serialize json")?;
            println!("{json}");
        }
        OutputFormat::Pretty => print!("{}", format_report_pretty(&report)),
    }
    Ok(())
}

struct PacketEntry {
    path: PathBuf,
    size: u64,
}

fn collect_packet_entries(dir: &Path, glob: Option<&str>) -> Result<Vec<PacketEntry>> {
    let mut entries = Vec::new();
    let pattern = match glob {
        Some(value) => Some(Pattern::new(value).context("invalid glob pattern")?),
        None => None,
    };

    for entry in fs::read_dir(dir).with_context(|| format!("read dir {}", dir.display()))? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if let Some(pattern) = &pattern {
            let matches_path = pattern.matches_path(&path);
            let matches_name = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| pattern.matches(name));
            if !matches_path && !matches_name {
                continue;
            }
        }
        let size = entry.metadata()?.len();
        entries.push(PacketEntry { path, size });
    }
    entries.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(entries)
}

fn maybe_sort_entries(
    mut entries: Vec<PacketEntry>,
    sort: Option<InspectSort>,
) -> Vec<PacketEntry> {
    if let Some(InspectSort::Size) = sort {
        entries.sort_by(|a, b| b.size.cmp(&a.size).then_with(|| a.path.cmp(&b.path)));
    }
    entries
}
