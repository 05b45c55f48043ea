//! Introspection and debugging tools for the layer-data codec.
//!
//! This crate provides utilities for inspecting and producing layer packets:
//!
//! - Walk a packet and report every header with its size in bits
//! - Synthesize packets from generated fields for testing receivers
//!
//! # Design Principles
//!
//! - **First-class tooling** - These tools are part of the product, not afterthoughts.
//! - **Human-readable output** - Make it easy to understand what the codec is doing.

use std::fmt::Write as _;

use anyhow::{bail, Context, Result};
use bitstream::BitPacker;
use codec::{prescan_patch, CodecSession, DctTables};
use serde::Serialize;
use wire::{GroupHeader, LayerCategory, LayerType, Limits, PatchHeader};

/// Structure of one decoded patch.
#[derive(Debug, Clone, Serialize)]
pub struct PatchReport {
    pub index: usize,
    pub header: PatchHeader,
    pub position: (u32, u32),
    pub word_bits: u8,
    pub prequant: u8,
    pub header_bits: u64,
    pub body_bits: u64,
    pub nonzero_coefficients: usize,
}

/// Structure of a whole layer packet.
#[derive(Debug, Clone, Serialize)]
pub struct InspectReport {
    pub packet_bytes: usize,
    pub group: GroupHeader,
    pub layer: Option<LayerType>,
    pub patches: Vec<PatchReport>,
    /// `true` if an end-of-patches sentinel was read.
    pub terminated: bool,
    /// Bits left unread after the last patch.
    pub trailing_bits: usize,
}

impl InspectReport {
    /// Total bits spent on patch headers and bodies.
    #[must_use]
    pub fn patch_bits(&self) -> u64 {
        self.patches
            .iter()
            .map(|patch| patch.header_bits + patch.body_bits)
            .sum()
    }
}

/// Decodes every header and body of a layer packet.
///
/// The layer type comes from the group header. Land groups are read until
/// the sentinel, wind groups hold two patches and cloud groups one; water
/// and unknown groups stop after the group header.
pub fn inspect_packet(bytes: &[u8], limits: &Limits) -> Result<InspectReport> {
    if bytes.len() > limits.max_packet_bytes {
        bail!(
            "packet is {} bytes, limit is {}",
            bytes.len(),
            limits.max_packet_bytes
        );
    }
    let mut packer = BitPacker::from_bytes(bytes.to_vec());
    let mut session = CodecSession::new();
    let group = session
        .decode_group_header(&mut packer)
        .context("decode group header")?;
    let layer = LayerType::from_code(group.layer_type);

    let (expected_patches, large_patch) = match layer.map(|l| (l.category(), l.large_patch())) {
        Some((LayerCategory::Land, large_patch)) => (None, large_patch),
        Some((LayerCategory::Wind, _)) => (Some(2), false),
        Some((LayerCategory::Cloud, _)) => (Some(1), false),
        Some((LayerCategory::Water, _)) | None => (Some(0), false),
    };

    let mut patches = Vec::new();
    let mut terminated = false;
    let mut coefficients = vec![0i32; group.patch_area()];
    loop {
        if expected_patches.is_some_and(|n| patches.len() >= n) {
            break;
        }
        if patches.len() >= limits.max_patches_per_group {
            bail!("group exceeds {} patches", limits.max_patches_per_group);
        }

        let start = packer.total_bits();
        let index = patches.len();
        let header = session
            .decode_patch_header(&mut packer, large_patch)
            .with_context(|| format!("decode patch header {index}"))?;
        if header.is_end_of_patches() {
            terminated = true;
            break;
        }
        let body_start = packer.total_bits();
        session
            .decode_patch(&mut packer, &mut coefficients)
            .with_context(|| format!("decode patch {index}"))?;

        patches.push(PatchReport {
            index,
            header,
            position: header.patch_position(large_patch),
            word_bits: header.word_bits(),
            prequant: header.prequant(),
            header_bits: body_start - start,
            body_bits: packer.total_bits() - body_start,
            nonzero_coefficients: coefficients.iter().filter(|c| **c != 0).count(),
        });
    }

    Ok(InspectReport {
        packet_bytes: bytes.len(),
        group,
        layer,
        patches,
        terminated,
        trailing_bits: packer.bits_remaining(),
    })
}

/// Renders a report for terminal output.
#[must_use]
pub fn format_report_pretty(report: &InspectReport) -> String {
    let mut out = String::new();
    let group = report.group;
    let layer = report
        .layer
        .map_or_else(|| "unknown".to_string(), |l| format!("{l:?}"));
    let _ = writeln!(
        out,
        "layer: {layer} ('{}') stride: {} patch_size: {}",
        char::from(group.layer_type),
        group.stride,
        group.patch_size
    );
    let _ = writeln!(
        out,
        "packet: {} bytes, {} patches, {} patch bits, {} trailing bits{}",
        report.packet_bytes,
        report.patches.len(),
        report.patch_bits(),
        report.trailing_bits,
        if report.terminated { "" } else { " (no sentinel)" }
    );
    if !report.patches.is_empty() {
        out.push_str("patches:\n");
    }
    for patch in &report.patches {
        let (x, y) = patch.position;
        let _ = writeln!(
            out,
            "  #{} ({x}, {y}) wbits {} prequant {} dc {:.3} range {} nonzero {} ({} + {} bits)",
            patch.index,
            patch.word_bits,
            patch.prequant,
            patch.header.dc_offset,
            patch.header.range,
            patch.nonzero_coefficients,
            patch.header_bits,
            patch.body_bits
        );
    }
    out
}

/// Parameters for [`synth_packet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SynthOptions {
    /// Land patches per region edge.
    pub patches_per_edge: u32,
    /// Patch edge length.
    pub patch_size: u8,
    /// DCT pre-quantization exponent.
    pub prequant: u8,
    /// High-frequency coefficients dropped per patch.
    pub postquant: usize,
}

impl Default for SynthOptions {
    fn default() -> Self {
        Self {
            patches_per_edge: 16,
            patch_size: wire::NORMAL_PATCH_SIZE,
            prequant: 10,
            postquant: 0,
        }
    }
}

/// Builds a layer packet from a generated field.
///
/// Land packets cover `patches_per_edge²` patches of rolling terrain and end
/// with the sentinel; wind packets hold an x and a y velocity patch; cloud
/// packets hold one density patch.
pub fn synth_packet(layer: LayerType, options: &SynthOptions) -> Result<Vec<u8>> {
    let tables = DctTables::new(options.patch_size).context("build dct tables")?;
    let size = tables.size();
    let large_patch = layer.large_patch();

    // (stride, samples, patch origins)
    let (stride, samples, patches) = match layer.category() {
        LayerCategory::Land => {
            let edge = options.patches_per_edge as usize * size + 1;
            let mut patches = Vec::new();
            for y in 0..options.patches_per_edge {
                for x in 0..options.patches_per_edge {
                    patches.push((x, y, y as usize * size * edge + x as usize * size));
                }
            }
            (edge, generate_field(edge, 20.0, 8.0), patches)
        }
        LayerCategory::Wind => {
            let mut samples = generate_field(size, 3.0, 2.0);
            samples.extend(generate_field(size, -1.0, 1.5));
            (size, samples, vec![(0, 0, 0), (0, 0, tables.area())])
        }
        LayerCategory::Cloud => (size, generate_field(size, 0.5, 0.25), vec![(0, 0, 0)]),
        LayerCategory::Water => bail!("water layers carry no patches"),
    };

    let group = GroupHeader::new(
        u16::try_from(stride).context("stride does not fit 16 bits")?,
        options.patch_size,
        layer.code(),
    );
    let mut packer = BitPacker::with_capacity(
        wire::GROUP_HEADER_BITS / 8 + patches.len() * (tables.area() * 3 + 16) + 16,
    );
    let mut session = CodecSession::new();
    session.code_group_header(&mut packer, &group)?;

    for &(x, y, origin) in &patches {
        let window = &samples[origin..];
        let (dc_offset, range) = prescan_patch(window, stride, size);
        let mut header = PatchHeader {
            dc_offset,
            range,
            patch_ids: PatchHeader::pack_position(x, y, large_patch),
            ..PatchHeader::default()
        };
        let coefficients = tables
            .compress_patch(window, stride, &mut header, options.prequant)
            .with_context(|| format!("compress patch ({x}, {y})"))?;
        session
            .code_patch_header(&mut packer, &mut header, &coefficients, large_patch)
            .with_context(|| format!("code patch header ({x}, {y})"))?;
        session
            .code_patch(&mut packer, &coefficients, options.postquant)
            .with_context(|| format!("code patch ({x}, {y})"))?;
    }
    if layer.category() == LayerCategory::Land {
        session.code_end_of_data(&mut packer)?;
    }
    packer.flush()?;
    Ok(packer.into_bytes())
}

/// Smooth `edge × edge` field around `base` with the given amplitude.
fn generate_field(edge: usize, base: f32, amplitude: f32) -> Vec<f32> {
    (0..edge * edge)
        .map(|idx| {
            let x = (idx % edge) as f32;
            let y = (idx / edge) as f32;
            base + (x * 0.07).sin() * amplitude + (y * 0.05).cos() * amplitude * 0.5
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synth_land_inspects_cleanly() {
        let options = SynthOptions {
            patches_per_edge: 2,
            ..SynthOptions::default()
        };
        let bytes = synth_packet(LayerType::Land, &options).unwrap();
        let report = inspect_packet(&bytes, &Limits::default()).unwrap();

        assert_eq!(report.layer, Some(LayerType::Land));
        assert_eq!(report.group.stride, 33);
        assert_eq!(report.patches.len(), 4);
        assert!(report.terminated);
        assert!(report.trailing_bits < 8);
        assert_eq!(report.patches[3].position, (1, 1));
        assert!(report
            .patches
            .iter()
            .all(|p| p.header_bits == 8 + 32 + 16 + 10 && p.prequant == 10));
    }

    #[test]
    fn synth_extended_land_uses_large_ids() {
        let options = SynthOptions {
            patches_per_edge: 1,
            ..SynthOptions::default()
        };
        let bytes = synth_packet(LayerType::ExtendedLand, &options).unwrap();
        let report = inspect_packet(&bytes, &Limits::default()).unwrap();
        assert_eq!(report.patches[0].header_bits, 8 + 32 + 16 + 32);
    }

    #[test]
    fn synth_wind_and_cloud() {
        let options = SynthOptions::default();
        let wind = inspect_packet(
            &synth_packet(LayerType::Wind, &options).unwrap(),
            &Limits::default(),
        )
        .unwrap();
        assert_eq!(wind.patches.len(), 2);
        assert!(!wind.terminated);

        let cloud = inspect_packet(
            &synth_packet(LayerType::Cloud, &options).unwrap(),
            &Limits::default(),
        )
        .unwrap();
        assert_eq!(cloud.patches.len(), 1);
    }

    #[test]
    fn synth_water_is_rejected() {
        assert!(synth_packet(LayerType::Water, &SynthOptions::default()).is_err());
    }

    #[test]
    fn postquant_shrinks_the_packet() {
        let full = synth_packet(
            LayerType::Land,
            &SynthOptions {
                patches_per_edge: 2,
                ..SynthOptions::default()
            },
        )
        .unwrap();
        let truncated = synth_packet(
            LayerType::Land,
            &SynthOptions {
                patches_per_edge: 2,
                postquant: 255,
                ..SynthOptions::default()
            },
        )
        .unwrap();
        assert!(truncated.len() < full.len());
    }

    #[test]
    fn truncated_packet_reports_context() {
        let bytes = synth_packet(LayerType::Cloud, &SynthOptions::default()).unwrap();
        let err = inspect_packet(&bytes[..6], &Limits::default()).unwrap_err();
        assert!(format!("{err:#}").contains("patch header 0"));
    }

    #[test]
    fn pretty_report_mentions_layer_and_patches() {
        let bytes = synth_packet(LayerType::Cloud, &SynthOptions::default()).unwrap();
        let report = inspect_packet(&bytes, &Limits::default()).unwrap();
        let text = format_report_pretty(&report);
        assert!(text.contains("Cloud"));
        assert!(text.contains("#0 (0, 0)"));
        assert!(text.contains("(no sentinel)"));
    }

    #[test]
    fn report_serializes_to_json() {
        let bytes = synth_packet(LayerType::Wind, &SynthOptions::default()).unwrap();
        let report = inspect_packet(&bytes, &Limits::default()).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["layer"], "Wind");
        assert_eq!(json["patches"].as_array().unwrap().len(), 2);
    }
}
