//! Layer packet queue and dispatch to region decompressors.

use std::collections::HashSet;

use bitstream::BitPacker;
use codec::CodecSession;
use log::{debug, trace, warn};
use wire::{LayerCategory, LayerType, Limits};

use crate::error::DispatchResult;
use crate::types::RegionHandle;

/// Decompressors for the layers of one region.
///
/// Each method receives a packer positioned just after the group header and
/// a session holding that header.
pub trait RegionSinks {
    /// Decodes a land group. `large_patch` selects 32-bit patch ids.
    fn decompress_land(
        &mut self,
        packer: &mut BitPacker,
        session: &mut CodecSession,
        large_patch: bool,
    ) -> DispatchResult<()>;

    /// Decodes a wind group.
    fn decompress_wind(
        &mut self,
        packer: &mut BitPacker,
        session: &mut CodecSession,
    ) -> DispatchResult<()>;

    /// Decodes a cloud group.
    fn decompress_cloud(
        &mut self,
        packer: &mut BitPacker,
        session: &mut CodecSession,
    ) -> DispatchResult<()>;
}

/// Resolves region handles to live regions.
pub trait RegionLookup {
    /// Decompressors owned by one region.
    type Sinks: RegionSinks;

    /// Returns the region for `handle`, or `None` if it is gone.
    fn region_mut(&mut self, handle: RegionHandle) -> Option<&mut Self::Sinks>;
}

/// A layer packet waiting to be decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedPacket {
    layer_type: u8,
    region: RegionHandle,
    data: Vec<u8>,
}

impl QueuedPacket {
    /// Raw layer type code.
    #[must_use]
    pub const fn layer_type(&self) -> u8 {
        self.layer_type
    }

    /// Region the packet belongs to.
    #[must_use]
    pub const fn region(&self) -> RegionHandle {
        self.region
    }

    /// Packet payload.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// Bits received per layer category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LayerBitCounts {
    pub land: u64,
    pub wind: u64,
    pub cloud: u64,
}

impl LayerBitCounts {
    /// Total bits across all categories.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.land + self.wind + self.cloud
    }
}

/// Outcome of one [`LayerDispatcher::unpack_data`] pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UnpackReport {
    /// Packets decoded into a region.
    pub dispatched: usize,
    /// Water or unknown packets whose group header was read and nothing else.
    pub skipped: usize,
    /// Packets whose region no longer exists.
    pub dropped: usize,
    /// Packets that failed to decode.
    pub failed: usize,
}

impl UnpackReport {
    /// Total packets drained from the queue.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.dispatched + self.skipped + self.dropped + self.failed
    }
}

enum Outcome {
    Dispatched,
    Skipped,
}

/// Queues layer packets as they arrive and decodes them in arrival order.
#[derive(Debug, Clone, Default)]
pub struct LayerDispatcher {
    limits: Limits,
    queue: Vec<QueuedPacket>,
    bits: LayerBitCounts,
    warned_codes: HashSet<u8>,
}

impl LayerDispatcher {
    /// Creates an empty dispatcher.
    #[must_use]
    pub fn new(limits: Limits) -> Self {
        Self {
            limits,
            queue: Vec::new(),
            bits: LayerBitCounts::default(),
            warned_codes: HashSet::new(),
        }
    }

    /// Returns the configured limits.
    #[must_use]
    pub const fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Returns the packets waiting to be decoded, oldest first.
    #[must_use]
    pub fn queued(&self) -> &[QueuedPacket] {
        &self.queue
    }

    /// Returns the number of queued packets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Returns `true` if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Queues a received layer packet for `region`.
    ///
    /// `message_size` is the size of the carrying message in bytes and feeds
    /// the per-category bit counters. Returns `false` if the packet was
    /// rejected at admission (empty or over `max_packet_bytes`).
    pub fn add_layer_data(
        &mut self,
        type_code: u8,
        data: Vec<u8>,
        region: RegionHandle,
        message_size: usize,
    ) -> bool {
        if data.is_empty() {
            warn!("dropping empty layer packet type {type_code:#04x} for region {region:?}");
            return false;
        }
        if data.len() > self.limits.max_packet_bytes {
            warn!(
                "dropping layer packet type {type_code:#04x} for region {region:?}: {} bytes exceeds limit {}",
                data.len(),
                self.limits.max_packet_bytes
            );
            return false;
        }

        let bits = message_size as u64 * 8;
        match LayerType::from_code(type_code).map(LayerType::category) {
            Some(LayerCategory::Land) => self.bits.land += bits,
            Some(LayerCategory::Wind) => self.bits.wind += bits,
            Some(LayerCategory::Cloud) => self.bits.cloud += bits,
            Some(LayerCategory::Water) => {}
            None => {
                if self.warned_codes.insert(type_code) {
                    warn!("unknown layer type {type_code:#04x}");
                }
            }
        }

        trace!(
            "queued layer packet type {type_code:#04x} for region {region:?} ({} bytes)",
            data.len()
        );
        self.queue.push(QueuedPacket {
            layer_type: type_code,
            region,
            data,
        });
        true
    }

    /// Decodes every queued packet in arrival order and empties the queue.
    ///
    /// Decode errors are logged and counted; they never stop the drain.
    pub fn unpack_data<L: RegionLookup>(&mut self, regions: &mut L) -> UnpackReport {
        let mut report = UnpackReport::default();
        for QueuedPacket {
            layer_type,
            region,
            data,
        } in self.queue.drain(..)
        {
            let Some(sinks) = regions.region_mut(region) else {
                trace!("region {region:?} gone, dropping layer packet type {layer_type:#04x}");
                report.dropped += 1;
                continue;
            };
            match decode_packet(layer_type, data, sinks) {
                Ok(Outcome::Dispatched) => report.dispatched += 1,
                Ok(Outcome::Skipped) => report.skipped += 1,
                Err(err) => {
                    warn!(
                        "failed to decode layer packet type {layer_type:#04x} for region {region:?}: {err}"
                    );
                    report.failed += 1;
                }
            }
        }
        debug!(
            "unpacked layer data: {} dispatched, {} skipped, {} dropped, {} failed",
            report.dispatched, report.skipped, report.dropped, report.failed
        );
        report
    }

    /// Drops every queued packet owned by `region` without decoding it.
    ///
    /// Returns the number of packets removed.
    pub fn cleanup_data(&mut self, region: RegionHandle) -> usize {
        let before = self.queue.len();
        self.queue.retain(|packet| packet.region != region);
        before - self.queue.len()
    }

    /// Returns the per-category bit counters.
    #[must_use]
    pub const fn bit_counts(&self) -> LayerBitCounts {
        self.bits
    }

    /// Bits received for land layers.
    #[must_use]
    pub const fn land_bits(&self) -> u64 {
        self.bits.land
    }

    /// Bits received for wind layers.
    #[must_use]
    pub const fn wind_bits(&self) -> u64 {
        self.bits.wind
    }

    /// Bits received for cloud layers.
    #[must_use]
    pub const fn cloud_bits(&self) -> u64 {
        self.bits.cloud
    }

    /// Bytes received across land, wind and cloud layers.
    #[must_use]
    pub const fn total_bytes(&self) -> u64 {
        self.bits.total() / 8
    }

    /// Zeroes the bit counters.
    pub fn reset_bit_counts(&mut self) {
        self.bits = LayerBitCounts::default();
    }
}

fn decode_packet<S: RegionSinks>(
    layer_type: u8,
    data: Vec<u8>,
    sinks: &mut S,
) -> DispatchResult<Outcome> {
    let mut packer = BitPacker::from_bytes(data);
    let mut session = CodecSession::new();
    let group = session.decode_group_header(&mut packer)?;
    debug!(
        "layer packet type {layer_type:#04x}: stride {}, patch size {}",
        group.stride, group.patch_size
    );

    let Some(layer) = LayerType::from_code(layer_type) else {
        return Ok(Outcome::Skipped);
    };
    match layer.category() {
        LayerCategory::Land => {
            sinks.decompress_land(&mut packer, &mut session, layer.large_patch())?;
        }
        LayerCategory::Wind => sinks.decompress_wind(&mut packer, &mut session)?,
        LayerCategory::Cloud => sinks.decompress_cloud(&mut packer, &mut session)?,
        LayerCategory::Water => return Ok(Outcome::Skipped),
    }
    Ok(Outcome::Dispatched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(Debug, Default)]
    struct Recorder {
        calls: Vec<(char, bool)>,
    }

    impl RegionSinks for Recorder {
        fn decompress_land(
            &mut self,
            _packer: &mut BitPacker,
            _session: &mut CodecSession,
            large_patch: bool,
        ) -> DispatchResult<()> {
            self.calls.push(('L', large_patch));
            Ok(())
        }

        fn decompress_wind(
            &mut self,
            _packer: &mut BitPacker,
            _session: &mut CodecSession,
        ) -> DispatchResult<()> {
            self.calls.push(('7', false));
            Ok(())
        }

        fn decompress_cloud(
            &mut self,
            _packer: &mut BitPacker,
            _session: &mut CodecSession,
        ) -> DispatchResult<()> {
            self.calls.push(('8', false));
            Ok(())
        }
    }

    impl RegionLookup for HashMap<RegionHandle, Recorder> {
        type Sinks = Recorder;

        fn region_mut(&mut self, handle: RegionHandle) -> Option<&mut Recorder> {
            self.get_mut(&handle)
        }
    }

    fn group_bytes(layer_type: u8) -> Vec<u8> {
        // stride 16 (low byte first), patch size 16
        vec![16, 0, 16, layer_type]
    }

    #[test]
    fn bit_counts_by_category() {
        let mut dispatcher = LayerDispatcher::new(Limits::default());
        let region = RegionHandle::new(1);
        dispatcher.add_layer_data(b'L', group_bytes(b'L'), region, 100);
        dispatcher.add_layer_data(b'M', group_bytes(b'M'), region, 10);
        dispatcher.add_layer_data(b'7', group_bytes(b'7'), region, 20);
        dispatcher.add_layer_data(b'8', group_bytes(b'8'), region, 30);
        dispatcher.add_layer_data(b'W', group_bytes(b'W'), region, 40);

        assert_eq!(dispatcher.land_bits(), 880);
        assert_eq!(dispatcher.wind_bits(), 160);
        assert_eq!(dispatcher.cloud_bits(), 240);
        assert_eq!(dispatcher.total_bytes(), 160);
        assert_eq!(dispatcher.len(), 5);

        dispatcher.reset_bit_counts();
        assert_eq!(dispatcher.bit_counts(), LayerBitCounts::default());
        assert_eq!(dispatcher.len(), 5);
    }

    #[test]
    fn admission_rejects_empty_and_oversized() {
        let mut dispatcher = LayerDispatcher::new(Limits::for_testing());
        let region = RegionHandle::new(1);
        assert!(!dispatcher.add_layer_data(b'L', Vec::new(), region, 0));
        assert!(!dispatcher.add_layer_data(b'L', vec![0; 4097], region, 4097));
        assert!(dispatcher.add_layer_data(b'L', vec![0; 4096], region, 4096));
        assert_eq!(dispatcher.len(), 1);
        assert_eq!(dispatcher.land_bits(), 4096 * 8);
    }

    #[test]
    fn unknown_codes_are_queued_and_skipped() {
        let mut dispatcher = LayerDispatcher::new(Limits::default());
        let region = RegionHandle::new(3);
        for _ in 0..3 {
            assert!(dispatcher.add_layer_data(b'Q', group_bytes(b'Q'), region, 4));
        }
        assert_eq!(dispatcher.warned_codes.len(), 1);
        assert_eq!(dispatcher.bit_counts().total(), 0);

        let mut regions = HashMap::from([(region, Recorder::default())]);
        let report = dispatcher.unpack_data(&mut regions);
        assert_eq!(report.skipped, 3);
        assert!(regions[&region].calls.is_empty());
    }

    #[test]
    fn routes_by_layer_type_in_arrival_order() {
        let mut dispatcher = LayerDispatcher::new(Limits::default());
        let region = RegionHandle::new(9);
        for code in [b'8', b'L', b'W', b'M', b'7', b':', b'9'] {
            dispatcher.add_layer_data(code, group_bytes(code), region, 4);
        }
        let mut regions = HashMap::from([(region, Recorder::default())]);
        let report = dispatcher.unpack_data(&mut regions);

        assert_eq!(
            regions[&region].calls,
            vec![
                ('8', false),
                ('L', false),
                ('L', true),
                ('7', false),
                ('8', false),
                ('7', false),
            ]
        );
        assert_eq!(report.dispatched, 6);
        assert_eq!(report.skipped, 1);
        assert!(dispatcher.is_empty());
    }

    #[test]
    fn missing_region_is_a_silent_drop() {
        let mut dispatcher = LayerDispatcher::new(Limits::default());
        dispatcher.add_layer_data(b'L', group_bytes(b'L'), RegionHandle::new(1), 4);
        dispatcher.add_layer_data(b'L', group_bytes(b'L'), RegionHandle::new(2), 4);
        let mut regions = HashMap::from([(RegionHandle::new(2), Recorder::default())]);

        let report = dispatcher.unpack_data(&mut regions);
        assert_eq!(report.dropped, 1);
        assert_eq!(report.dispatched, 1);
        assert_eq!(report.total(), 2);
    }

    #[test]
    fn malformed_group_header_counts_as_failed() {
        let mut dispatcher = LayerDispatcher::new(Limits::default());
        let region = RegionHandle::new(1);
        dispatcher.add_layer_data(b'L', vec![16, 0], region, 2);
        dispatcher.add_layer_data(b'L', vec![16, 0, 0, b'L'], region, 4);
        dispatcher.add_layer_data(b'L', group_bytes(b'L'), region, 4);
        let mut regions = HashMap::from([(region, Recorder::default())]);

        let report = dispatcher.unpack_data(&mut regions);
        assert_eq!(report.failed, 2);
        assert_eq!(report.dispatched, 1);
        assert!(dispatcher.is_empty());
    }

    #[test]
    fn cleanup_removes_only_that_region() {
        let mut dispatcher = LayerDispatcher::new(Limits::default());
        let a = RegionHandle::new(1);
        let b = RegionHandle::new(2);
        dispatcher.add_layer_data(b'L', group_bytes(b'L'), a, 4);
        dispatcher.add_layer_data(b'7', group_bytes(b'7'), b, 4);
        dispatcher.add_layer_data(b'8', group_bytes(b'8'), a, 4);

        assert_eq!(dispatcher.cleanup_data(a), 2);
        assert_eq!(dispatcher.len(), 1);
        assert_eq!(dispatcher.queued()[0].region(), b);
        assert_eq!(dispatcher.queued()[0].layer_type(), b'7');
        assert_eq!(dispatcher.cleanup_data(a), 0);
    }
}
