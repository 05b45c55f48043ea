#![no_main]

use dispatch::{LayerDispatcher, RegionHandle, RegionLayers, RegionRegistry};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Some((&type_code, payload)) = data.split_first() else {
        return;
    };
    let limits = wire::Limits::for_testing();
    let Ok(layers) = RegionLayers::with_limits(4, 16, limits.clone()) else {
        return;
    };
    let handle = RegionHandle::new(1);
    let mut registry = RegionRegistry::new();
    registry.insert(handle, layers);

    let mut dispatcher = LayerDispatcher::new(limits);
    dispatcher.add_layer_data(type_code, payload.to_vec(), handle, payload.len());
    // Also route the same bytes through every known layer code.
    for code in [b'L', b'M', b'7', b'9', b'8', b':'] {
        dispatcher.add_layer_data(code, payload.to_vec(), handle, payload.len());
    }
    let report = dispatcher.unpack_data(&mut registry);
    assert!(dispatcher.is_empty());
    assert!(report.total() <= 7);
});
