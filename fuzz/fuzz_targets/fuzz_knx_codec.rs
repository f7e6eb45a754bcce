#![no_main]
use ejp_knx::knx::{GroupAddress, cemi};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Routing frames straight off the wire
    if let Ok(event) = cemi::decode(data) {
        let _ = cemi::encode(&event);
    }

    // Group address text as typed into a config file
    if let Ok(text) = std::str::from_utf8(data)
        && let Ok(ga) = text.parse::<GroupAddress>()
    {
        assert_eq!(ga.to_string().parse::<GroupAddress>().ok(), Some(ga));
    }
});
