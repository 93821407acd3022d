//! Fuzz target: `MotorDecoder::on_event`
//!
//! Interprets the input as a stream of 5-byte records (4-byte little-endian
//! timestamp delta, 1-byte line selector) and asserts that the decoder never
//! panics, only commits levels 1–8, and keeps its counter bounded.
//!
//! cargo fuzz run fuzz_motor_decoder

#![no_main]

use fansense::app::ports::LineId;
use fansense::events::PulseEvent;
use fansense::sensors::motor::{MotorDecoder, PULSE_LENGTH_US, SPD_MAX_PULSES};
use libfuzzer_sys::fuzz_target;

const MED: LineId = LineId(2);
const HI: LineId = LineId(13);

fuzz_target!(|data: &[u8]| {
    let mut decoder = MotorDecoder::new(MED, HI, PULSE_LENGTH_US);
    let mut ts: u32 = 0;

    for rec in data.chunks_exact(5) {
        let delta = u32::from_le_bytes([rec[0], rec[1], rec[2], rec[3]]);
        ts = ts.wrapping_add(delta);
        let source = match rec[4] % 3 {
            0 => MED,
            1 => HI,
            _ => LineId(rec[4]),
        };

        if let Some(level) = decoder.on_event(PulseEvent { timestamp_us: ts, source }) {
            assert!((1..=8).contains(&level.get()), "level out of range");
            assert_eq!(level.get(), decoder.current_speed_level());
        }
        assert!(decoder.pulse_count() <= SPD_MAX_PULSES, "counter ran away");
        assert_eq!(decoder.last_activity_timestamp(), ts);
    }
});
