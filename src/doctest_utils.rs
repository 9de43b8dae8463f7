// Internal utilities for documentation tests
// This file contains helper functions to build in-memory containers for doctests

use chrono::NaiveDate;

use crate::{MemoryContainer, RawChannel, RawTrigger, Result};

/// Creates a two channel (Fp1, BIP1) container sampled at 1000 Hz
/// with 10 samples per channel and a couple of triggers.
pub fn create_demo_container() -> Result<MemoryContainer> {
    let row: Vec<f32> = (1..=10).map(|i| i as f32 * 1e4).collect();

    MemoryContainer::new(1000.0)
        .with_channel(RawChannel::new("Fp1", "uV", "CPz"))
        .with_channel(RawChannel::new("BIP1", "uV", "CPz"))
        .with_rows(&[row.clone(), row])
        .map(|cnt| {
            cnt.with_trigger(RawTrigger::new("1", 2).with_description("Stimulus"))
                .with_trigger(RawTrigger::new("9001", 5).with_duration(2))
        })
}

/// Same as [`create_demo_container`] plus an impedance check, an amplifier
/// disconnection and a recording start time.
pub fn create_full_demo_container() -> Result<MemoryContainer> {
    let mut cnt = create_demo_container()?
        .with_trigger(
            RawTrigger::new("0", 0)
                .with_duration(1)
                .with_description("Impedance")
                .with_impedance("1000 1200"),
        )
        .with_trigger(RawTrigger::new("", 3).with_condition("Amplifier disconnected"))
        .with_trigger(RawTrigger::new("", 7).with_condition("Amplifier reconnected"));

    if let Some(start) = NaiveDate::from_ymd_opt(2024, 3, 1).and_then(|d| d.and_hms_opt(9, 30, 0)) {
        cnt = cnt.with_start_time(start);
    }
    Ok(cnt)
}
