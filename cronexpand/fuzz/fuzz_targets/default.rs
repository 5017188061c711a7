#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(schedule) = s.parse::<cronexpand::Schedule>() {
            // rendering is skipped, a wide range is slow to print but never fails
            assert_eq!(schedule.fields().len(), cronexpand::FIELD_COUNT);
        }
    }
});
