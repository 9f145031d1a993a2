#![no_main]

use groum_ingest::dump::{parse_anomaly_dump, parse_pattern_dump, ParserOptions};
use groum_ingest::summary::read_cluster_summary;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // Neither grammar may panic, whatever the miner wrote
        let options = ParserOptions::default();
        let _ = parse_pattern_dump(input, &options);
        let _ = parse_anomaly_dump(input, &options);
        let _ = read_cluster_summary(input, 0);
    }
});
