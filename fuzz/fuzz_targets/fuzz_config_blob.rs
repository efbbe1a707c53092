//! Fuzz target: `DecoderConfig::decode`
//!
//! Arbitrary blobs must either be rejected or yield a config that passes
//! validation and re-encodes within `CONFIG_BLOB_MAX` bytes.
//!
//! cargo fuzz run fuzz_config_blob

#![no_main]

use libfuzzer_sys::fuzz_target;
use pulsetrain::config::CONFIG_BLOB_MAX;
use pulsetrain::DecoderConfig;

fuzz_target!(|data: &[u8]| {
    if let Ok(config) = DecoderConfig::decode(data) {
        assert!(config.validate().is_ok());
        let mut buf = [0u8; CONFIG_BLOB_MAX];
        let blob = config.encode(&mut buf).expect("validated config must encode");
        assert_eq!(DecoderConfig::decode(blob), Ok(config));
    }
});
