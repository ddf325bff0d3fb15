//! Prelude module - commonly used test utilities.
//!
//! Use `use skein_test::prelude::*;` to import all essential types.

pub use crate::{
    FailingTransport, Fixtures, MockCapability, MockConfirmHandler, RecordingTransport,
    fixture_registry, fixtures, init_test_logging, recording_channel, test_page, test_script_id,
};
