// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Spin loop support for polling device memory.

use std::time::Duration;

const YIELD_ATTEMPTS: u64 = 250;
const SHORT_SLEEP_ATTEMPTS: u64 = 250;
const SHORT_SLEEP_DURATION: Duration = Duration::from_millis(1);
const LONG_SLEEP_DURATION: Duration = Duration::from_millis(15);

/// Yields the current thread while polling for a condition that has no
/// interrupt-based notification, such as a firmware response landing in DMA
/// memory.
///
/// The first attempts only yield; later ones sleep for progressively longer.
#[derive(Default)]
pub(crate) struct Backoff {
    n: u64,
}

impl Backoff {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn back_off(&mut self) {
        if self.n < YIELD_ATTEMPTS {
            std::thread::yield_now();
        } else {
            let delay = if self.n - YIELD_ATTEMPTS < SHORT_SLEEP_ATTEMPTS {
                SHORT_SLEEP_DURATION
            } else {
                LONG_SLEEP_DURATION
            };
            std::thread::sleep(delay);
        }
        self.n += 1;
    }
}
