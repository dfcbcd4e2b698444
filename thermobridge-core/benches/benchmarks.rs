// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::window_bench::bench_window;
use criterion::{criterion_group, criterion_main};


criterion_group!(benches, bench_window);
criterion_main!(benches);
