// Copyright 2024 The html5core Developers.
// Licensed under the MIT license <LICENSE-MIT> or the Apache License,
// Version 2.0 <LICENSE-APACHE>, at your option.

/// Unwrap an `Option`, or perform an early return (optionally with a value)
/// when it's `None`. Used pervasively in the tokenizer's batch-scan loops,
/// where "ran out of input" and "found nothing interesting" are both
/// legitimate reasons to bail out of a step early.
macro_rules! unwrap_or_return {
    ($opt:expr) => {{
        match $opt {
            Some(x) => x,
            None => return,
        }
    }};
    ($opt:expr, $retval:expr) => {{
        match $opt {
            Some(x) => x,
            None => return $retval,
        }
    }};
}

/// Time an expression's evaluation in nanoseconds, for the `trace_tokenizer`
/// and adoption-agency iteration diagnostics.
macro_rules! time {
    ($e:expr) => {{
        let now = ::std::time::Instant::now();
        let result = $e;
        let d = now.elapsed();
        let dt = d.as_secs() * 1_000_000_000 + u64::from(d.subsec_nanos());
        (result, dt)
    }};
}
