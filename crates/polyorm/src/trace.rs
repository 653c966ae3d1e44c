//! Internal logging macros, compiled out without the `tracing` feature.

/// Debug event under the `polyorm.sql` target.
#[cfg(feature = "tracing")]
macro_rules! trace_sql {
    ($($arg:tt)*) => {
        tracing::debug!(target: "polyorm.sql", $($arg)*)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_sql {
    ($($arg:tt)*) => {};
}

/// Warning event under the `polyorm.sql` target.
#[cfg(feature = "tracing")]
macro_rules! warn_sql {
    ($($arg:tt)*) => {
        tracing::warn!(target: "polyorm.sql", $($arg)*)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! warn_sql {
    ($($arg:tt)*) => {};
}
