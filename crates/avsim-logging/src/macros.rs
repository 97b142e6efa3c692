//! ---
//! avsim_section: "03-logging"
//! avsim_subsection: "module"
//! avsim_type: "source"
//! avsim_scope: "code"
//! avsim_description: "Structured logging context for simulation events."
//! avsim_version: "v0.1.0"
//! avsim_owner: "tbd"
//! ---
/// Emit an informational log enriched with simulation context.
#[macro_export]
macro_rules! sim_info {
    (context = $ctx:expr, $($arg:tt)+) => {{
        let ctx = &$ctx;
        tracing::event!(
            tracing::Level::INFO,
            mode = ctx.mode.unwrap_or(""),
            phase = ctx.phase.unwrap_or(""),
            tick = ctx.tick.unwrap_or_default(),
            sim_time = ctx.sim_time.unwrap_or_default(),
            scenario = ctx.scenario.unwrap_or(""),
            message = %format_args!($($arg)+)
        );
    }};
    ($($arg:tt)+) => {{
        $crate::sim_info!(context = $crate::LogContext::default(), $($arg)+)
    }};
}

/// Emit a debug log enriched with simulation context.
#[macro_export]
macro_rules! sim_debug {
    (context = $ctx:expr, $($arg:tt)+) => {{
        let ctx = &$ctx;
        tracing::event!(
            tracing::Level::DEBUG,
            mode = ctx.mode.unwrap_or(""),
            phase = ctx.phase.unwrap_or(""),
            tick = ctx.tick.unwrap_or_default(),
            sim_time = ctx.sim_time.unwrap_or_default(),
            scenario = ctx.scenario.unwrap_or(""),
            message = %format_args!($($arg)+)
        );
    }};
    ($($arg:tt)+) => {{
        $crate::sim_debug!(context = $crate::LogContext::default(), $($arg)+)
    }};
}

/// Emit a warning log enriched with simulation context.
#[macro_export]
macro_rules! sim_warn {
    (context = $ctx:expr, $($arg:tt)+) => {{
        let ctx = &$ctx;
        tracing::event!(
            tracing::Level::WARN,
            mode = ctx.mode.unwrap_or(""),
            phase = ctx.phase.unwrap_or(""),
            tick = ctx.tick.unwrap_or_default(),
            sim_time = ctx.sim_time.unwrap_or_default(),
            scenario = ctx.scenario.unwrap_or(""),
            message = %format_args!($($arg)+)
        );
    }};
    ($($arg:tt)+) => {{
        $crate::sim_warn!(context = $crate::LogContext::default(), $($arg)+)
    }};
}
