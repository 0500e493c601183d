//! Conditional logging macros gated on a module-level `ENABLE_LOGS` const.
//!
//! Modules that want the chatty per-tick logging define
//! `const ENABLE_LOGS: bool = true;` and use these instead of the `log`
//! macros directly; flipping the const silences one module without touching
//! the global filter.

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::info!($($arg)*);
        }
    };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::warn!($($arg)*);
        }
    };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::error!($($arg)*);
        }
    };
}
