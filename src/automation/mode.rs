//! Run mode selection.

use std::fmt;

use crate::config::AutomationConfig;

/// How the engine is driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Once,
    Loop,
    Watch,
    Schedule,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Mode::Once => "once",
            Mode::Loop => "loop",
            Mode::Watch => "watch",
            Mode::Schedule => "schedule",
        })
    }
}

/// Mode switches given on the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModeFlags {
    pub once: bool,
    pub loop_: bool,
    pub watch: bool,
    pub schedule: bool,
}

impl Mode {
    /// Pick the mode from CLI flags, then config switches.
    ///
    /// Any CLI flag beats every config switch. Within each source the order is
    /// once, watch, schedule, loop. With nothing set a single manual cycle runs.
    pub fn resolve(flags: ModeFlags, config: &AutomationConfig) -> Mode {
        if flags.once {
            Mode::Once
        } else if flags.watch {
            Mode::Watch
        } else if flags.schedule {
            Mode::Schedule
        } else if flags.loop_ {
            Mode::Loop
        } else if config.watcher.enabled {
            Mode::Watch
        } else if config.scheduler.enabled {
            Mode::Schedule
        } else if config.auto_loop {
            Mode::Loop
        } else {
            Mode::Once
        }
    }
}
