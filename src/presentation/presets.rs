//! Duration presets, custom input validation and default task durations

use serde::Serialize;

/// Quick preset durations in minutes
pub const QUICK_PRESETS: [u32; 8] = [5, 10, 15, 20, 25, 30, 45, 60];

/// Longer session presets in minutes
pub const EXTENDED_PRESETS: [u32; 3] = [90, 120, 180];

/// Bounds for free-form duration entry, in minutes
pub const CUSTOM_MIN_MINUTES: u32 = 1;
pub const CUSTOM_MAX_MINUTES: u32 = 480;

/// Fallback when no keyword matches a task name
pub const GENERIC_MINUTES: u32 = 20;

/// Keyword table, checked in order. Each entry lists English and Arabic
/// substrings for one kind of task.
const KEYWORD_MINUTES: [(&[&str], u32); 5] = [
    (&["kitchen", "مطبخ"], 25),
    (&["bathroom", "حمام"], 15),
    (&["bedroom", "غرفة"], 20),
    (&["living", "صالة"], 30),
    (&["organiz", "تنظيم"], 25),
];

/// Default timer length for a task, in seconds
pub fn default_duration_for(task_name: &str) -> u64 {
    let name = task_name.to_lowercase();
    let minutes = KEYWORD_MINUTES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|keyword| name.contains(keyword)))
        .map(|(_, minutes)| *minutes)
        .unwrap_or(GENERIC_MINUTES);
    minutes_to_seconds(minutes)
}

pub fn minutes_to_seconds(minutes: u32) -> u64 {
    u64::from(minutes) * 60
}

/// Whether `minutes` is one of the offered presets
pub fn is_preset(minutes: u32) -> bool {
    QUICK_PRESETS.contains(&minutes) || EXTENDED_PRESETS.contains(&minutes)
}

/// A validated free-form duration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CustomDuration(u32);

impl CustomDuration {
    /// Parse user input. Anything that is not a whole number of minutes
    /// within bounds yields `None`, which disables the apply action.
    pub fn parse(input: &str) -> Option<Self> {
        let minutes: u32 = input.trim().parse().ok()?;
        (CUSTOM_MIN_MINUTES..=CUSTOM_MAX_MINUTES)
            .contains(&minutes)
            .then_some(Self(minutes))
    }

    pub fn is_accepted(input: &str) -> bool {
        Self::parse(input).is_some()
    }

    pub fn minutes(self) -> u32 {
        self.0
    }

    pub fn seconds(self) -> u64 {
        minutes_to_seconds(self.0)
    }
}

/// A preset button as shown in the settings panel
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PresetOption {
    pub minutes: u32,
    pub label: String,
}

/// Label for a preset: minutes below an hour, hours from there on
pub fn hours_label(minutes: u32) -> String {
    if minutes >= 60 {
        if minutes % 60 == 0 {
            format!("{}h", minutes / 60)
        } else {
            format!("{}h", f64::from(minutes) / 60.0)
        }
    } else {
        format!("{}m", minutes)
    }
}

pub fn quick_options() -> Vec<PresetOption> {
    QUICK_PRESETS
        .iter()
        .map(|&minutes| PresetOption {
            minutes,
            label: format!("{}m", minutes),
        })
        .collect()
}

pub fn extended_options() -> Vec<PresetOption> {
    EXTENDED_PRESETS
        .iter()
        .map(|&minutes| PresetOption {
            minutes,
            label: hours_label(minutes),
        })
        .collect()
}

/// Format seconds as `MM:SS`; minutes are not capped at 99
pub fn format_clock(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
