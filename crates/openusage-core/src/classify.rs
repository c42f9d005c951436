//! Process classification.
//!
//! A static substring table maps executable names to display metadata:
//! browsers, system services, known applications by category, and everything
//! else unknown. Matching is case-insensitive, first match wins in declared
//! order. Pure data in, pure data out; the table is compile-time
//! configuration, not runtime-mutable state.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Broad process family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessKind {
    System,
    Browser,
    Program,
    Unknown,
}

impl ProcessKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ProcessKind::System => "system",
            ProcessKind::Browser => "browser",
            ProcessKind::Program => "program",
            ProcessKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ProcessKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display metadata attached to a process name. Serialized inside the
/// statistics document with `kind` under the key `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub display_name: String,
    #[serde(rename = "type")]
    pub kind: ProcessKind,
    pub category: String,
    pub icon: String,
    pub is_rival: bool,
    pub is_critical: bool,
}

struct Rule {
    /// Substring matched against the lowercased process name.
    pattern: &'static str,
    display_name: &'static str,
    kind: ProcessKind,
    category: &'static str,
    icon: &'static str,
    is_rival: bool,
    is_critical: bool,
}

const fn browser(pattern: &'static str, display_name: &'static str) -> Rule {
    Rule {
        pattern,
        display_name,
        kind: ProcessKind::Browser,
        category: "Browser",
        icon: "🔍",
        is_rival: true,
        is_critical: false,
    }
}

const fn system(pattern: &'static str, display_name: &'static str, critical: bool) -> Rule {
    Rule {
        pattern,
        display_name,
        kind: ProcessKind::System,
        category: "System",
        icon: "",
        is_rival: false,
        is_critical: critical,
    }
}

const fn program(
    pattern: &'static str,
    display_name: &'static str,
    category: &'static str,
    rival: bool,
) -> Rule {
    Rule {
        pattern,
        display_name,
        kind: ProcessKind::Program,
        category,
        icon: "",
        is_rival: rival,
        is_critical: false,
    }
}

/// Declared order is match order. More specific patterns come before the
/// generic ones they contain (`notepad++` before `notepad`, bare `system`
/// last in its group).
const RULES: &[Rule] = &[
    // Browsers: the resource rivals.
    browser("chrome", "Google Chrome"),
    browser("firefox", "Mozilla Firefox"),
    browser("msedge", "Microsoft Edge"),
    browser("opera", "Opera"),
    browser("brave", "Brave"),
    browser("vivaldi", "Vivaldi"),
    browser("safari", "Safari"),
    browser("iexplore", "Internet Explorer"),
    // System services.
    system("explorer", "Windows Explorer", true),
    system("svchost", "Service Host", true),
    system("dwm", "Desktop Window Manager", true),
    system("csrss", "Client/Server Runtime", true),
    system("lsass", "Local Security Authority", true),
    system("services", "Services Control Manager", true),
    system("winlogon", "Windows Logon", true),
    system("smss", "Session Manager", true),
    system("wininit", "Windows Init", true),
    system("taskhost", "Task Host Window", false),
    system("searchindexer", "Search Indexer", false),
    system("spoolsv", "Print Spooler", false),
    system("audiodg", "Audio Device Graph", false),
    system("conhost", "Console Host", false),
    system("system", "System", true),
    // Development.
    program("code", "VS Code", "Development", false),
    program("devenv", "Visual Studio", "Development", false),
    program("pycharm", "PyCharm", "Development", false),
    program("idea64", "IntelliJ IDEA", "Development", false),
    program("sublime", "Sublime Text", "Development", false),
    program("notepad++", "Notepad++", "Development", false),
    program("atom", "Atom", "Development", false),
    // Communication. Ahead of gaming: "msteams" contains "steam".
    program("discord", "Discord", "Communication", false),
    program("slack", "Slack", "Communication", false),
    program("teams", "Microsoft Teams", "Communication", false),
    program("skype", "Skype", "Communication", false),
    program("zoom", "Zoom", "Communication", false),
    // Gaming; launchers count as rivals just like browsers.
    program("steam", "Steam", "Gaming", true),
    program("epicgames", "Epic Games", "Gaming", true),
    program("battlenet", "Battle.net", "Gaming", true),
    program("origin", "Origin", "Gaming", true),
    program("uplay", "Uplay", "Gaming", true),
    program("gog", "GOG Galaxy", "Gaming", true),
    // Media.
    program("spotify", "Spotify", "Media", false),
    program("vlc", "VLC Media Player", "Media", false),
    program("obs64", "OBS Studio", "Media", false),
    program("photoshop", "Photoshop", "Media", false),
    program("gimp", "GIMP", "Media", false),
    // Utilities.
    program("winrar", "WinRAR", "Utilities", false),
    program("7zfm", "7-Zip", "Utilities", false),
    program("notepad", "Notepad", "Utilities", false),
    program("calc", "Calculator", "Utilities", false),
];

/// Classify a process name (any casing). Deterministic and side-effect
/// free; unrecognized names fall back to Unknown carrying the raw name.
pub fn classify(name: &str) -> Classification {
    let lowered = name.trim().to_lowercase();
    for rule in RULES {
        if lowered.contains(rule.pattern) {
            return Classification {
                display_name: rule.display_name.to_string(),
                kind: rule.kind,
                category: rule.category.to_string(),
                icon: rule.icon.to_string(),
                is_rival: rule.is_rival,
                is_critical: rule.is_critical,
            };
        }
    }
    Classification {
        display_name: name.to_string(),
        kind: ProcessKind::Unknown,
        category: "Unknown".to_string(),
        icon: "❓".to_string(),
        is_rival: false,
        is_critical: false,
    }
}

/// Everything that is not a recognized system process counts as user
/// software, unknown names included.
pub fn is_user_process(name: &str) -> bool {
    classify(name).kind != ProcessKind::System
}

pub fn is_system_process(name: &str) -> bool {
    classify(name).kind == ProcessKind::System
}

/// Informational blurbs for well-known processes, with a generic fallback.
pub fn describe(name: &str) -> &'static str {
    const BLURBS: &[(&str, &str)] = &[
        (
            "chrome",
            "Google's browser. Each tab and extension runs as its own process, \
             so dozens of chrome entries and heavy RAM use are normal.",
        ),
        (
            "firefox",
            "Mozilla's browser. Splits sites across a handful of container \
             processes; steady RAM growth over a long session is expected.",
        ),
        (
            "msedge",
            "Microsoft's Chromium-based browser. Multi-process like Chrome and \
             often preloaded at startup, so it may appear without being opened.",
        ),
        (
            "svchost",
            "Windows service host. Many instances are normal; each one bundles \
             a group of system services. Do not terminate.",
        ),
        (
            "explorer",
            "Windows Explorer draws the desktop, taskbar and file windows. \
             Restarting it redraws the shell; killing it leaves a bare desktop.",
        ),
        (
            "dwm",
            "Desktop Window Manager composites every window with GPU help. \
             Usage rises with animations and high-refresh displays.",
        ),
        (
            "searchindexer",
            "Windows search indexing. Bursts of CPU and disk while cataloguing \
             new files, then idles.",
        ),
        (
            "steam",
            "Valve's game launcher. Light when idle; downloads and shader \
             pre-compilation can briefly saturate CPU and disk.",
        ),
        (
            "code",
            "Visual Studio Code. Spawns helper processes per window and \
             extension host; language servers can be CPU-hungry on big projects.",
        ),
        (
            "discord",
            "Voice and text chat. Moderate RAM at rest; CPU climbs while \
             streaming or in large voice channels.",
        ),
        (
            "spotify",
            "Music streaming client. Small CPU footprint; caches tracks to \
             disk in the background.",
        ),
        (
            "obs64",
            "OBS Studio screen recorder and streamer. Encoding is heavy by \
             design; sustained high CPU or GPU during capture is expected.",
        ),
    ];
    let lowered = name.trim().to_lowercase();
    for (pattern, blurb) in BLURBS {
        if lowered.contains(pattern) {
            return blurb;
        }
    }
    "No description on file for this process. Unrecognized software is not \
     necessarily a problem, but sustained high usage is worth a look."
}
