//! Stdin command parsing for headless mode
//!
//! One command per line. Arguments are split on whitespace; commands taking a
//! name or a search text use the rest of the line as-is.
//!
//! | Command | Effect |
//! |---------|--------|
//! | `quit` | Graceful shutdown (again to force) |
//! | `start` / `stop` / `restart` | Server lifecycle |
//! | `stop-benchmark` | Stop the synthetic source |
//! | `tab <name>` / `rename <name>` / `close` | Tab management |
//! | `merge <dst> <src>... [--keep-alive]` | Merge tabs into `dst` |
//! | `single-tab on\|off` | Route new connections into the first tab |
//! | `trim <n>` / `capacity <n>` | Record history of the selected tab |
//! | `dump` | Re-emit every visible record |
//! | `save <path>` / `load <path>` | Records files |
//! | `level <name> on\|off` / `levels all\|none` | Level filter |
//! | `select [<path>...]` / `children on\|off` | Namespace filter (`.` is the root) |
//! | `search [regex\|wildcard\|plain] [case\|nocase] <text>` | Search filter |
//! | `clear-search` / `next` | Search filter / find next match |
//! | `column <name> on\|off` / `extra on\|off` | Presentation |
//! | `preset load\|save\|delete\|default <name>` | Level presets |
//! | `header-preset load\|save\|delete\|default <name>` | Header presets |

use std::path::PathBuf;

use cutelog_app::{Message, SearchMode};

/// Parse one stdin line. Empty lines yield `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<Message>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (command, rest) = match line.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    };
    let args: Vec<&str> = rest.split_whitespace().collect();

    let msg = match command {
        "q" | "quit" => Message::Quit,
        "start" => Message::StartServer,
        "stop" => Message::StopServer,
        "restart" => Message::RestartServer,
        "stop-benchmark" => Message::StopBenchmark,

        "tab" => Message::SelectTab(required(rest, "tab <name>")?),
        "rename" => Message::RenameTab(required(rest, "rename <name>")?),
        "close" => Message::CloseTab,
        "merge" => parse_merge(&args)?,
        "single-tab" => Message::SetSingleTabMode(on_off(&args, "single-tab on|off")?),

        "trim" => Message::TrimRecords(count(&args, "trim <n>")?),
        "capacity" => Message::SetMaxCapacity(count(&args, "capacity <n>")?),
        "dump" => Message::DumpVisible,
        "save" => Message::SaveRecords(PathBuf::from(required(rest, "save <path>")?)),
        "load" => Message::LoadRecords(PathBuf::from(required(rest, "load <path>")?)),

        "level" => match args.as_slice() {
            [name, toggle] => Message::SetLevelEnabled {
                level: name.to_string(),
                enabled: on_off(&[*toggle], "level <name> on|off")?,
            },
            _ => return Err(usage("level <name> on|off")),
        },
        "levels" => match args.as_slice() {
            ["all"] => Message::EnableAllLevels,
            ["none"] => Message::DisableAllLevels,
            _ => return Err(usage("levels all|none")),
        },
        "select" => Message::SelectNamespaces(
            args.iter()
                .map(|path| if *path == "." { String::new() } else { path.to_string() })
                .collect(),
        ),
        "children" => Message::SetIncludeChildren(on_off(&args, "children on|off")?),
        "search" => parse_search(rest)?,
        "clear-search" => Message::ClearSearch,
        "next" => Message::FindNext,

        "column" => match args.as_slice() {
            [name, toggle] => Message::SetColumnVisible {
                column: name.to_string(),
                visible: on_off(&[*toggle], "column <name> on|off")?,
            },
            _ => return Err(usage("column <name> on|off")),
        },
        "extra" => Message::SetExtraMode(on_off(&args, "extra on|off")?),

        "preset" => parse_preset(rest, false)?,
        "header-preset" => parse_preset(rest, true)?,

        other => return Err(format!("Unknown command \"{}\"", other)),
    };
    Ok(Some(msg))
}

fn usage(form: &str) -> String {
    format!("Usage: {}", form)
}

fn required(rest: &str, form: &str) -> Result<String, String> {
    if rest.is_empty() {
        Err(usage(form))
    } else {
        Ok(rest.to_string())
    }
}

fn on_off(args: &[&str], form: &str) -> Result<bool, String> {
    match args {
        ["on"] => Ok(true),
        ["off"] => Ok(false),
        _ => Err(usage(form)),
    }
}

fn count(args: &[&str], form: &str) -> Result<usize, String> {
    match args {
        [n] => n.parse().map_err(|_| usage(form)),
        _ => Err(usage(form)),
    }
}

fn parse_merge(args: &[&str]) -> Result<Message, String> {
    let keep_alive = args.contains(&"--keep-alive");
    let names: Vec<&str> = args
        .iter()
        .copied()
        .filter(|a| *a != "--keep-alive")
        .collect();
    match names.split_first() {
        Some((dst, srcs)) if !srcs.is_empty() => Ok(Message::MergeTabs {
            dst: dst.to_string(),
            srcs: srcs.iter().map(|s| s.to_string()).collect(),
            keep_alive,
        }),
        _ => Err(usage("merge <dst> <src>... [--keep-alive]")),
    }
}

/// `search` options come first; the remainder of the line is the query
fn parse_search(rest: &str) -> Result<Message, String> {
    let mut mode = None;
    let mut case_sensitive = None;
    let mut query = rest;

    while let Some((word, tail)) = query.split_once(char::is_whitespace) {
        match word {
            "regex" => mode = Some(SearchMode::Regex),
            "wildcard" => mode = Some(SearchMode::Wildcard),
            "plain" => mode = Some(SearchMode::Plain),
            "case" => case_sensitive = Some(true),
            "nocase" => case_sensitive = Some(false),
            _ => break,
        }
        query = tail.trim_start();
    }

    if query.is_empty() {
        return Err(usage("search [regex|wildcard|plain] [case|nocase] <text>"));
    }
    Ok(Message::SetSearch {
        query: query.to_string(),
        mode,
        case_sensitive,
    })
}

fn parse_preset(rest: &str, header: bool) -> Result<Message, String> {
    let form = if header {
        "header-preset load|save|delete|default <name>"
    } else {
        "preset load|save|delete|default <name>"
    };
    let Some((op, name)) = rest.split_once(char::is_whitespace) else {
        return Err(usage(form));
    };
    let name = name.trim().to_string();
    if name.is_empty() {
        return Err(usage(form));
    }

    let msg = match (op, header) {
        ("load", false) => Message::LoadLevelPreset(name),
        ("save", false) => Message::SaveLevelPreset(name),
        ("delete", false) => Message::DeleteLevelPreset(name),
        ("default", false) => Message::SetDefaultLevelPreset(name),
        ("load", true) => Message::LoadHeaderPreset(name),
        ("save", true) => Message::SaveHeaderPreset(name),
        ("delete", true) => Message::DeleteHeaderPreset(name),
        ("default", true) => Message::SetDefaultHeaderPreset(name),
        _ => return Err(usage(form)),
    };
    Ok(msg)
}
