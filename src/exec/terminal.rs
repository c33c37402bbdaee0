// src/exec/terminal.rs

//! Terminal emulator discovery and window invocation assembly.

use anyhow::anyhow;
use tracing::warn;

use crate::cli::TerminalChoice;
use crate::errors::{FlowdagError, Result};
use crate::types::TerminalKind;

/// Terminal emulators present on this host, in preference order.
pub fn detect_available() -> Vec<TerminalKind> {
    [TerminalKind::GnomeTerminal, TerminalKind::Xterm]
        .into_iter()
        .filter(|kind| which::which(kind.program()).is_ok())
        .collect()
}

/// Pick a terminal based on desktop environment and availability.
///
/// GNOME desktops prefer gnome-terminal; otherwise the first available of
/// gnome-terminal, xterm.
pub fn default_terminal() -> Option<TerminalKind> {
    let available = detect_available();
    if available.is_empty() {
        return None;
    }

    let desktop = std::env::var("XDG_CURRENT_DESKTOP")
        .unwrap_or_default()
        .to_lowercase();
    if desktop.contains("gnome") && available.contains(&TerminalKind::GnomeTerminal) {
        return Some(TerminalKind::GnomeTerminal);
    }

    available.first().copied()
}

/// Resolve the CLI choice against what the host actually has.
///
/// A requested-but-missing terminal falls back to whatever is available
/// (with a warning); no terminal at all is an error, since multi-terminal
/// mode cannot run without one.
pub fn select_terminal(choice: TerminalChoice) -> Result<TerminalKind> {
    let available = detect_available();

    let wanted = match choice {
        TerminalChoice::Auto => default_terminal(),
        TerminalChoice::Xterm => Some(TerminalKind::Xterm),
        TerminalChoice::GnomeTerminal => Some(TerminalKind::GnomeTerminal),
    };

    match wanted {
        Some(kind) if available.contains(&kind) => Ok(kind),
        Some(kind) => match available.first() {
            Some(fallback) => {
                warn!(
                    requested = %kind,
                    using = %fallback,
                    "requested terminal not available; falling back"
                );
                Ok(*fallback)
            }
            None => Err(FlowdagError::Other(anyhow!(
                "no supported terminal emulator found (xterm or gnome-terminal)"
            ))),
        },
        None => Err(FlowdagError::Other(anyhow!(
            "no supported terminal emulator found (xterm or gnome-terminal)"
        ))),
    }
}

/// Wrap an inner command in a terminal-window invocation.
///
/// Returns `(program, args)` ready for the launcher. `--wait` / `-hold`
/// matter: the terminal process must stay attached while the task runs so
/// the health monitor can tell "window closed" from "task finished".
pub fn terminal_invocation(
    kind: TerminalKind,
    title: &str,
    inner: &[String],
) -> (String, Vec<String>) {
    match kind {
        TerminalKind::Xterm => {
            let mut args = vec![
                "-title".to_string(),
                title.to_string(),
                "-hold".to_string(),
                "-e".to_string(),
            ];
            args.extend(inner.iter().cloned());
            ("xterm".to_string(), args)
        }
        TerminalKind::GnomeTerminal => {
            let mut args = vec![
                "--wait".to_string(),
                "--title".to_string(),
                title.to_string(),
                "--".to_string(),
            ];
            args.extend(inner.iter().cloned());
            ("gnome-terminal".to_string(), args)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xterm_invocation_shape() {
        let (program, args) = terminal_invocation(
            TerminalKind::Xterm,
            "Task: syn",
            &["sh".to_string(), "/tmp/x.sh".to_string()],
        );
        assert_eq!(program, "xterm");
        assert_eq!(
            args,
            vec!["-title", "Task: syn", "-hold", "-e", "sh", "/tmp/x.sh"]
        );
    }

    #[test]
    fn gnome_invocation_waits() {
        let (program, args) = terminal_invocation(
            TerminalKind::GnomeTerminal,
            "Task: syn",
            &["sh".to_string(), "/tmp/x.sh".to_string()],
        );
        assert_eq!(program, "gnome-terminal");
        assert_eq!(args[0], "--wait");
        assert_eq!(args.last().unwrap(), "/tmp/x.sh");
    }
}
