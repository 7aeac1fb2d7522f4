//! Terminal drawing and keyboard commands for the mint page.

use cryptodevs_core::{AlertKind, AlertLog};
use cryptodevs_dapp::MintPage;

const CLEAR: &str = "\x1b[2J\x1b[H";
pub const CONTROLS: &str = "[Enter] press   [r] refresh   [d] disconnect   [q] quit";

/// One line of keyboard input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Press,
    Refresh,
    Disconnect,
    Quit,
    Unknown,
}

impl Command {
    pub fn parse(line: &str) -> Self {
        match line.trim().to_ascii_lowercase().as_str() {
            "" => Self::Press,
            "r" | "refresh" => Self::Refresh,
            "d" | "disconnect" => Self::Disconnect,
            "q" | "quit" | "exit" => Self::Quit,
            _ => Self::Unknown,
        }
    }
}

fn alert_prefix(kind: AlertKind) -> &'static str {
    match kind {
        AlertKind::Info => "i",
        AlertKind::Success => "\u{2714}",
        AlertKind::Warning | AlertKind::Error => "!",
    }
}

/// The page followed by the unread alerts, oldest first.
pub fn compose(page: &MintPage, alerts: &AlertLog) -> String {
    let mut screen = page.render();
    let mut unread: Vec<_> = alerts.all().into_iter().filter(|a| !a.read).collect();
    unread.reverse();
    if !unread.is_empty() {
        screen.push_str("\n\n");
        for alert in unread {
            screen.push_str(&format!("{} {}\n", alert_prefix(alert.kind), alert.message));
        }
        screen.push_str("(cleared on next input)");
    }
    screen.push_str("\n\n");
    screen.push_str(CONTROLS);
    screen
}

pub fn draw(page: &MintPage, alerts: &AlertLog) {
    println!("{CLEAR}{}", compose(page, alerts));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        assert_eq!(Command::parse(""), Command::Press);
        assert_eq!(Command::parse("  \n"), Command::Press);
        assert_eq!(Command::parse("R"), Command::Refresh);
        assert_eq!(Command::parse("d"), Command::Disconnect);
        assert_eq!(Command::parse("quit"), Command::Quit);
        assert_eq!(Command::parse("mint"), Command::Unknown);
    }
}
