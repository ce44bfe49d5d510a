use crossterm::{
    cursor::Show,
    event::{DisableBracketedPaste, EnableBracketedPaste},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, IsTerminal, Stdout};
use std::sync::Once;

pub type PlaygroundTerminal = Terminal<CrosstermBackend<Stdout>>;
static RESTORE_ON_PANIC: Once = Once::new();

/// Both stdin and stdout are attached to a terminal.
pub fn is_interactive() -> bool {
    io::stdin().is_terminal() && io::stdout().is_terminal()
}

/// Leaves raw mode and the alternate screen. Idempotent.
pub fn restore_terminal() {
    let _ = disable_raw_mode();
    let _ = execute!(
        io::stdout(),
        LeaveAlternateScreen,
        DisableBracketedPaste,
        Show
    );
}

fn restore_on_panic() {
    RESTORE_ON_PANIC.call_once(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            restore_terminal();
            previous(info);
        }));
    });
}

fn enter() -> anyhow::Result<PlaygroundTerminal> {
    enable_raw_mode()?;
    execute!(io::stdout(), EnterAlternateScreen, EnableBracketedPaste)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;
    terminal.clear()?;
    Ok(terminal)
}

/// Holds the alternate screen for the playground's lifetime; dropping it,
/// including on early `?` returns, hands the terminal back in cooked mode.
pub struct TerminalGuard {
    terminal: PlaygroundTerminal,
}

impl TerminalGuard {
    pub fn new() -> anyhow::Result<Self> {
        restore_on_panic();
        match enter() {
            Ok(terminal) => Ok(Self { terminal }),
            Err(error) => {
                restore_terminal();
                Err(error)
            }
        }
    }

    pub fn terminal_mut(&mut self) -> &mut PlaygroundTerminal {
        &mut self.terminal
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        restore_terminal();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_hook_is_installed_once() {
        restore_on_panic();
        restore_on_panic();
        assert!(RESTORE_ON_PANIC.is_completed());
    }
}
