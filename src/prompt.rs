use std::io::{self, BufRead, IsTerminal, Write};

use console::Term;
use dialoguer::{Input, theme::ColorfulTheme};

/// The only answer that starts a migration, compared case-insensitively.
const CONFIRMATION_WORD: &str = "yes";

/// Abstraction over reading one line of free-form input from the user.
///
/// This trait decouples the confirmation logic from the terminal so the
/// migration flow can be exercised with scripted answers.
pub trait LinePrompter {
    /// Shows `prompt` and returns the line the user typed, possibly empty.
    ///
    /// # Returns
    /// `Ok(String)` with the raw input, or `Err(String)` describing the failure.
    fn read_line(&mut self, prompt: &str) -> Result<String, String>;
}

/// Default implementation of `LinePrompter`.
///
/// Uses `dialoguer::Input` with the `ColorfulTheme` when both stdin and stderr
/// are terminals, and falls back to a plain line read from stdin when input is
/// piped.
pub struct TerminalLinePrompter;

impl LinePrompter for TerminalLinePrompter {
    fn read_line(&mut self, prompt: &str) -> Result<String, String> {
        if Term::stderr().is_term() && io::stdin().is_terminal() {
            let theme = ColorfulTheme::default();
            let input = Input::<String>::with_theme(&theme)
                .with_prompt(prompt)
                .allow_empty(true);
            return input.interact_text().map_err(|e| e.to_string());
        }

        print!("{prompt}: ");
        io::stdout().flush().map_err(|e| e.to_string())?;

        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(_) => Ok(line),
            Err(e) => Err(e.to_string()),
        }
    }
}

/// Returns `true` only for `yes`, ignoring case and surrounding whitespace.
pub fn is_confirmation(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case(CONFIRMATION_WORD)
}

/// Ask the user to confirm rewriting the previewed remotes.
///
/// Anything other than `yes` (including `y` and an empty line) declines.
///
/// # Returns
/// - `Ok(true)` if the user typed `yes`.
/// - `Ok(false)` for any other answer.
/// - `Err(String)` if input failed.
pub fn confirm_migration<P: LinePrompter>(prompter: &mut P) -> Result<bool, String> {
    let prompt = "Migrate repositories? (type 'yes' to continue) [yes/NO]";
    prompter.read_line(prompt).map(|answer| is_confirmation(&answer))
}
