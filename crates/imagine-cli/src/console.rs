use std::io::{BufRead, ErrorKind, Write};

use anyhow::{bail, Result};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use imagine_contracts::errors::ValidationError;
use imagine_contracts::interaction::InteractionSurface;
use imagine_contracts::validation::{validate_https_url, validate_secret, validate_text};

/// Line-oriented prompts over any reader/writer pair. With `masked` set, secrets are read
/// key by key from the terminal and echoed as `*`.
pub struct ConsoleSurface<R, W> {
    input: R,
    output: W,
    masked: bool,
}

impl<R: BufRead, W: Write> ConsoleSurface<R, W> {
    pub fn new(input: R, output: W, masked: bool) -> Self {
        Self {
            input,
            output,
            masked,
        }
    }

    fn read_line(&mut self) -> Result<String> {
        let mut line = String::new();
        loop {
            line.clear();
            match self.input.read_line(&mut line) {
                Ok(0) => bail!("input closed"),
                Ok(_) => return Ok(line.trim_end_matches(['\n', '\r']).to_string()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            }
        }
    }

    fn ask(&mut self, title: &str) -> Result<String> {
        write!(self.output, "{title}: ")?;
        self.output.flush()?;
        self.read_line()
    }

    /// Keeps asking until `validate` accepts the answer.
    fn ask_until<T>(
        &mut self,
        title: &str,
        validate: impl Fn(&str) -> Result<T, ValidationError>,
    ) -> Result<T> {
        loop {
            let answer = self.ask(title)?;
            match validate(&answer) {
                Ok(value) => return Ok(value),
                Err(err) => self.error(&err.to_string()),
            }
        }
    }

    fn print_menu(&mut self, title: &str, options: &[String]) -> Result<()> {
        writeln!(self.output, "{title}")?;
        for (idx, option) in options.iter().enumerate() {
            writeln!(self.output, "  {}) {}", idx + 1, option)?;
        }
        Ok(())
    }

    fn read_masked(&mut self, title: &str) -> Result<String> {
        write!(self.output, "{title}: ")?;
        self.output.flush()?;
        terminal::enable_raw_mode()?;
        let result = read_masked_keys(&mut self.output);
        terminal::disable_raw_mode()?;
        writeln!(self.output)?;
        result
    }
}

fn read_masked_keys(output: &mut impl Write) -> Result<String> {
    let mut secret = String::new();
    loop {
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        match key.code {
            KeyCode::Enter => return Ok(secret),
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                bail!("input cancelled")
            }
            KeyCode::Backspace => {
                if secret.pop().is_some() {
                    write!(output, "\u{8} \u{8}")?;
                }
            }
            KeyCode::Char(ch) => {
                secret.push(ch);
                write!(output, "*")?;
            }
            _ => {}
        }
        output.flush()?;
    }
}

/// Accepts a 1-based index or the exact option text.
fn parse_single_selection(answer: &str, options: &[String]) -> Result<String, ValidationError> {
    let answer = answer.trim();
    if let Ok(idx) = answer.parse::<usize>() {
        if (1..=options.len()).contains(&idx) {
            return Ok(options[idx - 1].clone());
        }
    }
    options
        .iter()
        .find(|option| option.as_str() == answer)
        .cloned()
        .ok_or_else(|| {
            ValidationError(format!("Choose a number between 1 and {}.", options.len()))
        })
}

/// Comma or space separated indexes/names; duplicates collapse and menu order is kept.
fn parse_multi_selection(answer: &str, options: &[String]) -> Result<Vec<String>, ValidationError> {
    let mut picked = vec![false; options.len()];
    for token in answer
        .split([',', ' '])
        .map(str::trim)
        .filter(|token| !token.is_empty())
    {
        let choice = parse_single_selection(token, options)
            .map_err(|_| ValidationError(format!("'{token}' is not one of the options.")))?;
        if let Some(idx) = options.iter().position(|option| *option == choice) {
            picked[idx] = true;
        }
    }

    let selected = options
        .iter()
        .zip(picked)
        .filter_map(|(option, picked)| picked.then(|| option.clone()))
        .collect::<Vec<String>>();
    if selected.is_empty() {
        return Err(ValidationError("Select at least one option.".to_string()));
    }
    Ok(selected)
}

impl<R: BufRead, W: Write> InteractionSurface for ConsoleSurface<R, W> {
    fn select_one(&mut self, title: &str, options: &[String]) -> Result<String> {
        self.print_menu(title, options)?;
        self.ask_until("Choice", |answer| parse_single_selection(answer, options))
    }

    fn select_many(&mut self, title: &str, options: &[String]) -> Result<Vec<String>> {
        self.print_menu(title, options)?;
        self.ask_until("Choices (e.g. 1,3)", |answer| {
            parse_multi_selection(answer, options)
        })
    }

    fn read_secret(&mut self, title: &str, min_chars: usize) -> Result<String> {
        loop {
            let answer = if self.masked {
                self.read_masked(title)?
            } else {
                self.ask(title)?
            };
            match validate_secret(&answer, min_chars) {
                Ok(secret) => return Ok(secret),
                Err(err) => self.error(&err.to_string()),
            }
        }
    }

    fn read_https_url(&mut self, title: &str) -> Result<String> {
        self.ask_until(title, validate_https_url)
    }

    fn read_text(&mut self, title: &str, max_chars: Option<usize>) -> Result<String> {
        self.ask_until(title, |answer| validate_text(answer, max_chars))
    }

    fn info(&mut self, message: &str) {
        let _ = writeln!(self.output, "{message}");
    }

    fn warn(&mut self, message: &str) {
        let _ = writeln!(self.output, "Warning: {message}");
    }

    fn error(&mut self, message: &str) {
        let _ = writeln!(self.output, "Error: {message}");
    }
}

/// Blocks until a key is pressed. Without a terminal there is nothing to wait for.
pub fn wait_for_any_key(interactive: bool) -> Result<()> {
    if !interactive {
        return Ok(());
    }
    terminal::enable_raw_mode()?;
    let result = loop {
        match event::read() {
            Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => break Ok(()),
            Ok(_) => continue,
            Err(err) => break Err(err),
        }
    };
    terminal::disable_raw_mode()?;
    result.map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn options(items: &[&str]) -> Vec<String> {
        items.iter().map(|item| (*item).to_string()).collect()
    }

    fn surface(input: &str) -> ConsoleSurface<Cursor<Vec<u8>>, Vec<u8>> {
        ConsoleSurface::new(Cursor::new(input.as_bytes().to_vec()), Vec::new(), false)
    }

    fn printed(surface: &ConsoleSurface<Cursor<Vec<u8>>, Vec<u8>>) -> String {
        String::from_utf8_lossy(&surface.output).to_string()
    }

    #[test]
    fn single_selection_accepts_index_or_text() {
        let menu = options(&["Azure OpenAI", "OpenAI", "Google AI"]);
        assert_eq!(parse_single_selection("2", &menu).unwrap(), "OpenAI");
        assert_eq!(parse_single_selection(" Google AI ", &menu).unwrap(), "Google AI");
        assert!(parse_single_selection("0", &menu).is_err());
        assert!(parse_single_selection("4", &menu).is_err());
        assert!(parse_single_selection("", &menu).is_err());
    }

    #[test]
    fn multi_selection_keeps_menu_order_and_requires_one() {
        let menu = options(&["dall-e-3", "gpt-image-1", "gpt-image-1-mini", "gpt-image-1.5"]);
        assert_eq!(
            parse_multi_selection("4, 1 4", &menu).unwrap(),
            vec!["dall-e-3", "gpt-image-1.5"]
        );
        assert_eq!(
            parse_multi_selection("gpt-image-1-mini", &menu).unwrap(),
            vec!["gpt-image-1-mini"]
        );
        assert!(parse_multi_selection(" , ", &menu).is_err());
        assert!(parse_multi_selection("1,9", &menu).is_err());
    }

    #[test]
    fn invalid_answers_are_reprompted() -> Result<()> {
        let mut console = surface("7\n3\n");
        let menu = options(&["Azure OpenAI", "OpenAI", "Google AI"]);
        assert_eq!(console.select_one("Select an AI provider", &menu)?, "Google AI");
        let out = printed(&console);
        assert!(out.contains("  1) Azure OpenAI"));
        assert!(out.contains("Error: Choose a number between 1 and 3."));
        Ok(())
    }

    #[test]
    fn url_and_text_prompts_validate_until_accepted() -> Result<()> {
        let mut console =
            surface("http://insecure.example\nhttps://res.openai.azure.com/\nhi\nneon city\n");
        assert_eq!(
            console.read_https_url("Endpoint")?,
            "https://res.openai.azure.com"
        );
        assert_eq!(console.read_text("Prompt", Some(20))?, "neon city");
        let out = printed(&console);
        assert!(out.contains("Error: Endpoint must use https://."));
        assert!(out.contains("Error: Enter at least 3 characters."));
        Ok(())
    }

    #[test]
    fn unmasked_secret_enforces_minimum_length() -> Result<()> {
        let mut console = surface("short\nsk-0123456789\n");
        assert_eq!(console.read_secret("OpenAI API key", 10)?, "sk-0123456789");
        assert!(printed(&console).contains("Error: Enter at least 10 characters."));
        Ok(())
    }

    #[test]
    fn closed_input_is_an_error_not_a_loop() {
        let mut console = surface("");
        let err = console.read_text("Prompt", None).unwrap_err();
        assert_eq!(err.to_string(), "input closed");
    }

    #[test]
    fn message_levels_are_prefixed() {
        let mut console = surface("");
        console.info("Saved.");
        console.warn("Skipping 'bad'.");
        console.error("Unauthorized (401): check your API key.");
        assert_eq!(
            printed(&console),
            "Saved.\nWarning: Skipping 'bad'.\nError: Unauthorized (401): check your API key.\n"
        );
    }

    #[test]
    fn non_interactive_exit_does_not_wait() {
        assert!(wait_for_any_key(false).is_ok());
    }
}
