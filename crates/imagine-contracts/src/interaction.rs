//! Console-facing collaborator used by the session.
//!
//! Prompts validate their own input and keep asking until it passes; the `Err` side is reserved
//! for the terminal itself failing (closed stdin, broken pipe).

pub trait InteractionSurface {
    fn select_one(&mut self, title: &str, options: &[String]) -> anyhow::Result<String>;

    /// Returns at least one selection, in menu order.
    fn select_many(&mut self, title: &str, options: &[String]) -> anyhow::Result<Vec<String>>;

    /// Masked input of at least `min_chars` characters.
    fn read_secret(&mut self, title: &str, min_chars: usize) -> anyhow::Result<String>;

    fn read_https_url(&mut self, title: &str) -> anyhow::Result<String>;

    /// Free text of at least three characters and at most `max_chars` when set.
    fn read_text(&mut self, title: &str, max_chars: Option<usize>) -> anyhow::Result<String>;

    fn info(&mut self, message: &str);

    fn warn(&mut self, message: &str);

    fn error(&mut self, message: &str);
}
