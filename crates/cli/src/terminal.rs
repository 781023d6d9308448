//! The operator's terminal: `colored` for output, `dialoguer` for questions.

use std::io;

use colored::Colorize;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Input, Password};
use taskpilot_core::console::{Block, Console};

#[derive(Default)]
pub struct TerminalConsole {
    theme: ColorfulTheme,
}

impl TerminalConsole {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Frame `body` in a box with `title` set into the top border. Long lines
/// are not wrapped; commands and file content are shown exactly.
fn framed(title: &str, body: &str) -> String {
    let width = body
        .lines()
        .map(|l| l.chars().count())
        .chain(std::iter::once(title.chars().count() + 2))
        .max()
        .unwrap_or(0)
        .clamp(20, 100);

    let mut out = String::new();
    let fill = width.saturating_sub(title.chars().count() + 1);
    out.push_str(&format!("╭─ {} {}╮\n", title.bold(), "─".repeat(fill)));
    for line in body.lines() {
        let pad = width.saturating_sub(line.chars().count());
        out.push_str(&format!("│ {line}{} │\n", " ".repeat(pad)));
    }
    out.push_str(&format!("╰{}╯", "─".repeat(width + 2)));
    out
}

/// A typed yes/no answer, or `None` when the text is neither.
fn parse_answer(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

impl Console for TerminalConsole {
    fn show(&self, block: Block) {
        match block {
            Block::Banner { title, subtitle } => {
                println!("{}", framed(&title, &subtitle).blue());
            }
            Block::Heading(text) => println!("\n{}", text.bold()),
            Block::Panel { title, body } => println!("{}", framed(&title, &body)),
            Block::Info(text) => println!("\n{}", text.bold()),
            Block::Success(text) => println!("{} {}", "✓".green(), text.green()),
            Block::Warning(text) => println!("{}", text.yellow()),
            Block::Failure(text) => println!("{} {}", "✗".red(), text.red()),
        }
    }

    // No default answer: an empty line is re-prompted, never taken as yes.
    fn confirm(&self, question: &str) -> io::Result<bool> {
        let answer = Input::<String>::with_theme(&self.theme)
            .with_prompt(format!("{question} [y/n]"))
            .validate_with(|text: &String| -> Result<(), &str> {
                parse_answer(text).map(|_| ()).ok_or("Please enter y or n")
            })
            .interact_text()
            .map_err(io::Error::other)?;
        parse_answer(&answer)
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "expected y or n"))
    }

    fn input(&self, prompt: &str) -> io::Result<String> {
        Input::<String>::with_theme(&self.theme)
            .with_prompt(prompt)
            .interact_text()
            .map_err(io::Error::other)
    }

    fn secret(&self, prompt: &str) -> io::Result<String> {
        Password::with_theme(&self.theme)
            .with_prompt(format!("{prompt} (input hidden)"))
            .allow_empty_password(true)
            .interact()
            .map_err(io::Error::other)
    }
}
