use owo_colors::OwoColorize;

/// Standard output formatting for the CLI
#[derive(Debug, Default, Clone, Copy)]
pub struct Output;

impl Output {
    pub fn new() -> Self {
        Self
    }

    /// Print a system/status message (indented)
    pub fn status(&self, message: &str) {
        println!("  {}", message.dimmed());
    }

    pub fn info(&self, label: &str, value: &str) {
        println!("  {} {}", label.bright_blue(), value);
    }

    pub fn success(&self, message: &str) {
        println!("  {} {}", "✓".bright_green(), message);
    }

    pub fn error(&self, message: &str) {
        println!("  {} {}", "✗".bright_red(), message);
    }

    pub fn warning(&self, message: &str) {
        println!("  {} {}", "⚠".yellow(), message);
    }

    /// Print a section header
    pub fn section(&self, title: &str) {
        println!();
        println!("{}", title.bright_cyan().bold());
        println!("{}", "─".repeat(40).dimmed());
    }

    pub fn list_item(&self, item: &str) {
        println!("    • {}", item);
    }

    /// A checklist entry, struck through once done
    pub fn check_item(&self, done: bool, text: &str, note: &str) {
        if done {
            println!(
                "    {} {} {}",
                "[x]".bright_green(),
                text.strikethrough().dimmed(),
                note.dimmed()
            );
        } else {
            println!("    {} {} {}", "[ ]".dimmed(), text, note.dimmed());
        }
    }

    /// Print a key-value pair (indented)
    pub fn kv(&self, key: &str, value: &str) {
        println!("  {} {}", format!("{}:", key).dimmed(), value);
    }

    /// Show the inline error of a failed form or fetch
    pub fn load_error(&self, message: Option<&str>) {
        if let Some(message) = message {
            self.error(message);
        }
    }
}
