//! Terminal styling for command output.

use console::Style;

use templsync_core::tree::{FileOperation, StatusCode};

/// `msg` after a green check mark.
pub fn success(msg: &str) -> String {
    format!("{} {}", Style::new().green().apply_to("✓"), msg)
}

/// `msg` after a red cross.
pub fn error(msg: &str) -> String {
    format!("{} {}", Style::new().red().apply_to("✗"), msg)
}

/// `msg` after a yellow warning sign.
pub fn warn(msg: &str) -> String {
    format!("{} {}", Style::new().yellow().apply_to("⚠"), msg)
}

/// Section titles.
pub fn header(msg: &str) -> String {
    Style::new().bold().apply_to(msg).to_string()
}

pub fn dim(msg: &str) -> String {
    Style::new().dim().apply_to(msg).to_string()
}

/// Color for a status code.
pub fn code_style(code: StatusCode) -> Style {
    match code {
        StatusCode::New | StatusCode::Deleted => Style::new().green(),
        StatusCode::Modified => Style::new().cyan(),
        StatusCode::Merged => Style::new().magenta(),
        StatusCode::Conflict => Style::new().yellow(),
        StatusCode::Error => Style::new().red(),
    }
}

/// An operation's report line, colored by its status code.
pub fn operation(op: &FileOperation) -> String {
    code_style(op.code()).apply_to(op.message()).to_string()
}
