use crate::storage::Status;
use crate::ui::{theme, Icons};
use owo_colors::OwoColorize;

const BAR_WIDTH: usize = 30;

pub fn header(icon: &str, text: &str) {
    println!("{} {}", icon, text.style(theme().header.clone()));
}

pub fn success(label: &str) {
    println!("{} {}", Icons::CHECK, label.style(theme().success.clone()));
}

pub fn error(label: &str) {
    eprintln!("{} {}", Icons::CROSS, label.style(theme().error.clone()));
}

pub fn warn(label: &str) {
    eprintln!("{} {}", Icons::WARN, label.style(theme().warn.clone()));
}

pub fn info(label: &str, value: &str) {
    println!(
        "{} {}: {}",
        Icons::INFO.style(theme().info.clone()),
        label.style(theme().dim.clone()),
        value
    );
}

pub fn section(title: &str) {
    println!();
    println!("━{}━", title.style(theme().header.clone()));
}

pub fn summary_row(label: &str, value: &str) {
    println!("  {} {}", label.style(theme().dim.clone()), value);
}

/// `[#####.....] 12/40` style bar for labelling progress
pub fn progress_bar(status: &Status) -> String {
    let filled = if status.total == 0 {
        0
    } else {
        status.done * BAR_WIDTH / status.total
    };
    format!(
        "[{}{}] {}/{}",
        "#".repeat(filled).style(theme().done.clone()),
        ".".repeat(BAR_WIDTH - filled).style(theme().pending.clone()),
        status.done,
        status.total
    )
}
