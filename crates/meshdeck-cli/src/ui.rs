use colored::Colorize;

// ---------------------------------------------------------------------------
// Colored message helpers
// ---------------------------------------------------------------------------

fn prefix() -> String {
    "[meshdeck]".bold().cyan().to_string()
}

/// Print an informational message: [meshdeck] message
pub fn info(msg: &str) {
    println!("{} {}", prefix(), msg);
}

/// Print a success message: [meshdeck] message (in green)
pub fn success(msg: &str) {
    println!("{} {}", prefix(), msg.green());
}

/// Print an error message: [meshdeck] message (in red)
pub fn error(msg: &str) {
    eprintln!("{} {}", "[meshdeck]".bold().red(), msg.red());
}

/// Print a warning message: [meshdeck] message (in yellow)
pub fn warn(msg: &str) {
    println!("{} {}", prefix(), msg.yellow());
}

// ---------------------------------------------------------------------------
// Banner
// ---------------------------------------------------------------------------

/// Print a green bold banner box.
pub fn banner(lines: &[&str]) {
    let width = lines.iter().map(|l| l.len()).max().unwrap_or(0) + 4;
    let rule = "=".repeat(width);

    println!();
    println!("{}", rule.bold().green());
    for line in lines {
        let pad = width - line.len() - 4;
        println!(
            "{}",
            format!("  {}{}  ", line, " ".repeat(pad)).bold().green()
        );
    }
    println!("{}", rule.bold().green());
    println!();
}

// ---------------------------------------------------------------------------
// Status lines
// ---------------------------------------------------------------------------

/// Color a network status or on/off word for display.
fn colorize_status(value: &str) -> String {
    match value {
        "running" | "enabled" => value.green().to_string(),
        "starting" | "stopped" => value.yellow().to_string(),
        "error" => value.red().to_string(),
        "off" | "disabled" | "-" => value.dimmed().to_string(),
        _ => value.to_string(),
    }
}

/// Print a status line with a bold label and a colored value.
pub fn status_line(label: &str, value: &str) {
    println!("{} {}", format!("{:<14}", label).bold(), colorize_status(value));
}
