//! CLI output formatting utilities

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};

use super::commands::RouteReport;
use crate::auth::AccessClaims;

/// Print a success message
pub fn success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

/// Print an error message
pub fn error(message: &str) {
    eprintln!("{} {}", "✗".red(), message);
}

/// Print a warning message
pub fn warn(message: &str) {
    println!("{} {}", "⚠".yellow(), message);
}

/// Print an info message
pub fn info(message: &str) {
    println!("{} {}", "ℹ".blue(), message);
}

/// Print a table of route decisions
pub fn print_route_table(reports: &[RouteReport]) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Path").fg(Color::Cyan),
            Cell::new("Guarded").fg(Color::Cyan),
            Cell::new("Class").fg(Color::Cyan),
            Cell::new("Anonymous visitor").fg(Color::Cyan),
        ]);

    for report in reports {
        let class = report
            .class
            .map(|c| c.to_string())
            .unwrap_or_else(|| "-".to_string());
        let class_color = match report.class {
            Some(crate::guard::RouteClass::Protected) => Color::Yellow,
            Some(crate::guard::RouteClass::Public) => Color::Green,
            None => Color::Grey,
        };
        let guarded = if report.excluded { "no" } else { "yes" };

        table.add_row(vec![
            Cell::new(&report.path),
            Cell::new(guarded),
            Cell::new(class).fg(class_color),
            Cell::new(&report.anonymous),
        ]);
    }

    println!("{table}");
}

/// Print access token claims
pub fn print_claims(claims: &AccessClaims) {
    println!("{}", "Access Token".bold().underline());
    println!();
    println!("  {} {}", "Subject:".bold(), claims.sub);
    if let Some(email) = &claims.email {
        println!("  {} {}", "Email:".bold(), email);
    }
    if let Some(role) = &claims.role {
        println!("  {} {}", "Role:".bold(), role);
    }
    if let Some(session_id) = &claims.session_id {
        println!("  {} {}", "Session:".bold(), session_id);
    }

    let expires = chrono::DateTime::from_timestamp(claims.exp, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| claims.exp.to_string());
    let remaining = claims.remaining_secs();
    let status = if remaining > 0 {
        format!("valid for {}s", remaining).green()
    } else {
        format!("expired {}s ago", -remaining).red()
    };
    println!("  {} {} ({})", "Expires:".bold(), expires, status);
}
