//! Terminal output helpers
//!
//! Tables for plugin listings, the session status block, and colored
//! one-line status messages.

use std::io::Write;

use crossterm::execute;
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use tabled::{settings::Style, Table, Tabled};

use pd_core::time::{current_time_millis, remaining_secs};
use pd_server::http::auth::{StatusResponse, UnlockResponse};

/// One row of the `plugins` listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginRow {
    pub name: String,
    pub handler: Option<String>,
    pub namespace: Option<String>,
    /// Resolution problem, if any
    pub problem: Option<String>,
}

/// Format discovered plugins as a table
pub fn format_plugins(plugins: &[PluginRow]) -> String {
    if plugins.is_empty() {
        return "No plugins found".to_string();
    }

    #[derive(Tabled)]
    struct Row {
        #[tabled(rename = "PLUGIN")]
        name: String,
        #[tabled(rename = "HANDLER")]
        handler: String,
        #[tabled(rename = "NAMESPACE")]
        namespace: String,
        #[tabled(rename = "STATUS")]
        status: String,
    }

    let rows: Vec<Row> = plugins
        .iter()
        .map(|p| Row {
            name: p.name.clone(),
            handler: p.handler.clone().unwrap_or_else(|| "-".to_string()),
            namespace: p.namespace.clone().unwrap_or_else(|| "-".to_string()),
            status: match (&p.problem, &p.handler) {
                (Some(problem), _) => truncate(problem, 60),
                (None, Some(_)) => "ready".to_string(),
                (None, None) => "no realtime entry".to_string(),
            },
        })
        .collect();

    Table::new(rows).with(Style::rounded()).to_string()
}

/// Format the result of a status query
pub fn format_status(status: &StatusResponse) -> String {
    let mut out = String::new();
    out.push_str(&format!("User:       {}\n", status.user_id));
    out.push_str(&format!(
        "State:      {}\n",
        if status.is_locked { "locked" } else { "unlocked" }
    ));
    out.push_str(&format!(
        "Expires in: {}\n",
        format_duration(status.remaining_seconds)
    ));
    out
}

/// Format a freshly issued session
pub fn format_unlock(unlock: &UnlockResponse) -> String {
    let remaining = remaining_secs(unlock.expires_at, current_time_millis());
    format!(
        "Token:       {}\nUser:        {}\nPermissions: {}\nExpires in:  {}\n",
        unlock.token,
        unlock.user_id,
        unlock.permissions.join(", "),
        format_duration(remaining)
    )
}

/// Format seconds as `1h 02m 03s` style text
pub fn format_duration(secs: u64) -> String {
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{}h {:02}m {:02}s", h, m, s)
    } else if m > 0 {
        format!("{}m {:02}s", m, s)
    } else {
        format!("{}s", s)
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

enum Stream {
    Out,
    Err,
}

fn print_marked(stream: Stream, color: Color, mark: &str, msg: &str) {
    let mut out: Box<dyn Write> = match stream {
        Stream::Out => Box::new(std::io::stdout()),
        Stream::Err => Box::new(std::io::stderr()),
    };
    // A closed pipe is not worth reporting.
    let _ = execute!(
        out,
        SetForegroundColor(color),
        Print(mark),
        ResetColor,
        Print(format!(" {}\n", msg))
    );
}

pub fn print_success(msg: &str) {
    print_marked(Stream::Out, Color::Green, "✓", msg);
}

/// Errors go to stderr so piped output stays clean
pub fn print_error(msg: &str) {
    print_marked(Stream::Err, Color::Red, "✗", msg);
}

pub fn print_warning(msg: &str) {
    print_marked(Stream::Err, Color::Yellow, "⚠", msg);
}

pub fn print_info(msg: &str) {
    print_marked(Stream::Out, Color::Cyan, "ℹ", msg);
}
