//! Output renderers and formatting helpers for CLI commands.

use anyhow::anyhow;
use chrono::NaiveDate;
use hrms_api_models::{
    Department, Designation, EmployeeSummary, Level, Notification, SalaryStructure, ShiftPolicy,
};
use hrms_notify::{NotificationSnapshot, group_by_day};
use hrms_settings::Badge;
use serde::Serialize;
use serde_json::{Value, json};

use crate::cli::OutputFormat;
use crate::client::{CliError, CliResult};

const TITLE_WIDTH: usize = 40;

pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))?;
    println!("{text}");
    Ok(())
}

/// Render rows as left-aligned columns sized to their widest cell.
pub(crate) fn format_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|header| header.chars().count()).collect();
    for row in rows {
        for (index, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(index) {
                *width = (*width).max(cell.chars().count());
            }
        }
    }

    let mut out = String::new();
    let header_cells: Vec<String> = headers.iter().map(|header| (*header).to_string()).collect();
    for row in std::iter::once(&header_cells).chain(rows) {
        let line = row
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ");
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    print!("{}", format_table(headers, rows));
}

pub(crate) fn render_notifications(
    snapshot: &NotificationSnapshot,
    notifications: &[Notification],
    grouped: bool,
    today: NaiveDate,
    format: OutputFormat,
) -> CliResult<()> {
    match format {
        OutputFormat::Json => {
            let items: Vec<Value> = notifications
                .iter()
                .map(|notification| {
                    json!({
                        "id": notification.id,
                        "title": notification.title,
                        "description": notification.description,
                        "date": notification.date,
                        "type": notification.kind,
                        "read": snapshot.is_read(&notification.id),
                    })
                })
                .collect();
            print_json(&json!({
                "unread_count": snapshot.unread_count,
                "notifications": items,
            }))
        }
        OutputFormat::Table => {
            if notifications.is_empty() {
                println!("No notifications.");
            } else if grouped {
                for group in group_by_day(notifications, today) {
                    println!("{}", group.label);
                    for notification in &group.notifications {
                        println!(
                            "  {}",
                            notification_line(notification, snapshot.is_read(&notification.id))
                        );
                    }
                }
            } else {
                for notification in notifications {
                    println!(
                        "{}",
                        notification_line(notification, snapshot.is_read(&notification.id))
                    );
                }
            }
            println!("unread: {}", snapshot.unread_count);
            Ok(())
        }
    }
}

/// One-line summary: read flag, id, kind, date and a clipped title.
pub(crate) fn notification_line(notification: &Notification, read: bool) -> String {
    let flag = if read { ' ' } else { '*' };
    let date = notification
        .timestamp()
        .map_or_else(|| "-".to_string(), |value| value.format("%Y-%m-%d %H:%M").to_string());
    format!(
        "{flag} {:<8} {:<16} {:<16} {}",
        notification.id.to_string(),
        notification.kind.as_str(),
        date,
        clip(&notification.title, TITLE_WIDTH)
    )
}

fn clip(text: &str, max: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut clipped: String = text.chars().take(max.saturating_sub(3)).collect();
    clipped.push_str("...");
    clipped
}

pub(crate) fn render_departments(rows: &[Department], format: OutputFormat) -> CliResult<()> {
    if format == OutputFormat::Json {
        return print_json(rows);
    }
    let table: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            vec![
                row.id.to_string(),
                row.department_name.clone(),
                row.creation_date.clone().unwrap_or_default(),
            ]
        })
        .collect();
    print_table(&["ID", "NAME", "CREATED"], &table);
    Ok(())
}

pub(crate) fn render_levels(rows: &[Level], format: OutputFormat) -> CliResult<()> {
    if format == OutputFormat::Json {
        return print_json(rows);
    }
    let table: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            vec![
                row.id.to_string(),
                row.level_name.clone(),
                clip(&row.description, TITLE_WIDTH),
            ]
        })
        .collect();
    print_table(&["ID", "NAME", "DESCRIPTION"], &table);
    Ok(())
}

pub(crate) fn render_designations(rows: &[Designation], format: OutputFormat) -> CliResult<()> {
    if format == OutputFormat::Json {
        return print_json(rows);
    }
    let table: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            vec![
                row.id.to_string(),
                row.designation_name.clone(),
                optional_id(row.department),
                optional_id(row.level),
            ]
        })
        .collect();
    print_table(&["ID", "NAME", "DEPARTMENT", "LEVEL"], &table);
    Ok(())
}

pub(crate) fn render_shifts(rows: &[ShiftPolicy], format: OutputFormat) -> CliResult<()> {
    if format == OutputFormat::Json {
        return print_json(rows);
    }
    let table: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            vec![
                row.id.to_string(),
                row.shift_type.clone(),
                row.checkin.clone().unwrap_or_default(),
                row.checkout.clone().unwrap_or_default(),
            ]
        })
        .collect();
    print_table(&["ID", "SHIFT", "CHECK-IN", "CHECK-OUT"], &table);
    Ok(())
}

pub(crate) fn render_salary_structures(
    rows: &[SalaryStructure],
    format: OutputFormat,
) -> CliResult<()> {
    if format == OutputFormat::Json {
        return print_json(rows);
    }
    let table: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            vec![
                row.id.to_string(),
                row.name.clone().unwrap_or_default(),
                percent_text(row.basic_percent.as_ref()),
                percent_text(row.hra_percent.as_ref()),
                row.total_working_days
                    .map(|days| days.to_string())
                    .unwrap_or_default(),
                format!("{}/{}", row.allowances.len(), row.deductions.len()),
            ]
        })
        .collect();
    print_table(
        &["ID", "NAME", "BASIC%", "HRA%", "DAYS", "ALLOW/DEDUCT"],
        &table,
    );
    Ok(())
}

pub(crate) fn render_employees(rows: &[EmployeeSummary], format: OutputFormat) -> CliResult<()> {
    if format == OutputFormat::Json {
        return print_json(rows);
    }
    let table: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            vec![
                row.id.to_string(),
                row.employee_id.clone().unwrap_or_default(),
                row.display_name(),
                row.email.clone().unwrap_or_default(),
                optional_id(row.department),
                optional_id(row.designation),
            ]
        })
        .collect();
    print_table(
        &["ID", "CODE", "NAME", "EMAIL", "DEPARTMENT", "DESIGNATION"],
        &table,
    );
    Ok(())
}

/// Badge counters: last seen, and unseen when a current count was given.
pub(crate) fn render_badges(
    rows: &[(Badge, u64, Option<u64>)],
    format: OutputFormat,
) -> CliResult<()> {
    if format == OutputFormat::Json {
        let items: Vec<Value> = rows
            .iter()
            .map(|(badge, last_seen, unseen)| {
                json!({
                    "badge": badge.as_str(),
                    "last_seen": last_seen,
                    "unseen": unseen,
                })
            })
            .collect();
        return print_json(&items);
    }
    let table: Vec<Vec<String>> = rows
        .iter()
        .map(|(badge, last_seen, unseen)| {
            vec![
                badge.to_string(),
                last_seen.to_string(),
                unseen.map(|count| count.to_string()).unwrap_or_default(),
            ]
        })
        .collect();
    print_table(&["BADGE", "LAST SEEN", "UNSEEN"], &table);
    Ok(())
}

fn optional_id(id: Option<i64>) -> String {
    id.map(|value| value.to_string()).unwrap_or_default()
}

fn percent_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Number(number)) => number.to_string(),
        _ => String::new(),
    }
}
