use std::str::FromStr;
use std::time::Duration;

use chrono::Local;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("{0}")]
    Cron(#[from] cron::error::Error),
    #[error("invalid interval '{0}', expected something like '@every 1h30m'")]
    InvalidInterval(String),
    #[error("cron expression has no upcoming fire time")]
    Exhausted,
}

/// When to run a notification cycle in scheduled mode.
#[derive(Debug, Clone)]
pub enum Schedule {
    /// Cron expression with a leading seconds field, evaluated in local time.
    Cron(cron::Schedule),
    /// Fixed interval, `@every <duration>`.
    Every(Duration),
}

impl Schedule {
    pub fn parse(expr: &str) -> Result<Schedule, ScheduleError> {
        let expr = expr.trim();
        if let Some(interval) = expr.strip_prefix("@every") {
            return parse_interval(interval.trim()).map(Schedule::Every);
        }
        let expr = normalize_cron(expr);
        Ok(Schedule::Cron(cron::Schedule::from_str(&expr)?))
    }

    /// How long to wait from now until the next tick.
    pub fn next_delay(&self) -> Result<Duration, ScheduleError> {
        match self {
            Schedule::Every(interval) => Ok(*interval),
            Schedule::Cron(schedule) => {
                let next = schedule
                    .upcoming(Local)
                    .next()
                    .ok_or(ScheduleError::Exhausted)?;
                // A tick that is already due converts to a negative duration.
                Ok((next - Local::now()).to_std().unwrap_or(Duration::ZERO))
            }
        }
    }
}

/// Accepts what the seconds-first cron dialect allows but the `cron` crate
/// does not: an omitted day-of-week field, `@midnight` and `@annually`.
fn normalize_cron(expr: &str) -> String {
    match expr {
        "@midnight" => "@daily".to_string(),
        "@annually" => "@yearly".to_string(),
        _ if expr.split_whitespace().count() == 5 => format!("{expr} *"),
        _ => expr.to_string(),
    }
}

fn parse_interval(text: &str) -> Result<Duration, ScheduleError> {
    let invalid = || ScheduleError::InvalidInterval(text.to_string());
    if text.is_empty() {
        return Err(invalid());
    }

    let mut total: u64 = 0;
    let mut digits = String::new();
    for c in text.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }
        let unit = match c {
            'h' => 3600,
            'm' => 60,
            's' => 1,
            _ => return Err(invalid()),
        };
        let value: u64 = digits.parse().map_err(|_| invalid())?;
        total = value
            .checked_mul(unit)
            .and_then(|secs| total.checked_add(secs))
            .ok_or_else(invalid)?;
        digits.clear();
    }
    // Trailing number without a unit
    if !digits.is_empty() || total == 0 {
        return Err(invalid());
    }
    Ok(Duration::from_secs(total))
}
