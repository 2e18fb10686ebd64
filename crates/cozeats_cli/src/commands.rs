pub mod auth;
pub mod config;
pub mod grocery;
pub mod group;
pub mod meal;
pub mod theme;
pub mod watch;

use chrono::{Local, NaiveDate};
use cozeats_core::models::calendar_date;
use miette::{Result, miette};

/// Parse a `YYYY-MM-DD` argument, defaulting to today
pub fn parse_day(raw: Option<&str>) -> Result<NaiveDate> {
    match raw {
        None => Ok(Local::now().date_naive()),
        Some("today") => Ok(Local::now().date_naive()),
        Some(raw) => NaiveDate::parse_from_str(raw.trim(), calendar_date::FORMAT)
            .map_err(|e| miette!("Invalid date '{}' (expected YYYY-MM-DD): {}", raw, e)),
    }
}

/// Read a password from `given` or prompt for it without echo
pub fn password(given: Option<String>, prompt: &str) -> Result<String> {
    match given {
        Some(password) => Ok(password),
        None => rpassword::prompt_password(format!("  {prompt}: "))
            .map_err(|e| miette!("Failed to read password: {}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_day() {
        assert_eq!(
            parse_day(Some("2025-12-18")).unwrap(),
            NaiveDate::from_ymd_opt(2025, 12, 18).unwrap()
        );
        assert_eq!(parse_day(None).unwrap(), Local::now().date_naive());
        assert!(parse_day(Some("18/12/2025")).is_err());
    }
}
