//! Flags shared by several resource commands.

use chrono::{DateTime, Utc};
use clap::Args;
use superplane_core::client::ListOptions;
use superplane_core::{CliError, CliResult};

/// `--limit` and `--before` for list commands.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct PageArgs {
    /// Maximum number of items to return (0 = server default)
    #[arg(long, default_value_t = 20)]
    pub limit: u32,

    /// Return items before this timestamp (RFC3339)
    #[arg(long)]
    pub before: Option<String>,
}

impl PageArgs {
    pub fn list_options(&self) -> CliResult<ListOptions> {
        let before = match self.before.as_deref().filter(|raw| !raw.is_empty()) {
            Some(raw) => Some(
                DateTime::parse_from_rfc3339(raw)
                    .map(|at| at.with_timezone(&Utc))
                    .map_err(|_| {
                        CliError::validation(format!(
                            "invalid --before value {:?}: expected RFC3339 timestamp",
                            raw
                        ))
                    })?,
            ),
            None => None,
        };

        Ok(ListOptions {
            limit: Some(self.limit).filter(|limit| *limit > 0),
            before,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(limit: u32, before: Option<&str>) -> PageArgs {
        PageArgs {
            limit,
            before: before.map(str::to_string),
        }
    }

    #[test]
    fn test_zero_limit_is_omitted() {
        assert_eq!(page(0, None).list_options().unwrap().limit, None);
        assert_eq!(page(20, None).list_options().unwrap().limit, Some(20));
    }

    #[test]
    fn test_before_accepts_offsets() {
        let options = page(20, Some("2024-05-01T12:00:00+02:00"))
            .list_options()
            .unwrap();
        assert_eq!(
            options.before.unwrap().to_rfc3339(),
            "2024-05-01T10:00:00+00:00"
        );
    }

    #[test]
    fn test_invalid_before() {
        let err = page(20, Some("yesterday")).list_options().unwrap_err();
        assert!(matches!(err, CliError::Validation(_)));
        assert_eq!(
            err.to_string(),
            "invalid --before value \"yesterday\": expected RFC3339 timestamp"
        );
    }
}
