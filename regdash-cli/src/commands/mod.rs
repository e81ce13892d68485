//! One-shot commands against the backend
//!
//! Every command builds a `Session` from the config file plus global flags,
//! then drives a `ListController` for one resource.

pub mod edit;
pub mod list;
pub mod watch;

use std::fmt;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::ValueEnum;
use regdash_client::ApiClient;
use regdash_core::{
    resources, DashConfig, DashError, ListController, Notice, NotificationSink, Operation,
    PageSize, Resource, ViewConfig,
};

pub use edit::{run_create, run_delete, run_update};
pub use list::{run_list, run_resources, run_schema, run_summary};
pub use watch::run_watch;

#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table (default)
    #[default]
    Human,
    /// JSON output (for piping to jq)
    Json,
    /// Identities only, one per line
    Quiet,
}

pub fn get_output_format(output: OutputFormat, json: bool) -> OutputFormat {
    if json {
        OutputFormat::Json
    } else {
        output
    }
}

/// clap parser for `--page-size`
pub fn parse_page_size(s: &str) -> std::result::Result<PageSize, String> {
    let n: usize = s.parse().map_err(|_| format!("not a number: {}", s))?;
    PageSize::try_from(n).map_err(|e| e.to_string())
}

/// clap parser for `--set field=value`
pub fn parse_assignment(s: &str) -> std::result::Result<(String, String), String> {
    let (field, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected FIELD=VALUE, got '{}'", s))?;
    let field = field.trim();
    if field.is_empty() {
        return Err(format!("empty field name in '{}'", s));
    }
    Ok((field.to_string(), value.to_string()))
}

/// Prints notices for one-shot commands: successes to stdout, errors to stderr
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSink;

impl NotificationSink for ConsoleSink {
    fn notify(&self, notice: Notice) {
        if notice.is_error() {
            eprintln!("✗ {}", notice);
        } else {
            println!("✓ {}", notice);
        }
    }
}

/// A failure the `ConsoleSink` has already printed.
///
/// `main` exits non-zero on it without printing the error again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reported(pub Operation);

impl fmt::Display for Reported {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed", self.0)
    }
}

impl std::error::Error for Reported {}

/// Swap a controller error the sink already showed for a bare [`Reported`]
pub fn reported<T>(result: regdash_core::Result<T>, operation: Operation) -> Result<T> {
    result.map_err(|e: DashError| {
        tracing::debug!(%operation, error = %e, "already reported");
        anyhow::Error::new(Reported(operation))
    })
}

/// Effective configuration for one invocation
#[derive(Debug, Clone)]
pub struct Session {
    pub config: DashConfig,
}

impl Session {
    /// Config file, then `--endpoint`/`REGDASH_API_URL` and `--insecure` on top
    pub fn load(endpoint: Option<String>, insecure: bool) -> Result<Self> {
        let mut config = DashConfig::load().context("Failed to load config")?;
        if let Some(endpoint) = endpoint {
            config.api.base_url = endpoint;
        }
        config.api.insecure |= insecure;
        config.validate().context("Configuration invalid")?;
        Ok(Self { config })
    }

    pub fn client(&self) -> Result<Arc<ApiClient>> {
        let client = ApiClient::from_config(&self.config.api)
            .with_context(|| format!("Failed to create client for {}", self.config.api.base_url))?;
        Ok(Arc::new(client))
    }

    pub fn view(&self, resource: Resource, page_size: Option<PageSize>) -> Result<ViewConfig> {
        ViewConfig::builder(resource)
            .page_size(page_size.unwrap_or(self.config.view.page_size))
            .refresh_interval(self.config.view.refresh_interval())
            .build()
            .map_err(|e| anyhow!(e))
    }

    /// Controller for `resource`, not yet loaded
    pub fn controller(
        &self,
        resource: &str,
        page_size: Option<PageSize>,
        sink: Arc<dyn NotificationSink>,
    ) -> Result<ListController> {
        let resource = resources::find(resource)
            .with_context(|| format!("Known resources: {}", resources::names().join(", ")))?;
        let view = self.view(resource, page_size)?;
        Ok(ListController::new(view, self.client()?, sink))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_sizes_from_the_fixed_set() {
        assert_eq!(parse_page_size("20"), Ok(PageSize::Twenty));
        assert!(parse_page_size("15").is_err());
        assert!(parse_page_size("diez").is_err());
    }

    #[test]
    fn assignments_split_on_first_equals() {
        assert_eq!(
            parse_assignment("correo=a=b@x.co"),
            Ok(("correo".to_string(), "a=b@x.co".to_string()))
        );
        assert_eq!(
            parse_assignment("nombre="),
            Ok(("nombre".to_string(), String::new()))
        );
        assert!(parse_assignment("nombre").is_err());
        assert!(parse_assignment("=x").is_err());
    }

    #[test]
    fn reported_errors_drop_the_detail() {
        let err = reported::<()>(Err(DashError::transport("connection refused")), Operation::Delete)
            .unwrap_err();
        assert!(err.is::<Reported>());
        assert_eq!(err.to_string(), "delete failed");
        assert!(!format!("{:#}", err).contains("connection refused"));

        assert_eq!(reported(Ok(7), Operation::Load).unwrap(), 7);
    }

    #[test]
    fn json_flag_wins() {
        assert_eq!(get_output_format(OutputFormat::Human, true), OutputFormat::Json);
        assert_eq!(get_output_format(OutputFormat::Quiet, false), OutputFormat::Quiet);
    }
}
