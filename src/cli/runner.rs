//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands};
use crate::client::{Api, ApiBuilder};
use crate::logging::LogConfig;
use crate::pagination::PageSize;
use crate::partition::Threshold;
use crate::request::Params;
use crate::sqlview::SqlViewOptions;
use crate::types::JsonValue;
use crate::utils::load_json;
use anyhow::{bail, Context};
use futures::TryStreamExt;
use serde::Serialize;
use std::path::Path;
use tracing::info;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Logging settings from the global flags
    pub fn log_config(&self) -> LogConfig {
        let config = LogConfig::verbose(self.cli.verbose);
        match &self.cli.log_file {
            Some(path) => config.log_file(path),
            None => config,
        }
    }

    /// Run the CLI command
    pub async fn run(&self) -> anyhow::Result<()> {
        let api = self.api()?;
        info!("Connected to {}", api.api_url());

        match &self.cli.command {
            Commands::Info => self.info(&api).await,
            Commands::Get {
                endpoint,
                file_type,
                params,
            } => self.get(&api, endpoint, file_type, params).await,
            Commands::Paged {
                endpoint,
                page_size,
                merge,
                params,
            } => self.paged(&api, endpoint, page_size, *merge, params).await,
            Commands::Sqlview {
                uid,
                execute,
                var,
                criteria,
            } => self.sqlview(&api, uid, *execute, var, criteria).await,
            Commands::PostPartitioned {
                endpoint,
                file,
                threshold,
                params,
            } => {
                self.post_partitioned(&api, endpoint, file, *threshold, params)
                    .await
            }
        }
    }

    /// Build the client from flags, or from the auth file
    fn api(&self) -> anyhow::Result<Api> {
        let builder = match (&self.cli.server, &self.cli.username, &self.cli.password) {
            (Some(server), Some(username), Some(password)) => {
                ApiBuilder::new(server, username, password)
            }
            (None, None, None) => Api::from_auth_file(self.cli.auth_file.as_deref())
                .context("no --server/--username/--password given and no usable auth file")?,
            _ => bail!("--server, --username and --password must be given together"),
        };

        Ok(builder.maybe_api_version(self.cli.api_version).build()?)
    }

    async fn info(&self, api: &Api) -> anyhow::Result<()> {
        emit_pretty(api.info().await?)
    }

    async fn get(
        &self,
        api: &Api,
        endpoint: &str,
        file_type: &str,
        params: &[(String, String)],
    ) -> anyhow::Result<()> {
        let params = to_params(params);
        let response = api.get_as(endpoint, file_type, params.as_ref()).await?;

        if file_type.eq_ignore_ascii_case("json") {
            let body: JsonValue = serde_json::from_slice(&response.bytes().await?)?;
            emit_pretty(&body)
        } else {
            print!("{}", response.text().await?);
            Ok(())
        }
    }

    async fn paged(
        &self,
        api: &Api,
        endpoint: &str,
        page_size: &str,
        merge: bool,
        params: &[(String, String)],
    ) -> anyhow::Result<()> {
        let page_size: PageSize = page_size.parse()?;
        let params = to_params(params);

        if merge {
            let merged = api.get_paged_merged(endpoint, params, page_size).await?;
            return emit_pretty(&merged);
        }

        let mut pages = api.get_paged(endpoint, params, page_size).await?;
        while let Some(page) = pages.try_next().await? {
            emit_line(&page)?;
        }
        Ok(())
    }

    async fn sqlview(
        &self,
        api: &Api,
        uid: &str,
        execute: bool,
        var: &[(String, String)],
        criteria: &[(String, String)],
    ) -> anyhow::Result<()> {
        let mut options = SqlViewOptions::new().execute(execute);
        if !var.is_empty() {
            options.var = Some(var.iter().cloned().collect());
        }
        for (k, v) in criteria {
            options = options.criteria(k, v);
        }

        let mut rows = api.get_sqlview(uid, options).await?;
        let mut count = 0usize;
        while let Some(row) = rows.try_next().await? {
            emit_line(&row)?;
            count += 1;
        }
        info!("{} rows read from SQL view {}", count, uid);
        Ok(())
    }

    async fn post_partitioned(
        &self,
        api: &Api,
        endpoint: &str,
        file: &Path,
        threshold: i64,
        params: &[(String, String)],
    ) -> anyhow::Result<()> {
        let payload = load_json(file)
            .with_context(|| format!("failed to load payload from {}", file.display()))?;
        let threshold = Threshold::try_from(threshold)?;

        let mut responses = api.post_partitioned(endpoint, payload, to_params(params), threshold)?;
        let mut chunk = 0usize;
        while let Some(response) = responses
            .try_next()
            .await
            .with_context(|| format!("chunk {} failed", chunk + 1))?
        {
            chunk += 1;
            let status = response.status().as_u16();
            let text = response.text().await?;
            let body = serde_json::from_str(&text).unwrap_or(JsonValue::String(text));
            emit_line(&serde_json::json!({
                "chunk": chunk,
                "status": status,
                "response": body,
            }))?;
        }
        Ok(())
    }
}

/// Ordered query pairs, `None` when empty
fn to_params(pairs: &[(String, String)]) -> Option<Params> {
    if pairs.is_empty() {
        return None;
    }
    Some(Params::from(pairs.to_vec()))
}

fn emit_pretty<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn emit_line<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}
