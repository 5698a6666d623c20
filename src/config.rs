use std::path::PathBuf;
use std::time::Duration;

use reqwest::Client;
use url::Url;

use crate::aggregate::extracts::snapshot_file_name;
use crate::router::ExecutionContext;
use crate::router::client::{DEV_API_BASE, PROD_API_BASE};
use crate::search::Region;

/// TCP connection establishment timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Global HTTP client timeout covering DNS + connect + response body.
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Runtime configuration. Every option can also be set through its
/// `XIVSEARCH_*` environment variable.
#[derive(clap::Args, Debug, Clone)]
pub struct Config {
    /// Directory holding `<lang>/<contenttype>.json` index sources and the
    /// `npcs.json` / `instances.json` reference tables
    #[arg(long, env = "XIVSEARCH_DATA_DIR", default_value = "assets/data", global = true)]
    pub data_dir: PathBuf,

    /// Directory holding the extracts snapshot
    #[arg(long, env = "XIVSEARCH_EXTRACTS_DIR", default_value = "assets/extracts", global = true)]
    pub extracts_dir: PathBuf,

    /// Content hash of the extracts snapshot; unset reads `extracts.json`
    #[arg(long, env = "XIVSEARCH_EXTRACTS_VERSION", global = true)]
    pub extracts_version: Option<String>,

    /// Run against local indexes (embedded) or the hosted search API (remote)
    #[arg(long, value_enum, env = "XIVSEARCH_CONTEXT", default_value_t = ExecutionContext::Embedded, global = true)]
    pub context: ExecutionContext,

    /// In remote mode, try the development API first
    #[arg(long, env = "XIVSEARCH_USE_LOCAL_API", global = true)]
    pub use_local_api: bool,

    #[arg(long, value_enum, env = "XIVSEARCH_REGION", default_value_t = Region::Global, global = true)]
    pub region: Region,

    #[arg(long, env = "XIVSEARCH_DEV_API", default_value = DEV_API_BASE, global = true)]
    pub dev_api_url: Url,

    #[arg(long, env = "XIVSEARCH_PROD_API", default_value = PROD_API_BASE, global = true)]
    pub prod_api_url: Url,

    /// Override the lore service base URL (defaults depend on region)
    #[arg(long, env = "XIVSEARCH_LORE_API", global = true)]
    pub lore_api_url: Option<Url>,

    /// Maximum rows returned per content type by the local engine
    #[arg(long, env = "XIVSEARCH_MAX_RESULTS", default_value_t = 100, global = true)]
    pub max_results: usize,
}

impl Config {
    pub fn extracts_path(&self) -> PathBuf {
        self.extracts_dir
            .join(snapshot_file_name(self.extracts_version.as_deref()))
    }

    pub fn npcs_path(&self) -> PathBuf {
        self.data_dir.join("npcs.json")
    }

    pub fn instances_path(&self) -> PathBuf {
        self.data_dir.join("instances.json")
    }

    pub fn http_client(&self) -> Result<Client, reqwest::Error> {
        Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(HTTP_TIMEOUT)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        config: Config,
    }

    #[test]
    fn defaults_resolve_paths() {
        let cli = TestCli::parse_from(["xivsearch"]);
        let config = cli.config;
        assert_eq!(config.context, ExecutionContext::Embedded);
        assert_eq!(config.region, Region::Global);
        assert_eq!(config.prod_api_url, Url::parse(PROD_API_BASE).unwrap());
        assert_eq!(config.npcs_path(), PathBuf::from("assets/data/npcs.json"));
    }

    #[test]
    fn flags_override_defaults() {
        let cli = TestCli::parse_from([
            "xivsearch",
            "--context",
            "remote",
            "--use-local-api",
            "--region",
            "china",
            "--extracts-dir",
            "/tmp/ex",
            "--extracts-version",
            "abc123",
        ]);
        let config = cli.config;
        assert_eq!(config.context, ExecutionContext::Remote);
        assert!(config.use_local_api);
        assert_eq!(config.region, Region::China);
        assert_eq!(
            config.extracts_path(),
            PathBuf::from("/tmp/ex/extracts.abc123.json")
        );
    }

    #[test]
    fn malformed_api_url_is_rejected() {
        let result = TestCli::try_parse_from(["xivsearch", "--prod-api-url", "not a url"]);
        assert!(result.is_err());
    }
}
