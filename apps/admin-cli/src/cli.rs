use admin_gateway::{RequestMethod, ResponseType};
use admin_menu::MenuId;
use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;

/// Menu admin CLI - issue admin API calls through the request gateway
#[derive(Debug, Parser)]
#[command(name = "admin-cli")]
#[command(about = "Menu admin CLI - issue admin API calls through the request gateway")]
#[command(version)]
pub struct Cli {
    /// Path to YAML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Print effective configuration (JSON) and exit
    #[arg(long, global = true)]
    pub print_config: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Validate configuration and exit
    Check,
    /// Send a request through the gateway and print the envelope
    Request(RequestArgs),
    /// Menu tree operations
    #[command(subcommand)]
    Menu(MenuCommand),
}

#[derive(Debug, Args)]
pub struct RequestArgs {
    /// GET, POST, PUT or DELETE
    pub method: RequestMethod,

    /// Path relative to the base URL, or an absolute URL
    pub path: String,

    /// JSON payload: query parameters for GET, body otherwise
    #[arg(long, value_parser = parse_json)]
    pub data: Option<Value>,

    /// Header as `Name:Value`; repeatable, replaces the default header
    #[arg(long = "header", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// Per-request timeout override
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// json, arraybuffer or blob
    #[arg(long, default_value_t = ResponseType::Json)]
    pub response_type: ResponseType,

    /// Keep the raw response and save its body to --output
    #[arg(long, requires = "output")]
    pub export: bool,

    /// File for binary or exported bodies
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum MenuCommand {
    /// Fetch the menu tree
    Tree {
        /// Query parameters as a JSON object
        #[arg(long, value_parser = parse_json)]
        data: Option<Value>,
    },
    /// Create a menu node
    Add {
        /// Node as JSON
        #[arg(long, value_parser = parse_json)]
        data: Value,
    },
    /// Update a menu node
    Update {
        id: MenuId,
        /// Node as JSON
        #[arg(long, value_parser = parse_json)]
        data: Value,
    },
    /// Delete a menu node
    Delete { id: MenuId },
}

fn parse_json(raw: &str) -> Result<Value, String> {
    serde_json::from_str(raw).map_err(|e| format!("invalid JSON: {e}"))
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected Name:Value, got '{raw}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("empty header name in '{raw}'"));
    }
    Ok((name.to_owned(), value.trim().to_owned()))
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use serde_json::json;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("admin-cli").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_request_with_options() {
        let cli = parse(&[
            "request",
            "post",
            "/menu",
            "--data",
            r#"{"name":"x"}"#,
            "--header",
            "x-token: abc",
            "--timeout-ms",
            "500",
        ]);
        let Some(Commands::Request(args)) = cli.command else {
            panic!("expected request command");
        };
        assert_eq!(args.method, RequestMethod::Post);
        assert_eq!(args.data, Some(json!({"name": "x"})));
        assert_eq!(args.headers, vec![("x-token".to_owned(), "abc".to_owned())]);
        assert_eq!(args.timeout_ms, Some(500));
        assert_eq!(args.response_type, ResponseType::Json);
        assert!(!args.export);
    }

    #[test]
    fn export_requires_output() {
        let result = Cli::try_parse_from(["admin-cli", "request", "GET", "/menu/export", "--export"]);
        assert!(result.is_err());

        let cli = parse(&[
            "request",
            "GET",
            "/menu/export",
            "--export",
            "-o",
            "menu.xlsx",
            "--response-type",
            "blob",
        ]);
        let Some(Commands::Request(args)) = cli.command else {
            panic!("expected request command");
        };
        assert!(args.export);
        assert_eq!(args.response_type, ResponseType::Blob);
    }

    #[test]
    fn rejects_bad_values() {
        for args in [
            ["admin-cli", "request", "PATCH", "/menu"].as_slice(),
            ["admin-cli", "request", "GET", "/menu", "--data", "{oops"].as_slice(),
            ["admin-cli", "request", "GET", "/menu", "--header", "novalue"].as_slice(),
            ["admin-cli", "menu", "delete", "a/b"].as_slice(),
        ] {
            assert!(Cli::try_parse_from(args).is_err(), "{args:?} should fail");
        }
    }

    #[test]
    fn parses_menu_commands() {
        let cli = parse(&["menu", "update", "7", "--data", r#"{"name":"Home"}"#]);
        let Some(Commands::Menu(MenuCommand::Update { id, data })) = cli.command else {
            panic!("expected menu update");
        };
        assert_eq!(id, MenuId::number(7));
        assert_eq!(data, json!({"name": "Home"}));

        let cli = parse(&["--config", "admin.yaml", "menu", "tree"]);
        assert_eq!(cli.config, Some(PathBuf::from("admin.yaml")));
        assert!(matches!(
            cli.command,
            Some(Commands::Menu(MenuCommand::Tree { data: None }))
        ));
    }

    #[test]
    fn parse_header_trims() {
        assert_eq!(
            parse_header(" codeMode : json "),
            Ok(("codeMode".to_owned(), "json".to_owned()))
        );
        assert!(parse_header(":x").is_err());
    }
}
