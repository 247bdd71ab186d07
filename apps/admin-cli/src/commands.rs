use crate::cli::{MenuCommand, RequestArgs};
use admin_gateway::{
    CancellationToken, Envelope, HttpResponse, Reply, RequestGateway, RequestOptions,
};
use admin_menu::{MenuApi, MenuNode, decode_tree};
use anyhow::{Context, Result};
use serde_json::{Value, json};
use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;

/// Exit code for a call that resolved to a `code: -1` envelope.
const FAILURE_EXIT: u8 = 2;

pub async fn run_request(
    gateway: &RequestGateway,
    args: RequestArgs,
    cancel: CancellationToken,
) -> Result<ExitCode> {
    let mut options = RequestOptions::new()
        .response_type(args.response_type)
        .cancellation(cancel);
    if !args.headers.is_empty() {
        options = options.headers(args.headers);
    }
    if let Some(ms) = args.timeout_ms {
        options = options.timeout(Duration::from_millis(ms));
    }
    if args.export {
        options = options.export();
    }

    let reply = gateway
        .request(args.method, &args.path, args.data.as_ref(), options)
        .await?;

    match reply {
        Reply::Export(response) => save_export(response, args.output.as_deref()).await,
        Reply::Envelope(envelope) => emit_envelope(&envelope, args.output.as_deref()).await,
    }
}

pub async fn run_menu(
    gateway: &RequestGateway,
    command: MenuCommand,
    cancel: CancellationToken,
) -> Result<ExitCode> {
    let options = RequestOptions::new().cancellation(cancel);
    let api = MenuApi::new(gateway).with_options(&options);

    let envelope = match command {
        MenuCommand::Tree { data } => {
            let params = data.unwrap_or_else(|| json!({}));
            let envelope = api.get_menu_tree(&params).await?;
            if let Ok(tree) = decode_tree(&envelope) {
                let nodes: usize = tree.iter().map(MenuNode::subtree_len).sum();
                tracing::info!(roots = tree.len(), nodes, "menu tree fetched");
            }
            envelope
        }
        MenuCommand::Add { data } => api.add_menu(&parse_node(data)?).await?,
        MenuCommand::Update { id, data } => api.update_menu(&id, &parse_node(data)?).await?,
        MenuCommand::Delete { id } => api.delete_menu(&id).await?,
    };

    emit_envelope(&envelope, None).await
}

fn parse_node(data: Value) -> Result<MenuNode> {
    serde_json::from_value(data).context("--data is not a valid menu node")
}

/// Print the envelope as JSON, or write a binary payload to `output`.
async fn emit_envelope(envelope: &Envelope, output: Option<&Path>) -> Result<ExitCode> {
    match (envelope.binary_data(), output) {
        (Some(body), Some(path)) => {
            tokio::fs::write(path, body)
                .await
                .with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!(bytes = body.len(), path = %path.display(), "binary body saved");
        }
        _ => println!("{}", serde_json::to_string_pretty(envelope)?),
    }

    Ok(exit_code_for(envelope))
}

async fn save_export(response: HttpResponse, output: Option<&Path>) -> Result<ExitCode> {
    let Some(output) = output else {
        anyhow::bail!("--export requires --output");
    };

    let status = response.status();
    let server_filename = response.attachment_filename();
    let body = response
        .bytes()
        .await
        .context("failed to read export body")?;

    tokio::fs::write(output, &body)
        .await
        .with_context(|| format!("failed to write {}", output.display()))?;

    tracing::info!(
        status = status.as_u16(),
        bytes = body.len(),
        server_filename = ?server_filename,
        path = %output.display(),
        "export saved"
    );
    Ok(ExitCode::SUCCESS)
}

fn exit_code_for(envelope: &Envelope) -> ExitCode {
    if envelope.is_failure() {
        ExitCode::from(FAILURE_EXIT)
    } else {
        ExitCode::SUCCESS
    }
}
