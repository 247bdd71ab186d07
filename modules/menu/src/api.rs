use crate::model::{MenuId, MenuNode};
use admin_gateway::{Envelope, GatewayError, RequestGateway, RequestMethod, RequestOptions};
use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;

const MENU_PATH: &str = "/menu";
const MENU_TREE_PATH: &str = "/menu/tree";

/// Menu tree CRUD over a shared [`RequestGateway`].
///
/// Each call returns the gateway's envelope unchanged; decoding the payload
/// is left to [`decode_tree`] / [`decode_node`].
#[derive(Debug, Clone, Copy)]
pub struct MenuApi<'a> {
    gateway: &'a RequestGateway,
    options: Option<&'a RequestOptions>,
}

impl<'a> MenuApi<'a> {
    #[must_use]
    pub fn new(gateway: &'a RequestGateway) -> Self {
        Self {
            gateway,
            options: None,
        }
    }

    /// Apply `options` (timeout, cancellation, headers) to every call.
    #[must_use]
    pub fn with_options(mut self, options: &'a RequestOptions) -> Self {
        self.options = Some(options);
        self
    }

    /// `GET /menu/tree`, `params` sent as query parameters.
    ///
    /// # Errors
    /// Returns [`GatewayError::Cancelled`] if the call is cancelled.
    pub async fn get_menu_tree<P>(&self, params: &P) -> Result<Envelope, GatewayError>
    where
        P: Serialize + ?Sized,
    {
        self.call(RequestMethod::Get, MENU_TREE_PATH, params).await
    }

    /// `DELETE /menu/{id}` with `{"id": id}` as body.
    ///
    /// # Errors
    /// Returns [`GatewayError::Cancelled`] if the call is cancelled.
    pub async fn delete_menu(&self, id: &MenuId) -> Result<Envelope, GatewayError> {
        let path = node_path(id);
        self.call(RequestMethod::Delete, &path, &json!({ "id": id }))
            .await
    }

    /// `POST /menu` with `node` as body.
    ///
    /// # Errors
    /// Returns [`GatewayError::Cancelled`] if the call is cancelled.
    pub async fn add_menu(&self, node: &MenuNode) -> Result<Envelope, GatewayError> {
        self.call(RequestMethod::Post, MENU_PATH, node).await
    }

    /// `PUT /menu/{id}` with `node` as body; the body's `id` is set to `id`.
    ///
    /// # Errors
    /// Returns [`GatewayError::Cancelled`] if the call is cancelled.
    pub async fn update_menu(
        &self,
        id: &MenuId,
        node: &MenuNode,
    ) -> Result<Envelope, GatewayError> {
        let path = node_path(id);
        let body = MenuNode {
            id: Some(id.clone()),
            ..node.clone()
        };
        self.call(RequestMethod::Put, &path, &body).await
    }

    async fn call<T>(
        &self,
        method: RequestMethod,
        path: &str,
        data: &T,
    ) -> Result<Envelope, GatewayError>
    where
        T: Serialize + ?Sized,
    {
        let options = self.options.cloned().unwrap_or_default();
        let envelope = self.gateway.envelope(method, path, Some(data), options).await?;
        if envelope.is_failure() {
            tracing::debug!(%method, path, msg = ?envelope.msg, "menu call failed");
        }
        Ok(envelope)
    }
}

fn node_path(id: &MenuId) -> String {
    format!("{MENU_PATH}/{id}")
}

/// Why an envelope's payload could not be read as menu data.
#[derive(Debug, Error)]
pub enum MenuDecodeError {
    #[error("menu call failed: {0}")]
    Failure(String),

    #[error("menu payload is binary, expected JSON")]
    Binary,

    #[error("malformed menu payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Read the tree from a `get_menu_tree` envelope.
///
/// A missing or `null` payload is an empty tree.
///
/// # Errors
/// Returns [`MenuDecodeError`] for failure envelopes and payloads that are not
/// an array of nodes.
pub fn decode_tree(envelope: &Envelope) -> Result<Vec<MenuNode>, MenuDecodeError> {
    match json_payload(envelope)? {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(data) => Ok(serde_json::from_value(data.clone())?),
    }
}

/// Read a single node (e.g. the result of `add_menu`).
///
/// # Errors
/// Returns [`MenuDecodeError`] for failure envelopes and payloads that are not
/// a node.
pub fn decode_node(envelope: &Envelope) -> Result<MenuNode, MenuDecodeError> {
    let data = json_payload(envelope)?.cloned().unwrap_or(Value::Null);
    Ok(serde_json::from_value(data)?)
}

fn json_payload(envelope: &Envelope) -> Result<Option<&Value>, MenuDecodeError> {
    if envelope.is_failure() {
        let msg = envelope.failure_message().unwrap_or_default();
        return Err(MenuDecodeError::Failure(msg.into_owned()));
    }
    if envelope.binary_data().is_some() {
        return Err(MenuDecodeError::Binary);
    }
    Ok(envelope.json_data())
}
