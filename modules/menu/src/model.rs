use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Identifier of a menu node, used as a URL path segment.
///
/// The backend sends ids as strings or integers. An id serializes back in the
/// JSON type it was read in, so request bodies carry it unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawMenuId", into = "RawMenuId")]
pub struct MenuId(RawMenuId);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidMenuId {
    #[error("menu id must not be empty")]
    Empty,
    #[error("menu id '{0}' contains a reserved URL character")]
    ReservedCharacter(String),
}

impl MenuId {
    /// Textual id.
    ///
    /// # Errors
    /// Returns [`InvalidMenuId`] if `id` is empty or contains whitespace or
    /// one of `/ ? # %`.
    pub fn new(id: impl Into<String>) -> Result<Self, InvalidMenuId> {
        let id = id.into();
        if id.is_empty() {
            return Err(InvalidMenuId::Empty);
        }
        if id
            .chars()
            .any(|c| matches!(c, '/' | '?' | '#' | '%') || c.is_whitespace())
        {
            return Err(InvalidMenuId::ReservedCharacter(id));
        }
        Ok(Self(RawMenuId::Text(id)))
    }

    /// Numeric id; serializes as a JSON number.
    #[must_use]
    pub fn number(id: i64) -> Self {
        Self(RawMenuId::Number(id))
    }

    #[must_use]
    pub fn as_number(&self) -> Option<i64> {
        match self.0 {
            RawMenuId::Number(number) => Some(number),
            RawMenuId::Text(_) => None,
        }
    }
}

impl fmt::Display for MenuId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            RawMenuId::Number(number) => write!(f, "{number}"),
            RawMenuId::Text(text) => f.write_str(text),
        }
    }
}

/// Canonical integers (`7`, `-3`) parse as numeric ids, anything else
/// (`007`, `+7`, `a1`) as text.
impl FromStr for MenuId {
    type Err = InvalidMenuId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.parse::<i64>() {
            Ok(number) if number.to_string() == s => Ok(Self::number(number)),
            _ => Self::new(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
enum RawMenuId {
    Number(i64),
    Text(String),
}

impl TryFrom<RawMenuId> for MenuId {
    type Error = InvalidMenuId;

    fn try_from(raw: RawMenuId) -> Result<Self, Self::Error> {
        match raw {
            RawMenuId::Text(text) => Self::new(text),
            RawMenuId::Number(number) => Ok(Self::number(number)),
        }
    }
}

impl From<MenuId> for RawMenuId {
    fn from(id: MenuId) -> Self {
        id.0
    }
}

/// A node of the menu tree as the backend exchanges it.
///
/// Fields not modelled here survive a round trip through `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<MenuId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<MenuId>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hidden: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<MenuNode>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MenuNode {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Number of nodes in this subtree, including `self`.
    #[must_use]
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(Self::subtree_len).sum::<usize>()
    }
}
