#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Menu tree CRUD for the admin panel.
//!
//! | call                     | request                                 |
//! |--------------------------|-----------------------------------------|
//! | `get_menu_tree(params)`  | `GET /menu/tree`, params as query        |
//! | `add_menu(node)`         | `POST /menu`, node as body               |
//! | `update_menu(id, node)`  | `PUT /menu/{id}`, node (with id) as body |
//! | `delete_menu(id)`        | `DELETE /menu/{id}`, `{id}` as body      |

mod api;
mod model;

pub use api::{MenuApi, MenuDecodeError, decode_node, decode_tree};
pub use model::{InvalidMenuId, MenuId, MenuNode};
