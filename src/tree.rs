//! Coalescing attribute writes into request trees, and walking response trees.

use serde_json::Value;

use crate::protocol::{Attribute, MultiRequest, MultiResponse, Node, Request, OP_WRITE, STATUS_ROOT};
use crate::{Error, Result};

/// Merges `attributes` into one write request per destination. Attributes
/// sharing a path prefix share the branch nodes of that prefix; a repeated
/// leaf keeps the last value written.
pub fn build_write_request(attributes: &[Attribute]) -> MultiRequest {
    let mut requests: Vec<Request> = Vec::new();

    for attr in attributes {
        let idx = match requests.iter().position(|r| r.to == attr.destination()) {
            Some(idx) => idx,
            None => {
                requests.push(Request {
                    op: OP_WRITE,
                    to: attr.destination().to_string(),
                    pc: Some(Node::branch(STATUS_ROOT)),
                });
                requests.len() - 1
            }
        };

        let root = requests[idx]
            .pc
            .get_or_insert_with(|| Node::branch(STATUS_ROOT));
        let mut children = branch_children(root);
        for segment in attr.path() {
            children = descend(children, segment);
        }

        let leaf = Node::leaf(attr.name(), attr.value().clone());
        match children.iter().position(|n| n.name() == attr.name()) {
            Some(existing) => children[existing] = leaf,
            None => children.push(leaf),
        }
    }

    MultiRequest { requests }
}

fn descend<'a>(children: &'a mut Vec<Node>, name: &str) -> &'a mut Vec<Node> {
    let idx = match children.iter().position(|n| n.name() == name) {
        Some(idx) => idx,
        None => {
            children.push(Node::branch(name));
            children.len() - 1
        }
    };
    branch_children(&mut children[idx])
}

/// Children of a branch; a leaf standing where a branch is needed is
/// replaced by an empty branch of the same name.
fn branch_children(node: &mut Node) -> &mut Vec<Node> {
    if let Node::Leaf { name, .. } = node {
        let name = std::mem::take(name);
        *node = Node::branch(name);
    }
    match node {
        Node::Branch { children, .. } => children,
        Node::Leaf { .. } => unreachable!("leaf replaced by branch above"),
    }
}

/// Walks `keys` from the root node of every record answering `endpoint`
/// and returns the value of the final leaf.
pub fn find_value<'a>(response: &'a MultiResponse, endpoint: &str, keys: &[&str]) -> Result<&'a Value> {
    let not_found = |key: &str| Error::KeyNotFound {
        endpoint: endpoint.to_string(),
        key: key.to_string(),
    };
    let (last, parents) = keys.split_last().ok_or_else(|| not_found(""))?;

    let mut level: Vec<&'a Node> = response
        .responses
        .iter()
        .filter(|r| r.fr == endpoint)
        .filter_map(|r| r.pc.as_ref())
        .collect();

    for key in parents {
        let node = level
            .iter()
            .copied()
            .find(|n| n.name() == *key)
            .ok_or_else(|| not_found(*key))?;
        match node {
            Node::Branch { children, .. } => level = children.iter().collect(),
            Node::Leaf { .. } => return Err(not_found(*key)),
        }
    }

    match level.into_iter().find(|n| n.name() == *last) {
        Some(Node::Leaf { value, .. }) => Ok(value),
        _ => Err(not_found(*last)),
    }
}

/// `find_value` narrowed to a string leaf.
pub fn find_str<'a>(response: &'a MultiResponse, endpoint: &str, keys: &[&str]) -> Result<&'a str> {
    let value = find_value(response, endpoint, keys)?;
    value.as_str().ok_or_else(|| Error::InvalidValue {
        key: keys.join("/"),
        value: value.to_string(),
    })
}
