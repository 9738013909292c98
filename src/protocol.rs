use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::{Error, Result};

pub const MULTIREQ_PATH: &str = "/dsiot/multireq";

pub const OP_READ: u8 = 2;
pub const OP_WRITE: u8 = 3;
pub const RSC_WRITE_OK: u32 = 2004;

const READ_FILTER: &str = "?filter=pv,pt,md";

pub const IDENTITY_ENDPOINT: &str = "/dsiot/edge.adp_i";
pub const STATUS_ENDPOINT: &str = "/dsiot/edge/adr_0100.dgc_status";
pub const OUTDOOR_ENDPOINT: &str = "/dsiot/edge/adr_0200.dgc_status";
pub const WEEK_POWER_ENDPOINT: &str = "/dsiot/edge/adr_0100.i_power.week_power";
pub const CONTROL_ENDPOINT: &str = STATUS_ENDPOINT;

/// Root node of every `dgc_status` tree, read or written.
pub const STATUS_ROOT: &str = "dgc_status";

pub const SETTINGS_GROUP: &[&str] = &["e_1002", "e_3001"];
pub const POWER_GROUP: &[&str] = &["e_1002", "e_A002"];
pub const SENSOR_GROUP: &[&str] = &["e_1002", "e_A00B"];
pub const OUTDOOR_GROUP: &[&str] = &["e_1003", "e_A00D"];

pub const MODE_ATTR: &str = "p_01";
pub const POWER_ATTR: &str = "p_01";
pub const INDOOR_TEMP_ATTR: &str = "p_01";
pub const HUMIDITY_ATTR: &str = "p_02";
pub const OUTDOOR_TEMP_ATTR: &str = "p_01";

/// Full navigator key list for an attribute under `dgc_status`.
pub fn status_keys<'a>(group: &[&'a str], attr: &'a str) -> Vec<&'a str> {
    let mut keys = Vec::with_capacity(group.len() + 2);
    keys.push(STATUS_ROOT);
    keys.extend_from_slice(group);
    keys.push(attr);
    keys
}

/// A named element of a dsiot tree: `{"pn", "pv"}` or `{"pn", "pch"}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawNode")]
pub enum Node {
    Leaf { name: String, value: Value },
    Branch { name: String, children: Vec<Node> },
}

impl Node {
    pub fn leaf(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Node::Leaf {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn branch(name: impl Into<String>) -> Self {
        Node::Branch {
            name: name.into(),
            children: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Node::Leaf { name, .. } | Node::Branch { name, .. } => name,
        }
    }
}

#[derive(Deserialize)]
struct RawNode {
    pn: String,
    #[serde(default)]
    pv: Option<Value>,
    #[serde(default)]
    pch: Option<Vec<Node>>,
}

impl From<RawNode> for Node {
    fn from(raw: RawNode) -> Self {
        match raw.pch {
            Some(children) => Node::Branch {
                name: raw.pn,
                children,
            },
            None => Node::Leaf {
                name: raw.pn,
                value: raw.pv.unwrap_or(Value::Null),
            },
        }
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        match self {
            Node::Leaf { name, value } => {
                map.serialize_entry("pn", name)?;
                map.serialize_entry("pv", value)?;
            }
            Node::Branch { name, children } => {
                map.serialize_entry("pn", name)?;
                map.serialize_entry("pch", children)?;
            }
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MultiRequest {
    pub requests: Vec<Request>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Request {
    pub op: u8,
    pub to: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pc: Option<Node>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MultiResponse {
    #[serde(default)]
    pub responses: Vec<Response>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Response {
    pub fr: String,
    #[serde(default)]
    pub rsc: Option<u32>,
    #[serde(default)]
    pub pc: Option<Node>,
}

impl MultiResponse {
    /// Every record must carry `rsc == 2004`; an empty reply is a rejection.
    pub fn check_write_ack(&self, endpoint: &str) -> Result<()> {
        if self.responses.is_empty() {
            return Err(Error::Protocol {
                endpoint: endpoint.to_string(),
                rsc: None,
            });
        }
        match self.responses.iter().find(|r| r.rsc != Some(RSC_WRITE_OK)) {
            Some(rejected) => Err(Error::Protocol {
                endpoint: rejected.fr.clone(),
                rsc: rejected.rsc,
            }),
            None => Ok(()),
        }
    }
}

pub fn parse_response(body: &str) -> Result<MultiResponse> {
    Ok(serde_json::from_str(body)?)
}

pub fn identity_read_request() -> MultiRequest {
    MultiRequest {
        requests: vec![Request {
            op: OP_READ,
            to: IDENTITY_ENDPOINT.to_string(),
            pc: None,
        }],
    }
}

/// The three reads behind every refresh.
pub fn status_read_request() -> MultiRequest {
    let requests = [STATUS_ENDPOINT, OUTDOOR_ENDPOINT, WEEK_POWER_ENDPOINT]
        .into_iter()
        .map(|endpoint| Request {
            op: OP_READ,
            to: format!("{endpoint}{READ_FILTER}"),
            pc: None,
        })
        .collect();
    MultiRequest { requests }
}

/// One desired scalar write, addressed by destination + path + leaf name.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    name: String,
    value: Value,
    path: Vec<String>,
    destination: String,
}

impl Attribute {
    pub fn new(destination: &str, path: &[&str], name: &str, value: impl Into<Value>) -> Self {
        Self {
            name: name.to_string(),
            value: value.into(),
            path: path.iter().map(|s| s.to_string()).collect(),
            destination: destination.to_string(),
        }
    }

    /// Attribute on the control endpoint.
    pub fn control(path: &[&str], name: &str, value: impl Into<Value>) -> Self {
        Self::new(CONTROL_ENDPOINT, path, name, value)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn path(&self) -> &[String] {
        &self.path
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }
}
