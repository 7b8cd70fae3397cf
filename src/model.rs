//! Domain model for discovered middleware hosts.
//!
//! A probe builds a [`Host`] first, appends [`Node`]s as it discovers them,
//! attaches topics, services and parameters to their owning node, and finally
//! calls [`Host::synthesize_communications`] to derive the publish/subscribe
//! graph. Once the probe hands the host to the engine it is read-only.

use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::net::Ipv4Addr;
use std::sync::Arc;

/// Handle to a node inside the [`Host`] that issued it.
///
/// Handles are positions in the host's append-only node list, so they stay
/// valid for the lifetime of the host and never point across hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in its host's node list.
    pub fn index(self) -> usize {
        self.0
    }
}

/// A named, typed publish/subscribe channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub name: String,
    /// Payload schema identifier as reported by the target.
    #[serde(rename = "type")]
    pub type_name: String,
}

impl Topic {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.name, self.type_name)
    }
}

/// A remote-callable endpoint exposed by a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub name: String,
}

impl Service {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A named configuration value. Never interpreted by the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub value: String,
}

impl Parameter {
    pub fn new(
        name: impl Into<String>,
        type_name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            value: value.into(),
        }
    }
}

/// One logical process discovered on a host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    /// Address the node advertises, which may be a hostname.
    pub address: String,
    pub port: u16,
    #[serde(default)]
    pub published_topics: Vec<Topic>,
    #[serde(default)]
    pub subscribed_topics: Vec<Topic>,
    #[serde(default)]
    pub services: Vec<Service>,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
}

impl Node {
    /// Create a node with no topics, services or parameters.
    pub fn new(name: impl Into<String>, address: impl Into<String>, port: u16) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            port,
            published_topics: Vec::new(),
            subscribed_topics: Vec::new(),
            services: Vec::new(),
            parameters: Vec::new(),
        }
    }

    /// Declare a topic this node publishes.
    pub fn publishes(&mut self, topic: Topic) -> &mut Self {
        self.published_topics.push(topic);
        self
    }

    /// Declare a topic this node subscribes to.
    pub fn subscribes(&mut self, topic: Topic) -> &mut Self {
        self.subscribed_topics.push(topic);
        self
    }

    pub fn add_service(&mut self, service: Service) -> &mut Self {
        self.services.push(service);
        self
    }

    pub fn add_parameter(&mut self, parameter: Parameter) -> &mut Self {
        self.parameters.push(parameter);
        self
    }
}

/// The derived publisher/subscriber graph for one topic within a host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Communication {
    pub topic: Arc<Topic>,
    pub publishers: Vec<NodeId>,
    pub subscribers: Vec<NodeId>,
}

impl Communication {
    fn new(topic: Arc<Topic>) -> Self {
        Self {
            topic,
            publishers: Vec::new(),
            subscribers: Vec::new(),
        }
    }

    /// Resolve publisher handles against the host that produced this record.
    pub fn publisher_nodes<'a>(&'a self, host: &'a Host) -> impl Iterator<Item = &'a Node> + 'a {
        self.publishers.iter().filter_map(move |id| host.node(*id))
    }

    /// Resolve subscriber handles against the host that produced this record.
    pub fn subscriber_nodes<'a>(&'a self, host: &'a Host) -> impl Iterator<Item = &'a Node> + 'a {
        self.subscribers.iter().filter_map(move |id| host.node(*id))
    }
}

#[derive(Clone, Copy)]
enum Role {
    Publisher,
    Subscriber,
}

/// One scanned endpoint believed to run the target middleware.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Host {
    address: Ipv4Addr,
    port: u16,
    /// Raw service banner, when the probe captured one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    banner: Option<String>,
    nodes: Vec<Node>,
    communications: Vec<Communication>,
}

impl Host {
    /// Create an empty host for a successful probe.
    pub fn new(address: Ipv4Addr, port: u16) -> Self {
        Self {
            address,
            port,
            banner: None,
            nodes: Vec::new(),
            communications: Vec::new(),
        }
    }

    /// Set the banner.
    pub fn with_banner(mut self, banner: Option<String>) -> Self {
        self.banner = banner;
        self
    }

    pub fn address(&self) -> Ipv4Addr {
        self.address
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn banner(&self) -> Option<&str> {
        self.banner.as_deref()
    }

    /// Nodes in discovery order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn communications(&self) -> &[Communication] {
        &self.communications
    }

    /// Append a discovered node. Names must be non-empty and unique per host.
    pub fn add_node(&mut self, node: Node) -> Result<NodeId, ModelError> {
        if node.name.is_empty() {
            return Err(ModelError::EmptyNodeName);
        }
        if self.nodes.iter().any(|n| n.name == node.name) {
            return Err(ModelError::DuplicateNode(node.name));
        }

        self.nodes.push(node);
        Ok(NodeId(self.nodes.len() - 1))
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Mutable access for attaching topics, services and parameters.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    pub fn node_id(&self, name: &str) -> Option<NodeId> {
        self.nodes.iter().position(|n| n.name == name).map(NodeId)
    }

    /// Correlate publish/subscribe declarations across this host's nodes.
    ///
    /// Produces one [`Communication`] per distinct topic name, ordered by first
    /// declaration. The shared topic is the first declaration seen. Calling
    /// this again rebuilds the graph from the current nodes.
    pub fn synthesize_communications(&mut self) -> &[Communication] {
        let mut slots: HashMap<&str, usize> = HashMap::new();
        let mut communications: Vec<Communication> = Vec::new();

        for (index, node) in self.nodes.iter().enumerate() {
            let id = NodeId(index);
            let declarations = node
                .published_topics
                .iter()
                .map(|t| (t, Role::Publisher))
                .chain(node.subscribed_topics.iter().map(|t| (t, Role::Subscriber)));

            for (topic, role) in declarations {
                let slot = *slots.entry(topic.name.as_str()).or_insert_with(|| {
                    communications.push(Communication::new(Arc::new(topic.clone())));
                    communications.len() - 1
                });

                let entry = &mut communications[slot];
                let ids = match role {
                    Role::Publisher => &mut entry.publishers,
                    Role::Subscriber => &mut entry.subscribers,
                };
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
        }

        self.communications = communications;
        &self.communications
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.address, self.port)
    }
}
