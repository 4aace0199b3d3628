//! Manifest to graph conversion

use super::ident::nodify;
use super::{attrs, Edge, EdgeKind, Graph, Node, NodeKind, Subgraph};
use crate::compose::config::{attachment_network, Manifest, NetworkConfig, ServiceConfig};

/// Header row color (service name)
pub const HEADER_COLOR: &str = "lightblue";
/// Port row color
pub const PORTS_COLOR: &str = "lightgrey";
/// Volume row color
pub const VOLUMES_COLOR: &str = "orange";
/// Environment row color (legend only)
pub const ENVIRONMENT_COLOR: &str = "pink";
/// Network node fill color
pub const NETWORK_COLOR: &str = "palegreen";

/// Legend cluster identifier
pub const LEGEND_CLUSTER: &str = "cluster_legend";
/// Legend node identifier
pub const LEGEND_NODE: &str = "legend_service";

/// Builds the graph for a manifest
///
/// Entities are visited in key order, so the same manifest always yields the
/// same graph. Edge targets are never checked against the node set.
#[derive(Debug, Clone, Default)]
pub struct GraphBuilder {
    name: Option<String>,
}

impl GraphBuilder {
    /// Builder for an unnamed graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Name the resulting graph
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Lay out the legend, then one node per network and service, then each
    /// service's edges. Never fails; dangling references become edges to
    /// nodes the renderer creates implicitly.
    pub fn build(&self, manifest: &Manifest) -> Graph {
        let mut graph = Graph::new(self.name.clone());

        graph.subgraphs.push(legend());

        for (name, network) in &manifest.networks {
            graph.nodes.push(network_node(name, network));
        }

        for (name, service) in &manifest.services {
            graph.nodes.push(service_node(name, service));
        }

        for (name, service) in &manifest.services {
            graph.edges.extend(service_edges(name, service));
        }

        tracing::debug!(
            nodes = graph.nodes.len(),
            edges = graph.edges.len(),
            "Built compose graph"
        );

        graph
    }
}

fn legend() -> Subgraph {
    let label = format!(
        "<{}{}{}{}{}{}>",
        "<TABLE BORDER='0'>",
        header_row("container_name"),
        detail_row(PORTS_COLOR, "ports ext:int"),
        detail_row(VOLUMES_COLOR, "volumes host:container"),
        detail_row(ENVIRONMENT_COLOR, "environment"),
        "</TABLE>",
    );

    Subgraph {
        id: LEGEND_CLUSTER.to_string(),
        attrs: attrs([("label", "Legend")]),
        nodes: vec![Node {
            id: LEGEND_NODE.to_string(),
            kind: NodeKind::Legend,
            attrs: attrs([("shape", "plaintext"), ("label", label.as_str())]),
        }],
    }
}

fn network_node(name: &str, network: &NetworkConfig) -> Node {
    let label = format!("Network: {}", network.display_name(name));
    Node {
        id: nodify(name),
        kind: NodeKind::Network,
        attrs: attrs([
            ("label", label.as_str()),
            ("style", "filled"),
            ("shape", "box"),
            ("fillcolor", NETWORK_COLOR),
        ]),
    }
}

fn service_node(name: &str, service: &ServiceConfig) -> Node {
    let mut label = String::from("<<TABLE BORDER='0'>");
    label.push_str(&header_row(name));
    for port in &service.ports {
        label.push_str(&detail_row(PORTS_COLOR, port));
    }
    for volume in &service.volumes {
        label.push_str(&detail_row(VOLUMES_COLOR, volume));
    }
    label.push_str("</TABLE>>");

    Node {
        id: nodify(name),
        kind: NodeKind::Service,
        attrs: attrs([("shape", "plaintext"), ("label", label.as_str())]),
    }
}

fn service_edges(name: &str, service: &ServiceConfig) -> Vec<Edge> {
    let from = nodify(name);
    let mut edges = Vec::with_capacity(
        service.networks.len() + service.volumes_from.len() + service.depends_on.len(),
    );

    for attachment in &service.networks {
        edges.push(Edge {
            from: from.clone(),
            to: nodify(attachment_network(attachment)),
            kind: EdgeKind::Network,
            attrs: attrs([("dir", "none")]),
        });
    }

    for target in &service.volumes_from {
        edges.push(dashed(&from, target, EdgeKind::VolumesFrom, "volumes_from"));
    }

    for target in &service.depends_on {
        edges.push(dashed(&from, target, EdgeKind::DependsOn, "depends_on"));
    }

    edges
}

fn dashed(from: &str, target: &str, kind: EdgeKind, label: &str) -> Edge {
    Edge {
        from: from.to_string(),
        to: nodify(target),
        kind,
        attrs: attrs([("style", "dashed"), ("label", label)]),
    }
}

fn header_row(text: &str) -> String {
    format!(
        "<TR><TD BGCOLOR='{}'><B>{}</B></TD></TR>",
        HEADER_COLOR,
        escape_html(text)
    )
}

fn detail_row(color: &str, text: &str) -> String {
    format!(
        "<TR><TD BGCOLOR='{}'><FONT POINT-SIZE='9'>{}</FONT></TD></TR>",
        color,
        escape_html(text)
    )
}

/// Escape text placed inside an HTML-like label
fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            c => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::ComposeParser;

    fn build(yaml: &str) -> Graph {
        let manifest = ComposeParser::parse_str(yaml).unwrap();
        GraphBuilder::new().build(&manifest)
    }

    fn label<'a>(node: &'a Node) -> &'a str {
        node.attrs.get("label").map(String::as_str).unwrap_or_default()
    }

    #[test]
    fn test_end_to_end_single_service() {
        let graph = build(
            r#"
networks:
  front-end:
services:
  web:
    image: nginx
    ports: ["80:80"]
    networks: ["front-end"]
"#,
        );

        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.edges.len(), 1);

        let network = graph.node("front_end").unwrap();
        assert_eq!(network.kind, NodeKind::Network);
        assert_eq!(label(network), "Network: front-end");
        assert_eq!(network.attrs["fillcolor"], "palegreen");
        assert_eq!(network.attrs["shape"], "box");
        assert_eq!(network.attrs["style"], "filled");

        let web = graph.node("web").unwrap();
        assert_eq!(web.kind, NodeKind::Service);
        assert!(label(web).contains("80:80"));
        assert_eq!(
            label(web),
            "<<TABLE BORDER='0'>\
             <TR><TD BGCOLOR='lightblue'><B>web</B></TD></TR>\
             <TR><TD BGCOLOR='lightgrey'><FONT POINT-SIZE='9'>80:80</FONT></TD></TR>\
             </TABLE>>"
        );

        let edge = &graph.edges[0];
        assert_eq!((edge.from.as_str(), edge.to.as_str()), ("web", "front_end"));
        assert_eq!(edge.kind, EdgeKind::Network);
        assert_eq!(edge.attrs, attrs([("dir", "none")]));
    }

    #[test]
    fn test_legend_is_constant() {
        let empty = build("");
        let full = build("services:\n  web:\n    image: nginx\n");
        assert_eq!(empty.subgraphs, full.subgraphs);

        let legend = &empty.subgraphs[0];
        assert_eq!(legend.id, "cluster_legend");
        assert_eq!(legend.attrs["label"], "Legend");
        assert_eq!(legend.nodes.len(), 1);
        assert_eq!(legend.nodes[0].id, "legend_service");
        assert_eq!(
            label(&legend.nodes[0]),
            "<<TABLE BORDER='0'>\
             <TR><TD BGCOLOR='lightblue'><B>container_name</B></TD></TR>\
             <TR><TD BGCOLOR='lightgrey'><FONT POINT-SIZE='9'>ports ext:int</FONT></TD></TR>\
             <TR><TD BGCOLOR='orange'><FONT POINT-SIZE='9'>volumes host:container</FONT></TD></TR>\
             <TR><TD BGCOLOR='pink'><FONT POINT-SIZE='9'>environment</FONT></TD></TR>\
             </TABLE>>"
        );
        assert!(empty.nodes.is_empty());
    }

    #[test]
    fn test_every_key_is_one_node() {
        let graph = build(
            r#"
networks:
  front-end:
  back-end:
  legacy:
    external: true
volumes:
  data:
services:
  web-app:
    image: nginx
  db:
    image: postgres
  cache-1:
    image: redis
"#,
        );

        let mut ids: Vec<_> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec!["back_end", "cache_1", "db", "front_end", "legacy", "web_app"]);
        assert_eq!(graph.nodes_of(NodeKind::Network).count(), 3);
        assert_eq!(graph.nodes_of(NodeKind::Service).count(), 3);
        assert!(graph.node("data").is_none());
    }

    #[test]
    fn test_alias_is_stripped() {
        let graph = build(
            r#"
services:
  web:
    networks:
      - frontend:alias
"#,
        );
        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.edges[0].to, "frontend");
    }

    #[test]
    fn test_external_network_name_in_label() {
        let graph = build(
            r#"
networks:
  outside:
    external:
      name: legacy-net
"#,
        );
        let node = graph.node("outside").unwrap();
        assert!(label(node).contains("legacy-net"));
        assert!(!label(node).contains("outside"));
    }

    #[test]
    fn test_edge_counts_match_lists() {
        let graph = build(
            r#"
services:
  web:
    volumes_from: [data, logs]
    depends_on: [api, db, cache]
  api:
    depends_on: [db]
"#,
        );

        let count = |from: &str, kind: EdgeKind| graph.edges_from(from).filter(|e| e.kind == kind).count();
        assert_eq!(count("web", EdgeKind::VolumesFrom), 2);
        assert_eq!(count("web", EdgeKind::DependsOn), 3);
        assert_eq!(count("api", EdgeKind::DependsOn), 1);
        assert_eq!(count("api", EdgeKind::VolumesFrom), 0);

        for edge in graph.edges_from("web") {
            assert_eq!(edge.attrs["style"], "dashed");
        }
        let labels: Vec<_> = graph.edges_from("web").map(|e| e.attrs["label"].as_str()).collect();
        assert_eq!(
            labels,
            vec!["volumes_from", "volumes_from", "depends_on", "depends_on", "depends_on"]
        );
    }

    #[test]
    fn test_dangling_depends_on() {
        let graph = build(
            r#"
services:
  web:
    image: nginx
    depends_on: ["db"]
"#,
        );
        assert!(graph.node("db").is_none());
        assert_eq!(graph.edges.len(), 1);
        let edge = &graph.edges[0];
        assert_eq!((edge.from.as_str(), edge.to.as_str()), ("web", "db"));
        assert_eq!(edge.attrs, attrs([("label", "depends_on"), ("style", "dashed")]));
    }

    #[test]
    fn test_hyphenated_targets_are_normalized() {
        let graph = build(
            r#"
services:
  web-app:
    networks: [front-end:web]
    volumes_from: [data-box]
    depends_on: [my-db]
"#,
        );
        let targets: Vec<_> = graph.edges_from("web_app").map(|e| e.to.as_str()).collect();
        assert_eq!(targets, vec!["front_end", "data_box", "my_db"]);
    }

    #[test]
    fn test_environment_not_rendered() {
        let graph = build(
            r#"
services:
  web:
    environment:
      SECRET: hunter2
    volumes: ["./html:/usr/share/nginx/html"]
"#,
        );
        let web = label(graph.node("web").unwrap()).to_string();
        assert!(!web.contains("SECRET"));
        assert!(!web.contains("pink"));
        assert!(web.contains("<TD BGCOLOR='orange'><FONT POINT-SIZE='9'>./html:/usr/share/nginx/html</FONT>"));
    }

    #[test]
    fn test_label_text_is_escaped() {
        let graph = build("services:\n  web:\n    ports: [\"<80>&\"]\n");
        assert!(label(graph.node("web").unwrap()).contains("&lt;80&gt;&amp;"));
    }

    #[test]
    fn test_order_is_independent_of_source() {
        let a = build("services:\n  b:\n    image: x\n  a:\n    image: y\nnetworks:\n  n2:\n  n1:\n");
        let b = build("networks:\n  n1:\n  n2:\nservices:\n  a:\n    image: y\n  b:\n    image: x\n");
        assert_eq!(a, b);
        let ids: Vec<_> = a.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["n1", "n2", "a", "b"]);
    }

    #[test]
    fn test_graph_name() {
        let graph = GraphBuilder::new().with_name("stack").build(&Manifest::default());
        assert_eq!(graph.name.as_deref(), Some("stack"));
    }
}
