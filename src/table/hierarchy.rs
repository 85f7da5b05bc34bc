//! Three-level row hierarchy of a summary table
//!
//! Configured as nested `L1` / `L2` / `L3` lists:
//!
//! ```toml
//! [[L1]]
//! legend = "Total"
//! aggregation_freq = "mean"
//!
//!   [[L1.L2]]
//!   legend = "Wind"
//!   aggregation_freq = "mean"
//! ```
//!
//! Each node's `legend` names a data column. Legends are unique across the
//! whole tree and rows are rendered in depth-first pre-order.

use crate::error::{ReshapeError, ReshapeResult};
use crate::frame::Aggregation;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Depth of a hierarchy node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Level {
    L1,
    L2,
    L3,
}

impl Level {
    pub fn key(&self) -> &'static str {
        match self {
            Self::L1 => "L1",
            Self::L2 => "L2",
            Self::L3 => "L3",
        }
    }

    /// Number of `&nbsp;` entities prepended to the legend
    pub fn indent(&self) -> usize {
        match self {
            Self::L1 => 0,
            Self::L2 => 2,
            Self::L3 => 4,
        }
    }

    /// Legend as rendered in the first table column
    pub fn indented(&self, legend: &str) -> String {
        format!("{}{}", "&nbsp;".repeat(self.indent()), legend)
    }

    fn child(&self) -> Option<Level> {
        match self {
            Self::L1 => Some(Self::L2),
            Self::L2 => Some(Self::L3),
            Self::L3 => None,
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// One row of the hierarchy
#[derive(Debug, Clone, PartialEq)]
pub struct HierarchyNode {
    pub legend: String,
    /// Aggregation used when resampling this row's column
    pub aggregation_freq: Aggregation,
    /// Roll-up aggregation across children, carried through configuration
    pub aggregation_level: Option<Aggregation>,
    pub children: Vec<HierarchyNode>,
}

impl HierarchyNode {
    pub fn new(legend: impl Into<String>, aggregation_freq: Aggregation) -> Self {
        Self {
            legend: legend.into(),
            aggregation_freq,
            aggregation_level: None,
            children: Vec::new(),
        }
    }

    pub fn with_child(mut self, child: HierarchyNode) -> Self {
        self.children.push(child);
        self
    }
}

/// Node as written in configuration, before level checks
#[derive(Debug, Clone, Deserialize)]
struct RawNode {
    legend: String,
    #[serde(default = "default_aggregation")]
    aggregation_freq: Aggregation,
    #[serde(default)]
    aggregation_level: Option<Aggregation>,
    #[serde(rename = "L1", default)]
    l1: Option<Vec<RawNode>>,
    #[serde(rename = "L2", default)]
    l2: Option<Vec<RawNode>>,
    #[serde(rename = "L3", default)]
    l3: Option<Vec<RawNode>>,
}

fn default_aggregation() -> Aggregation {
    Aggregation::Mean
}

/// Top level of a hierarchy configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RawHierarchy {
    #[serde(rename = "L1", default)]
    l1: Vec<RawNode>,
    #[serde(rename = "L2", default)]
    l2: Option<Vec<RawNode>>,
    #[serde(rename = "L3", default)]
    l3: Option<Vec<RawNode>>,
}

impl RawNode {
    fn into_node(self, level: Level) -> ReshapeResult<HierarchyNode> {
        let nested = [(Level::L1, self.l1), (Level::L2, self.l2), (Level::L3, self.l3)];

        let mut children = Vec::new();
        for (key, nodes) in nested {
            let Some(nodes) = nodes else { continue };
            if Some(key) != level.child() {
                return Err(ReshapeError::InvalidHierarchy(format!(
                    "'{}' cannot be nested under {} node '{}'",
                    key, level, self.legend
                )));
            }
            for node in nodes {
                children.push(node.into_node(key)?);
            }
        }

        Ok(HierarchyNode {
            legend: self.legend,
            aggregation_freq: self.aggregation_freq,
            aggregation_level: self.aggregation_level,
            children,
        })
    }
}

/// Validated row hierarchy
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawHierarchy")]
pub struct Hierarchy {
    roots: Vec<HierarchyNode>,
}

impl Hierarchy {
    /// Build from L1 nodes, checking depth and legend uniqueness
    pub fn new(roots: Vec<HierarchyNode>) -> ReshapeResult<Self> {
        fn check(
            node: &HierarchyNode,
            depth: usize,
            seen: &mut HashSet<String>,
        ) -> ReshapeResult<()> {
            if depth > 3 {
                return Err(ReshapeError::InvalidHierarchy(format!(
                    "'{}' is nested deeper than three levels",
                    node.legend
                )));
            }
            if !seen.insert(node.legend.clone()) {
                return Err(ReshapeError::InvalidHierarchy(format!(
                    "duplicate legend '{}'",
                    node.legend
                )));
            }
            node.children
                .iter()
                .try_for_each(|child| check(child, depth + 1, seen))
        }

        let mut seen = HashSet::new();
        for root in &roots {
            check(root, 1, &mut seen)?;
        }
        Ok(Self { roots })
    }

    /// Parse a JSON hierarchy configuration
    pub fn from_value(value: serde_json::Value) -> ReshapeResult<Self> {
        let raw: RawHierarchy = serde_json::from_value(value)
            .map_err(|e| ReshapeError::InvalidHierarchy(e.to_string()))?;
        Self::try_from(raw)
    }

    pub fn roots(&self) -> &[HierarchyNode] {
        &self.roots
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Nodes in depth-first pre-order with their level
    pub fn flatten(&self) -> Vec<(Level, &HierarchyNode)> {
        fn visit<'a>(
            node: &'a HierarchyNode,
            level: Level,
            out: &mut Vec<(Level, &'a HierarchyNode)>,
        ) {
            out.push((level, node));
            if let Some(child_level) = level.child() {
                for child in &node.children {
                    visit(child, child_level, out);
                }
            }
        }

        let mut out = Vec::new();
        for root in &self.roots {
            visit(root, Level::L1, &mut out);
        }
        out
    }

    /// Legends in rendering order
    pub fn legends(&self) -> Vec<&str> {
        self.flatten()
            .into_iter()
            .map(|(_, node)| node.legend.as_str())
            .collect()
    }

    /// Legends grouped by level, each group in rendering order
    pub fn legends_by_level(&self) -> BTreeMap<Level, Vec<&str>> {
        let mut levels: BTreeMap<Level, Vec<&str>> =
            [Level::L1, Level::L2, Level::L3].into_iter().map(|l| (l, Vec::new())).collect();
        for (level, node) in self.flatten() {
            levels.entry(level).or_default().push(node.legend.as_str());
        }
        levels
    }

    /// Resampling aggregation of every legend
    pub fn aggregations(&self) -> HashMap<&str, Aggregation> {
        self.flatten()
            .into_iter()
            .map(|(_, node)| (node.legend.as_str(), node.aggregation_freq))
            .collect()
    }
}

impl TryFrom<RawHierarchy> for Hierarchy {
    type Error = ReshapeError;

    fn try_from(raw: RawHierarchy) -> ReshapeResult<Self> {
        if raw.l2.is_some() || raw.l3.is_some() {
            return Err(ReshapeError::InvalidHierarchy(
                "the top level only accepts 'L1'".to_string(),
            ));
        }
        let roots = raw
            .l1
            .into_iter()
            .map(|node| node.into_node(Level::L1))
            .collect::<ReshapeResult<Vec<_>>>()?;
        Self::new(roots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Hierarchy {
        Hierarchy::from_value(json!({
            "L1": [
                {
                    "legend": "level_l1_0",
                    "aggregation_freq": "mean",
                    "aggregation_level": "sum",
                    "L2": [
                        {
                            "legend": "level_l1_l2_0",
                            "aggregation_freq": "sum",
                            "L3": [{"legend": "level_l1_l2_l3_0", "aggregation_freq": "max"}]
                        },
                        {"legend": "level_l1_l2_1", "aggregation_freq": "mean"}
                    ]
                },
                {"legend": "level_l1_1", "aggregation_freq": "last"}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_pre_order_traversal() {
        assert_eq!(
            sample().legends(),
            vec![
                "level_l1_0",
                "level_l1_l2_0",
                "level_l1_l2_l3_0",
                "level_l1_l2_1",
                "level_l1_1"
            ]
        );
    }

    #[test]
    fn test_legends_by_level() {
        let hierarchy = sample();
        let levels = hierarchy.legends_by_level();
        assert_eq!(levels[&Level::L1], vec!["level_l1_0", "level_l1_1"]);
        assert_eq!(levels[&Level::L2], vec!["level_l1_l2_0", "level_l1_l2_1"]);
        assert_eq!(levels[&Level::L3], vec!["level_l1_l2_l3_0"]);
    }

    #[test]
    fn test_aggregations() {
        let hierarchy = sample();
        let aggs = hierarchy.aggregations();
        assert_eq!(aggs.len(), 5);
        assert_eq!(aggs["level_l1_l2_0"], Aggregation::Sum);
        assert_eq!(aggs["level_l1_l2_l3_0"], Aggregation::Max);
        assert_eq!(hierarchy.roots()[0].aggregation_level, Some(Aggregation::Sum));
    }

    #[test]
    fn test_indentation_increases_with_level() {
        assert_eq!(Level::L1.indented("a"), "a");
        assert_eq!(Level::L2.indented("a"), "&nbsp;&nbsp;a");
        assert_eq!(Level::L3.indented("a"), "&nbsp;&nbsp;&nbsp;&nbsp;a");
        assert!(Level::L1.indent() < Level::L2.indent());
        assert!(Level::L2.indent() < Level::L3.indent());
    }

    #[test]
    fn test_key_at_wrong_level() {
        let result = Hierarchy::from_value(json!({
            "L1": [{"legend": "a", "L3": [{"legend": "b"}]}]
        }));
        assert!(matches!(result, Err(ReshapeError::InvalidHierarchy(_))));

        let result = Hierarchy::from_value(json!({"L2": [{"legend": "a"}]}));
        assert!(matches!(result, Err(ReshapeError::InvalidHierarchy(_))));
    }

    #[test]
    fn test_too_deep_via_builder() {
        let node = HierarchyNode::new("a", Aggregation::Mean).with_child(
            HierarchyNode::new("b", Aggregation::Mean).with_child(
                HierarchyNode::new("c", Aggregation::Mean)
                    .with_child(HierarchyNode::new("d", Aggregation::Mean)),
            ),
        );
        assert!(matches!(
            Hierarchy::new(vec![node]),
            Err(ReshapeError::InvalidHierarchy(_))
        ));
    }

    #[test]
    fn test_duplicate_legend() {
        let result = Hierarchy::from_value(json!({
            "L1": [
                {"legend": "a", "L2": [{"legend": "b"}]},
                {"legend": "b"}
            ]
        }));
        assert!(matches!(result, Err(ReshapeError::InvalidHierarchy(msg)) if msg.contains("'b'")));
    }

    #[test]
    fn test_toml_configuration() {
        let config = r#"
            [[L1]]
            legend = "Total"
            aggregation_freq = "sum"

              [[L1.L2]]
              legend = "Wind"
        "#;
        let hierarchy: Hierarchy = toml::from_str(config).unwrap();
        assert_eq!(hierarchy.legends(), vec!["Total", "Wind"]);
        // Missing aggregation defaults to mean
        assert_eq!(hierarchy.aggregations()["Wind"], Aggregation::Mean);
    }
}
