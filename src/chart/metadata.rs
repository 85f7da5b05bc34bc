//! Chart metadata building blocks
//!
//! Metadata is a nested JSON document. Chart payloads assemble it from small
//! blocks combined with [`merge`], so a later block refines an earlier one
//! without wiping its siblings.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Merge `overlay` into `base`
///
/// Objects merge key by key, recursively. Any other value in `overlay`
/// replaces the one in `base`.
pub fn merge(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        base.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (base, overlay) => *base = overlay.clone(),
    }
}

/// Merge every block in order into an empty document
pub fn merge_all<'a>(blocks: impl IntoIterator<Item = &'a Value>) -> Value {
    let mut document = Value::Object(Map::new());
    for block in blocks {
        merge(&mut document, block);
    }
    document
}

/// Deterministic colour assignment
///
/// Series `i` gets `colors[(offset + i) % len]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Palette {
    pub colors: Vec<u32>,
    #[serde(default)]
    pub offset: usize,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            colors: vec![7, 2, 9, 5, 6, 8, 2, 10],
            offset: 0,
        }
    }
}

impl Palette {
    pub fn new(colors: Vec<u32>, offset: usize) -> Self {
        Self { colors, offset }
    }

    pub fn color_for(&self, i: usize) -> Option<u32> {
        if self.colors.is_empty() {
            return None;
        }
        Some(self.colors[(self.offset + i) % self.colors.len()])
    }

    /// `custom-colors` block for `legends`, in order
    pub fn assign<'a>(&self, legends: impl IntoIterator<Item = &'a str>) -> Value {
        let colors: Map<String, Value> = legends
            .into_iter()
            .enumerate()
            .filter_map(|(i, legend)| self.color_for(i).map(|c| (legend.to_string(), json!(c))))
            .collect();
        Value::Object(colors)
    }
}

/// Family of chart a label policy applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelKind {
    Line,
    /// Areas and bars
    Block,
}

/// Where series labels go
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelPolicy {
    /// Number of value columns above which labels move to the top
    pub threshold: usize,
}

impl Default for LabelPolicy {
    fn default() -> Self {
        Self { threshold: 1 }
    }
}

impl LabelPolicy {
    pub fn new(threshold: usize) -> Self {
        Self { threshold }
    }

    pub fn labeling(&self, kind: LabelKind, value_columns: usize, secondary: bool) -> &'static str {
        if secondary {
            "right"
        } else if value_columns > self.threshold {
            "top"
        } else {
            match kind {
                LabelKind::Line => "none",
                LabelKind::Block => "off",
            }
        }
    }
}

/// Size of the published chart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishSettings {
    pub height: u32,
    pub width: u32,
}

impl Default for PublishSettings {
    fn default() -> Self {
        Self {
            height: 600,
            width: 600,
        }
    }
}

impl PublishSettings {
    /// `publish` block: size, image download on, no logo
    pub fn block(&self) -> Value {
        json!({
            "publish": {
                "blocks": {
                    "download-image": true,
                    "logo": false,
                },
                "chart-height": self.height,
                "chart-width": self.width,
            }
        })
    }
}

/// `annotate` block carrying the chart notes
pub fn notes_block(notes: &str) -> Value {
    json!({ "annotate": { "notes": notes } })
}

/// `describe` block carrying the source line
pub fn source_block(source: &str) -> Value {
    json!({ "describe": { "source-name": source } })
}

/// Unit suffix on one column
pub fn unit_block(column: &str, unit: &str) -> Value {
    json!({
        "data": {
            "column-format": {
                column: {
                    "type": "auto",
                    "number-append": format!(" {}", unit),
                }
            }
        }
    })
}

/// Vertical line marking `today`
pub fn today_line(today: NaiveDate) -> Value {
    let stamp = today.format("%d/%m/%Y 00:00").to_string();
    json!({
        "visualize": {
            "range-annotations": [{
                "x0": stamp,
                "x1": stamp,
                "type": "x",
                "color": "#00344c",
                "display": "line",
                "opacity": 28,
                "strokeType": "solid",
                "strokeWidth": 1,
            }]
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_is_recursive() {
        let mut base = json!({
            "visualize": {"x-grid": "ticks", "sharing": {"auto": true, "enabled": false}},
            "publish": {"chart-height": 600}
        });
        merge(
            &mut base,
            &json!({
                "visualize": {"sharing": {"enabled": true}, "labeling": "top"},
                "publish": 3
            }),
        );

        assert_eq!(
            base,
            json!({
                "visualize": {
                    "x-grid": "ticks",
                    "sharing": {"auto": true, "enabled": true},
                    "labeling": "top"
                },
                "publish": 3
            })
        );
    }

    #[test]
    fn test_merge_scalar_replaced_by_map() {
        let mut base = json!({"a": 1});
        merge(&mut base, &json!({"a": {"b": 2}}));
        assert_eq!(base, json!({"a": {"b": 2}}));
    }

    #[test]
    fn test_merge_all_later_blocks_win() {
        let document =
            merge_all([&notes_block("first"), &notes_block("second"), &source_block("me")]);
        assert_eq!(
            document,
            json!({"annotate": {"notes": "second"}, "describe": {"source-name": "me"}})
        );
    }

    #[test]
    fn test_palette_wraps_with_offset() {
        let palette = Palette::new(vec![1, 2, 3], 2);
        assert_eq!(palette.color_for(0), Some(3));
        assert_eq!(palette.color_for(1), Some(1));
        assert_eq!(palette.color_for(4), Some(3));
        assert_eq!(Palette::new(vec![], 0).color_for(0), None);

        let colors = Palette::default().assign(["a", "b"]);
        assert_eq!(colors, json!({"a": 7, "b": 2}));
    }

    #[test]
    fn test_label_policy() {
        let policy = LabelPolicy::default();
        assert_eq!(policy.labeling(LabelKind::Line, 2, true), "right");
        assert_eq!(policy.labeling(LabelKind::Line, 2, false), "top");
        assert_eq!(policy.labeling(LabelKind::Line, 1, false), "none");
        assert_eq!(policy.labeling(LabelKind::Block, 1, false), "off");

        let relaxed = LabelPolicy::new(3);
        assert_eq!(relaxed.labeling(LabelKind::Block, 3, false), "off");
        assert_eq!(relaxed.labeling(LabelKind::Block, 4, false), "top");
    }

    #[test]
    fn test_blocks() {
        let publish = PublishSettings { height: 400, width: 800 }.block();
        assert_eq!(publish["publish"]["chart-width"], json!(800));
        assert_eq!(publish["publish"]["blocks"]["logo"], json!(false));

        let unit = unit_block("power", "MW");
        assert_eq!(unit["data"]["column-format"]["power"]["number-append"], json!(" MW"));

        let line = today_line(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
        assert_eq!(line["visualize"]["range-annotations"][0]["x0"], json!("05/03/2024 00:00"));
    }
}
