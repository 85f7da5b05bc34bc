//! Row and column styling of summary tables
//!
//! - rows: L1 bold between 1px borders, L3 in a smaller font, the last row
//!   closed by a 3px bottom border
//! - columns: sparkline columns fixed-width with line hints, a left border
//!   marking the current period

use crate::table::builder::HierarchicalTable;
use crate::table::hierarchy::Level;
use chrono::NaiveDate;
use serde_json::{json, Map, Value};

const BORDER_COLOR: &str = "#333333";
const BACKGROUND: &str = "#ffffff";
const SPARKLINE_COLOR: &str = "#18a1cd";

impl Level {
    fn font_size(&self) -> f64 {
        match self {
            Self::L1 | Self::L2 => 1.0,
            Self::L3 => 0.8,
        }
    }

    fn border(&self) -> &'static str {
        match self {
            Self::L1 => "1px",
            Self::L2 | Self::L3 => "none",
        }
    }

    fn bold(&self) -> bool {
        matches!(self, Self::L1)
    }
}

/// Styles keyed by `row-<i>`
pub fn row_styles(levels: &[Level]) -> Value {
    let mut rows = Map::new();
    for (i, level) in levels.iter().enumerate() {
        let bottom = if i + 1 == levels.len() { "3px" } else { level.border() };
        rows.insert(
            format!("row-{}", i),
            json!({
                "borderBottom": bottom,
                "borderBottomColor": BORDER_COLOR,
                "borderTop": level.border(),
                "borderTopColor": BORDER_COLOR,
                "style": {
                    "background": BACKGROUND,
                    "fontSize": level.font_size(),
                    "bold": level.bold(),
                    "italic": false,
                    "underline": false,
                },
            }),
        );
    }
    Value::Object(rows)
}

/// Styles keyed by column header
pub fn column_styles(table: &HierarchicalTable, today: NaiveDate) -> Value {
    let now = table.today_position(today);
    let mut columns = Map::new();

    for (i, header) in table.table.columns.iter().enumerate() {
        let mut style = json!({
            "sortable": false,
            "showOnDesktop": true,
            "showOnMobile": true,
            "sparkline": {},
            "format": "0.0",
            "fixedWidth": false,
            "minWidth": 15,
        });

        if i == now + 1 || i == now + 2 {
            style["borderLeft"] = json!("1px");
            style["borderLeftColor"] = json!(BORDER_COLOR);
        }
        if i > 0 && i <= table.sparkline_columns {
            style["fixedWidth"] = json!(true);
            style["minWidth"] = json!(150);
            style["sparkline"] = json!({
                "color": SPARKLINE_COLOR,
                "dotFirst": true,
                "height": 20,
                "stroke": 2,
                "dotLast": true,
                "enabled": true,
                "type": "line",
            });
        }

        columns.insert(header.clone(), style);
    }

    Value::Object(columns)
}

/// Header block shared by every summary table
pub fn header_style() -> Value {
    json!({
        "style": {
            "bold": true,
            "fontSize": 0.8,
        },
        "borderTop": "3px",
        "borderBottom": "1px",
        "borderTopColor": BORDER_COLOR,
        "borderBottomColor": BORDER_COLOR,
    })
}
