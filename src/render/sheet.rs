//! Cheat sheet content.
//!
//! A sheet is plain data: a title and an ordered list of sections. The
//! built-in sheet summarises the Risk: Lord of the Rings rulebook; other
//! rulebooks can be summarised by loading a JSON file with the same shape.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Page whose images illustrate the strongholds section of the default sheet.
pub const DEFAULT_FIGURE_PAGE: u32 = 3;

/// A quick reference sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheatSheet {
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    pub sections: Vec<Section>,
}

/// One titled section of a sheet.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Section {
    pub heading: String,
    #[serde(default)]
    pub style: ListStyle,
    #[serde(default)]
    pub items: Vec<Item>,
    #[serde(default)]
    pub table: Option<Table>,
    /// Items shown after the table
    #[serde(default)]
    pub notes: Vec<Item>,
    /// Rulebook page whose images illustrate this section
    #[serde(default)]
    pub figures: Option<u32>,
}

/// How a section's items are presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListStyle {
    /// One paragraph per item
    #[default]
    Plain,
    Bullets,
    Numbered,
    /// Highlighted box
    Callout,
}

/// A line of content, optionally led by a bold label.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "ItemRepr")]
pub struct Item {
    pub label: Option<String>,
    pub text: String,
    pub children: Vec<Item>,
}

/// Items may be written as bare strings in sheet files.
#[derive(Deserialize)]
#[serde(untagged)]
enum ItemRepr {
    Text(String),
    Full {
        #[serde(default)]
        label: Option<String>,
        text: String,
        #[serde(default)]
        children: Vec<Item>,
    },
}

impl From<ItemRepr> for Item {
    fn from(repr: ItemRepr) -> Self {
        match repr {
            ItemRepr::Text(text) => Item::new(text),
            ItemRepr::Full {
                label,
                text,
                children,
            } => Item {
                label,
                text,
                children,
            },
        }
    }
}

impl Item {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            label: None,
            text: text.into(),
            children: Vec::new(),
        }
    }

    pub fn labeled(label: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            ..Self::new(text)
        }
    }

    pub fn with_children(mut self, children: Vec<Item>) -> Self {
        self.children = children;
        self
    }

    /// `label: text`, or just the text.
    pub fn line(&self) -> String {
        match &self.label {
            Some(label) => format!("{}: {}", label, self.text),
            None => self.text.clone(),
        }
    }
}

impl From<&str> for Item {
    fn from(text: &str) -> Self {
        Item::new(text)
    }
}

/// A simple grid with a header row.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: &[&str], rows: &[&[&str]]) -> Self {
        Self {
            headers: headers.iter().map(|s| s.to_string()).collect(),
            rows: rows
                .iter()
                .map(|row| row.iter().map(|s| s.to_string()).collect())
                .collect(),
        }
    }

    pub fn column_count(&self) -> usize {
        self.rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(self.headers.len()))
            .max()
            .unwrap_or(0)
    }

    /// Widest cell per column, in characters.
    pub fn column_widths(&self) -> Vec<usize> {
        let mut widths = vec![0; self.column_count()];
        for row in std::iter::once(&self.headers).chain(self.rows.iter()) {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }
        widths
    }
}

impl Section {
    pub fn new(heading: impl Into<String>, style: ListStyle, items: Vec<Item>) -> Self {
        Self {
            heading: heading.into(),
            style,
            items,
            ..Default::default()
        }
    }

    pub fn with_table(mut self, table: Table) -> Self {
        self.table = Some(table);
        self
    }

    pub fn with_notes(mut self, notes: Vec<Item>) -> Self {
        self.notes = notes;
        self
    }

    pub fn with_figures(mut self, page: u32) -> Self {
        self.figures = Some(page);
        self
    }
}

impl CheatSheet {
    /// Load a sheet from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json(&data)
    }

    pub fn from_json(data: &str) -> Result<Self> {
        Ok(serde_json::from_str(data)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// `"TITLE - SUBTITLE"`, as used in banners.
    pub fn full_title(&self) -> String {
        match &self.subtitle {
            Some(sub) => format!("{} - {}", self.title, sub),
            None => self.title.clone(),
        }
    }

    /// Rulebook pages referenced by any section.
    pub fn figure_pages(&self) -> Vec<u32> {
        let mut pages: Vec<u32> = self.sections.iter().filter_map(|s| s.figures).collect();
        pages.sort_unstable();
        pages.dedup();
        pages
    }
}

impl Default for CheatSheet {
    /// The Risk: Lord of the Rings quick reference.
    fn default() -> Self {
        use ListStyle::*;

        let sections = vec![
            Section::new("Quick Rules Overview", Plain, vec!["Players: 2-4 | Age: 10+".into()]),
            Section::new(
                "Objective",
                Plain,
                vec![
                    "Score points by controlling territories, regions, and completing missions".into(),
                    "Don't let the Fellowship reach Mount Doom!".into(),
                ],
            ),
            Section::new(
                "The 8 Steps of Your Turn",
                Numbered,
                vec![
                    "Receive and place reinforcements".into(),
                    "Combat (invade other territories)".into(),
                    "Fortify your position".into(),
                    "Collect a territory card (if you conquered)".into(),
                    "Collect an adventure card (if leader conquered)".into(),
                    "Replace a leader".into(),
                    "Try to find the Ring (EVIL only - if you control Ring's region, roll to find it)"
                        .into(),
                    "Move the Fellowship".into(),
                ],
            ),
            Section::new("Reinforcements Table", Plain, Vec::new())
                .with_table(Table::new(
                    &["Territories", "Reinforcements"],
                    &[
                        &["1-11", "3"],
                        &["12-14", "4"],
                        &["15-17", "5"],
                        &["18-20", "6"],
                        &["21+", "÷3, round up"],
                    ],
                ))
                .with_notes(vec![
                    Item::labeled("Region Control", "+7-11 pts per region"),
                    Item::labeled("Card Sets", "3 same type→bonus pts; Wild card can substitute"),
                ]),
            Section::new("Battalion Values", Plain, Vec::new()).with_table(Table::new(
                &["Good Armies", "Value", "Evil Armies", "Value"],
                &[
                    &["Elven Archer", "1 battalion", "Orc", "1 battalion"],
                    &["Rider of Rohan", "3 battalions", "Dark Rider", "3 battalions"],
                    &["Eagle", "5 battalions", "Cave Troll", "5 battalions"],
                ],
            )),
            Section::new(
                "Combat Rules",
                Bullets,
                vec![
                    "Need at least 2 battalions in territory to attack".into(),
                    "Each side rolls 1 die per attacking/defending battalion".into(),
                    "Compare highest die rolls (attacker needs tie to win)".into(),
                    "Winner removes loser's battalion".into(),
                    "Leaders add +1 to combat rolls".into(),
                    "Continue until one side is eliminated".into(),
                ],
            ),
            Section::new(
                "Strongholds & Sites of Power",
                Callout,
                vec![
                    Item::labeled("Strongholds", "+1 reinforcement (counted as part of region, not added)"),
                    Item::labeled("Sites of Power", "+2 pts, but only if you control entire region"),
                ],
            )
            .with_figures(DEFAULT_FIGURE_PAGE),
            Section::new(
                "Adventure Cards",
                Plain,
                vec![
                    Item::labeled("Mission", "Complete by getting Leader to specified location"),
                    Item::labeled("Event", "Play immediately for effect"),
                    Item::labeled("Power", "Play during combat for advantage"),
                ],
            ),
            Section::new(
                "Scoring",
                Plain,
                vec![
                    "1 point per territory controlled".into(),
                    "2-4 pts per region controlled".into(),
                    "Card bonuses vary by card type".into(),
                    "Leaders completing missions earn points".into(),
                ],
            ),
            Section::new(
                "Winning",
                Plain,
                vec![Item::new("When Fellowship reaches Mount Doom, roll 1 die:").with_children(vec![
                    Item::labeled("3 or less", "Fellowship fails, game continues"),
                    Item::labeled("4+", "Fellowship succeeds, game ends, calculate final scores"),
                ])],
            ),
        ];

        Self {
            title: "RISK: Lord of the Rings".to_string(),
            subtitle: Some("Quick Reference".to_string()),
            sections,
        }
    }
}
