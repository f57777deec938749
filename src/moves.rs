//! Move list filtering, ordering and paging.

use crate::pokemon::{Move, MoveLearnDetail};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DamageCategory {
    Physical,
    Special,
    Status,
}

impl DamageCategory {
    pub fn from_api(name: &str) -> Option<Self> {
        match name {
            "physical" => Some(DamageCategory::Physical),
            "special" => Some(DamageCategory::Special),
            "status" => Some(DamageCategory::Status),
            _ => None,
        }
    }
}

impl fmt::Display for DamageCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DamageCategory::Physical => "physical",
            DamageCategory::Special => "special",
            DamageCategory::Status => "status",
        };
        f.write_str(name)
    }
}

/// A move as the creature knows it: full move data plus how it is learned.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoveEntry {
    pub name: String,
    pub type_name: String,
    pub category: Option<DamageCategory>,
    pub power: Option<u32>,
    pub accuracy: Option<u32>,
    pub pp: Option<u32>,
    pub priority: i32,
    pub target: Option<String>,
    pub flags: Vec<String>,
    pub learned: Vec<MoveLearnDetail>,
}

impl MoveEntry {
    pub fn new(detail: &Move, learned: Vec<MoveLearnDetail>) -> Self {
        Self {
            name: detail.name.clone(),
            type_name: detail.r#type.name.clone(),
            category: detail
                .damage_class
                .as_ref()
                .and_then(|c| DamageCategory::from_api(&c.name)),
            power: detail.power,
            accuracy: detail.accuracy,
            pp: detail.pp,
            priority: detail.priority,
            target: detail.target.as_ref().map(|t| t.name.clone()),
            flags: move_flags(detail),
            learned,
        }
    }

    /// Most recent learn record (the API lists version groups oldest first).
    pub fn latest_learn(&self) -> Option<&MoveLearnDetail> {
        self.learned.last()
    }
}

fn move_flags(detail: &Move) -> Vec<String> {
    let mut flags = Vec::new();
    if detail.priority > 0 {
        flags.push("priority".to_string());
    }
    if let Some(meta) = &detail.meta {
        if meta.drain > 0 {
            flags.push("drain".to_string());
        }
        if meta.drain < 0 {
            flags.push("recoil".to_string());
        }
        if meta.healing > 0 {
            flags.push("healing".to_string());
        }
        if meta.crit_rate > 0 {
            flags.push("high-crit".to_string());
        }
        if meta.flinch_chance > 0 {
            flags.push("flinch".to_string());
        }
        if meta.max_hits.is_some_and(|hits| hits > 1) {
            flags.push("multi-hit".to_string());
        }
        if let Some(ailment) = meta.ailment.as_ref().filter(|a| a.name != "none") {
            flags.push(ailment.name.clone());
        }
    }
    flags
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Name,
    Power,
    Accuracy,
    Pp,
    Type,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MoveFilter {
    /// Matches when empty or when the move's type is listed.
    pub types: BTreeSet<String>,
    /// Matches when empty or when the move's category is listed.
    pub categories: BTreeSet<DamageCategory>,
    pub search: String,
    pub sort: SortKey,
}

impl MoveFilter {
    fn matches(&self, entry: &MoveEntry, needle: &str) -> bool {
        entry.name.to_lowercase().contains(needle)
            && (self.types.is_empty() || self.types.contains(&entry.type_name))
            && (self.categories.is_empty()
                || entry.category.is_some_and(|c| self.categories.contains(&c)))
    }
}

/// Filters and orders `moves`. Numeric keys sort descending with missing
/// values counted as zero; ties keep list order.
pub fn apply<'a>(moves: &'a [MoveEntry], filter: &MoveFilter) -> Vec<&'a MoveEntry> {
    let needle = filter.search.trim().to_lowercase();
    let mut selected: Vec<&MoveEntry> = moves
        .iter()
        .filter(|entry| filter.matches(entry, &needle))
        .collect();

    match filter.sort {
        SortKey::Name => selected.sort_by(|a, b| a.name.cmp(&b.name)),
        SortKey::Type => selected.sort_by(|a, b| a.type_name.cmp(&b.type_name)),
        SortKey::Power => selected.sort_by_key(|m| std::cmp::Reverse(m.power.unwrap_or(0))),
        SortKey::Accuracy => selected.sort_by_key(|m| std::cmp::Reverse(m.accuracy.unwrap_or(0))),
        SortKey::Pp => selected.sort_by_key(|m| std::cmp::Reverse(m.pp.unwrap_or(0))),
    }
    selected
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page<'a, T> {
    pub items: &'a [T],
    /// 1-based page actually shown after clamping.
    pub page: usize,
    /// Always at least 1, even for an empty list.
    pub page_count: usize,
    pub total: usize,
}

pub fn page_count(total: usize, page_size: usize) -> usize {
    total.div_ceil(page_size.max(1)).max(1)
}

/// Slice for 1-based `page`, clamped into `[1, page_count]`.
pub fn paginate<T>(items: &[T], page: usize, page_size: usize) -> Page<'_, T> {
    let page_size = page_size.max(1);
    let page_count = page_count(items.len(), page_size);
    let page = page.clamp(1, page_count);
    let start = ((page - 1) * page_size).min(items.len());
    let end = (page * page_size).min(items.len());

    Page {
        items: &items[start..end],
        page,
        page_count,
        total: items.len(),
    }
}

/// Filter, sort and page selection for the currently displayed move list.
///
/// Changing the filter, search text or sort key returns to page 1; changing
/// the page keeps everything else.
#[derive(Debug, Clone)]
pub struct MoveListState {
    filter: MoveFilter,
    page: usize,
    page_size: usize,
}

impl MoveListState {
    pub fn new(page_size: usize) -> Self {
        Self {
            filter: MoveFilter::default(),
            page: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn filter(&self) -> &MoveFilter {
        &self.filter
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn toggle_type(&mut self, type_name: &str) {
        let type_name = type_name.to_lowercase();
        if !self.filter.types.remove(&type_name) {
            self.filter.types.insert(type_name);
        }
        self.page = 1;
    }

    pub fn toggle_category(&mut self, category: DamageCategory) {
        if !self.filter.categories.remove(&category) {
            self.filter.categories.insert(category);
        }
        self.page = 1;
    }

    pub fn set_search(&mut self, text: &str) {
        self.filter.search = text.to_string();
        self.page = 1;
    }

    pub fn set_sort(&mut self, sort: SortKey) {
        self.filter.sort = sort;
        self.page = 1;
    }

    pub fn set_filter(&mut self, filter: MoveFilter) {
        self.filter = filter;
        self.page = 1;
    }

    pub fn clear_filters(&mut self) {
        self.set_filter(MoveFilter {
            sort: self.filter.sort,
            ..MoveFilter::default()
        });
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = page.max(1);
    }

    /// Applies the state to `moves`. The stored page is clamped to what the
    /// result can show.
    pub fn view<'a>(&mut self, moves: &'a [MoveEntry]) -> MovePage<'a> {
        let ordered = apply(moves, &self.filter);
        let page = paginate(&ordered, self.page, self.page_size);
        self.page = page.page;
        MovePage {
            moves: page.items.to_vec(),
            page: page.page,
            page_count: page.page_count,
            total: page.total,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MovePage<'a> {
    pub moves: Vec<&'a MoveEntry>,
    pub page: usize,
    pub page_count: usize,
    pub total: usize,
}
