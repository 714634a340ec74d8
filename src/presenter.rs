//! Presentation boundary.
//!
//! The workflow never touches widgets directly. It sends [`Presenter`] instructions
//! keyed by [`Region`]; [`ViewState`] retains them so the egui layer can draw the
//! current view every frame (and tests can inspect it).

use crate::{ChartSpec, ChartType, DisplayRow, PreparedChart};

use std::collections::{HashMap, HashSet};

/// Logical regions of the user interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    UploadView,
    UploadButton,
    UploadSpinner,
    SelectedFile,
    DashboardView,
    ResetButton,
    FileNameHeader,
    ColumnList,
    SuggestionList,
    ChartPlaceholder,
    ChartLoader,
    ChartDisplay,
}

/// Regions hidden when the application starts.
const INITIALLY_HIDDEN: [Region; 5] = [
    Region::UploadSpinner,
    Region::SelectedFile,
    Region::DashboardView,
    Region::ResetButton,
    Region::ChartLoader,
];

/// A suggestion entry as displayed.
#[derive(Debug, Clone, PartialEq)]
pub struct SuggestionItem {
    pub title: String,
    pub chart_type: ChartType,
    pub active: bool,
}

/// A child appended to a list region.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Column(DisplayRow),
    Suggestion(SuggestionItem),
    Hint(String),
}

/// Side-effecting presentation operations used by the workflow.
pub trait Presenter {
    fn set_visible(&mut self, region: Region, visible: bool);

    fn set_enabled(&mut self, region: Region, enabled: bool);

    fn set_text(&mut self, region: Region, text: &str);

    /// Removes all children of `region` (and any chart drawn in it).
    fn clear_children(&mut self, region: Region);

    fn append_child(&mut self, region: Region, element: Element);

    /// Draws `spec` inside `region`, replacing what was there.
    fn render_chart(&mut self, region: Region, spec: ChartSpec);
}

/// Retained view model: what is visible, enabled, written and drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    hidden: HashSet<Region>,
    disabled: HashSet<Region>,
    texts: HashMap<Region, String>,
    children: HashMap<Region, Vec<Element>>,
    charts: HashMap<Region, PreparedChart>,
}

impl Default for ViewState {
    fn default() -> Self {
        ViewState {
            hidden: INITIALLY_HIDDEN.into_iter().collect(),
            disabled: HashSet::new(),
            texts: HashMap::new(),
            children: HashMap::new(),
            charts: HashMap::new(),
        }
    }
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_visible(&self, region: Region) -> bool {
        !self.hidden.contains(&region)
    }

    pub fn is_enabled(&self, region: Region) -> bool {
        !self.disabled.contains(&region)
    }

    pub fn text(&self, region: Region) -> &str {
        self.texts.get(&region).map_or("", String::as_str)
    }

    pub fn children(&self, region: Region) -> &[Element] {
        self.children.get(&region).map_or(&[], Vec::as_slice)
    }

    pub fn chart(&self, region: Region) -> Option<&PreparedChart> {
        self.charts.get(&region)
    }

    /// Column rows currently listed.
    pub fn column_rows(&self) -> impl Iterator<Item = &DisplayRow> {
        self.children(Region::ColumnList)
            .iter()
            .filter_map(|element| match element {
                Element::Column(row) => Some(row),
                _ => None,
            })
    }

    /// Suggestion entries currently listed.
    pub fn suggestion_items(&self) -> impl Iterator<Item = &SuggestionItem> {
        self.children(Region::SuggestionList)
            .iter()
            .filter_map(|element| match element {
                Element::Suggestion(item) => Some(item),
                _ => None,
            })
    }
}

impl Presenter for ViewState {
    fn set_visible(&mut self, region: Region, visible: bool) {
        if visible {
            self.hidden.remove(&region);
        } else {
            self.hidden.insert(region);
        }
    }

    fn set_enabled(&mut self, region: Region, enabled: bool) {
        if enabled {
            self.disabled.remove(&region);
        } else {
            self.disabled.insert(region);
        }
    }

    fn set_text(&mut self, region: Region, text: &str) {
        if text.is_empty() {
            self.texts.remove(&region);
        } else {
            self.texts.insert(region, text.to_string());
        }
    }

    fn clear_children(&mut self, region: Region) {
        self.children.remove(&region);
        self.charts.remove(&region);
    }

    fn append_child(&mut self, region: Region, element: Element) {
        self.children.entry(region).or_default().push(element);
    }

    fn render_chart(&mut self, region: Region, spec: ChartSpec) {
        self.charts.insert(region, PreparedChart::from_spec(spec));
    }
}

#[cfg(test)]
mod tests_presenter {
    use super::*;
    use serde_json::json;

    #[test]
    fn initial_view_shows_upload_form() {
        let view = ViewState::new();
        assert!(view.is_visible(Region::UploadView));
        assert!(view.is_visible(Region::ChartPlaceholder));
        assert!(view.is_enabled(Region::UploadButton));
        for region in INITIALLY_HIDDEN {
            assert!(!view.is_visible(region), "{region:?} should start hidden");
        }
    }

    #[test]
    fn clear_children_also_clears_chart() {
        let mut view = ViewState::new();
        view.append_child(Region::ChartDisplay, Element::Hint("x".into()));
        view.render_chart(
            Region::ChartDisplay,
            ChartSpec {
                data: json!([]),
                layout: json!({}),
            },
        );
        assert!(view.chart(Region::ChartDisplay).is_some());

        view.clear_children(Region::ChartDisplay);
        assert!(view.chart(Region::ChartDisplay).is_none());
        assert!(view.children(Region::ChartDisplay).is_empty());
    }

    #[test]
    fn text_and_enabled_flags() {
        let mut view = ViewState::new();
        view.set_text(Region::FileNameHeader, "sales.csv");
        view.set_enabled(Region::UploadButton, false);
        assert_eq!(view.text(Region::FileNameHeader), "sales.csv");
        assert_eq!(view.text(Region::SelectedFile), "");
        assert!(!view.is_enabled(Region::UploadButton));
    }
}
