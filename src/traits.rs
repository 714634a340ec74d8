//! Extensions to `egui` types used by `layout.rs`.
//!
//! `MyStyle` sets the application look once at start-up, `Notification` paints the
//! current toast, and `DashboardWidgets` draws the list entries of the dashboard
//! (column rows and suggestion buttons).

use crate::{Cardinality, ChartType, ColumnIcon, DisplayRow, SuggestionItem, Toast, ToastKind};

use egui::{
    Align2, Color32, Context,
    FontFamily::Proportional,
    FontId, Frame, Id, Order, Response, RichText, Spacing, Stroke, Style,
    TextStyle::{Body, Button, Heading, Monospace, Small},
    Ui, Visuals,
    style::ScrollStyle,
};

/// Defines custom text styles for the egui context.
/// Overrides default `egui` font sizes for different logical text styles (Heading, Body, etc.).
/// Used by `MyStyle::set_style_init`.
pub const CUSTOM_TEXT_STYLE: [(egui::TextStyle, egui::FontId); 5] = [
    (Heading, FontId::new(20.0, Proportional)),
    (Body, FontId::new(16.0, Proportional)),
    (Button, FontId::new(16.0, Proportional)),
    (Monospace, FontId::new(15.0, Proportional)),
    (Small, FontId::new(13.0, Proportional)),
];

/// A trait for applying custom styling to the `egui` context (`Context`).
/// Used once at startup by `layout.rs::ProfilerViewApp::new`.
pub trait MyStyle {
    /// Applies a pre-defined application style to the `egui` context.
    fn set_style_init(&self, visuals: Visuals);
}

impl MyStyle for Context {
    fn set_style_init(&self, visuals: Visuals) {
        let scroll = ScrollStyle {
            handle_min_length: 32.0,
            ..ScrollStyle::default()
        };

        let spacing = Spacing {
            scroll,
            item_spacing: [8.0, 6.0].into(),
            ..Spacing::default()
        };

        let style = Style {
            visuals,
            spacing,
            text_styles: CUSTOM_TEXT_STYLE.into(),
            ..Style::default()
        };

        self.set_style(style);
    }
}

/// Something that can paint itself as a transient overlay.
pub trait Notification {
    /// Paints the overlay for the current frame.
    ///
    /// ### Returns
    /// `true` if the user dismissed it with a click.
    fn show(&self, ctx: &Context) -> bool;
}

impl Notification for Toast {
    /// Bottom-right toast, coloured by kind. Clicking it dismisses it.
    fn show(&self, ctx: &Context) -> bool {
        let (fill, stroke) = toast_colors(self.kind);

        egui::Area::new(Id::new("toast"))
            .order(Order::Foreground)
            .anchor(Align2::RIGHT_BOTTOM, [-16.0, -16.0])
            .show(ctx, |ui| {
                Frame::default()
                    .fill(fill)
                    .stroke(Stroke::new(1.0, stroke))
                    .corner_radius(6.0)
                    .inner_margin(12.0)
                    .show(ui, |ui| {
                        ui.set_max_width(360.0);
                        ui.add(
                            egui::Label::new(RichText::new(&self.message).color(Color32::WHITE))
                                .sense(egui::Sense::click()),
                        )
                        .on_hover_text("Click to dismiss")
                        .clicked()
                    })
                    .inner
            })
            .inner
    }
}

fn toast_colors(kind: ToastKind) -> (Color32, Color32) {
    match kind {
        ToastKind::Success => (Color32::from_rgb(22, 128, 61), Color32::from_rgb(20, 83, 45)),
        ToastKind::Error => (Color32::from_rgb(185, 28, 28), Color32::DARK_RED),
        ToastKind::Info => (Color32::from_rgb(37, 99, 235), Color32::from_rgb(30, 64, 175)),
    }
}

/// Dashboard list entries drawn on a `Ui`.
pub trait DashboardWidgets {
    /// One column of the analysis: icon, name, cardinality badge and the two statistics.
    fn column_row(&mut self, row: &DisplayRow);

    /// A clickable suggestion. Highlighted when active.
    fn suggestion_button(&mut self, item: &SuggestionItem) -> Response;
}

impl DashboardWidgets for Ui {
    fn column_row(&mut self, row: &DisplayRow) {
        Frame::group(self.style()).show(self, |ui| {
            ui.set_width(ui.available_width());
            ui.horizontal(|ui| {
                ui.label(RichText::new(column_icon(row.icon)).strong());
                ui.label(RichText::new(&row.name).strong());
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    badge(ui, row.cardinality, row.badge());
                });
            });
            ui.horizontal(|ui| {
                ui.label(RichText::new(&row.unique_text).small());
                ui.separator();
                ui.label(RichText::new(&row.missing_text).small());
            });
        });
    }

    fn suggestion_button(&mut self, item: &SuggestionItem) -> Response {
        let text = format!("{}  {}", chart_icon(&item.chart_type), item.title);
        let button = egui::Button::new(RichText::new(text)).selected(item.active);

        self.add_sized([self.available_width(), 28.0], button)
            .on_hover_text(format!("Generate a {} chart", item.chart_type))
    }
}

fn badge(ui: &mut Ui, cardinality: Cardinality, text: &str) {
    let color = match cardinality {
        Cardinality::Low => Color32::from_rgb(34, 197, 94),
        Cardinality::Medium => Color32::from_rgb(234, 179, 8),
        Cardinality::High => Color32::from_rgb(249, 115, 22),
    };

    Frame::default()
        .fill(color.gamma_multiply(0.25))
        .stroke(Stroke::new(1.0, color))
        .corner_radius(8.0)
        .inner_margin(egui::Margin::symmetric(6, 1))
        .show(ui, |ui| {
            ui.label(RichText::new(text).small().color(color));
        });
}

pub fn column_icon(icon: ColumnIcon) -> &'static str {
    match icon {
        ColumnIcon::Hash => "#",
        ColumnIcon::BarChart => "📊",
        ColumnIcon::Calendar => "📅",
    }
}

/// Unknown chart kinds share the bar-chart icon.
pub fn chart_icon(chart_type: &ChartType) -> &'static str {
    match chart_type {
        ChartType::Line => "📈",
        ChartType::Scatter => "⚫",
        ChartType::Histogram => "📶",
        ChartType::Box => "☐",
        ChartType::Pie => "◔",
        ChartType::Heatmap => "▦",
        ChartType::Bar | ChartType::Other(_) => "📊",
    }
}

#[cfg(test)]
mod tests_traits {
    use super::*;

    #[test]
    fn unknown_chart_type_uses_bar_icon() {
        assert_eq!(
            chart_icon(&ChartType::Other("sunburst".into())),
            chart_icon(&ChartType::Bar)
        );
        assert_ne!(chart_icon(&ChartType::Line), chart_icon(&ChartType::Bar));
    }

    #[test]
    fn column_icons_are_distinct() {
        let icons = [ColumnIcon::Hash, ColumnIcon::BarChart, ColumnIcon::Calendar].map(column_icon);
        assert_ne!(icons[0], icons[1]);
        assert_ne!(icons[1], icons[2]);
        assert_ne!(icons[0], icons[2]);
    }
}
