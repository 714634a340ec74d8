use crate::{
    Arguments, DashboardWidgets, Element, HttpBackend, MyStyle, Notification, Notifier,
    ProfilerResult, Region, ViewState, WorkflowController, open_file, show_chart,
};

use egui::{
    Button, CentralPanel, Context, MenuBar, RichText, ScrollArea, SidePanel, TopBottomPanel,
    ViewportCommand, style::Visuals, warn_if_debug_build, widgets,
};
use std::{
    path::PathBuf,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::runtime::Runtime;
use tracing::{debug, info};

/// Repaint interval while a backend request is outstanding.
const BUSY_REPAINT: Duration = Duration::from_millis(100);

/// The main application struct for Profiler View.
pub struct ProfilerViewApp {
    /// Owns all workflow state; the UI only reads its `ViewState`.
    controller: WorkflowController<ViewState>,
    /// Contents of the date-format input.
    date_format: String,
    /// Value restored into `date_format` on reset.
    initial_date_format: String,

    /// Tokio runtime for backend requests and the file dialog.
    /// Declared last so it is dropped after the controller.
    runtime: Runtime,
}

impl ProfilerViewApp {
    /// Creates a new `ProfilerViewApp`.
    ///
    /// When `args` names a file, it is selected and submitted immediately.
    pub fn new(cc: &eframe::CreationContext<'_>, args: &Arguments) -> ProfilerResult<Self> {
        cc.egui_ctx.set_visuals(Visuals::dark());
        cc.egui_ctx.set_style_init(Visuals::dark());

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;

        let backend = HttpBackend::new(&args.api_url, args.timeout())?;
        info!("Backend: {}", backend.base_url());

        let ctx = cc.egui_ctx.clone();
        let controller = WorkflowController::new(
            Arc::new(backend),
            runtime.handle().clone(),
            ViewState::new(),
            Notifier::new(args.notify_duration()),
        )
        .with_repaint(Arc::new(move || ctx.request_repaint()));

        let date_format = args.date_format.clone().unwrap_or_default();
        let mut app = ProfilerViewApp {
            controller,
            initial_date_format: date_format.clone(),
            date_format,
            runtime,
        };

        if let Some(path) = args.initial_file() {
            app.select(path.clone());
            app.submit();
        }

        Ok(app)
    }

    fn date_format_hint(&self) -> Option<String> {
        Some(self.date_format.clone())
    }

    fn select(&mut self, path: PathBuf) {
        let hint = self.date_format_hint();
        self.controller.select_file(path, hint);
    }

    /// Submits the current candidate with the date format as currently typed.
    fn submit(&mut self) {
        if let Some(path) = self.controller.candidate().map(|c| c.path.clone()) {
            self.select(path);
        }
        // Rejections are already reported by the controller.
        if let Err(err) = self.controller.submit_upload() {
            debug!("Upload not started: {err}");
        }
    }

    fn browse(&mut self) {
        match self.runtime.block_on(open_file()) {
            Ok(path) => self.select(path),
            Err(err) => debug!("File dialog closed: {err}"),
        }
    }

    fn reset(&mut self) {
        self.controller.reset();
        self.date_format = self.initial_date_format.clone();
    }

    /// Handles a file dropped onto the window, while the upload view is showing.
    fn check_dropped_file(&mut self, ctx: &Context) {
        if !self.controller.view().is_visible(Region::UploadView) {
            return;
        }
        if let Some(path) = ctx.input(|i| i.raw.dropped_files.last().and_then(|f| f.path.clone())) {
            self.select(path);
        }
    }

    /// Paints the visible toast and schedules the repaint that hides it.
    fn check_notification(&mut self, ctx: &Context) {
        let now = Instant::now();
        let Some(toast) = self.controller.notifier().visible_at(now).cloned() else {
            return;
        };

        if toast.show(ctx) {
            self.controller.notifier_mut().dismiss();
        } else if let Some(remaining) = self.controller.notifier().remaining_at(now) {
            ctx.request_repaint_after(remaining);
        }
    }

    fn render_menu(&mut self, ctx: &Context) {
        TopBottomPanel::top("top_panel").show(ctx, |ui| {
            MenuBar::new().ui(ui, |ui| {
                ui.menu_button("File", |ui| {
                    let idle = self.controller.view().is_visible(Region::UploadView);
                    if ui.add_enabled(idle, Button::new("Open")).clicked() {
                        self.browse();
                        ui.close();
                    }

                    if ui.button("New analysis").clicked() {
                        self.reset();
                        ui.close();
                    }

                    if ui.button("Quit").clicked() {
                        ui.ctx().send_viewport_cmd(ViewportCommand::Close);
                    }
                });

                if self.controller.view().is_visible(Region::ResetButton)
                    && ui.button("⟲ New analysis").clicked()
                {
                    self.reset();
                }

                // Add spacing to align theme switch to the right.
                let delta = ui.available_width() - 15.0;
                if delta > 0.0 {
                    ui.add_space(delta);
                    widgets::global_theme_preference_switch(ui);
                }
            });
        });
    }

    fn render_upload(&mut self, ui: &mut egui::Ui) {
        let (selected, upload_enabled, uploading) = {
            let view = self.controller.view();
            (
                view.is_visible(Region::SelectedFile)
                    .then(|| view.text(Region::SelectedFile).to_string()),
                view.is_enabled(Region::UploadButton),
                view.is_visible(Region::UploadSpinner),
            )
        };

        ui.vertical_centered(|ui| {
            ui.add_space(48.0);
            ui.heading("Profile a dataset");
            ui.label("Drag and drop a CSV file here, or browse for one.");
            ui.add_space(12.0);

            if ui.add_enabled(upload_enabled, Button::new("Browse…")).clicked() {
                self.browse();
            }

            if let Some(name) = selected {
                ui.label(RichText::new(format!("Selected: {name}")).strong());
            }

            ui.add_space(8.0);
            ui.horizontal(|ui| {
                ui.label("Date format (optional):");
                ui.add_enabled(
                    upload_enabled,
                    egui::TextEdit::singleline(&mut self.date_format).hint_text("%d/%m/%Y"),
                );
            });

            ui.add_space(8.0);
            ui.horizontal(|ui| {
                if ui
                    .add_enabled(upload_enabled, Button::new("Analyze"))
                    .clicked()
                {
                    self.submit();
                }
                if uploading {
                    ui.spinner();
                }
            });
        });
    }

    fn render_dashboard(&mut self, ctx: &Context) {
        SidePanel::left("analysis_panel")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| {
                let view = self.controller.view();
                ui.heading(view.text(Region::FileNameHeader));
                ui.separator();
                ScrollArea::vertical().show(ui, |ui| {
                    for row in view.column_rows() {
                        ui.column_row(row);
                    }
                });
            });

        SidePanel::right("suggestion_panel")
            .resizable(true)
            .default_width(280.0)
            .show(ctx, |ui| {
                ui.heading("Suggested charts");
                ui.separator();

                let mut clicked = None;
                ScrollArea::vertical().show(ui, |ui| {
                    let view = self.controller.view();
                    for (index, element) in view.children(Region::SuggestionList).iter().enumerate() {
                        match element {
                            Element::Suggestion(item) => {
                                if ui.suggestion_button(item).clicked() {
                                    clicked = Some(index);
                                }
                            }
                            Element::Hint(text) => {
                                ui.weak(text);
                            }
                            Element::Column(_) => {}
                        }
                    }
                });

                if let Some(index) = clicked {
                    self.controller.select_suggestion_at(index);
                }
            });

        // CentralPanel must be added after all other panels in your egui layout!
        CentralPanel::default().show(ctx, |ui| {
            warn_if_debug_build(ui);

            let view = self.controller.view();
            if view.is_visible(Region::ChartLoader) {
                ui.centered_and_justified(|ui| {
                    ui.spinner();
                });
            } else if let Some(chart) = view.chart(Region::ChartDisplay) {
                show_chart(ui, chart);
            } else if view.is_visible(Region::ChartPlaceholder) {
                ui.centered_and_justified(|ui| {
                    ui.label("Select a suggestion to generate a chart.");
                });
            }
        });
    }
}

impl eframe::App for ProfilerViewApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        self.controller.poll();
        self.check_dropped_file(ctx);

        self.render_menu(ctx);

        if self.controller.view().is_visible(Region::DashboardView) {
            self.render_dashboard(ctx);
        } else {
            CentralPanel::default().show(ctx, |ui| {
                warn_if_debug_build(ui);
                self.render_upload(ui);
            });
        }

        self.check_notification(ctx);

        if self.controller.is_busy() {
            ctx.request_repaint_after(BUSY_REPAINT);
        }
    }
}
