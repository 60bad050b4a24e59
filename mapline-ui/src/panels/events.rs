use crate::SharedEventLog;

pub struct EventsPanel;

impl EventsPanel {
    pub fn render(
        ui: &mut egui::Ui,
        events: &SharedEventLog,
    ) {
        let mut clear_requested = false;

        // Под read-guard только отрисовка; очистка после drop
        let log = events.read();

        ui.horizontal(|ui| {
            ui.strong("Events");
            ui.label(format!("({})", log.len()));
            if ui.small_button("Clear").clicked() {
                clear_requested = true;
            }
        });
        ui.separator();

        egui::ScrollArea::vertical()
            .auto_shrink([false; 2])
            .stick_to_bottom(true)
            .show(ui, |ui| {
                ui.set_width(ui.available_width());

                for event in log.entries() {
                    ui.horizontal(|ui| {
                        let time_str = event.time.format("%H:%M:%S%.3f").to_string();
                        ui.label(
                            egui::RichText::new(format!("[{time_str}]"))
                                .color(egui::Color32::from_rgb(120, 120, 120))
                                .monospace(),
                        );
                        ui.label(
                            egui::RichText::new(&event.message)
                                .color(event.level.color())
                                .monospace(),
                        );
                    });
                }
            });

        drop(log);

        if clear_requested {
            events.write().clear();
        }
    }
}
