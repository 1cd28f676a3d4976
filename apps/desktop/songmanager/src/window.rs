use instance_core::HostWindow;

use log::info;

/// Host window for the terminal build: there is nothing to raise, so each
/// focus request is logged.
#[derive(Debug, Clone)]
pub struct ConsoleWindow {
    title: String,
}

impl ConsoleWindow {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }
}

impl HostWindow for ConsoleWindow {
    fn restore_if_minimized(&self) {
        info!("[{}] restore requested", self.title);
    }

    fn bring_to_foreground(&self) {
        info!("[{}] foreground requested", self.title);
    }

    fn set_input_focus(&self) {
        info!("[{}] input focus requested", self.title);
    }
}
