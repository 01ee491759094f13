//! Terminal presentation surface.
//!
//! Pretty mode drives a single indicatif status line; plain mode writes
//! changed states to stderr. Either way the panel is a pure consumer of
//! overlay data: it never feeds anything back into the loop.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::overlay::{OverlayElement, OverlaySurface, Viewport};

#[derive(Clone, Copy, Debug)]
pub enum PanelMode {
    Auto,
    Plain,
    Pretty,
}

impl PanelMode {
    pub fn from_flag(flag: Option<&str>) -> Self {
        match flag {
            Some("plain") => PanelMode::Plain,
            Some("pretty") => PanelMode::Pretty,
            _ => PanelMode::Auto,
        }
    }
}

pub struct TerminalPanel {
    viewport: Viewport,
    bar: Option<ProgressBar>,
    last_line: String,
}

impl TerminalPanel {
    pub fn new(mode: PanelMode, viewport: Viewport, is_tty: bool) -> Self {
        let use_pretty = match mode {
            PanelMode::Pretty => true,
            PanelMode::Auto => is_tty,
            PanelMode::Plain => false,
        };

        let bar = if use_pretty {
            let bar = ProgressBar::new_spinner();
            bar.set_draw_target(ProgressDrawTarget::stderr());
            let style = ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner());
            bar.set_style(style);
            Some(bar)
        } else {
            None
        };

        Self {
            viewport,
            bar,
            last_line: String::new(),
        }
    }

    fn compose(elements: &[OverlayElement], log: &[String], sound_active: bool) -> String {
        let boxes = if elements.is_empty() {
            "clear".to_string()
        } else {
            let labels: Vec<&str> = elements.iter().map(|e| e.label.as_str()).collect();
            format!("{} box(es): {}", elements.len(), labels.join(", "))
        };
        let mut line = boxes;
        if !log.is_empty() {
            line.push_str(" | recent: ");
            line.push_str(&log.join(" · "));
        }
        if sound_active {
            line.push_str(" ♪");
        }
        line
    }
}

impl OverlaySurface for TerminalPanel {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn present(&mut self, elements: &[OverlayElement], log: &[String], sound_active: bool) {
        let line = Self::compose(elements, log, sound_active);
        if line == self.last_line {
            return;
        }
        match &self.bar {
            Some(bar) => bar.set_message(line.clone()),
            None => eprintln!("{}", line),
        }
        self.last_line = line;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::DisplayBox;

    fn element(label: &str) -> OverlayElement {
        OverlayElement {
            bbox: DisplayBox {
                left: 0.0,
                top: 0.0,
                width: 1.0,
                height: 1.0,
            },
            label: label.to_string(),
        }
    }

    #[test]
    fn composed_line_shows_boxes_log_and_sound() {
        let line = TerminalPanel::compose(
            &[element("cat - 90%")],
            &["cat - 90%".to_string(), "dog - 71%".to_string()],
            true,
        );
        assert_eq!(line, "1 box(es): cat - 90% | recent: cat - 90% · dog - 71% ♪");
    }

    #[test]
    fn empty_state_reads_clear() {
        let line = TerminalPanel::compose(&[], &[], false);
        assert_eq!(line, "clear");
    }
}
