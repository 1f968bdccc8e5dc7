//! Display lines for decoded traffic.
//!
//! Rendering is pure: callers decide whether and where to print. The plain
//! form is the structure; ANSI styling only wraps its segments, so stripping
//! escape codes from a styled line gives back the plain line.

use colored::{Color, ColoredString, Colorize};

use crate::protocols::manaplus::layout::format_bytes;
use crate::protocols::manaplus::{DecodeError, Decoded, Event, Origin};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Style {
    #[default]
    Plain,
    Ansi,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Renderer {
    style: Style,
}

impl Renderer {
    pub fn new(style: Style) -> Self {
        Self { style }
    }

    pub fn style(&self) -> Style {
        self.style
    }

    /// `--> Title | Label: value | value`
    pub fn render(&self, event: &Event) -> String {
        let bg = background(event.origin);
        let head = format!("{} {}", event.origin.arrow(), event.title);
        let mut line = self.segment(head, |s| s.bright_yellow().on_color(bg));
        for field in &event.fields {
            line.push_str(&self.segment(" |".to_string(), |s| s.black().on_color(bg)));
            if !field.label.is_empty() {
                let label = format!(" {}:", field.label);
                line.push_str(&self.segment(label, |s| s.bold().on_color(bg)));
            }
            let value = format!(" {}", field.value);
            line.push_str(&self.segment(value, |s| s.dimmed().on_color(bg)));
        }
        line
    }

    /// Diagnostic for a pass that stopped early; `payload` is the whole
    /// segment as captured.
    pub fn render_stop(&self, origin: Origin, payload: &[u8], err: &DecodeError) -> String {
        let origin_tag = origin.as_str().to_ascii_uppercase();
        let raw = format_bytes(payload);
        match err {
            DecodeError::UnknownOpcode { opcode, .. } => self.segment(
                format!("*** {} | ID 0x{:04x} | {}", origin_tag, opcode, raw),
                |s| s.yellow(),
            ),
            DecodeError::TruncatedRecord { opcode, .. } => self.segment(
                format!("!!! {} | ID 0x{:04x} | {} | {}", origin_tag, opcode, err, raw),
                |s| s.red(),
            ),
            DecodeError::Underflow { .. } => self.segment(
                format!("!!! {} | {} | {}", origin_tag, err, raw),
                |s| s.red(),
            ),
        }
    }

    /// One line per event, then a diagnostic if the pass stopped early.
    pub fn render_decoded(&self, origin: Origin, payload: &[u8], decoded: &Decoded) -> Vec<String> {
        let mut lines: Vec<String> = decoded.events.iter().map(|e| self.render(e)).collect();
        if let Some(err) = decoded.outcome.error() {
            lines.push(self.render_stop(origin, payload, err));
        }
        lines
    }

    fn segment(&self, text: String, paint: impl FnOnce(&str) -> ColoredString) -> String {
        match self.style {
            Style::Plain => text,
            Style::Ansi => paint(&text).to_string(),
        }
    }
}

/// Plain rendering of a single event.
pub fn render(event: &Event) -> String {
    Renderer::default().render(event)
}

fn background(origin: Origin) -> Color {
    match origin {
        Origin::Host => Color::Blue,
        Origin::Node => Color::BrightBlack,
    }
}

#[cfg(test)]
mod tests {
    use super::{Renderer, Style, render};
    use crate::protocols::manaplus::{Origin, decode};

    fn strip_ansi(text: &str) -> String {
        let mut out = String::new();
        let mut chars = text.chars();
        while let Some(c) = chars.next() {
            if c == '\u{1b}' {
                for c in chars.by_ref() {
                    if c == 'm' {
                        break;
                    }
                }
            } else {
                out.push(c);
            }
        }
        out
    }

    #[test]
    fn labelled_and_bare_segments() {
        let decoded = decode(Origin::Host, &[0x80, 0x00, 0x7a, 0x8c, 0xf1, 0x34, 0x5e]);
        assert_eq!(
            render(&decoded.events[0]),
            "<-- NPC monster check | ID: 0x34f18c7a | Unknown: 5e"
        );

        let decoded = decode(Origin::Node, &[0x85, 0x00, 0x17, 0x03, 0x90]);
        assert_eq!(render(&decoded.events[0]), "--> Player move to | 170390");
    }

    #[test]
    fn title_only_record() {
        let decoded = decode(Origin::Node, &[0x18, 0x01]);
        assert_eq!(render(&decoded.events[0]), "--> NPC killed");
    }

    #[test]
    fn unknown_opcode_diagnostic() {
        let payload = [0x05, 0x0a, 0x28, 0x49, 0x89];
        let decoded = decode(Origin::Node, &payload);
        let lines = Renderer::new(Style::Plain).render_decoded(Origin::Node, &payload, &decoded);
        assert_eq!(lines, vec!["*** NODE | ID 0x0a05 | 050a284989".to_string()]);
    }

    #[test]
    fn truncated_diagnostic_follows_events() {
        let payload = [0x7d, 0x00, 0x94, 0x00, 0xd7];
        let decoded = decode(Origin::Node, &payload);
        let lines = Renderer::default().render_decoded(Origin::Node, &payload, &decoded);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "--> Scenario change");
        assert_eq!(
            lines[1],
            "!!! NODE | ID 0x0094 | truncated node record 0x0094: need 4 bytes, 1 remaining | 7d009400d7"
        );
    }

    #[test]
    fn ansi_style_keeps_structure() {
        colored::control::set_override(true);
        let decoded = decode(Origin::Node, &[0x89, 0x00, 0xb6, 0x8e, 0x8e, 0x06, 0x07]);
        let styled = Renderer::new(Style::Ansi).render(&decoded.events[0]);
        assert!(styled.contains('\u{1b}'));
        assert_eq!(strip_ansi(&styled), render(&decoded.events[0]));
        assert_eq!(
            strip_ansi(&styled),
            "--> Player action | Target: 0x068e8eb6 | Action: Attack"
        );
    }
}
