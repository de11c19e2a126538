//! ANSI escape handling for display
//!
//! Lines are stored raw. These helpers render a line for a viewer: either as
//! HTML with SGR styling turned into inline `<span>` styles, or as plain text
//! with every escape sequence removed. Neither affects search.

use std::fmt::Write;

use vte::{Params, Parser, Perform};

const DEFAULT_FG: Rgb = Rgb(0xf0, 0xf0, 0xf7);
const DEFAULT_BG: Rgb = Rgb(0x18, 0x18, 0x1b);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Rgb(u8, u8, u8);

impl std::fmt::Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

/// SGR state carried between printed characters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Style {
    fg: Option<Rgb>,
    bg: Option<Rgb>,
    bold: bool,
    dim: bool,
    italic: bool,
    underline: bool,
    inverse: bool,
}

impl Style {
    fn is_plain(&self) -> bool {
        *self == Style::default()
    }

    fn css(&self) -> String {
        let (fg, bg) = if self.inverse {
            (
                Some(self.bg.unwrap_or(DEFAULT_BG)),
                Some(self.fg.unwrap_or(DEFAULT_FG)),
            )
        } else {
            (self.fg, self.bg)
        };

        let mut css = String::new();
        if let Some(fg) = fg {
            let _ = write!(css, "color:{fg};");
        }
        if let Some(bg) = bg {
            let _ = write!(css, "background-color:{bg};");
        }
        if self.bold {
            css.push_str("font-weight:bold;");
        }
        if self.dim {
            css.push_str("opacity:0.5;");
        }
        if self.italic {
            css.push_str("font-style:italic;");
        }
        if self.underline {
            css.push_str("text-decoration:underline;");
        }
        css
    }

    fn apply_sgr(&mut self, codes: &[u16]) {
        if codes.is_empty() {
            *self = Style::default();
            return;
        }

        let mut i = 0;
        while i < codes.len() {
            let code = codes[i];
            match code {
                0 => *self = Style::default(),
                1 => self.bold = true,
                2 => self.dim = true,
                3 => self.italic = true,
                4 => self.underline = true,
                7 => self.inverse = true,
                21 | 22 => {
                    self.bold = false;
                    self.dim = false;
                }
                23 => self.italic = false,
                24 => self.underline = false,
                27 => self.inverse = false,
                30..=37 => self.fg = Some(palette(code - 30)),
                39 => self.fg = None,
                40..=47 => self.bg = Some(palette(code - 40)),
                49 => self.bg = None,
                90..=97 => self.fg = Some(palette(code - 90 + 8)),
                100..=107 => self.bg = Some(palette(code - 100 + 8)),
                38 => {
                    if let Some(color) = extended_color(codes, &mut i) {
                        self.fg = Some(color);
                    }
                }
                48 => {
                    if let Some(color) = extended_color(codes, &mut i) {
                        self.bg = Some(color);
                    }
                }
                _ => {}
            }
            i += 1;
        }
    }
}

/// `38;5;n` or `38;2;r;g;b` (and the `48` forms)
fn extended_color(codes: &[u16], i: &mut usize) -> Option<Rgb> {
    match *codes.get(*i + 1)? {
        5 => {
            let idx = *codes.get(*i + 2)?;
            *i += 2;
            Some(color_256(idx.min(255) as u8))
        }
        2 => {
            let channel = |n: usize| codes.get(*i + n).map(|v| (*v).min(255) as u8);
            let color = Rgb(channel(2)?, channel(3)?, channel(4)?);
            *i += 4;
            Some(color)
        }
        _ => None,
    }
}

fn palette(idx: u16) -> Rgb {
    match idx {
        0 => Rgb(0x00, 0x00, 0x00),
        1 => Rgb(0xaa, 0x00, 0x00),
        2 => Rgb(0x00, 0xaa, 0x00),
        3 => Rgb(0xaa, 0x55, 0x00),
        4 => Rgb(0x00, 0x00, 0xaa),
        5 => Rgb(0xaa, 0x00, 0xaa),
        6 => Rgb(0x00, 0xaa, 0xaa),
        7 => Rgb(0xaa, 0xaa, 0xaa),
        8 => Rgb(0x55, 0x55, 0x55),
        9 => Rgb(0xff, 0x55, 0x55),
        10 => Rgb(0x55, 0xff, 0x55),
        11 => Rgb(0xff, 0xff, 0x55),
        12 => Rgb(0x55, 0x55, 0xff),
        13 => Rgb(0xff, 0x55, 0xff),
        14 => Rgb(0x55, 0xff, 0xff),
        _ => Rgb(0xff, 0xff, 0xff),
    }
}

fn color_256(idx: u8) -> Rgb {
    match idx {
        0..=15 => palette(idx as u16),
        16..=231 => {
            // 6x6x6 colour cube
            let idx = idx - 16;
            let level = |v: u8| if v == 0 { 0 } else { 55 + v * 40 };
            Rgb(level(idx / 36), level((idx / 6) % 6), level(idx % 6))
        }
        232..=255 => {
            let gray = 8 + (idx - 232) * 10;
            Rgb(gray, gray, gray)
        }
    }
}

fn escape_into(out: &mut String, c: char) {
    match c {
        '&' => out.push_str("&amp;"),
        '<' => out.push_str("&lt;"),
        '>' => out.push_str("&gt;"),
        '"' => out.push_str("&quot;"),
        '\'' => out.push_str("&#x27;"),
        c => out.push(c),
    }
}

#[derive(Default)]
struct HtmlWriter {
    out: String,
    style: Style,
    span_open: bool,
}

impl HtmlWriter {
    fn close_span(&mut self) {
        if self.span_open {
            self.out.push_str("</span>");
            self.span_open = false;
        }
    }

    fn finish(mut self) -> String {
        self.close_span();
        self.out
    }
}

impl Perform for HtmlWriter {
    fn print(&mut self, c: char) {
        // Spans are opened lazily so style changes with no text between
        // them produce no empty elements
        if !self.span_open && !self.style.is_plain() {
            let _ = write!(self.out, "<span style=\"{}\">", self.style.css());
            self.span_open = true;
        }
        escape_into(&mut self.out, c);
    }

    fn execute(&mut self, byte: u8) {
        if byte == b'\t' {
            self.print('\t');
        }
    }

    fn csi_dispatch(&mut self, params: &Params, _intermediates: &[u8], ignore: bool, action: char) {
        if ignore || action != 'm' {
            return;
        }
        let codes: Vec<u16> = params.iter().flatten().copied().collect();
        let mut next = self.style;
        next.apply_sgr(&codes);
        if next != self.style {
            self.close_span();
            self.style = next;
        }
    }
}

#[derive(Default)]
struct PlainWriter {
    out: String,
}

impl Perform for PlainWriter {
    fn print(&mut self, c: char) {
        self.out.push(c);
    }

    fn execute(&mut self, byte: u8) {
        if byte == b'\t' {
            self.out.push('\t');
        }
    }
}

/// Render a raw line as HTML, turning SGR styling into inline spans
pub fn ansi_to_html(line: &str) -> String {
    let mut writer = HtmlWriter::default();
    Parser::new().advance(&mut writer, line.as_bytes());
    writer.finish()
}

/// Printable text of a raw line with every escape sequence removed
pub fn strip_ansi(line: &str) -> String {
    if !line.contains('\x1b') {
        return line.to_string();
    }
    let mut writer = PlainWriter::default();
    Parser::new().advance(&mut writer, line.as_bytes());
    writer.out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_escaped() {
        assert_eq!(ansi_to_html("a < b & \"c\""), "a &lt; b &amp; &quot;c&quot;");
    }

    #[test]
    fn test_basic_colour_and_reset() {
        assert_eq!(
            ansi_to_html("\x1b[31mred\x1b[0m plain"),
            "<span style=\"color:#aa0000;\">red</span> plain"
        );
    }

    #[test]
    fn test_bold_and_bright_background() {
        assert_eq!(
            ansi_to_html("\x1b[1;102mok"),
            "<span style=\"background-color:#55ff55;font-weight:bold;\">ok</span>"
        );
    }

    #[test]
    fn test_extended_colours() {
        assert_eq!(
            ansi_to_html("\x1b[38;5;196mx"),
            "<span style=\"color:#ff0000;\">x</span>"
        );
        assert_eq!(
            ansi_to_html("\x1b[48;2;1;2;3my"),
            "<span style=\"background-color:#010203;\">y</span>"
        );
        assert_eq!(
            ansi_to_html("\x1b[38;5;244mz"),
            "<span style=\"color:#808080;\">z</span>"
        );
    }

    #[test]
    fn test_style_change_closes_span() {
        assert_eq!(
            ansi_to_html("\x1b[32ma\x1b[34mb"),
            "<span style=\"color:#00aa00;\">a</span><span style=\"color:#0000aa;\">b</span>"
        );
    }

    #[test]
    fn test_inverse_uses_defaults() {
        assert_eq!(
            ansi_to_html("\x1b[7mx"),
            "<span style=\"color:#18181b;background-color:#f0f0f7;\">x</span>"
        );
    }

    #[test]
    fn test_non_sgr_sequences_are_dropped() {
        assert_eq!(ansi_to_html("\x1b[2Kclear\x1b]0;title\x07"), "clear");
    }

    #[test]
    fn test_strip_ansi() {
        assert_eq!(strip_ansi("\x1b[1;31merror\x1b[0m:\tdisk"), "error:\tdisk");
        assert_eq!(strip_ansi("plain"), "plain");
    }
}
