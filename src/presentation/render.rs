//! Draws views off-screen and writes the result to a plain writer.

use std::io::{self, Write};

use crossterm::queue;
use crossterm::style::{
    Attribute, Color as TermColor, Print, ResetColor, SetAttribute, SetBackgroundColor,
    SetForegroundColor,
};
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier};
use ratatui::text::Span;
use ratatui::widgets::Widget;

use crate::domain::entities::MediaView;
use crate::presentation::widgets::MediaViewWidget;

/// Renders `view` into a buffer `width` columns wide.
#[must_use]
pub fn render_view(view: &MediaView, width: u16) -> Buffer {
    let widget = MediaViewWidget::new(view);
    let area = Rect::new(0, 0, width, widget.preferred_height(width));
    let mut buf = Buffer::empty(area);
    widget.render(area, &mut buf);
    buf
}

/// Returns the buffer rows as text, without styling.
#[must_use]
pub fn buffer_lines(buf: &Buffer) -> Vec<String> {
    let area = buf.area;
    (area.top()..area.bottom())
        .map(|y| {
            let mut line = String::new();
            let mut skip = 0;
            for x in area.left()..area.right() {
                if skip > 0 {
                    skip -= 1;
                    continue;
                }
                let symbol = buf[(x, y)].symbol();
                skip = symbol_width(symbol).saturating_sub(1);
                line.push_str(symbol);
            }
            line.trim_end().to_string()
        })
        .collect()
}

/// Writes the buffer with terminal colors.
///
/// # Errors
///
/// Returns an error if writing to `out` fails.
pub fn write_buffer<W: Write>(buf: &Buffer, out: &mut W) -> io::Result<()> {
    let area = buf.area;
    for y in area.top()..area.bottom() {
        let mut skip = 0;
        for x in area.left()..area.right() {
            if skip > 0 {
                skip -= 1;
                continue;
            }
            let cell = &buf[(x, y)];
            skip = symbol_width(cell.symbol()).saturating_sub(1);

            queue!(
                out,
                SetForegroundColor(terminal_color(cell.fg)),
                SetBackgroundColor(terminal_color(cell.bg))
            )?;
            if cell.modifier.contains(Modifier::BOLD) {
                queue!(
                    out,
                    SetAttribute(Attribute::Bold),
                    Print(cell.symbol()),
                    SetAttribute(Attribute::NormalIntensity)
                )?;
            } else {
                queue!(out, Print(cell.symbol()))?;
            }
        }
        queue!(out, ResetColor, Print("\n"))?;
    }
    out.flush()
}

fn symbol_width(symbol: &str) -> usize {
    Span::raw(symbol).width()
}

const fn terminal_color(color: Color) -> TermColor {
    match color {
        Color::Rgb(r, g, b) => TermColor::Rgb { r, g, b },
        Color::Indexed(i) => TermColor::AnsiValue(i),
        Color::Black => TermColor::Black,
        Color::Red => TermColor::DarkRed,
        Color::Green => TermColor::DarkGreen,
        Color::Yellow => TermColor::DarkYellow,
        Color::Blue => TermColor::DarkBlue,
        Color::Magenta => TermColor::DarkMagenta,
        Color::Cyan => TermColor::DarkCyan,
        Color::Gray => TermColor::Grey,
        Color::DarkGray => TermColor::DarkGrey,
        Color::LightRed => TermColor::Red,
        Color::LightGreen => TermColor::Green,
        Color::LightYellow => TermColor::Yellow,
        Color::LightBlue => TermColor::Blue,
        Color::LightMagenta => TermColor::Magenta,
        Color::LightCyan => TermColor::Cyan,
        Color::White => TermColor::White,
        _ => TermColor::Reset,
    }
}
