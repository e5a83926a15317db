//! Media view widget: a bordered card with either a placeholder or a
//! half-block rendering of the image.

use image::RgbImage;
use image::imageops::{self, FilterType};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph, Widget, Wrap},
};

use crate::domain::entities::{InlineImage, MediaView, Placeholder, PlaceholderKind};

/// Tallest image drawn, in terminal rows.
pub const MAX_IMAGE_ROWS: u16 = 24;

const HALF_BLOCK: &str = "▀";

/// Styles used by [`MediaViewWidget`].
#[derive(Debug, Clone, Copy)]
pub struct MediaViewStyle {
    /// Border style.
    pub border: Style,
    /// First line style.
    pub title: Style,
    /// Metadata lines.
    pub text: Style,
    /// Affordance line.
    pub hint: Style,
}

impl Default for MediaViewStyle {
    fn default() -> Self {
        Self {
            border: Style::default().fg(Color::DarkGray),
            title: Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
            text: Style::default().fg(Color::Gray),
            hint: Style::default().fg(Color::Cyan),
        }
    }
}

/// Renders a [`MediaView`].
#[derive(Debug, Clone, Copy)]
pub struct MediaViewWidget<'a> {
    view: &'a MediaView,
    style: MediaViewStyle,
}

impl<'a> MediaViewWidget<'a> {
    /// Creates a widget with the default style.
    #[must_use]
    pub fn new(view: &'a MediaView) -> Self {
        Self {
            view,
            style: MediaViewStyle::default(),
        }
    }

    /// Overrides the style.
    #[must_use]
    pub const fn style(mut self, style: MediaViewStyle) -> Self {
        self.style = style;
        self
    }

    /// Rows needed to draw the view at `width` columns, borders included.
    #[must_use]
    pub fn preferred_height(&self, width: u16) -> u16 {
        match self.view {
            MediaView::Placeholder(p) => u16::try_from(p.lines().len())
                .unwrap_or(u16::MAX)
                .saturating_add(2),
            MediaView::Inline(img) => {
                let cols = u64::from(width.saturating_sub(2).max(1));
                let pixel_rows = u64::from(img.height) * cols / u64::from(img.width.max(1));
                let rows = u16::try_from(pixel_rows.div_ceil(2))
                    .unwrap_or(MAX_IMAGE_ROWS)
                    .clamp(1, MAX_IMAGE_ROWS);
                let caption = u16::try_from(img.caption().len()).unwrap_or(u16::MAX);
                rows.saturating_add(caption).saturating_add(2)
            }
        }
    }

    fn block_title(&self) -> String {
        let label = match self.view {
            MediaView::Inline(_) => "Image",
            MediaView::Placeholder(p) => match p.kind {
                PlaceholderKind::Disabled => "Media",
                PlaceholderKind::Image => "Image",
                PlaceholderKind::Video => "Video",
                PlaceholderKind::Audio => "Audio",
                PlaceholderKind::Generic => "Attachment",
            },
        };
        format!(" {label} ")
    }

    fn placeholder_lines(&self, placeholder: &Placeholder) -> Vec<Line<'static>> {
        let hint = placeholder.hint();
        placeholder
            .lines()
            .into_iter()
            .enumerate()
            .map(|(i, text)| {
                let style = if i == 0 {
                    self.style.title
                } else if hint == Some(text.as_str()) {
                    self.style.hint
                } else {
                    self.style.text
                };
                Line::from(Span::styled(text, style))
            })
            .collect()
    }

    fn render_inline(&self, img: &InlineImage, area: Rect, buf: &mut Buffer) {
        let caption: Vec<Line<'static>> = img
            .caption()
            .into_iter()
            .enumerate()
            .map(|(i, text)| {
                let style = if i == 0 { self.style.title } else { self.style.text };
                Line::from(Span::styled(text, style))
            })
            .collect();
        let caption_height = u16::try_from(caption.len()).unwrap_or(u16::MAX).min(area.height);
        Paragraph::new(caption).render(
            Rect {
                height: caption_height,
                ..area
            },
            buf,
        );

        let image_area = Rect {
            y: area.y + caption_height,
            height: area.height - caption_height,
            ..area
        };
        if image_area.is_empty() {
            return;
        }
        draw_half_blocks(&img.pixels, image_area, buf);
    }
}

impl Widget for MediaViewWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::bordered()
            .title(self.block_title())
            .border_style(self.style.border);
        let inner = block.inner(area);
        block.render(area, buf);

        match self.view {
            MediaView::Placeholder(p) => {
                Paragraph::new(self.placeholder_lines(p))
                    .wrap(Wrap { trim: true })
                    .render(inner, buf);
            }
            MediaView::Inline(img) => self.render_inline(img, inner, buf),
        }
    }
}

/// Largest size with the aspect ratio of `width`×`height` that fits the box.
fn fit_within(width: u32, height: u32, max_w: u32, max_h: u32) -> (u32, u32) {
    let (w, h) = (u64::from(width.max(1)), u64::from(height.max(1)));
    let (bw, bh) = (u64::from(max_w), u64::from(max_h));
    let (fw, fh) = if w * bh <= h * bw {
        (w * bh / h, bh)
    } else {
        (bw, h * bw / w)
    };
    (
        u32::try_from(fw).unwrap_or(max_w).max(1),
        u32::try_from(fh).unwrap_or(max_h).max(1),
    )
}

/// Draws `img` into `area` with two pixels per cell.
fn draw_half_blocks(img: &RgbImage, area: Rect, buf: &mut Buffer) {
    let (w, h) = fit_within(
        img.width(),
        img.height(),
        u32::from(area.width),
        u32::from(area.height) * 2,
    );
    let scaled = imageops::resize(img, w, h, FilterType::Triangle);

    for (row, y) in (0..scaled.height()).step_by(2).enumerate() {
        for x in 0..scaled.width() {
            let top = scaled.get_pixel(x, y);
            let bottom = if y + 1 < scaled.height() {
                *scaled.get_pixel(x, y + 1)
            } else {
                *top
            };
            let (Ok(dx), Ok(dy)) = (u16::try_from(x), u16::try_from(row)) else {
                continue;
            };
            if let Some(cell) = buf.cell_mut((area.x + dx, area.y + dy)) {
                cell.set_symbol(HALF_BLOCK)
                    .set_fg(Color::Rgb(top[0], top[1], top[2]))
                    .set_bg(Color::Rgb(bottom[0], bottom[1], bottom[2]));
            }
        }
    }
}
