//! Page-break accounting for the PDF export.
//!
//! The report is flattened into [`Block`]s, then placed top-down on pages
//! with a running cursor. A block that would cross the bottom margin moves to
//! a fresh page, unless it already starts at the top of one. Images are
//! never split; text taller than a whole page continues line by line.

use fieldnote_shared::Report;

/// Millimetres per typographic point
const MM_PER_PT: f32 = 25.4 / 72.0;
const LINE_HEIGHT_FACTOR: f32 = 1.2;
const IMAGE_GAP_MM: f32 = 4.0;

pub const PLACEHOLDER_TEXT: &str = "[Image could not be loaded]";

// Advance widths of printable ASCII (0x20..=0x7E) in 1/1000 em, from the
// Adobe core font metrics. Oblique shares the upright widths.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 222, 333, 333, 389, 584, 278, 333, 278, 278, //
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, //
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, //
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, //
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, //
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 278, 333, 333, 389, 584, 278, 333, 278, 278, //
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611, //
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778, //
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556, //
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611, //
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];
/// Anything outside the tables is measured as a full em
const FALLBACK_WIDTH: u16 = 1000;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width_mm: f32,
    pub height_mm: f32,
    pub margin_mm: f32,
}

impl PageGeometry {
    pub const A4: PageGeometry = PageGeometry {
        width_mm: 210.0,
        height_mm: 297.0,
        margin_mm: 15.0,
    };

    pub fn printable_width(&self) -> f32 {
        self.width_mm - 2.0 * self.margin_mm
    }

    pub fn printable_height(&self) -> f32 {
        self.height_mm - 2.0 * self.margin_mm
    }

    fn top(&self) -> f32 {
        self.margin_mm
    }

    fn bottom(&self) -> f32 {
        self.height_mm - self.margin_mm
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextStyle {
    Title,
    Meta,
    Heading,
    Body,
    Placeholder,
}

impl TextStyle {
    pub fn font_size_pt(self) -> f32 {
        match self {
            TextStyle::Title => 18.0,
            TextStyle::Heading => 13.0,
            TextStyle::Body => 11.0,
            TextStyle::Meta | TextStyle::Placeholder => 10.0,
        }
    }

    pub fn line_height_mm(self) -> f32 {
        self.font_size_pt() * MM_PER_PT * LINE_HEIGHT_FACTOR
    }

    /// Distance from the top of a line to its baseline
    pub fn baseline_offset_mm(self) -> f32 {
        self.font_size_pt() * MM_PER_PT
    }

    /// Space left below the block
    pub fn gap_after_mm(self) -> f32 {
        match self {
            TextStyle::Title => 4.0,
            TextStyle::Meta => 1.0,
            TextStyle::Heading => 1.5,
            TextStyle::Body => 5.0,
            TextStyle::Placeholder => 3.0,
        }
    }

    /// Title and headings are set in Helvetica-Bold
    pub fn is_bold(self) -> bool {
        matches!(self, TextStyle::Title | TextStyle::Heading)
    }

    /// Rendered width of `text` in this style
    pub fn text_width_mm(self, text: &str) -> f32 {
        let table = if self.is_bold() { &HELVETICA_BOLD_WIDTHS } else { &HELVETICA_WIDTHS };
        let units: u32 = text
            .chars()
            .map(|c| match c {
                ' '..='~' => u32::from(table[c as usize - 0x20]),
                _ => u32::from(FALLBACK_WIDTH),
            })
            .sum();
        units as f32 / 1000.0 * self.font_size_pt() * MM_PER_PT
    }
}

/// Position of an image inside the report: `points[point].images[index]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageRef {
    pub point: usize,
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Text { style: TextStyle, text: String },
    Image { image: ImageRef, width_px: u32, height_px: u32 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Placed {
    Line {
        style: TextStyle,
        text: String,
        x_mm: f32,
        top_mm: f32,
    },
    Image {
        image: ImageRef,
        x_mm: f32,
        top_mm: f32,
        width_mm: f32,
        height_mm: f32,
    },
}

impl Placed {
    pub fn top_mm(&self) -> f32 {
        match self {
            Placed::Line { top_mm, .. } | Placed::Image { top_mm, .. } => *top_mm,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageLayout {
    pub items: Vec<Placed>,
}

/// Greedy word wrap by measured width. Explicit newlines are kept; words
/// wider than a line are cut between characters.
pub fn wrap_text(text: &str, style: TextStyle, max_width_mm: f32) -> Vec<String> {
    let fits = |candidate: &str| style.text_width_mm(candidate) <= max_width_mm;
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut line = String::new();

        for word in paragraph.split_whitespace() {
            let candidate = if line.is_empty() { word.to_string() } else { format!("{} {}", line, word) };
            if fits(&candidate) {
                line = candidate;
                continue;
            }
            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }

            for ch in word.chars() {
                line.push(ch);
                // A single glyph always goes on its line
                if line.chars().count() > 1 && !fits(&line) {
                    line.pop();
                    lines.push(std::mem::replace(&mut line, ch.to_string()));
                }
            }
        }

        if !line.is_empty() || paragraph.trim().is_empty() {
            lines.push(line);
        }
    }

    lines
}

/// Flatten a report into blocks. `dims` mirrors the report's image lists;
/// `None` entries become placeholder lines.
pub fn report_blocks(
    report: &Report,
    title: &str,
    meta: &[String],
    dims: &[Vec<Option<(u32, u32)>>],
) -> Vec<Block> {
    let mut blocks = vec![Block::Text {
        style: TextStyle::Title,
        text: title.to_string(),
    }];
    blocks.extend(meta.iter().map(|line| Block::Text {
        style: TextStyle::Meta,
        text: line.clone(),
    }));

    for (p, point) in report.points.iter().enumerate() {
        blocks.push(Block::Text {
            style: TextStyle::Heading,
            text: format!("Point {}", p + 1),
        });
        let text = if point.text.trim().is_empty() {
            "(no text)".to_string()
        } else {
            point.text.clone()
        };
        blocks.push(Block::Text {
            style: TextStyle::Body,
            text,
        });

        for index in 0..point.images.len() {
            let size = dims.get(p).and_then(|d| d.get(index)).copied().flatten();
            blocks.push(match size {
                Some((width_px, height_px)) if width_px > 0 && height_px > 0 => Block::Image {
                    image: ImageRef { point: p, index },
                    width_px,
                    height_px,
                },
                _ => Block::Text {
                    style: TextStyle::Placeholder,
                    text: PLACEHOLDER_TEXT.to_string(),
                },
            });
        }
    }

    blocks
}

/// Image size on the page: a share of the printable width, aspect kept,
/// shrunk further if it would be taller than a whole page.
pub fn image_size_mm(width_px: u32, height_px: u32, geometry: &PageGeometry, width_percent: u8) -> (f32, f32) {
    let aspect = height_px as f32 / width_px as f32;
    let mut width = geometry.printable_width() * f32::from(width_percent) / 100.0;
    let mut height = width * aspect;
    if height > geometry.printable_height() {
        height = geometry.printable_height();
        width = height / aspect;
    }
    (width, height)
}

struct Cursor<'g> {
    geometry: &'g PageGeometry,
    pages: Vec<PageLayout>,
    y: f32,
}

impl<'g> Cursor<'g> {
    fn new(geometry: &'g PageGeometry) -> Self {
        Self {
            geometry,
            pages: vec![PageLayout::default()],
            y: geometry.top(),
        }
    }

    fn at_top(&self) -> bool {
        self.y <= self.geometry.top()
    }

    fn fits(&self, height: f32) -> bool {
        self.y + height <= self.geometry.bottom()
    }

    fn new_page(&mut self) {
        self.pages.push(PageLayout::default());
        self.y = self.geometry.top();
    }

    /// Start a new page unless `height` fits or we are already at the top
    fn reserve(&mut self, height: f32) {
        if !self.fits(height) && !self.at_top() {
            self.new_page();
        }
    }

    fn place(&mut self, item: Placed) {
        if let Some(page) = self.pages.last_mut() {
            page.items.push(item);
        }
    }
}

fn text_height_mm(style: TextStyle, lines: usize) -> f32 {
    style.line_height_mm() * lines as f32
}

/// Place blocks on pages. Always returns at least one page.
///
/// A heading is kept on the same page as the text block that follows it:
/// the whole block when heading and text fit on one page together,
/// otherwise at least the first line.
pub fn layout_blocks(blocks: &[Block], geometry: &PageGeometry, image_width_percent: u8) -> Vec<PageLayout> {
    let mut cursor = Cursor::new(geometry);
    let x = geometry.margin_mm;
    let width = geometry.printable_width();

    for (i, block) in blocks.iter().enumerate() {
        match block {
            Block::Text { style, text } => {
                let lines = wrap_text(text, *style, width);
                let line_height = style.line_height_mm();
                let mut needed = text_height_mm(*style, lines.len());

                if *style == TextStyle::Heading {
                    if let Some(Block::Text { style: next, text: next_text }) = blocks.get(i + 1) {
                        let next_lines = wrap_text(next_text, *next, width).len();
                        let with_all = needed + style.gap_after_mm() + text_height_mm(*next, next_lines);
                        needed = if with_all <= geometry.printable_height() {
                            with_all
                        } else {
                            needed + style.gap_after_mm() + next.line_height_mm()
                        };
                    }
                }

                // Taller than a page: flow from where we are
                if needed <= geometry.printable_height() {
                    cursor.reserve(needed);
                }

                for line in lines {
                    // Only reached when the block is taller than a page
                    if !cursor.fits(line_height) && !cursor.at_top() {
                        cursor.new_page();
                    }
                    let top_mm = cursor.y;
                    cursor.place(Placed::Line {
                        style: *style,
                        text: line,
                        x_mm: x,
                        top_mm,
                    });
                    cursor.y += line_height;
                }
                cursor.y += style.gap_after_mm();
            }
            Block::Image {
                image,
                width_px,
                height_px,
            } => {
                let (width_mm, height_mm) = image_size_mm(*width_px, *height_px, geometry, image_width_percent);
                cursor.reserve(height_mm);
                let top_mm = cursor.y;
                cursor.place(Placed::Image {
                    image: *image,
                    x_mm: x,
                    top_mm,
                    width_mm,
                    height_mm,
                });
                cursor.y += height_mm + IMAGE_GAP_MM;
            }
        }
    }

    cursor.pages
}
