//! Shareable quote images.
//!
//! Renders the 1080x1920 story-format card: a cover-scaled backdrop (or the
//! theme background), a transparent-to-80%-black vertical gradient, the
//! wrapped quote, and an author row with a circular avatar, topped off by
//! the app caption. Text is set in the bundled DejaVu Sans Bold.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use ab_glyph::{FontRef, PxScale};
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};
use serde::Serialize;

use crate::error::Result;
use crate::models::Quote;
use crate::state::Color;

pub const EXPORT_WIDTH: u32 = 1080;
pub const EXPORT_HEIGHT: u32 = 1920;
pub const PADDING: u32 = 80;
pub const QUOTE_FONT_SIZE: u32 = 60;
pub const QUOTE_LINE_HEIGHT: u32 = 80;
pub const AVATAR_SIZE: u32 = 80;
pub const AVATAR_COLOR: Color = Color::rgb(0xFF, 0x6B, 0x6B);
pub const TEXT_COLOR: Color = Color::rgb(0xFF, 0xFF, 0xFF);
pub const CAPTION: &str = "QuoteVault";

/// Subdirectory of the user's pictures folder that receives exports.
pub const MEDIA_ALBUM: &str = "QuoteVault";

const GRADIENT_MAX_ALPHA: f32 = 0.8;
const QUOTE_MARGIN_BOTTOM: u32 = 60;
const AUTHOR_FONT_SIZE: u32 = 32;
const AUTHOR_GAP: u32 = 20;
const CAPTION_FONT_SIZE: u32 = 24;
const CAPTION_MARGIN_TOP: u32 = 20;
const CAPTION_LINE_HEIGHT: u32 = 32;
/// 70% opacity
const CAPTION_ALPHA: u8 = 178;

static FONT_BYTES: &[u8] = include_bytes!("../assets/fonts/DejaVuSans-Bold.ttf");

fn font() -> &'static FontRef<'static> {
    static FONT: OnceLock<FontRef<'static>> = OnceLock::new();
    FONT.get_or_init(|| FontRef::try_from_slice(FONT_BYTES).expect("Invalid embedded font"))
}

#[allow(clippy::cast_precision_loss)]
fn scale(font_size: u32) -> PxScale {
    PxScale::from(font_size as f32)
}

/// Rendered width of `text` in pixels.
pub fn measure_text(text: &str, font_size: u32) -> u32 {
    text_size(scale(font_size), font(), text).0
}

#[derive(Debug)]
pub enum ExportBackground {
    Solid(Color),
    Image(DynamicImage),
}

impl ExportBackground {
    /// Decode an encoded image (PNG, JPEG, ...).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(Self::Image(image::load_from_memory(bytes)?))
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        Ok(Self::Image(image::open(path)?))
    }
}

/// One line of text positioned on the canvas; `x`/`y` are the top-left of its box.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextLine {
    pub text: String,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub font_size: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvatarLayout {
    /// Author initial shown inside the circle
    pub initial: String,
    pub center_x: u32,
    pub center_y: u32,
    pub radius: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportLayout {
    pub quote_lines: Vec<TextLine>,
    pub avatar: AvatarLayout,
    pub author: TextLine,
    pub caption: TextLine,
}

/// A rendered card ready to encode.
pub struct QuoteImage {
    pub image: RgbaImage,
    pub layout: ExportLayout,
}

impl QuoteImage {
    pub fn encode_png(&self) -> Result<Vec<u8>> {
        let mut bytes = std::io::Cursor::new(Vec::new());
        self.image.write_to(&mut bytes, ImageFormat::Png)?;
        Ok(bytes.into_inner())
    }

    pub fn save_png(&self, path: &Path) -> Result<()> {
        self.image.save_with_format(path, ImageFormat::Png)?;
        Ok(())
    }
}

/// Render `quote` over `background`.
pub fn render_quote_image(quote: &Quote, background: &ExportBackground) -> QuoteImage {
    let mut canvas = match background {
        ExportBackground::Solid(color) => {
            RgbaImage::from_pixel(EXPORT_WIDTH, EXPORT_HEIGHT, Rgba(color.to_rgba(u8::MAX)))
        }
        ExportBackground::Image(image) => image
            .resize_to_fill(EXPORT_WIDTH, EXPORT_HEIGHT, FilterType::Triangle)
            .to_rgba8(),
    };

    apply_gradient(&mut canvas);
    let layout = layout_quote(&quote.text, &quote.author);
    let white = Rgba(TEXT_COLOR.to_rgba(u8::MAX));

    for line in &layout.quote_lines {
        let top_offset = (QUOTE_LINE_HEIGHT - QUOTE_FONT_SIZE) / 2;
        draw_line(&mut canvas, line, top_offset, white);
    }

    draw_circle(&mut canvas, &layout.avatar, AVATAR_COLOR);
    draw_initial(&mut canvas, &layout.avatar, white);
    draw_line(&mut canvas, &layout.author, 0, white);
    draw_caption(&mut canvas, &layout.caption);

    QuoteImage {
        image: canvas,
        layout,
    }
}

/// Render and write the PNG into `<pictures_dir>/QuoteVault`, returning the file path.
pub fn save_to_media_dir(
    quote: &Quote,
    background: &ExportBackground,
    pictures_dir: &Path,
) -> Result<PathBuf> {
    let album = pictures_dir.join(MEDIA_ALBUM);
    fs::create_dir_all(&album)?;

    let path = album.join(export_file_name(quote));
    render_quote_image(quote, background).save_png(&path)?;
    tracing::info!(quote = %quote.id, path = %path.display(), "Saved quote image");
    Ok(path)
}

fn export_file_name(quote: &Quote) -> String {
    let id = quote
        .id
        .as_str()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect::<String>();
    format!(
        "quotevault-{id}-{}.png",
        chrono::Utc::now().format("%Y%m%d%H%M%S")
    )
}

fn apply_gradient(canvas: &mut RgbaImage) {
    let last_row = (EXPORT_HEIGHT - 1) as f32;
    for (_, y, pixel) in canvas.enumerate_pixels_mut() {
        let keep = 1.0 - GRADIENT_MAX_ALPHA * (y as f32 / last_row);
        for channel in &mut pixel.0[..3] {
            *channel = (f32::from(*channel) * keep).round() as u8;
        }
        pixel.0[3] = u8::MAX;
    }
}

fn draw_circle(canvas: &mut RgbaImage, avatar: &AvatarLayout, color: Color) {
    let radius = i64::from(avatar.radius);
    let (cx, cy) = (i64::from(avatar.center_x), i64::from(avatar.center_y));
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy > radius * radius {
                continue;
            }
            let (Ok(x), Ok(y)) = (u32::try_from(cx + dx), u32::try_from(cy + dy)) else {
                continue;
            };
            if x < canvas.width() && y < canvas.height() {
                canvas.put_pixel(x, y, Rgba(color.to_rgba(u8::MAX)));
            }
        }
    }
}

fn to_coord(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

fn draw_line(canvas: &mut RgbaImage, line: &TextLine, offset_y: u32, color: Rgba<u8>) {
    draw_text_mut(
        canvas,
        color,
        to_coord(line.x),
        to_coord(line.y + offset_y),
        scale(line.font_size),
        font(),
        &line.text,
    );
}

fn draw_initial(canvas: &mut RgbaImage, avatar: &AvatarLayout, color: Rgba<u8>) {
    if avatar.initial.is_empty() {
        return;
    }
    let (width, height) = text_size(scale(AUTHOR_FONT_SIZE), font(), &avatar.initial);
    draw_text_mut(
        canvas,
        color,
        to_coord(avatar.center_x.saturating_sub(width / 2)),
        to_coord(avatar.center_y.saturating_sub(height / 2)),
        scale(AUTHOR_FONT_SIZE),
        font(),
        &avatar.initial,
    );
}

/// The caption is drawn on its own transparent layer so it can be blended at reduced opacity.
fn draw_caption(canvas: &mut RgbaImage, caption: &TextLine) {
    let mut layer = RgbaImage::from_pixel(
        caption.width + caption.font_size,
        CAPTION_LINE_HEIGHT,
        Rgba(TEXT_COLOR.to_rgba(0)),
    );
    draw_text_mut(
        &mut layer,
        Rgba(TEXT_COLOR.to_rgba(CAPTION_ALPHA)),
        0,
        0,
        scale(caption.font_size),
        font(),
        &caption.text,
    );
    imageops::overlay(canvas, &layer, i64::from(caption.x), i64::from(caption.y));
}

fn centered_x(width: u32) -> u32 {
    EXPORT_WIDTH.saturating_sub(width) / 2
}

/// Byte length of the longest prefix of `word` that fits, keeping at least one character.
fn fitting_prefix_len(word: &str, max_width: u32, measure: &impl Fn(&str) -> u32) -> usize {
    let mut end = word.chars().next().map_or(word.len(), char::len_utf8);
    for (index, c) in word.char_indices().skip(1) {
        let next = index + c.len_utf8();
        if measure(&word[..next]) > max_width {
            break;
        }
        end = next;
    }
    end
}

/// Greedy word wrap to at most `max_width` as reported by `measure`; overlong words are split.
fn wrap_text(text: &str, max_width: u32, measure: impl Fn(&str) -> u32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word = word.to_string();
        while measure(&word) > max_width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let split = fitting_prefix_len(&word, max_width, &measure);
            let rest = word.split_off(split);
            lines.push(word);
            word = rest;
        }
        if word.is_empty() {
            continue;
        }

        if current.is_empty() {
            current = word;
            continue;
        }
        let candidate = format!("{current} {word}");
        if measure(&candidate) > max_width {
            lines.push(std::mem::replace(&mut current, word));
        } else {
            current = candidate;
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Position the quote block, author row and caption, centered on the canvas.
pub fn layout_quote(text: &str, author: &str) -> ExportLayout {
    let content_width = EXPORT_WIDTH - 2 * PADDING;
    let trailer = QUOTE_MARGIN_BOTTOM + AVATAR_SIZE + CAPTION_MARGIN_TOP + CAPTION_LINE_HEIGHT;
    let max_lines = ((EXPORT_HEIGHT - 2 * PADDING - trailer) / QUOTE_LINE_HEIGHT) as usize;
    let quote_width = |line: &str| measure_text(line, QUOTE_FONT_SIZE);

    let mut lines = wrap_text(&format!("\"{}\"", text.trim()), content_width, quote_width);
    if lines.len() > max_lines {
        lines.truncate(max_lines);
        if let Some(last) = lines.last_mut() {
            let mut kept = last.trim_end().to_string();
            while !kept.is_empty() && quote_width(&format!("{kept}…")) > content_width {
                kept.pop();
            }
            *last = format!("{}…", kept.trim_end());
        }
    }

    let line_count = u32::try_from(lines.len()).unwrap_or(u32::MAX);
    let block_height = line_count * QUOTE_LINE_HEIGHT + trailer;
    let top = EXPORT_HEIGHT.saturating_sub(block_height) / 2;

    let quote_lines = lines
        .into_iter()
        .zip(0..)
        .map(|(line, index)| {
            let width = quote_width(&line).min(content_width);
            TextLine {
                x: centered_x(width),
                y: top + index * QUOTE_LINE_HEIGHT,
                width,
                font_size: QUOTE_FONT_SIZE,
                text: line,
            }
        })
        .collect::<Vec<_>>();

    let row_top = top + line_count * QUOTE_LINE_HEIGHT + QUOTE_MARGIN_BOTTOM;
    let author_width = measure_text(author, AUTHOR_FONT_SIZE)
        .min(content_width - AVATAR_SIZE - AUTHOR_GAP);
    let row_left = centered_x(AVATAR_SIZE + AUTHOR_GAP + author_width);
    let avatar = AvatarLayout {
        initial: author.chars().next().map(String::from).unwrap_or_default(),
        center_x: row_left + AVATAR_SIZE / 2,
        center_y: row_top + AVATAR_SIZE / 2,
        radius: AVATAR_SIZE / 2,
    };
    let author = TextLine {
        text: author.to_string(),
        x: row_left + AVATAR_SIZE + AUTHOR_GAP,
        y: row_top + (AVATAR_SIZE - AUTHOR_FONT_SIZE) / 2,
        width: author_width,
        font_size: AUTHOR_FONT_SIZE,
    };

    let caption_width = measure_text(CAPTION, CAPTION_FONT_SIZE);
    let caption = TextLine {
        text: CAPTION.to_string(),
        x: centered_x(caption_width),
        y: row_top + AVATAR_SIZE + CAPTION_MARGIN_TOP,
        width: caption_width,
        font_size: CAPTION_FONT_SIZE,
    };

    ExportLayout {
        quote_lines,
        avatar,
        author,
        caption,
    }
}
