//! `create_image_with_text`: renders the final answer onto a PNG card.
//!
//! Layout: 900×500 white canvas, a centred "Final Answer" title, the
//! wrapped `Result: …` text (at most three lines, longer text is cut to two
//! lines ending in `...`), and a black border. Fonts come from the
//! configured paths first, then a list of common system fonts.
//!
//! Rasterisation is CPU-bound, so it runs on tokio's blocking pool.

use std::path::{Path, PathBuf};
use ab_glyph::{FontVec, PxScale};
use async_trait::async_trait;
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use reckon_config::ImageConfig;
use reckon_core::args::{ArgKind, ArgValue, Param};
use reckon_core::error::ToolError;
use reckon_core::tool::Tool;
use reckon_core::value::ToolValue;
use tracing::{debug, info};

const WIDTH: u32 = 900;
const HEIGHT: u32 = 500;
const TITLE: &str = "Final Answer";
const TITLE_SIZE: f32 = 28.0;
const TITLE_Y: i32 = 40;
const BODY_SIZE: f32 = 20.0;
const BODY_Y: i32 = 120;
const LINE_HEIGHT: i32 = 35;
const MAX_TEXT_WIDTH: u32 = WIDTH - 100;
const MAX_LINES: usize = 3;
const BORDER_WIDTH: i32 = 3;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
const BLUE: Rgb<u8> = Rgb([0, 0, 255]);
const DARK_BLUE: Rgb<u8> = Rgb([0, 0, 139]);

const SYSTEM_FONTS: &[&str] = &[
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/System/Library/Fonts/Arial.ttf",
    "/System/Library/Fonts/Helvetica.ttc",
    "/Library/Fonts/Arial.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation-sans/LiberationSans-Regular.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

pub struct CreateImageTool {
    default_path: PathBuf,
    font_paths: Vec<PathBuf>,
}

impl CreateImageTool {
    pub fn new(config: &ImageConfig) -> Self {
        Self {
            default_path: config.default_path.clone(),
            font_paths: config.font_paths.clone(),
        }
    }
}

const PARAMS: &[Param] = &[
    Param::new("text", ArgKind::Text),
    Param::new("path", ArgKind::Text),
];

#[async_trait]
impl Tool for CreateImageTool {
    fn name(&self) -> &str {
        "create_image_with_text"
    }

    fn description(&self) -> &str {
        "Render the text onto a PNG image saved at path (empty path uses the default file)."
    }

    fn params(&self) -> &[Param] {
        PARAMS
    }

    async fn execute(&self, args: Vec<ArgValue>) -> Result<ToolValue, ToolError> {
        let text = args
            .first()
            .and_then(ArgValue::as_text)
            .ok_or_else(|| ToolError::invalid(self.name(), "missing text"))?
            .to_string();
        let path = match args.get(1).and_then(ArgValue::as_text).map(str::trim) {
            Some(p) if !p.is_empty() => PathBuf::from(p),
            _ => self.default_path.clone(),
        };

        let font_paths = self.font_paths.clone();
        let target = path.clone();
        let rendered = tokio::task::spawn_blocking(move || {
            let font = load_font(&font_paths)?;
            render(&text, &target, &font)
        })
        .await
        .map_err(|e| ToolError::external(self.name(), format!("render task failed: {e}")))?;

        rendered.map_err(|reason| ToolError::external(self.name(), reason))?;

        info!(path = %path.display(), "Image created");
        Ok(ToolValue::Text(format!("Image created successfully: {}", path.display())))
    }
}

/// Load the first usable font: configured paths, then system fonts.
pub fn load_font(configured: &[PathBuf]) -> Result<FontVec, String> {
    let candidates = configured
        .iter()
        .map(PathBuf::as_path)
        .chain(SYSTEM_FONTS.iter().map(Path::new));
    first_loadable(candidates)
}

fn first_loadable<'a>(candidates: impl Iterator<Item = &'a Path>) -> Result<FontVec, String> {
    for path in candidates {
        let Ok(bytes) = std::fs::read(path) else {
            continue;
        };
        let is_collection = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("ttc"));
        let font = if is_collection {
            FontVec::try_from_vec_and_index(bytes, 0)
        } else {
            FontVec::try_from_vec(bytes)
        };
        match font {
            Ok(font) => {
                debug!(path = %path.display(), "Loaded font");
                return Ok(font);
            }
            Err(e) => debug!(path = %path.display(), error = %e, "Skipping unreadable font"),
        }
    }
    Err("no usable font found (set image.font_paths in the config)".into())
}

/// Draw the answer card and save it; the format follows the file extension.
pub fn render(text: &str, path: &Path, font: &FontVec) -> Result<(), String> {
    let mut canvas = RgbImage::from_pixel(WIDTH, HEIGHT, WHITE);

    let (title_width, _) = text_size(PxScale::from(TITLE_SIZE), font, TITLE);
    draw_text_mut(
        &mut canvas,
        BLACK,
        centred_x(title_width),
        TITLE_Y,
        PxScale::from(TITLE_SIZE),
        font,
        TITLE,
    );

    let body_scale = PxScale::from(BODY_SIZE);
    let measure = |s: &str| text_size(body_scale, font, s).0;
    let lines = wrap_text(&format!("Result: {text}"), MAX_TEXT_WIDTH, &measure);
    let lines = fit_lines(lines, MAX_TEXT_WIDTH, &measure);

    let mut y = BODY_Y;
    for (i, line) in lines.iter().enumerate() {
        let colour = if i == 0 { BLUE } else { DARK_BLUE };
        draw_text_mut(&mut canvas, colour, centred_x(measure(line)), y, body_scale, font, line);
        y += LINE_HEIGHT;
    }

    // Border from (30, 20) to (870, 470), drawn inward.
    for i in 0..BORDER_WIDTH {
        let rect = Rect::at(30 + i, 20 + i).of_size(841 - 2 * i as u32, 451 - 2 * i as u32);
        draw_hollow_rect_mut(&mut canvas, rect, BLACK);
    }

    canvas
        .save(path)
        .map_err(|e| format!("failed to save {}: {e}", path.display()))
}

fn centred_x(width: u32) -> i32 {
    (WIDTH.saturating_sub(width) / 2) as i32
}

/// Greedy word wrap on spaces; a word wider than the line gets a line of its own.
pub fn wrap_text(text: &str, max_width: u32, measure: &impl Fn(&str) -> u32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for word in text.split(' ') {
        current.push(word);
        if measure(&current.join(" ")) <= max_width {
            continue;
        }
        current.pop();
        if current.is_empty() {
            lines.push(word.to_string());
        } else {
            lines.push(current.join(" "));
            current = vec![word];
        }
    }
    if !current.is_empty() {
        lines.push(current.join(" "));
    }
    lines
}

/// More than three lines: keep two and end the second with `...`.
pub fn fit_lines(lines: Vec<String>, max_width: u32, measure: &impl Fn(&str) -> u32) -> Vec<String> {
    if lines.len() <= MAX_LINES {
        return lines;
    }

    let mut kept: Vec<String> = lines.into_iter().take(2).collect();
    if let Some(last) = kept.last_mut() {
        let mut base = last.clone();
        loop {
            let candidate = format!("{base}...");
            if measure(&candidate) <= max_width || base.chars().count() < 10 {
                *last = candidate;
                break;
            }
            base.pop();
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    // Ten pixels per character.
    fn measure(s: &str) -> u32 {
        s.chars().count() as u32 * 10
    }

    #[test]
    fn short_text_is_one_line() {
        assert_eq!(wrap_text("Result: 42", 800, &measure), vec!["Result: 42"]);
    }

    #[test]
    fn wraps_on_word_boundaries() {
        let lines = wrap_text("aaaa bbbb cccc", 90, &measure);
        assert_eq!(lines, vec!["aaaa bbbb", "cccc"]);
    }

    #[test]
    fn overlong_word_gets_its_own_line() {
        let lines = wrap_text("hi abcdefghijkl yo", 100, &measure);
        assert_eq!(lines, vec!["hi", "abcdefghijkl", "yo"]);
    }

    #[test]
    fn three_lines_are_kept() {
        let lines = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        assert_eq!(fit_lines(lines.clone(), 800, &measure), lines);
    }

    #[test]
    fn four_lines_become_two_with_ellipsis() {
        let lines: Vec<String> = ["one", "second line of the text", "three", "four"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let fitted = fit_lines(lines, 200, &measure);
        assert_eq!(fitted.len(), 2);
        assert_eq!(fitted[0], "one");
        assert!(fitted[1].ends_with("..."));
        assert!(measure(&fitted[1]) <= 200);
    }

    #[test]
    fn missing_fonts_are_reported() {
        let bogus = [Path::new("/nonexistent/font.ttf")];
        assert!(first_loadable(bogus.into_iter()).is_err());
    }

    #[test]
    fn renders_png_when_a_font_is_available() {
        let Ok(font) = load_font(&[]) else {
            return;
        };
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("answer.png");
        render("7.599822246093079e+33", &path, &font).unwrap();

        let img = image::open(&path).unwrap().to_rgb8();
        assert_eq!(img.dimensions(), (WIDTH, HEIGHT));
        assert_eq!(*img.get_pixel(0, 0), WHITE);
        assert_eq!(*img.get_pixel(30, 20), BLACK);
    }
}
