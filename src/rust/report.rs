//! Human-facing output: the accuracy line, a confusion table, a confusion
//! heatmap and a grid of sample predictions.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use font8x8::{UnicodeFonts, BASIC_FONTS};
use image::{imageops, GenericImage, Rgb, RgbImage, Rgba, RgbaImage};
use log::info;

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::evaluation::{ConfusionMatrix, SamplePrediction};
use crate::features::preprocessing::load_image;

/// Minimum side of one heatmap cell, in pixels; cells grow to fit class names
pub const HEATMAP_CELL_SIZE: u32 = 48;
/// Side of one sample grid tile, in pixels
pub const SAMPLE_TILE_SIZE: u32 = 300;
/// Height of the caption strip under each sample tile
pub const CAPTION_HEIGHT: u32 = 32;

/// Side of one unscaled glyph
const GLYPH_SIZE: u32 = 8;
const LABEL_PADDING: u32 = 6;
const CAPTION_SCALE: u32 = 2;

const EMPTY_CELL: [u8; 3] = [247, 251, 255];
const FULL_CELL: [u8; 3] = [8, 48, 107];
const GRID_LINE: [u8; 3] = [200, 200, 200];
const INK: [u8; 3] = [20, 20, 20];

pub fn format_accuracy(accuracy_percent: f64) -> String {
    format!("Accuracy: {:.1}%", accuracy_percent)
}

fn class_names<'c>(matrix: &ConfusionMatrix, config: &'c PipelineConfig) -> Vec<&'c str> {
    (0..matrix.n_classes())
        .map(|i| config.class_name(i).unwrap_or("?"))
        .collect()
}

/// Renders the confusion matrix as a text table; rows are true classes,
/// columns predicted classes.
pub fn format_confusion_table(matrix: &ConfusionMatrix, config: &PipelineConfig) -> String {
    let names = class_names(matrix, config);
    let width = names.iter().map(|n| n.len()).max().unwrap_or(0).max(5);

    let mut out = String::new();
    let _ = write!(out, "{:>width$}", "true\\pred", width = width.max(9));
    for name in &names {
        let _ = write!(out, " {:>width$}", name, width = width);
    }
    out.push('\n');
    for (t, row) in matrix.rows().iter().enumerate() {
        let _ = write!(out, "{:>width$}", names[t], width = width.max(9));
        for count in row {
            let _ = write!(out, " {:>width$}", count, width = width);
        }
        out.push('\n');
    }
    out
}

pub fn format_sample_predictions(samples: &[SamplePrediction]) -> String {
    samples.iter()
        .map(|s| format!("{} -> {}", s.path.display(), s.class_name))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Pixel width of `text` drawn at `scale`
fn text_width(text: &str, scale: u32) -> u32 {
    text.chars().count() as u32 * GLYPH_SIZE * scale
}

/// Draws `text` with its top-left corner at (x, y) using 8x8 bitmap glyphs.
///
/// Pixels falling outside the image are clipped. Characters without a glyph
/// leave a blank.
fn draw_text<I: GenericImage>(img: &mut I, x: u32, y: u32, text: &str, scale: u32, ink: I::Pixel) {
    let (width, height) = img.dimensions();
    for (i, ch) in text.chars().enumerate() {
        let Some(glyph) = BASIC_FONTS.get(ch) else {
            continue;
        };
        let origin = x + i as u32 * GLYPH_SIZE * scale;
        for (row, bits) in glyph.iter().enumerate() {
            for col in 0..GLYPH_SIZE {
                // Least significant bit is the leftmost pixel
                if *bits & (1u8 << col) == 0 {
                    continue;
                }
                for sy in 0..scale {
                    for sx in 0..scale {
                        let px = origin + col * scale + sx;
                        let py = y + row as u32 * scale + sy;
                        if px < width && py < height {
                            img.put_pixel(px, py, ink);
                        }
                    }
                }
            }
        }
    }
}

fn blend(t: f32) -> Rgb<u8> {
    let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
    Rgb([
        mix(EMPTY_CELL[0], FULL_CELL[0]),
        mix(EMPTY_CELL[1], FULL_CELL[1]),
        mix(EMPTY_CELL[2], FULL_CELL[2]),
    ])
}

/// Geometry of a labelled heatmap
struct HeatmapLayout {
    cell: u32,
    left: u32,
    top: u32,
}

impl HeatmapLayout {
    fn for_names(names: &[&str]) -> Self {
        let longest = names.iter().map(|n| text_width(n, 1)).max().unwrap_or(0);
        Self {
            cell: HEATMAP_CELL_SIZE.max(longest + 2 * LABEL_PADDING),
            left: longest + 2 * LABEL_PADDING,
            top: GLYPH_SIZE + 2 * LABEL_PADDING,
        }
    }

    /// Top-left pixel of the cell for (true `t`, predicted `p`)
    fn cell_origin(&self, t: u32, p: u32) -> (u32, u32) {
        (self.left + p * self.cell, self.top + t * self.cell)
    }
}

/// Paints the confusion matrix as a heatmap image, darker for higher counts.
///
/// True classes are named down the left edge, predicted classes along the
/// top, and each cell carries its count.
pub fn confusion_heatmap(matrix: &ConfusionMatrix, config: &PipelineConfig) -> RgbImage {
    let names = class_names(matrix, config);
    let layout = HeatmapLayout::for_names(&names);
    let n = names.len() as u32;
    let max = matrix.max_count().max(1) as f32;

    let mut img = RgbImage::from_pixel(
        layout.left + n * layout.cell,
        layout.top + n * layout.cell,
        Rgb([255, 255, 255]),
    );

    for t in 0..n {
        for p in 0..n {
            let count = matrix.get(t as usize, p as usize);
            let intensity = count as f32 / max;
            let shade = blend(intensity);
            let (x0, y0) = layout.cell_origin(t, p);
            for dy in 0..layout.cell {
                for dx in 0..layout.cell {
                    let pixel = if dx == 0 || dy == 0 { Rgb(GRID_LINE) } else { shade };
                    img.put_pixel(x0 + dx, y0 + dy, pixel);
                }
            }

            let label = count.to_string();
            let ink = if intensity > 0.5 { Rgb([255, 255, 255]) } else { Rgb(INK) };
            draw_text(
                &mut img,
                x0 + layout.cell.saturating_sub(text_width(&label, 1)) / 2,
                y0 + (layout.cell - GLYPH_SIZE) / 2,
                &label,
                1,
                ink,
            );
        }
    }

    for (i, name) in names.iter().enumerate() {
        let i = i as u32;
        let (x0, y0) = layout.cell_origin(i, i);
        let width = text_width(name, 1);
        draw_text(
            &mut img,
            layout.left - LABEL_PADDING - width,
            y0 + (layout.cell - GLYPH_SIZE) / 2,
            name,
            1,
            Rgb(INK),
        );
        draw_text(&mut img, x0 + (layout.cell - width) / 2, LABEL_PADDING, name, 1, Rgb(INK));
    }
    img
}

/// Writes the heatmap to `path`, creating parent directories as needed
pub fn render_confusion_heatmap(
    matrix: &ConfusionMatrix,
    config: &PipelineConfig,
    path: &Path,
) -> Result<(), PipelineError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    confusion_heatmap(matrix, config).save(path)?;
    info!("Confusion heatmap written to {:?}", path);
    Ok(())
}

/// Lays the sample images out two per row, each scaled into a square tile
/// with its predicted class name captioned underneath
pub fn sample_grid(samples: &[SamplePrediction]) -> Result<RgbaImage, PipelineError> {
    let columns = 2u32;
    let rows = (samples.len() as u32).div_ceil(columns).max(1);
    let cell_height = SAMPLE_TILE_SIZE + CAPTION_HEIGHT;
    let mut canvas = RgbaImage::from_pixel(
        columns * SAMPLE_TILE_SIZE,
        rows * cell_height,
        Rgba([255, 255, 255, 255]),
    );

    for (i, sample) in samples.iter().enumerate() {
        let tile = load_image(&sample.path)?
            .thumbnail(SAMPLE_TILE_SIZE, SAMPLE_TILE_SIZE)
            .to_rgba8();
        let (col, row) = (i as u32 % columns, i as u32 / columns);
        let (cell_x, cell_y) = (col * SAMPLE_TILE_SIZE, row * cell_height);

        // Centre the tile in its cell
        let x = cell_x + (SAMPLE_TILE_SIZE - tile.width()) / 2;
        let y = cell_y + (SAMPLE_TILE_SIZE - tile.height()) / 2;
        imageops::overlay(&mut canvas, &tile, x as i64, y as i64);

        let caption_width = text_width(&sample.class_name, CAPTION_SCALE).min(SAMPLE_TILE_SIZE);
        draw_text(
            &mut canvas,
            cell_x + (SAMPLE_TILE_SIZE - caption_width) / 2,
            cell_y + SAMPLE_TILE_SIZE + (CAPTION_HEIGHT - GLYPH_SIZE * CAPTION_SCALE) / 2,
            &sample.class_name,
            CAPTION_SCALE,
            Rgba([INK[0], INK[1], INK[2], 255]),
        );
    }
    Ok(canvas)
}

/// Writes the sample grid to `path`, creating parent directories as needed
pub fn render_sample_grid(samples: &[SamplePrediction], path: &Path) -> Result<(), PipelineError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    sample_grid(samples)?.save(path)?;
    info!("Sample grid written to {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn has_ink<I: image::GenericImageView>(img: &I, x0: u32, y0: u32, w: u32, h: u32, background: I::Pixel) -> bool
    where
        I::Pixel: PartialEq,
    {
        (y0..y0 + h).any(|y| (x0..x0 + w).any(|x| img.get_pixel(x, y) != background))
    }

    #[test]
    fn test_format_accuracy() {
        assert_eq!(format_accuracy(80.0), "Accuracy: 80.0%");
        assert_eq!(format_accuracy(66.66), "Accuracy: 66.7%");
    }

    #[test]
    fn test_confusion_table_uses_class_names() {
        let config = PipelineConfig::with_classes(vec!["indian", "thai"]);
        let cm = ConfusionMatrix::new(2, &[0, 1, 1], &[0, 0, 1]).unwrap();
        let table = format_confusion_table(&cm, &config);

        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("indian") && lines[0].contains("thai"));
        assert!(lines[2].trim_start().starts_with("thai"));
        assert!(lines[2].trim_end().ends_with('1'));
    }

    #[test]
    fn test_heatmap_shading() {
        let config = PipelineConfig::with_classes(vec!["a", "b"]);
        let cm = ConfusionMatrix::new(2, &[0, 0, 1], &[0, 0, 0]).unwrap();
        let img = confusion_heatmap(&cm, &config);

        let layout = HeatmapLayout::for_names(&["a", "b"]);
        assert_eq!(layout.cell, HEATMAP_CELL_SIZE);
        assert_eq!(img.dimensions(), (layout.left + 2 * layout.cell, layout.top + 2 * layout.cell));

        // (true 0, pred 0) holds the maximum count
        let (x, y) = layout.cell_origin(0, 0);
        assert_eq!(*img.get_pixel(x + 3, y + 3), Rgb(FULL_CELL));
        // (true 0, pred 1) is empty
        let (x, y) = layout.cell_origin(0, 1);
        assert_eq!(*img.get_pixel(x + 3, y + 3), Rgb(EMPTY_CELL));
    }

    #[test]
    fn test_heatmap_names_rows_and_columns() {
        let config = PipelineConfig::with_classes(vec!["indian", "japanese", "thai"]);
        let cm = ConfusionMatrix::new(3, &[0, 1, 2], &[0, 1, 2]).unwrap();
        let img = confusion_heatmap(&cm, &config);
        let layout = HeatmapLayout::for_names(&["indian", "japanese", "thai"]);
        let white = Rgb([255, 255, 255]);

        // Cells widen to fit the longest name
        assert!(layout.cell >= text_width("japanese", 1));
        // Row labels sit in the left margin, column labels in the top margin
        assert!(has_ink(&img, 0, layout.top, layout.left, layout.cell, white));
        assert!(has_ink(&img, layout.left, 0, layout.cell, layout.top, white));
        // Cell counts are drawn too
        let (x, y) = layout.cell_origin(1, 0);
        assert!(has_ink(&img, x + 1, y + 1, layout.cell - 1, layout.cell - 1, Rgb(EMPTY_CELL)));
    }

    #[test]
    fn test_render_sample_grid() {
        let dir = tempfile::tempdir().unwrap();
        let mut samples = Vec::new();
        for i in 0..4 {
            let path = dir.path().join(format!("meal{}.png", i));
            RgbImage::from_pixel(40, 20, Rgb([i * 60, 0, 0])).save(&path).unwrap();
            samples.push(SamplePrediction { path, label: 0, class_name: "thai".into() });
        }

        let out = dir.path().join("reports").join("samples.png");
        render_sample_grid(&samples, &out).unwrap();
        let grid = image::open(&out).unwrap();
        assert_eq!(grid.width(), 2 * SAMPLE_TILE_SIZE);
        assert_eq!(grid.height(), 2 * (SAMPLE_TILE_SIZE + CAPTION_HEIGHT));
    }

    #[test]
    fn test_sample_tiles_are_captioned() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meal.png");
        RgbImage::from_pixel(30, 30, Rgb([0, 160, 60])).save(&path).unwrap();
        let samples = vec![
            SamplePrediction { path: path.clone(), label: 5, class_name: "thai".into() },
            SamplePrediction { path, label: 1, class_name: String::new() },
        ];

        let grid = sample_grid(&samples).unwrap();
        let white = Rgba([255, 255, 255, 255]);
        // Caption strip under the first tile carries the class name
        assert!(has_ink(&grid, 0, SAMPLE_TILE_SIZE, SAMPLE_TILE_SIZE, CAPTION_HEIGHT, white));
        // An empty name leaves the second strip blank
        assert!(!has_ink(&grid, SAMPLE_TILE_SIZE, SAMPLE_TILE_SIZE, SAMPLE_TILE_SIZE, CAPTION_HEIGHT, white));
    }

    #[test]
    fn test_glyphs_clip_at_the_edge() {
        let mut img = RgbImage::from_pixel(10, 10, Rgb([255, 255, 255]));
        draw_text(&mut img, 6, 6, "WW", 2, Rgb([0, 0, 0]));
        assert!(has_ink(&img, 6, 6, 4, 4, Rgb([255, 255, 255])));
    }

    #[test]
    fn test_format_sample_predictions() {
        let samples = vec![SamplePrediction {
            path: PathBuf::from("thai_meals/thai0160.jpeg"),
            label: 5,
            class_name: "thai".into(),
        }];
        assert_eq!(format_sample_predictions(&samples), "thai_meals/thai0160.jpeg -> thai");
    }
}
