//! PNG/JPG/PDF output: plots are rendered to SVG, then rasterized with `resvg` or converted with
//! `svg2pdf`.

use crate::HeadlessError;
use narwhal_render::Plot;

#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    #[error(transparent)]
    Headless(#[from] HeadlessError),
    #[error("failed to parse SVG")]
    SvgParse,
    #[error("failed to allocate pixmap for raster rendering")]
    PixmapAlloc,
    #[error("failed to encode PNG")]
    PngEncode,
    #[error("invalid background color: {0}")]
    Background(String),
    #[error("JPG rendering requires an opaque background color (e.g. white)")]
    JpegOpaqueBackgroundRequired,
    #[error("failed to encode JPG")]
    JpegEncode,
    #[error("failed to convert SVG to PDF")]
    PdfConvert,
}

impl From<narwhal_render::Error> for RasterError {
    fn from(err: narwhal_render::Error) -> Self {
        RasterError::Headless(err.into())
    }
}

pub type Result<T> = std::result::Result<T, RasterError>;

#[derive(Debug, Clone)]
pub struct RasterOptions {
    pub scale: f32,
    /// Fill painted under the plot; the plot's own background still draws on top.
    pub background: Option<String>,
    pub jpeg_quality: u8,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self {
            scale: 1.0,
            background: None,
            jpeg_quality: 90,
        }
    }
}

pub fn render_png_sync(plot: &Plot, raster: &RasterOptions) -> Result<Vec<u8>> {
    svg_to_png(&plot.render_svg()?, raster)
}

pub fn render_jpeg_sync(plot: &Plot, raster: &RasterOptions) -> Result<Vec<u8>> {
    svg_to_jpeg(&plot.render_svg()?, raster)
}

pub fn render_pdf_sync(plot: &Plot) -> Result<Vec<u8>> {
    svg_to_pdf(&plot.render_svg()?)
}

pub fn svg_to_png(svg: &str, options: &RasterOptions) -> Result<Vec<u8>> {
    let pixmap = svg_to_pixmap(svg, options.scale, options.background.as_deref())?;
    pixmap.encode_png().map_err(|_| RasterError::PngEncode)
}

pub fn svg_to_jpeg(svg: &str, options: &RasterOptions) -> Result<Vec<u8>> {
    let bg = options.background.as_deref().unwrap_or("white");
    let color = parse_color(bg)?;
    if color.alpha() != 1.0 {
        return Err(RasterError::JpegOpaqueBackgroundRequired);
    }

    let pixmap = svg_to_pixmap(svg, options.scale, Some(bg))?;
    let (w, h) = (pixmap.width(), pixmap.height());

    // Opaque fill underneath: alpha is always 255 and can be dropped.
    let rgb: Vec<u8> = pixmap
        .data()
        .chunks_exact(4)
        .flat_map(|px| [px[0], px[1], px[2]])
        .collect();

    let mut out = Vec::new();
    let mut enc =
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, options.jpeg_quality);
    enc.encode(&rgb, w, h, image::ExtendedColorType::Rgb8)
        .map_err(|_| RasterError::JpegEncode)?;
    Ok(out)
}

pub fn svg_to_pdf(svg: &str) -> Result<Vec<u8>> {
    let mut opt = svg2pdf::usvg::Options::default();
    opt.fontdb_mut().load_system_fonts();
    opt.font_family = "sans-serif".to_string();

    let tree = svg2pdf::usvg::Tree::from_str(svg, &opt).map_err(|_| RasterError::SvgParse)?;
    svg2pdf::to_pdf(
        &tree,
        svg2pdf::ConversionOptions::default(),
        svg2pdf::PageOptions::default(),
    )
    .map_err(|_| RasterError::PdfConvert)
}

fn svg_to_pixmap(svg: &str, scale: f32, background: Option<&str>) -> Result<tiny_skia::Pixmap> {
    let mut opt = usvg::Options::default();
    opt.fontdb_mut().load_system_fonts();
    opt.font_family = "sans-serif".to_string();

    let tree = usvg::Tree::from_str(svg, &opt).map_err(|_| RasterError::SvgParse)?;
    // Plot SVGs always carry width/height, so the tree size is the canvas size.
    let size = tree.size();
    let width_px = (size.width() * scale).ceil().max(1.0) as u32;
    let height_px = (size.height() * scale).ceil().max(1.0) as u32;

    let mut pixmap = tiny_skia::Pixmap::new(width_px, height_px).ok_or(RasterError::PixmapAlloc)?;
    if let Some(bg) = background {
        pixmap.fill(parse_color(bg)?);
    }
    resvg::render(
        &tree,
        tiny_skia::Transform::from_scale(scale, scale),
        &mut pixmap.as_mut(),
    );
    tracing::debug!(width_px, height_px, "rasterized plot");
    Ok(pixmap)
}

/// CSS color (names, `#rgb[a]`, `#rrggbb[aa]`, `rgb()`...) as a tiny-skia color.
fn parse_color(text: &str) -> Result<tiny_skia::Color> {
    let c: svgtypes::Color = text
        .trim()
        .parse()
        .map_err(|_| RasterError::Background(text.to_string()))?;
    Ok(tiny_skia::Color::from_rgba8(c.red, c.green, c.blue, c.alpha))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10" viewBox="0 0 10 10"><rect width="10" height="10" fill="black"/></svg>"#;

    #[test]
    fn svg_to_png_produces_png_signature() {
        let bytes = svg_to_png(SVG, &RasterOptions::default()).unwrap();
        assert!(bytes.starts_with(b"\x89PNG\r\n\x1a\n"));
    }

    #[test]
    fn svg_to_pdf_produces_pdf_signature() {
        let bytes = svg_to_pdf(SVG).unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
    }

    #[test]
    fn jpeg_needs_an_opaque_background() {
        let opts = RasterOptions {
            background: Some("transparent".to_string()),
            ..RasterOptions::default()
        };
        assert!(matches!(
            svg_to_jpeg(SVG, &opts),
            Err(RasterError::JpegOpaqueBackgroundRequired)
        ));
        let opts = RasterOptions {
            background: Some("not-a-color".to_string()),
            ..RasterOptions::default()
        };
        assert!(matches!(svg_to_jpeg(SVG, &opts), Err(RasterError::Background(_))));

        let bytes = svg_to_jpeg(SVG, &RasterOptions::default()).unwrap();
        assert!(bytes.starts_with(&[0xff, 0xd8]));
    }
}
