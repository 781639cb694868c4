//! PNG rasterization of a finished SVG document.

use log::debug;

use trustmap_core::{
    color::Color,
    draw::{EMBEDDED_FONT, EMBEDDED_FONT_FAMILY},
};

use super::Error;

/// Renders `svg` to PNG bytes at `scale` times its declared size.
///
/// The raster is transparent unless a `background` is given. Text is drawn
/// with the embedded font that measured it, whatever family it names.
///
/// # Errors
///
/// Fails when the document cannot be read, the raster cannot be allocated
/// or PNG encoding fails.
pub fn svg_to_png(svg: &str, scale: f32, background: Option<&Color>) -> Result<Vec<u8>, Error> {
    let mut opt = usvg::Options {
        font_family: EMBEDDED_FONT_FAMILY.to_string(),
        ..usvg::Options::default()
    };
    let fontdb = opt.fontdb_mut();
    fontdb.load_font_data(EMBEDDED_FONT.to_vec());
    fontdb.set_serif_family(EMBEDDED_FONT_FAMILY);
    fontdb.set_sans_serif_family(EMBEDDED_FONT_FAMILY);
    fontdb.set_monospace_family(EMBEDDED_FONT_FAMILY);

    let tree = usvg::Tree::from_str(svg, &opt).map_err(|err| Error::Reparse(err.to_string()))?;

    let size = tree.size();
    let width = (size.width() * scale).ceil().max(1.0) as u32;
    let height = (size.height() * scale).ceil().max(1.0) as u32;
    let mut pixmap =
        tiny_skia::Pixmap::new(width, height).ok_or(Error::PixmapAlloc { width, height })?;

    if let Some(color) = background {
        let [r, g, b, a] = color.to_rgba8();
        pixmap.fill(tiny_skia::Color::from_rgba8(r, g, b, a));
    }

    resvg::render(
        &tree,
        tiny_skia::Transform::from_scale(scale, scale),
        &mut pixmap.as_mut(),
    );
    debug!(width = width, height = height, scale = scale; "Rasterized SVG");

    pixmap
        .encode_png()
        .map_err(|err| Error::PngEncode(err.to_string()))
}
