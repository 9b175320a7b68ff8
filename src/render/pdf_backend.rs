//! PDF backend built on `printpdf`.
//!
//! | Operation | printpdf |
//! |---|---|
//! | Pages | `PdfDocument::new` for the first page, `add_page` after |
//! | Fonts | `add_builtin_font` (base-14) or `add_external_font` (TTF/OTF) |
//! | Shapes | `Polygon` rings, Bézier corners for rounded outlines |
//! | Text | one text section per line, `set_font` + `write_text` per run |
//! | Icon | `ImageXObject` from flattened RGB, sized through its DPI |
//! | Output | `save_to_bytes` |
//!
//! The document itself is created lazily on the first page, because
//! `printpdf` wants the first page's size up front. Font files are read and
//! parsed by [`FontFaces::load`] while a run is planned, so a broken font
//! stops the run before anything is drawn.

use super::backend::{DocumentBackend, RenderError};
use super::metrics::FaceMetrics;
use super::params::{Icon, Ink, PlacedText};
use crate::fonts::{BuiltinFamily, FamilySource, FontStyle};
use crate::geometry::{CardBox, MM_PER_INCH};
use log::debug;
use printpdf::*;
use printpdf::path::{PaintMode, WindingOrder};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

const LAYER_NAME: &str = "Cards";
const PRODUCER: &str = "Bigger, Blacker Cards";
/// Outline weight for cut guides, in points.
const CUT_LINE_THICKNESS: f32 = 0.5;
/// Cubic Bézier handle length for a quarter circle of radius 1.
const KAPPA: f64 = 0.552_284_75;

#[derive(Debug, Clone, PartialEq)]
enum FaceSource {
    Builtin(BuiltinFont),
    File(PathBuf),
}

#[derive(Debug, Clone)]
struct Face {
    source: FaceSource,
    metrics: FaceMetrics,
}

/// The four faces of one family, read and parsed ahead of drawing.
#[derive(Debug, Clone)]
pub struct FontFaces {
    faces: BTreeMap<FontStyle, Face>,
}

impl FontFaces {
    /// Load every face of `family`. Each distinct file is read once.
    pub fn load(family: &FamilySource) -> Result<Self, RenderError> {
        let mut loaded: BTreeMap<&Path, FaceMetrics> = BTreeMap::new();
        let mut faces = BTreeMap::new();
        for style in FontStyle::ALL {
            let face = match family {
                FamilySource::Builtin(builtin) => Face {
                    source: FaceSource::Builtin(builtin_font(*builtin, style)),
                    metrics: FaceMetrics::Builtin {
                        family: *builtin,
                        style,
                    },
                },
                FamilySource::Files(files) => {
                    let path = files.path(style);
                    let metrics = match loaded.get(path) {
                        Some(metrics) => metrics.clone(),
                        None => {
                            let metrics = load_face(path)?;
                            loaded.insert(path, metrics.clone());
                            metrics
                        }
                    };
                    Face {
                        source: FaceSource::File(path.to_path_buf()),
                        metrics,
                    }
                }
            };
            faces.insert(style, face);
        }
        Ok(Self { faces })
    }

    /// Advance width of `text` in points.
    pub fn text_width(&self, text: &str, style: FontStyle, size: f64) -> f64 {
        self.faces
            .get(&style)
            .map(|face| face.metrics.text_width(text, size))
            .unwrap_or(0.0)
    }
}

fn load_face(path: &Path) -> Result<FaceMetrics, RenderError> {
    let data = fs::read(path)
        .map_err(|e| RenderError::Font(format!("cannot read {}: {e}", path.display())))?;
    debug!("loaded font {} ({} bytes)", path.display(), data.len());
    FaceMetrics::from_font_data(data)
        .map_err(|e| RenderError::Font(format!("cannot parse {}: {e}", path.display())))
}

/// Production [`DocumentBackend`] writing a PDF document.
pub struct PdfBackend {
    title: String,
    faces: FontFaces,
    doc: Option<PdfDocumentReference>,
    fonts: BTreeMap<FontStyle, IndirectFontRef>,
    layer: Option<PdfLayerReference>,
    page_size: (f64, f64),
}

impl PdfBackend {
    /// Prepare a backend for one document drawn with `faces`.
    pub fn new(title: &str, faces: &FontFaces) -> Self {
        Self {
            title: title.to_string(),
            faces: faces.clone(),
            doc: None,
            fonts: BTreeMap::new(),
            layer: None,
            page_size: (0.0, 0.0),
        }
    }

    fn embed_fonts(&mut self, doc: &PdfDocumentReference) -> Result<(), RenderError> {
        let mut embedded: Vec<(FaceSource, IndirectFontRef)> = Vec::new();
        for (style, face) in &self.faces.faces {
            if let Some((_, font)) = embedded.iter().find(|(src, _)| *src == face.source) {
                self.fonts.insert(*style, font.clone());
                continue;
            }
            let font = match (&face.source, &face.metrics) {
                (FaceSource::Builtin(builtin), _) => doc.add_builtin_font(*builtin),
                (FaceSource::File(_), FaceMetrics::File(data)) => {
                    doc.add_external_font(data.as_slice())
                }
                (FaceSource::File(path), _) => {
                    return Err(RenderError::Font(format!(
                        "no font data loaded for {}",
                        path.display()
                    )));
                }
            }
            .map_err(|e| RenderError::Font(e.to_string()))?;
            debug!("embedded {:?} face {:?}", style, face.source);
            embedded.push((face.source.clone(), font.clone()));
            self.fonts.insert(*style, font);
        }
        Ok(())
    }

    fn font(&self, style: FontStyle) -> Result<&IndirectFontRef, RenderError> {
        self.fonts
            .get(&style)
            .ok_or_else(|| RenderError::Font(format!("no {style:?} face embedded")))
    }

    fn layer(&self) -> Result<&PdfLayerReference, RenderError> {
        self.layer
            .as_ref()
            .ok_or_else(|| RenderError::Pdf("drawing before the first page".to_string()))
    }
}

fn builtin_font(family: BuiltinFamily, style: FontStyle) -> BuiltinFont {
    match (family, style) {
        (BuiltinFamily::Helvetica, FontStyle::Normal) => BuiltinFont::Helvetica,
        (BuiltinFamily::Helvetica, FontStyle::Italic) => BuiltinFont::HelveticaOblique,
        (BuiltinFamily::Helvetica, FontStyle::Bold) => BuiltinFont::HelveticaBold,
        (BuiltinFamily::Helvetica, FontStyle::BoldItalic) => BuiltinFont::HelveticaBoldOblique,
        (BuiltinFamily::Times, FontStyle::Normal) => BuiltinFont::TimesRoman,
        (BuiltinFamily::Times, FontStyle::Italic) => BuiltinFont::TimesItalic,
        (BuiltinFamily::Times, FontStyle::Bold) => BuiltinFont::TimesBold,
        (BuiltinFamily::Times, FontStyle::BoldItalic) => BuiltinFont::TimesBoldItalic,
        (BuiltinFamily::Courier, FontStyle::Normal) => BuiltinFont::Courier,
        (BuiltinFamily::Courier, FontStyle::Italic) => BuiltinFont::CourierOblique,
        (BuiltinFamily::Courier, FontStyle::Bold) => BuiltinFont::CourierBold,
        (BuiltinFamily::Courier, FontStyle::BoldItalic) => BuiltinFont::CourierBoldOblique,
    }
}

fn color(ink: Ink) -> Color {
    let (r, g, b) = ink.rgb();
    Color::Rgb(Rgb::new(r as f32, g as f32, b as f32, None))
}

fn point(x: f64, y: f64) -> Point {
    Point::new(Mm(x as f32), Mm(y as f32))
}

/// Closed outline of `rect`. The flag on each point marks that the next two
/// points are Bézier control points.
fn outline_ring(rect: CardBox, corner_radius: Option<f64>) -> Vec<(Point, bool)> {
    let (l, r, b, t) = (rect.left(), rect.right(), rect.bottom(), rect.top());
    let radius = corner_radius
        .unwrap_or(0.0)
        .min(rect.width / 2.0)
        .min(rect.height / 2.0);

    if radius <= 0.0 {
        return vec![
            (point(l, b), false),
            (point(r, b), false),
            (point(r, t), false),
            (point(l, t), false),
        ];
    }

    let k = radius * KAPPA;
    vec![
        (point(l + radius, b), false),
        (point(r - radius, b), true),
        (point(r - radius + k, b), true),
        (point(r, b + radius - k), false),
        (point(r, b + radius), false),
        (point(r, t - radius), true),
        (point(r, t - radius + k), true),
        (point(r - radius + k, t), false),
        (point(r - radius, t), false),
        (point(l + radius, t), true),
        (point(l + radius - k, t), true),
        (point(l, t - radius + k), false),
        (point(l, t - radius), false),
        (point(l, b + radius), true),
        (point(l, b + radius - k), true),
        (point(l + radius - k, b), false),
        (point(l + radius, b), false),
    ]
}

impl DocumentBackend for PdfBackend {
    fn begin_page(&mut self, width: f64, height: f64) -> Result<(), RenderError> {
        let (w, h) = (Mm(width as f32), Mm(height as f32));
        let layer = match self.doc.take() {
            None => {
                let (doc, page, layer) = PdfDocument::new(self.title.as_str(), w, h, LAYER_NAME);
                let doc = doc.with_creator(PRODUCER).with_producer(PRODUCER);
                self.embed_fonts(&doc)?;
                let layer = doc.get_page(page).get_layer(layer);
                self.doc = Some(doc);
                layer
            }
            Some(doc) => {
                let (page, layer) = doc.add_page(w, h, LAYER_NAME);
                let layer = doc.get_page(page).get_layer(layer);
                self.doc = Some(doc);
                layer
            }
        };
        self.layer = Some(layer);
        self.page_size = (width, height);
        Ok(())
    }

    fn fill_page(&mut self, ink: Ink) -> Result<(), RenderError> {
        let (width, height) = self.page_size;
        let layer = self.layer()?;
        layer.set_fill_color(color(ink));
        let page = CardBox {
            x: 0.0,
            y: height,
            width,
            height,
        };
        layer.add_polygon(Polygon {
            rings: vec![outline_ring(page, None)],
            mode: PaintMode::Fill,
            winding_order: WindingOrder::NonZero,
        });
        Ok(())
    }

    fn stroke_rect(
        &mut self,
        rect: CardBox,
        corner_radius: Option<f64>,
        ink: Ink,
    ) -> Result<(), RenderError> {
        let layer = self.layer()?;
        layer.set_outline_color(color(ink));
        layer.set_outline_thickness(CUT_LINE_THICKNESS);
        layer.add_polygon(Polygon {
            rings: vec![outline_ring(rect, corner_radius)],
            mode: PaintMode::Stroke,
            winding_order: WindingOrder::NonZero,
        });
        Ok(())
    }

    fn draw_text(&mut self, text: &PlacedText) -> Result<(), RenderError> {
        let layer = self.layer()?;
        layer.set_fill_color(color(text.ink));
        for line in &text.lines {
            let fonts = line
                .runs
                .iter()
                .map(|run| self.font(run.style))
                .collect::<Result<Vec<_>, _>>()?;
            layer.begin_text_section();
            layer.set_text_cursor(Mm(line.x as f32), Mm(line.baseline as f32));
            for (run, font) in line.runs.iter().zip(fonts) {
                layer.set_font(font, text.size as f32);
                layer.write_text(run.text.as_str(), font);
            }
            layer.end_text_section();
        }
        Ok(())
    }

    fn draw_image(
        &mut self,
        icon: &Icon,
        rect: CardBox,
        background: Ink,
    ) -> Result<(), RenderError> {
        if rect.width <= 0.0 || rect.height <= 0.0 {
            return Ok(());
        }
        let layer = self.layer()?;
        let image = Image::from(ImageXObject {
            width: Px(icon.width as usize),
            height: Px(icon.height as usize),
            color_space: ColorSpace::Rgb,
            bits_per_component: ColorBits::Bit8,
            interpolate: true,
            image_data: icon.flatten(background),
            image_filter: None,
            clipping_bbox: None,
            smask: None,
        });

        // DPI that makes the pixel width come out at rect.width mm
        let dpi = icon.width as f64 / (rect.width / MM_PER_INCH);
        let natural_height = icon.height as f64 / dpi * MM_PER_INCH;
        image.add_to_layer(
            layer.clone(),
            ImageTransform {
                translate_x: Some(Mm(rect.left() as f32)),
                translate_y: Some(Mm(rect.bottom() as f32)),
                dpi: Some(dpi as f32),
                scale_y: Some((rect.height / natural_height) as f32),
                ..Default::default()
            },
        );
        Ok(())
    }

    fn text_width(&self, text: &str, style: FontStyle, size: f64) -> f64 {
        self.faces.text_width(text, style, size)
    }

    fn finish(self) -> Result<Vec<u8>, RenderError> {
        let doc = self.doc.ok_or(RenderError::EmptyDocument)?;
        doc.save_to_bytes()
            .map_err(|e| RenderError::Pdf(e.to_string()))
    }
}
