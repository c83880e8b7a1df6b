//! Extruded 3D lettering for the floating label.
//!
//! Glyphs are rasterised with `ab_glyph` on a coarse pixel grid and every covered cell is
//! extruded into a box. Adjacent cells of a row are merged into one box, which keeps the mesh
//! small and gives the lettering the same low-poly look as the rest of the scene.

use ab_glyph::{Font, FontArc, PxScale, ScaleFont};

use crate::resources::{AssetSource, mesh::MeshData, texture::LoadError};

/// Letter height in world units.
pub const TEXT_SIZE: f32 = 2.0;
/// Extrusion depth in world units.
pub const TEXT_DEPTH: f32 = 0.1;
/// Grid cells per em. Higher values trade mesh size for rounder letters.
const CELLS_PER_EM: f32 = 14.0;
/// Coverage above which a cell counts as filled.
const COVERAGE_THRESHOLD: f32 = 0.5;

/// Rasterised coverage of one glyph, already placed on the line.
///
/// `origin` is the grid position (in cells, y pointing down from the baseline) of the top-left
/// cell.
#[derive(Clone, Debug, PartialEq)]
pub struct Coverage {
    pub origin: (i32, i32),
    pub width: u32,
    pub height: u32,
    pub cells: Vec<bool>,
}

impl Coverage {
    pub fn filled(&self, x: u32, y: u32) -> bool {
        self.cells
            .get((y * self.width + x) as usize)
            .copied()
            .unwrap_or(false)
    }
}

pub struct LabelFont {
    font: FontArc,
}

impl std::fmt::Debug for LabelFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LabelFont")
            .field("glyphs", &self.font.glyph_count())
            .finish()
    }
}

impl LabelFont {
    pub fn from_bytes(url: &str, bytes: Vec<u8>) -> Result<Self, LoadError> {
        let font = FontArc::try_from_vec(bytes).map_err(|e| LoadError::Decode {
            url: url.to_string(),
            cause: e.to_string(),
        })?;
        Ok(Self { font })
    }

    /// Lays out `text` on a single line and rasterises every glyph.
    pub fn rasterise(&self, text: &str) -> Vec<Coverage> {
        let scale = PxScale::from(CELLS_PER_EM);
        let scaled = self.font.as_scaled(scale);
        let mut caret = 0.0f32;
        let mut previous = None;
        let mut glyphs = Vec::new();

        for ch in text.chars() {
            let id = self.font.glyph_id(ch);
            if let Some(previous) = previous {
                caret += scaled.kern(previous, id);
            }
            let glyph = id.with_scale_and_position(scale, ab_glyph::point(caret, 0.0));
            caret += scaled.h_advance(id);
            previous = Some(id);

            // Whitespace has no outline, only an advance
            let Some(outlined) = scaled.outline_glyph(glyph) else {
                continue;
            };
            let bounds = outlined.px_bounds();
            let width = bounds.width().ceil() as u32;
            let height = bounds.height().ceil() as u32;
            let mut cells = vec![false; (width * height) as usize];
            outlined.draw(|gx, gy, coverage| {
                let idx = (gy * width + gx) as usize;
                if idx < cells.len() {
                    cells[idx] = coverage >= COVERAGE_THRESHOLD;
                }
            });
            glyphs.push(Coverage {
                origin: (bounds.min.x.floor() as i32, bounds.min.y.floor() as i32),
                width,
                height,
                cells,
            });
        }
        glyphs
    }

    /// The label mesh: extruded, horizontally centred, baseline at y = 0.
    pub fn text_mesh(&self, text: &str) -> MeshData {
        let mut mesh = extrude(&self.rasterise(text), TEXT_SIZE / CELLS_PER_EM, TEXT_DEPTH);
        centre_horizontally(&mut mesh);
        mesh
    }
}

/// Fetches and parses the label font.
pub async fn load_font<S: AssetSource>(source: &S, url: &str) -> Result<LabelFont, LoadError> {
    let bytes = source.fetch(url).await.map_err(|e| LoadError::Fetch {
        url: url.to_string(),
        cause: format!("{e:#}"),
    })?;
    LabelFont::from_bytes(url, bytes)
}

/// Turns coverage grids into boxes of `cell` × `cell` × `depth`, merging horizontal runs.
pub fn extrude(glyphs: &[Coverage], cell: f32, depth: f32) -> MeshData {
    let mut mesh = MeshData::default();
    for glyph in glyphs {
        for y in 0..glyph.height {
            let mut x = 0;
            while x < glyph.width {
                if !glyph.filled(x, y) {
                    x += 1;
                    continue;
                }
                let start = x;
                while x < glyph.width && glyph.filled(x, y) {
                    x += 1;
                }
                let run = (x - start) as f32;
                let left = (glyph.origin.0 + start as i32) as f32 * cell;
                let top = (glyph.origin.1 + y as i32) as f32 * cell;
                let centre = [left + run * cell / 2.0, -(top + cell / 2.0), 0.0];
                mesh.merge(MeshData::cuboid(run * cell, cell, depth).translated(centre));
            }
        }
    }
    mesh
}

pub fn centre_horizontally(mesh: &mut MeshData) {
    if let Some((min, max)) = mesh.bounds() {
        let offset = -0.5 * (min[0] + max[0]);
        for vertex in &mut mesh.vertices {
            vertex.position[0] += offset;
        }
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;

    use super::*;
    use crate::resources::testing::MemorySource;

    fn glyph(origin: (i32, i32), rows: &[&str]) -> Coverage {
        let width = rows[0].len() as u32;
        Coverage {
            origin,
            width,
            height: rows.len() as u32,
            cells: rows.iter().flat_map(|row| row.chars().map(|c| c == '#')).collect(),
        }
    }

    #[test]
    fn runs_become_single_boxes() {
        let g = glyph((0, -2), &["###", "#.#"]);
        let mesh = extrude(&[g], 1.0, 0.1);
        // one box for the full top row, two for the split bottom row
        assert_eq!(mesh.vertices.len(), 3 * 24);
        let (min, max) = mesh.bounds().unwrap();
        assert_eq!(min[0], 0.0);
        assert_eq!(max[0], 3.0);
        // rows sit above the baseline when the origin is negative
        assert_eq!(max[1], 2.0);
        assert_eq!(min[1], 0.0);
        assert!((max[2] - min[2] - 0.1).abs() < 1e-6);
    }

    #[test]
    fn empty_coverage_yields_no_geometry() {
        let g = glyph((0, 0), &["...", "..."]);
        assert!(extrude(&[g], 1.0, 0.1).vertices.is_empty());
    }

    #[test]
    fn centring_balances_the_bounds() {
        let mut mesh = extrude(&[glyph((4, 0), &["##"]), glyph((8, 0), &["#"])], 0.5, 0.1);
        centre_horizontally(&mut mesh);
        let (min, max) = mesh.bounds().unwrap();
        assert!((min[0] + max[0]).abs() < 1e-6);
    }

    #[test]
    fn garbage_is_a_decode_error() {
        let source = MemorySource::default().with_bytes("font.ttf", vec![1, 2, 3]);
        match block_on(load_font(&source, "font.ttf")) {
            Err(LoadError::Decode { url, .. }) => assert_eq!(url, "font.ttf"),
            other => panic!("unexpected {:?}", other.map(|_| ())),
        }
        match block_on(load_font(&source, "missing.ttf")) {
            Err(LoadError::Fetch { url, .. }) => assert_eq!(url, "missing.ttf"),
            other => panic!("unexpected {:?}", other.map(|_| ())),
        }
    }
}
