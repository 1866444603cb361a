use std::{fs::write, path::Path, sync::OnceLock};

use eyre::{Context, Result};
use fontdb::{Database, Family, Query};
use svg2pdf::usvg::{self, PostProcessingSteps, TreeParsing, TreePostProc};
use tracing::{debug, warn};

static FONTS: OnceLock<Database> = OnceLock::new();

/// System fonts, with the generic sans-serif family pointed at an installed
/// face when the stock choice is missing.
fn fonts() -> &'static Database {
    FONTS.get_or_init(|| {
        let mut db = Database::new();
        db.load_system_fonts();
        let query = Query {
            families: &[Family::SansSerif],
            ..Default::default()
        };
        if db.query(&query).is_none() {
            let fallback = db
                .faces()
                .find_map(|face| face.families.first().map(|(name, _)| name.clone()));
            match fallback {
                Some(name) => {
                    debug!("Using {name} as sans-serif");
                    db.set_sans_serif_family(name);
                }
                None => warn!("No system fonts found, chart text is left out"),
            }
        }
        db
    })
}

/// Converts a rendered SVG document into a single page PDF.
pub fn svg_to_pdf(svg: &str) -> Result<Vec<u8>> {
    let mut tree = usvg::Tree::from_str(svg, &usvg::Options::default())
        .context("Parse rendered chart")?;
    tree.postprocess(PostProcessingSteps::default(), fonts());
    Ok(svg2pdf::convert_tree(&tree, svg2pdf::Options::default()))
}

pub fn write_pdf(filepath: &Path, svg: &str) -> Result<()> {
    let pdf = svg_to_pdf(svg)?;
    write(filepath, pdf).context(format!("Write {}", filepath.display()))
}
