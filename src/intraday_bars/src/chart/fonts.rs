//! plotters draws text only with a font registered up front.

use std::{fs, path::Path, sync::OnceLock};

use plotters::style::{FontStyle, register_font};
use tracing::{debug, warn};

pub(crate) const FAMILY: &str = "sans-serif";

const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

static REGISTERED: OnceLock<bool> = OnceLock::new();

/// Registers `preferred`, or failing that the first system font found, as
/// [`FAMILY`]. Only the first call looks; later calls report its result.
pub fn ensure_font(preferred: Option<&str>) -> bool {
    *REGISTERED.get_or_init(|| {
        let found = preferred
            .into_iter()
            .chain(SYSTEM_FONTS.iter().copied())
            .any(|path| load(Path::new(path)));
        if !found {
            warn!("no usable font found; charts will be drawn without text");
        }
        found
    })
}

fn load(path: &Path) -> bool {
    let Ok(bytes) = fs::read(path) else {
        return false;
    };
    // The registry holds a 'static slice for the life of the process.
    let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
    match register_font(FAMILY, FontStyle::Normal, bytes) {
        Ok(()) => {
            debug!(font = %path.display(), "chart font registered");
            true
        }
        Err(_) => {
            warn!(font = %path.display(), "not a usable font file");
            false
        }
    }
}
