mod engine;
mod loader;
mod preprocessor;
mod recognizer;

pub use engine::{OcrEngine, MIN_BEST_TEXT_CHARS};
pub use loader::{FsImageLoader, ImageLoadError, ImageLoader};
pub use preprocessor::{otsu_threshold, Preprocessor, DEFAULT_TARGET_HEIGHT};
pub use recognizer::{
    parse_tsv, OcrError, Recognition, TesseractCli, TextRecognizer, DEFAULT_LANGUAGES,
    DEFAULT_OCR_TIMEOUT,
};

use image::DynamicImage;
use shared_types::{Binarization, OcrResult};

/// One preprocessing + extraction pass over a receipt image.
pub struct OcrPipeline {
    preprocessor: Preprocessor,
    engine: OcrEngine,
}

impl OcrPipeline {
    pub fn new(preprocessor: Preprocessor, engine: OcrEngine) -> Self {
        Self {
            preprocessor,
            engine,
        }
    }

    pub fn run(&self, image: &DynamicImage, binarization: Binarization) -> OcrResult {
        let prepared = self.preprocessor.run(image, binarization);
        self.engine.extract(&prepared, binarization)
    }
}
