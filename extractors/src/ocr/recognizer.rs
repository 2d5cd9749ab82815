use image::{GrayImage, ImageFormat};
use shared_types::PageSegMode;
use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

pub const DEFAULT_LANGUAGES: &str = "ind+eng";
pub const DEFAULT_OCR_TIMEOUT: Duration = Duration::from_secs(30);
const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, thiserror::Error)]
pub enum OcrError {
    #[error("failed to stage image for OCR: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode image for OCR: {0}")]
    Encode(#[from] image::ImageError),

    #[error("failed to run {binary}: {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("OCR engine exited with {status}: {stderr}")]
    EngineFailed { status: String, stderr: String },

    #[error("{binary} timed out after {}ms", elapsed.as_millis())]
    TimedOut { binary: String, elapsed: Duration },
}

/// Raw text plus per-word confidences from one recognition run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Recognition {
    pub text: String,
    pub word_confidences: Vec<f32>,
}

impl Recognition {
    /// Mean confidence over words the engine scored above zero.
    pub fn mean_confidence(&self) -> f32 {
        let scored: Vec<f32> = self
            .word_confidences
            .iter()
            .copied()
            .filter(|c| *c > 0.0)
            .collect();
        if scored.is_empty() {
            return 0.0;
        }
        scored.iter().sum::<f32>() / scored.len() as f32
    }
}

pub trait TextRecognizer: Send + Sync {
    fn recognize(&self, image: &GrayImage, psm: PageSegMode) -> Result<Recognition, OcrError>;
}

/// Runs the `tesseract` command line tool with TSV output.
#[derive(Debug, Clone)]
pub struct TesseractCli {
    binary: PathBuf,
    languages: String,
    timeout: Duration,
}

impl Default for TesseractCli {
    fn default() -> Self {
        Self::new("tesseract", DEFAULT_LANGUAGES)
    }
}

impl TesseractCli {
    pub fn new(binary: impl Into<PathBuf>, languages: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            languages: languages.into(),
            timeout: DEFAULT_OCR_TIMEOUT,
        }
    }

    /// A run that exceeds `timeout` is killed and reported as failed.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl TextRecognizer for TesseractCli {
    fn recognize(&self, image: &GrayImage, psm: PageSegMode) -> Result<Recognition, OcrError> {
        let workdir = tempfile::Builder::new().prefix("finot-ocr-").tempdir()?;
        let input = workdir.path().join("page.png");
        let output_base = workdir.path().join("page");
        image.save_with_format(&input, ImageFormat::Png)?;

        let binary = self.binary.display().to_string();
        let child = Command::new(&self.binary)
            .arg(&input)
            .arg(&output_base)
            .args(["-l", &self.languages])
            .args(["--oem", "3"])
            .args(["--psm", &psm.number().to_string()])
            .arg("tsv")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| OcrError::Spawn {
                binary: binary.clone(),
                source,
            })?;

        let (status, stderr) = wait_with_timeout(child, self.timeout, &binary)?;
        if !status.success() {
            return Err(OcrError::EngineFailed {
                status: status.to_string(),
                stderr: stderr.trim().to_string(),
            });
        }

        let tsv = std::fs::read_to_string(output_base.with_extension("tsv"))?;
        Ok(parse_tsv(&tsv))
    }
}

/// Polls `child` until it exits, killing it once `timeout` has elapsed.
fn wait_with_timeout(
    mut child: Child,
    timeout: Duration,
    binary: &str,
) -> Result<(ExitStatus, String), OcrError> {
    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            let mut stderr = String::new();
            if let Some(mut pipe) = child.stderr.take() {
                pipe.read_to_string(&mut stderr)?;
            }
            return Ok((status, stderr));
        }

        let elapsed = start.elapsed();
        if elapsed > timeout {
            let _ = child.kill();
            let _ = child.wait();
            return Err(OcrError::TimedOut {
                binary: binary.to_string(),
                elapsed,
            });
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}

/// Rebuilds text and word confidences from Tesseract TSV output.
///
/// Words on the same (page, block, paragraph, line) are joined by spaces and
/// lines by newlines.
pub fn parse_tsv(tsv: &str) -> Recognition {
    let mut lines: Vec<String> = Vec::new();
    let mut current_key: Option<[&str; 4]> = None;
    let mut word_confidences = Vec::new();

    for row in tsv.lines().skip(1) {
        let columns: Vec<&str> = row.split('\t').collect();
        if columns.len() < 12 || columns[0] != "5" {
            continue;
        }

        let word = columns[11..].join("\t");
        let word = word.trim();
        if word.is_empty() {
            continue;
        }

        if let Ok(confidence) = columns[10].trim().parse::<f32>() {
            word_confidences.push(confidence);
        }

        let key = [columns[1], columns[2], columns[3], columns[4]];
        match lines.last_mut() {
            Some(line) if current_key == Some(key) => {
                line.push(' ');
                line.push_str(word);
            }
            _ => {
                lines.push(word.to_string());
                current_key = Some(key);
            }
        }
    }

    Recognition {
        text: lines.join("\n"),
        word_confidences,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_TSV: &str = "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext
1\t1\t0\t0\t0\t0\t0\t0\t800\t1600\t-1\t
4\t1\t1\t1\t1\t0\t10\t10\t300\t30\t-1\t
5\t1\t1\t1\t1\t1\t10\t10\t100\t30\t91.5\tINDOMARET
5\t1\t1\t1\t1\t2\t120\t10\t100\t30\t88.5\tCABANG
5\t1\t1\t1\t2\t1\t10\t50\t100\t30\t0\t~
5\t1\t1\t1\t3\t1\t10\t90\t100\t30\t95\tTOTAL
5\t1\t1\t1\t3\t2\t120\t90\t100\t30\t95\t25.000
5\t1\t1\t1\t3\t3\t240\t90\t100\t30\t-1\t ";

    #[test]
    fn test_parse_tsv_rebuilds_lines() {
        let recognition = parse_tsv(SAMPLE_TSV);
        assert_eq!(recognition.text, "INDOMARET CABANG\n~\nTOTAL 25.000");
        assert_eq!(recognition.word_confidences, vec![91.5, 88.5, 0.0, 95.0, 95.0]);
    }

    #[test]
    fn test_mean_confidence_ignores_unscored_words() {
        let recognition = parse_tsv(SAMPLE_TSV);
        assert!((recognition.mean_confidence() - 92.5).abs() < 1e-4);
    }

    #[test]
    fn test_empty_output() {
        let recognition = parse_tsv("");
        assert!(recognition.text.is_empty());
        assert_eq!(recognition.mean_confidence(), 0.0);
    }

    #[test]
    fn test_missing_binary_is_spawn_error() {
        let cli = TesseractCli::new("/nonexistent/finot-tesseract", DEFAULT_LANGUAGES);
        let image = GrayImage::new(8, 8);
        let err = cli.recognize(&image, PageSegMode::SingleBlock).unwrap_err();
        assert!(matches!(err, OcrError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_hung_engine_is_killed() {
        let child = Command::new("sleep")
            .arg("5")
            .stderr(Stdio::piped())
            .spawn()
            .unwrap();
        let start = Instant::now();
        let err = wait_with_timeout(child, Duration::from_millis(100), "sleep").unwrap_err();
        assert!(matches!(err, OcrError::TimedOut { .. }));
        assert!(start.elapsed() < Duration::from_secs(4));
    }

    #[cfg(unix)]
    #[test]
    fn test_finished_engine_reports_status() {
        let child = Command::new("true").stderr(Stdio::piped()).spawn().unwrap();
        let (status, stderr) = wait_with_timeout(child, Duration::from_secs(5), "true").unwrap();
        assert!(status.success());
        assert!(stderr.is_empty());
    }
}
