//! Writing rendered sections to numbered files

use crate::analysis::Section;
use crate::error::{SectionizeError, SectionizeResult};
use crate::render::SectionRenderer;
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

/// `1.wav`, `2.wav`, ... for 1-based `index`
pub fn section_file_name(index: usize, extension: &str) -> String {
    format!("{}.{}", index, extension)
}

/// Render every section in order and write it to `out_dir/<n>.<ext>`
///
/// Existing files are overwritten. The first failure stops the export; files
/// already written stay in place.
pub fn export_sections<R: SectionRenderer>(
    sections: &[Section],
    renderer: &mut R,
    out_dir: &Path,
) -> SectionizeResult<Vec<PathBuf>> {
    let extension = renderer.extension();
    let mut written = Vec::with_capacity(sections.len());

    for (index, section) in sections.iter().enumerate() {
        let bytes = renderer.render(section)?;
        let path = out_dir.join(section_file_name(index + 1, extension));

        fs::write(&path, &bytes).map_err(|source| SectionizeError::OutputError {
            path: path.clone(),
            source,
        })?;

        info!(
            "Section {} ({:.2}s..{:.2}s) -> {} ({} bytes)",
            index + 1,
            section.start,
            section.end(),
            path.display(),
            bytes.len()
        );
        written.push(path);
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct Echo {
        rendered: usize,
        fail_at: Option<usize>,
    }

    impl SectionRenderer for Echo {
        fn extension(&self) -> &'static str {
            "raw"
        }

        fn render(&mut self, section: &Section) -> SectionizeResult<Vec<u8>> {
            self.rendered += 1;
            if self.fail_at == Some(self.rendered) {
                return Err(SectionizeError::EncodeError("boom".to_string()));
            }
            Ok(format!("{}+{}", section.start, section.duration).into_bytes())
        }
    }

    fn sections(n: usize) -> Vec<Section> {
        (0..n)
            .map(|i| Section {
                start: i as f64 * 5.0,
                duration: 5.0,
                confidence: 1.0,
                loudness: -20.0,
                tempo: 100.0,
                tempo_confidence: 0.5,
                key: None,
                time_signature: 4,
                time_signature_confidence: 0.5,
            })
            .collect()
    }

    #[test]
    fn test_section_file_name() {
        assert_eq!(section_file_name(1, "wav"), "1.wav");
        assert_eq!(section_file_name(12, "mp3"), "12.mp3");
    }

    #[test]
    fn test_export_writes_numbered_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("2.raw"), b"stale").unwrap();
        let mut renderer = Echo {
            rendered: 0,
            fail_at: None,
        };

        let written = export_sections(&sections(3), &mut renderer, dir.path()).unwrap();
        assert_eq!(
            written,
            vec![
                dir.path().join("1.raw"),
                dir.path().join("2.raw"),
                dir.path().join("3.raw")
            ]
        );
        assert_eq!(fs::read(&written[0]).unwrap(), b"0+5");
        assert_eq!(fs::read(&written[1]).unwrap(), b"5+5");
        assert_eq!(fs::read(&written[2]).unwrap(), b"10+5");
    }

    #[test]
    fn test_export_nothing() {
        let dir = TempDir::new().unwrap();
        let mut renderer = Echo {
            rendered: 0,
            fail_at: None,
        };
        assert!(export_sections(&[], &mut renderer, dir.path()).unwrap().is_empty());
        assert_eq!(renderer.rendered, 0);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_failure_keeps_earlier_files() {
        let dir = TempDir::new().unwrap();
        let mut renderer = Echo {
            rendered: 0,
            fail_at: Some(3),
        };

        assert!(export_sections(&sections(4), &mut renderer, dir.path()).is_err());
        assert!(dir.path().join("1.raw").exists());
        assert!(dir.path().join("2.raw").exists());
        assert!(!dir.path().join("3.raw").exists());
        assert!(!dir.path().join("4.raw").exists());
    }

    #[test]
    fn test_unwritable_directory() {
        let dir = TempDir::new().unwrap();
        let mut renderer = Echo {
            rendered: 0,
            fail_at: None,
        };
        let err = export_sections(&sections(1), &mut renderer, &dir.path().join("missing")).unwrap_err();
        assert!(matches!(err, SectionizeError::OutputError { .. }));
    }
}
