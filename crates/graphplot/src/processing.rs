//! External imagery processing seam
//!
//! The run hands each deck-checked record to an [`ExternalProcessor`] and
//! only records the locations the processor reports back. What the
//! processor does with the imagery is outside this crate.

use crate::error::Result;
use crate::intake::{copy_file, move_file, sidecar_candidates, FileLocation, FileRecord};
use std::path::PathBuf;
use tracing::{debug, warn};

pub trait ExternalProcessor {
    /// Process `record`, still sitting under its original name.
    ///
    /// Every file produced or relocated as a side effect is pushed onto
    /// `produced` as soon as it exists, so the caller sees partial work even
    /// when an error follows. Errors are logged by the caller and never stop
    /// the run.
    fn process(&mut self, record: &FileRecord, produced: &mut Vec<FileLocation>) -> Result<()>;
}

/// Does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProcessor;

impl ExternalProcessor for NoopProcessor {
    fn process(&mut self, _record: &FileRecord, _produced: &mut Vec<FileLocation>) -> Result<()> {
        Ok(())
    }
}

/// Hands copies to a Documentum import area.
///
/// The image is copied under its renamed name into `image_dir`. A metadata
/// sidecar, if present, is copied (renamed to match) into `metacard_dir` and
/// the original is moved into `meta_dir`.
#[derive(Debug, Clone)]
pub struct DocumentumProcessor {
    pub image_dir: Option<PathBuf>,
    pub metacard_dir: Option<PathBuf>,
    pub meta_dir: PathBuf,
}

impl DocumentumProcessor {
    /// `None` when neither Documentum target is configured.
    pub fn from_dirs(
        image_dir: Option<PathBuf>,
        metacard_dir: Option<PathBuf>,
        meta_dir: PathBuf,
    ) -> Option<Self> {
        if image_dir.is_none() && metacard_dir.is_none() {
            return None;
        }
        Some(Self {
            image_dir,
            metacard_dir,
            meta_dir,
        })
    }
}

impl ExternalProcessor for DocumentumProcessor {
    fn process(&mut self, record: &FileRecord, produced: &mut Vec<FileLocation>) -> Result<()> {
        let source_dir = record.directory().to_path_buf();

        if let Some(image_dir) = &self.image_dir {
            copy_file(record.location(), image_dir, &record.renamed_name)?;
            produced.push(FileLocation::new(record.renamed_name.clone(), image_dir.clone()));
        }

        let Some(metacard_dir) = &self.metacard_dir else {
            return Ok(());
        };

        let sidecar = sidecar_candidates(&record.fname)
            .into_iter()
            .find(|name| source_dir.join(name).is_file());
        let Some(sidecar) = sidecar else {
            debug!(file = %record.fname, "No metadata sidecar");
            return Ok(());
        };

        let metacard_name = format!("{}.xml", record.renamed_name);
        copy_file(&source_dir.join(&sidecar), metacard_dir, &metacard_name)?;
        produced.push(FileLocation::new(metacard_name, metacard_dir.clone()));

        match move_file(&source_dir.join(&sidecar), &self.meta_dir, &sidecar) {
            Ok(_) => produced.push(FileLocation::new(sidecar, self.meta_dir.clone())),
            Err(e) => warn!("Sidecar {} not moved to metadata dir: {}", sidecar, e),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intake::ParsedName;
    use std::fs;
    use tempfile::TempDir;

    fn record(dir: &std::path::Path) -> FileRecord {
        let parsed = ParsedName {
            date: "20230115".into(),
            time: "1230".into(),
            year: 2023,
            month: 1,
            identifier: "4567E12345".into(),
        };
        let name = "20230115_1230Z_4567E12345_XY_ABC.tif";
        FileRecord::new(name, "cmd", parsed, dir.join(name), "proc")
    }

    #[test]
    fn unconfigured_documentum_is_disabled() {
        assert!(DocumentumProcessor::from_dirs(None, None, PathBuf::from("/m")).is_none());
    }

    #[test]
    fn copies_image_and_metacard() {
        let temp = TempDir::new().unwrap();
        let input = temp.path().join("in");
        let images = temp.path().join("img");
        let cards = temp.path().join("cards");
        let meta = temp.path().join("meta");
        for d in [&input, &images, &cards, &meta] {
            fs::create_dir_all(d).unwrap();
        }
        let rec = record(&input);
        fs::write(rec.location(), b"img").unwrap();
        fs::write(input.join("20230115_1230Z_4567E12345_XY_ABC.xml"), b"<m/>").unwrap();

        let mut p = DocumentumProcessor::from_dirs(Some(images.clone()), Some(cards.clone()), meta.clone()).unwrap();
        let mut produced = Vec::new();
        p.process(&rec, &mut produced).unwrap();

        assert_eq!(produced.len(), 3);
        assert!(images.join("20230115_1230Z_4567E12345_XY_ABC_proc.tif").exists());
        assert!(cards.join("20230115_1230Z_4567E12345_XY_ABC_proc.tif.xml").exists());
        assert!(meta.join("20230115_1230Z_4567E12345_XY_ABC.xml").exists());
        assert!(!input.join("20230115_1230Z_4567E12345_XY_ABC.xml").exists());
        assert!(rec.location().exists());
    }

    #[test]
    fn image_copy_is_reported_when_metacard_copy_fails() {
        let temp = TempDir::new().unwrap();
        let input = temp.path().join("in");
        let images = temp.path().join("img");
        for d in [&input, &images] {
            fs::create_dir_all(d).unwrap();
        }
        let rec = record(&input);
        fs::write(rec.location(), b"img").unwrap();
        fs::write(input.join("20230115_1230Z_4567E12345_XY_ABC.xml"), b"<m/>").unwrap();

        let missing_cards = temp.path().join("cards");
        let mut p = DocumentumProcessor::from_dirs(
            Some(images.clone()),
            Some(missing_cards),
            temp.path().join("meta"),
        )
        .unwrap();
        let mut produced = Vec::new();
        assert!(p.process(&rec, &mut produced).is_err());

        assert_eq!(
            produced,
            vec![FileLocation::new("20230115_1230Z_4567E12345_XY_ABC_proc.tif", images.clone())]
        );
        assert!(images.join("20230115_1230Z_4567E12345_XY_ABC_proc.tif").exists());
    }

    #[test]
    fn noop_reports_nothing() {
        let temp = TempDir::new().unwrap();
        let mut produced = Vec::new();
        NoopProcessor.process(&record(temp.path()), &mut produced).unwrap();
        assert!(produced.is_empty());
    }
}
