/*! Clip generation

Every `good` annotation is cropped out of its sample into
`samples/_annotated/<lang>/<lang>-<checksum>-<start>-<end>.mp3`.
Clips that already exist are left alone, so the command can be re-run after each session.
!*/
use std::fs;

use log::{debug, info};

use crate::audio::Cropper;
use crate::error::Error;
use crate::io::Store;
use crate::types::{Dataset, Segment};

/// Crop every good annotation of `dataset` that has no clip yet.
///
/// Returns the number of clips written.
pub fn make_clips(store: &Store, dataset: &Dataset, cropper: &dyn Cropper) -> Result<usize, Error> {
    let mut written = 0;

    for language in dataset.languages() {
        for record in dataset.samples(language) {
            let sample = record.sample_ref();
            let src = store.audio_path(&sample);

            for annotation in record.annotations.iter().filter(|a| a.is_good()) {
                let segment = Segment::new(sample.clone(), annotation.offset, annotation.duration);
                let dst = store.clip_path(&segment);
                if dst.exists() {
                    debug!("{:?} already exists", dst);
                    continue;
                }

                if let Some(parent) = dst.parent() {
                    fs::create_dir_all(parent)?;
                }
                cropper.crop(&src, segment.offset(), segment.duration(), &dst)?;
                written += 1;
            }
        }
    }

    info!("wrote {} clips", written);
    Ok(written)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::path::{Path, PathBuf};

    use chrono::NaiveDate;
    use tempfile::tempdir;

    use super::*;
    use crate::types::{Annotation, Genders, SampleRecord};

    /// records crops and writes an empty file in place of the clip.
    #[derive(Default)]
    struct FakeCropper {
        calls: RefCell<Vec<(PathBuf, u32, u32)>>,
    }

    impl Cropper for FakeCropper {
        fn crop(&self, src: &Path, offset: u32, duration: u32, dst: &Path) -> Result<(), Error> {
            self.calls
                .borrow_mut()
                .push((src.to_path_buf(), offset, duration));
            fs::write(dst, "")?;
            Ok(())
        }
    }

    #[test]
    fn crops_good_annotations_once() {
        let dir = tempdir().unwrap();
        let store = Store::new(&dir.path().join("index"), &dir.path().join("samples"));
        let date = NaiveDate::from_ymd_opt(2016, 5, 1).unwrap();

        let mut record = SampleRecord::new("fra", "abc", "http://a");
        let good = Segment::new(record.sample_ref(), 20, 20);
        let bad = Segment::new(record.sample_ref(), 0, 20);
        record.annotations.push(Annotation::good(
            &good,
            2,
            Genders::Mixed,
            "a".to_string(),
            date,
        ));
        record
            .annotations
            .push(Annotation::bad(&bad, vec![], "a".to_string(), date));
        let dataset: Dataset = vec![record].into_iter().collect();

        let cropper = FakeCropper::default();
        assert_eq!(make_clips(&store, &dataset, &cropper).unwrap(), 1);
        assert!(dir
            .path()
            .join("samples/_annotated/fra/fra-abc-20-40.mp3")
            .exists());
        assert_eq!(
            cropper.calls.borrow().as_slice(),
            &[(dir.path().join("samples/fra/fra-abc.mp3"), 20, 20)]
        );

        // second run has nothing left to do
        assert_eq!(make_clips(&store, &dataset, &cropper).unwrap(), 0);
    }
}
