use std::{
    cell::RefCell,
    path::{Path, PathBuf},
};

use chrono::NaiveDate;
use img2avif::{
    ConvertOptions, EncodeJob, Encoder, Img2AvifError, Img2AvifResult, ItemResult, Outcome,
    PostOptions, Template, canonical_name, prepare_post, prepare_post_in_dir,
};

/// Stands in for ffmpeg: writes a fixed payload per template.
#[derive(Default)]
struct FakeEncoder {
    jobs: RefCell<Vec<(PathBuf, Template, Option<u32>)>>,
    fail_on: Option<&'static str>,
}

impl FakeEncoder {
    fn payload(template: Template) -> &'static [u8] {
        match template {
            Template::Animated => b"animated",
            Template::Transparent => b"transparent",
            Template::Generic => b"",
        }
    }
}

impl Encoder for FakeEncoder {
    fn encode(&self, job: &EncodeJob<'_>) -> Img2AvifResult<()> {
        self.jobs
            .borrow_mut()
            .push((job.input.to_path_buf(), job.template, job.max_width));
        if let Some(name) = self.fail_on
            && job.input.file_name().and_then(|n| n.to_str()) == Some(name)
        {
            return Err(Img2AvifError::encode(job.input, "exit status: 1"));
        }
        std::fs::write(job.output, Self::payload(job.template))
            .map_err(|e| Img2AvifError::write(job.output, e))
    }
}

fn fixed_opts(max_width: Option<u32>) -> PostOptions {
    PostOptions {
        convert: ConvertOptions::document(max_width),
        now: NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5)
            .unwrap(),
    }
}

fn write(path: &Path, bytes: &[u8]) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, bytes).unwrap();
}

#[test]
fn post_is_prepared_and_images_renamed() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let doc = root.join("Trip Notes.md");
    write(
        &doc,
        b"# Trip Notes\n\
          ![cat](images/cat.jpg)\n\
          ![](images/logo.avif) ![again](cat.jpg)\n\
          ![doc](images/report.pdf)\n",
    );
    write(&root.join("images/cat.jpg"), b"jpeg");
    write(&root.join("images/logo.avif"), b"abc");
    write(&root.join("images/report.pdf"), b"pdf");

    let enc = FakeEncoder::default();
    let report = prepare_post(&doc, &fixed_opts(Some(940)), &enc).unwrap();

    let cat = canonical_name(b"");
    let logo = canonical_name(b"abc");
    assert_eq!(cat.as_str(), "d41d8cd98f00b204e9800998ecf8427e.avif");

    let text = std::fs::read_to_string(&doc).unwrap();
    assert_eq!(
        text,
        format!(
            "---\ntitle: Trip Notes\ndate: 2024-01-02T03:04:05\ntags: [ ]\n---\n\n\
             ![cat](images/{cat})\n\
             ![](images/{logo}) ![again](images/{cat})\n\
             ![doc](images/report.pdf)\n"
        )
    );

    // Transcoded source removed, target-format source kept beside its copy.
    assert!(!root.join("images/cat.jpg").exists());
    assert!(root.join("images").join(cat.as_str()).exists());
    assert!(root.join("images/logo.avif").exists());
    assert!(root.join("images").join(logo.as_str()).exists());
    assert!(root.join("images/report.pdf").exists());

    assert_eq!(
        enc.jobs.borrow().as_slice(),
        &[(root.join("images/cat.jpg"), Template::Generic, Some(940))]
    );
    assert_eq!(report.images.conversions().count(), 2);
    assert_eq!(report.images.skipped_count(), 1);
}

#[test]
fn rerun_over_canonical_files_is_a_no_op() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let name = canonical_name(b"abc");
    let doc = root.join("post.md");
    write(&doc, format!("![x](images/{name})\n").as_bytes());
    write(&root.join("images").join(name.as_str()), b"abc");

    let report = prepare_post(&doc, &fixed_opts(None), &FakeEncoder::default()).unwrap();

    let outcomes: Vec<_> = report.images.conversions().map(|c| c.outcome).collect();
    assert_eq!(outcomes, vec![Outcome::AlreadyCanonical]);
    assert_eq!(std::fs::read_dir(root.join("images")).unwrap().count(), 1);
    assert!(
        std::fs::read_to_string(&doc)
            .unwrap()
            .ends_with(&format!("![x](images/{name})\n"))
    );
}

#[test]
fn failed_image_keeps_its_link_and_the_rest_proceed() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let doc = root.join("post.md");
    write(&doc, b"![a](images/a.png)\n![b](images/b.gif)\n");
    write(&root.join("images/a.png"), b"png");
    write(&root.join("images/b.gif"), b"gif");

    let enc = FakeEncoder {
        fail_on: Some("a.png"),
        ..FakeEncoder::default()
    };
    let report = prepare_post(&doc, &fixed_opts(None), &enc).unwrap();

    assert_eq!(report.images.failed_count(), 1);
    assert!(matches!(
        &report.images.items[0],
        ItemResult::Failed { error: Img2AvifError::Encode { .. }, .. }
    ));

    let gif = canonical_name(b"animated");
    let text = std::fs::read_to_string(&doc).unwrap();
    assert!(text.contains("![a](images/a.png)\n"));
    assert!(text.contains(&format!("![b](images/{gif})\n")));
    assert!(root.join("images/a.png").exists());
    assert!(!root.join("images/b.gif").exists());
}

#[test]
fn missing_images_dir_still_writes_front_matter() {
    let dir = tempfile::tempdir().unwrap();
    let doc = dir.path().join("solo.md");
    write(&doc, b"## Section\n![a](images/a.png)\n");

    prepare_post(&doc, &fixed_opts(None), &FakeEncoder::default()).unwrap();

    assert_eq!(
        std::fs::read_to_string(&doc).unwrap(),
        "---\ntitle: solo\ndate: 2024-01-02T03:04:05\ntags: [ ]\n---\n\n\
         ## Section\n![a](images/a.png)\n"
    );
}

#[test]
fn two_documents_abort_before_any_change() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(&root.join("a.md"), b"# A\n![x](images/x.jpg)\n");
    write(&root.join("b.md"), b"# B\n");
    write(&root.join("images/x.jpg"), b"jpeg");

    let enc = FakeEncoder::default();
    let err = prepare_post_in_dir(root, &fixed_opts(None), &enc).unwrap_err();

    assert!(matches!(err, Img2AvifError::Precondition(_)));
    assert!(enc.jobs.borrow().is_empty());
    assert_eq!(
        std::fs::read_to_string(root.join("a.md")).unwrap(),
        "# A\n![x](images/x.jpg)\n"
    );
    assert!(root.join("images/x.jpg").exists());
}
