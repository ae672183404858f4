//! End-to-end split scenarios
//!
//! Loads synthetic PDFs through the lopdf codec, edits the arrangement and
//! checks the exported documents page by page.
//!
//! Run with: cargo test -p pdfsplit-core --test export_scenarios -- --nocapture

use lopdf::{content::Content, content::Operation, Dictionary, Document, Object, Stream};
use pdfsplit_core::{
    LopdfCodec, NoProgress, OutputFile, PdfSplitError, RotateDirection, SplitConfig, SplitSession,
};
use pretty_assertions::assert_eq;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("pdfsplit_core=debug")),
        )
        .try_init();
}

/// Create a test PDF where page N shows "Page N"
fn create_synthetic_pdf(num_pages: u32) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let mut page_ids = Vec::new();

    for i in 0..num_pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new(
                    "Tf",
                    vec![Object::Name(b"F1".to_vec()), Object::Integer(12)],
                ),
                Operation::new("Td", vec![Object::Integer(100), Object::Integer(700)]),
                Operation::new(
                    "Tj",
                    vec![Object::String(
                        format!("Page {}", i + 1).into_bytes(),
                        lopdf::StringFormat::Literal,
                    )],
                ),
                Operation::new("ET", vec![]),
            ],
        };

        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.encode().unwrap()));

        let page = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            (
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(612),
                    Object::Integer(792),
                ]),
            ),
            ("Contents", Object::Reference(content_id)),
        ]);

        page_ids.push(doc.add_object(page));
    }

    let pages = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Count", Object::Integer(num_pages as i64)),
        (
            "Kids",
            Object::Array(page_ids.iter().map(|id| Object::Reference(*id)).collect()),
        ),
    ]);
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]);
    let catalog_id = doc.add_object(catalog);
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

fn session_with(num_pages: u32) -> SplitSession<LopdfCodec> {
    init_tracing();
    let config = SplitConfig::default();
    let mut session = SplitSession::new(LopdfCodec::from_config(&config), config);
    session.load(&create_synthetic_pdf(num_pages)).unwrap();
    session
}

fn export_all(session: &SplitSession<LopdfCodec>) -> Vec<OutputFile> {
    let mut files: Vec<OutputFile> = Vec::new();
    session.export(&mut files, &mut NoProgress).unwrap();
    files
}

/// (source page number, /Rotate) for every page of an exported file
fn describe(file: &OutputFile) -> Vec<(u32, i64)> {
    let doc = Document::load_mem(&file.bytes).unwrap();
    doc.get_pages()
        .values()
        .map(|&page_id| {
            let text = String::from_utf8_lossy(&doc.get_page_content(page_id).unwrap()).into_owned();
            let number = text
                .split("(Page ")
                .nth(1)
                .and_then(|rest| rest.split(')').next())
                .and_then(|n| n.parse().ok())
                .unwrap_or(0);
            let rotate = doc
                .get_object(page_id)
                .and_then(|object| object.as_dict())
                .and_then(|page| page.get(b"Rotate"))
                .and_then(|object| object.as_i64())
                .unwrap_or(0);
            (number, rotate)
        })
        .collect()
}

fn filenames(files: &[OutputFile]) -> Vec<&str> {
    files.iter().map(|file| file.filename.as_str()).collect()
}

#[test]
fn scenario_manual_split_into_three_files() {
    let mut session = session_with(5);
    session.toggle_split(1);
    session.toggle_split(3);

    let files = export_all(&session);
    assert_eq!(filenames(&files), vec!["split_1.pdf", "split_2.pdf", "split_3.pdf"]);
    assert_eq!(describe(&files[0]), vec![(1, 0), (2, 0)]);
    assert_eq!(describe(&files[1]), vec![(3, 0), (4, 0)]);
    assert_eq!(describe(&files[2]), vec![(5, 0)]);
}

#[test]
fn scenario_rotation_is_written_to_export() {
    let mut session = session_with(5);
    session.toggle_split(1);
    session.toggle_split(3);
    session.rotate(2, RotateDirection::Right);

    let files = export_all(&session);
    assert_eq!(describe(&files[1]), vec![(3, 90), (4, 0)]);
}

#[test]
fn scenario_duplicate_lands_in_original_section() {
    let mut session = session_with(5);
    session.toggle_split(1);
    session.toggle_split(3);
    session.duplicate(1);

    assert_eq!(session.arrangement().order(), &[0, 1, 1, 2, 3, 4]);
    let files = export_all(&session);
    assert_eq!(files.len(), 3);
    assert_eq!(describe(&files[0]), vec![(1, 0), (2, 0), (2, 0)]);
    assert_eq!(describe(&files[1]), vec![(3, 0), (4, 0)]);
}

#[test]
fn scenario_duplicates_share_rotation() {
    let mut session = session_with(3);
    session.duplicate(0);
    session.rotate(0, RotateDirection::Left);

    let files = export_all(&session);
    assert_eq!(describe(&files[0]), vec![(1, 270), (1, 270), (2, 0), (3, 0)]);
}

#[test]
fn scenario_skipped_sections_leave_no_gaps() {
    let mut session = session_with(5);
    session.toggle_split(1);
    session.toggle_split(3);
    session.toggle_skip(0);
    session.toggle_skip(1);

    let files = export_all(&session);
    assert_eq!(filenames(&files), vec!["split_1.pdf"]);
    assert_eq!(describe(&files[0]), vec![(5, 0)]);
}

#[test]
fn scenario_everything_deleted_exports_nothing() {
    let mut session = session_with(3);
    while !session.arrangement().is_empty() {
        session.delete(0);
    }

    let mut files: Vec<OutputFile> = Vec::new();
    let summary = session.export(&mut files, &mut NoProgress).unwrap();
    assert!(files.is_empty());
    assert_eq!(summary.page_count, 0);
}

#[test]
fn scenario_reordered_pages_export_in_slot_order() {
    let mut session = session_with(4);
    session.move_slot(3, 0);
    session.toggle_split(1);

    let files = export_all(&session);
    assert_eq!(describe(&files[0]), vec![(4, 0), (1, 0)]);
    assert_eq!(describe(&files[1]), vec![(2, 0), (3, 0)]);
}

#[test]
fn scenario_interval_mode() {
    let mut session = session_with(5);
    session.toggle_split(0);
    session.set_interval(2).unwrap();

    let files = export_all(&session);
    let pages: Vec<usize> = files.iter().map(|file| file.page_count).collect();
    assert_eq!(pages, vec![2, 2, 1]);
    assert_eq!(describe(&files[2]), vec![(5, 0)]);
}

#[test]
fn scenario_progress_reports_every_file() {
    let mut session = session_with(6);
    session.split_after_pages("2, 4").unwrap();

    let mut seen = Vec::new();
    let mut files: Vec<OutputFile> = Vec::new();
    let summary = session
        .export(&mut files, &mut |current: usize, total: usize, name: &str| {
            seen.push(format!("{}/{} {}", current, total, name))
        })
        .unwrap();

    assert_eq!(
        seen,
        vec!["1/3 split_1.pdf", "2/3 split_2.pdf", "3/3 split_3.pdf"]
    );
    assert_eq!(summary.files.len(), 3);
    assert_eq!(
        summary.output_size_bytes,
        files.iter().map(|file| file.bytes.len()).sum::<usize>()
    );
}

#[test]
fn scenario_invalid_upload_leaves_session_empty() {
    init_tracing();
    let mut session = SplitSession::new(LopdfCodec::new(), SplitConfig::default());
    let result = session.load(b"%PDF-1.7 but not really");
    assert!(matches!(result, Err(PdfSplitError::ParseError(_))));
    assert!(!session.is_loaded());

    let mut files: Vec<OutputFile> = Vec::new();
    assert!(matches!(
        session.export(&mut files, &mut NoProgress),
        Err(PdfSplitError::NoDocument)
    ));
}
