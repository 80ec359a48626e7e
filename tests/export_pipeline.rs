use kobo_export::app::{self, Extraction};
use kobo_export::config::{CliArgs, Config};
use kobo_export::notion::{Block, DocumentRef, NewBlock, Workspace};
use kobo_export::sync::SyncResult;
use rusqlite::{params, Connection};
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Writes a small KoboReader.sqlite with two books and a mix of kinds.
fn create_kobo_db(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("KoboReader.sqlite");
    let conn = Connection::open(&path).unwrap();

    conn.execute_batch(
        "CREATE TABLE content (
            ContentID TEXT PRIMARY KEY,
            BookTitle TEXT,
            Title TEXT,
            Attribution TEXT
        );
        CREATE TABLE Bookmark (
            BookmarkID TEXT PRIMARY KEY,
            VolumeID TEXT NOT NULL,
            Text TEXT,
            Annotation TEXT,
            ExtraAnnotationData BLOB,
            DateCreated TEXT,
            DateModified TEXT
        );",
    )
    .unwrap();

    conn.execute(
        "INSERT INTO content VALUES ('vol-dune', 'Dune', 'Dune', 'Frank Herbert')",
        [],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO content VALUES ('vol-walden', 'Walden', 'Walden', 'Henry David Thoreau')",
        [],
    )
    .unwrap();

    let rows: [(&str, &str, Option<&str>, Option<&str>, Option<&str>); 4] = [
        ("1", "vol-dune", Some("Fear is the mind-killer."), None, Some("2014-12-19T19:54:11.000")),
        ("2", "vol-dune", Some("The spice must flow."), Some("classic"), Some("2014-12-20T08:00:00.000")),
        ("3", "vol-walden", Some("Simplify, simplify."), None, None),
        ("4", "vol-walden", None, None, Some("2015-03-01T10:00:00.000")),
    ];
    for (id, volume, text, note, created) in rows {
        conn.execute(
            "INSERT INTO Bookmark (BookmarkID, VolumeID, Text, Annotation, DateCreated, DateModified)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
            params![id, volume, text, note, created],
        )
        .unwrap();
    }

    path
}

fn config(db: &Path, f: impl FnOnce(&mut CliArgs)) -> Config {
    let mut cli = CliArgs {
        db: db.to_path_buf(),
        ..Default::default()
    };
    f(&mut cli);
    Config::from_args(cli, |_| None).unwrap()
}

fn extract(db: &Path, f: impl FnOnce(&mut CliArgs)) -> Extraction {
    app::extract(&config(db, f)).unwrap()
}

#[test]
fn test_human_output_skips_bookmarks() {
    let dir = TempDir::new().unwrap();
    let db = create_kobo_db(&dir);

    let extraction = extract(&db, |_| {});

    assert_eq!(extraction.records.as_ref().unwrap().len(), 3);
    assert_eq!(extraction.output.matches("Type:").count(), 3);
    assert!(extraction.output.contains("Annotation:\n=== === ===\nclassic\n=== === ==="));
    assert!(extraction.output.contains("Date created:   1970-01-01T00:00:00.000"));
}

#[test]
fn test_kindle_output_for_one_book() {
    let dir = TempDir::new().unwrap();
    let db = create_kobo_db(&dir);

    let extraction = extract(&db, |cli| {
        cli.kindle = true;
        cli.book = Some("Dune".to_string());
        cli.highlights_only = true;
    });

    assert_eq!(
        extraction.output,
        "Dune (Frank Herbert)\n\
         - Your Highlight on page 1 | location 1 | Added on Friday, 19 December 2014 19:54:11\n\
         \n\
         Fear is the mind-killer.\n\
         =========="
    );
}

#[test]
fn test_csv_output_by_book_id() {
    let dir = TempDir::new().unwrap();
    let db = create_kobo_db(&dir);

    // books are ordered by title: 1 = Dune, 2 = Walden
    let extraction = extract(&db, |cli| {
        cli.csv = true;
        cli.bookid = Some("2".to_string());
    });

    assert_eq!(
        extraction.output,
        "highlight,Walden,Henry David Thoreau,1970-01-01T00:00:00.000,1970-01-01T00:00:00.000,,\"Simplify, simplify.\"\r\n"
    );
}

#[test]
fn test_book_id_out_of_range_is_rejected() {
    let dir = TempDir::new().unwrap();
    let db = create_kobo_db(&dir);

    let result = app::extract(&config(&db, |cli| cli.bookid = Some("9".to_string())));

    let message = result.unwrap_err().to_string();
    assert_eq!(message, "The bookid value must be an integer between 1 and 2");
}

#[test]
fn test_list_mode() {
    let dir = TempDir::new().unwrap();
    let db = create_kobo_db(&dir);

    let extraction = extract(&db, |cli| cli.list = true);

    assert!(extraction.records.is_none());
    assert_eq!(
        extraction.output,
        "ID\tTITLE\tAUTHOR\n1\tDune\tFrank Herbert\n2\tWalden\tHenry David Thoreau"
    );
}

#[test]
fn test_run_writes_output_file() {
    let dir = TempDir::new().unwrap();
    let db = create_kobo_db(&dir);
    let out = dir.path().join("highlights.txt");

    let cfg = config(&db, |cli| {
        cli.raw = true;
        cli.output = Some(out.clone());
    });
    app::run(&cfg).unwrap();

    let written = fs::read_to_string(&out).unwrap();
    assert_eq!(
        written,
        "Fear is the mind-killer.\n\nThe spice must flow.\n\nSimplify, simplify.\n"
    );
}

fn add_accented_highlight(db: &Path) {
    let conn = Connection::open(db).unwrap();
    conn.execute(
        "INSERT INTO content VALUES ('vol-cafe', 'Café', 'Café society', 'Zoë Brontë')",
        [],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO Bookmark (BookmarkID, VolumeID, Text, DateCreated)
         VALUES ('5', 'vol-cafe', 'Un café crème, s''il vous plaît.', '2016-05-04T09:08:07.000')",
        [],
    )
    .unwrap();
}

#[test]
fn test_ascii_output_replaces_non_ascii_in_every_format() {
    let dir = TempDir::new().unwrap();
    let db = create_kobo_db(&dir);
    add_accented_highlight(&db);

    let formats: [(&str, fn(&mut CliArgs)); 3] = [
        ("human", |_| {}),
        ("kindle", |cli| cli.kindle = true),
        ("raw", |cli| cli.raw = true),
    ];

    for (name, pick) in formats {
        let out = dir.path().join(format!("{}.txt", name));
        let cfg = config(&db, |cli| {
            pick(cli);
            cli.ascii = true;
            cli.book = Some("Café society".to_string());
            cli.output = Some(out.clone());
        });

        app::run(&cfg).unwrap();

        let written = fs::read_to_string(&out).unwrap();
        assert!(written.is_ascii(), "{} output is not ASCII: {}", name, written);
        assert!(written.contains("Un caf? cr?me, s'il vous pla?t."), "{}", name);
    }
}

#[test]
fn test_utf8_output_keeps_accents() {
    let dir = TempDir::new().unwrap();
    let db = create_kobo_db(&dir);
    add_accented_highlight(&db);
    let out = dir.path().join("kindle.txt");

    let cfg = config(&db, |cli| {
        cli.kindle = true;
        cli.book = Some("Café society".to_string());
        cli.output = Some(out.clone());
    });
    app::run(&cfg).unwrap();

    let written = fs::read_to_string(&out).unwrap();
    assert!(written.starts_with("Café society (Zoë Brontë)\n"));
    assert!(written.contains("Un café crème"));
}

#[derive(Default)]
struct MemoryWorkspace {
    appended: RefCell<Vec<(String, Vec<NewBlock>)>>,
}

impl Workspace for MemoryWorkspace {
    fn find_documents(&self, title: &str) -> SyncResult<Vec<DocumentRef>> {
        Ok(if title == "Dune" {
            vec![DocumentRef {
                id: "page-dune".to_string(),
            }]
        } else {
            Vec::new()
        })
    }

    fn list_children(&self, _block_id: &str) -> SyncResult<Vec<Block>> {
        Ok(vec![Block::heading_3("section", "Highlights")])
    }

    fn append_children(&self, block_id: &str, children: &[NewBlock]) -> SyncResult<Vec<Block>> {
        self.appended
            .borrow_mut()
            .push((block_id.to_string(), children.to_vec()));
        Ok(Vec::new())
    }
}

#[test]
fn test_export_appends_only_target_book() {
    let dir = TempDir::new().unwrap();
    let db = create_kobo_db(&dir);
    let extraction = extract(&db, |_| {});
    let workspace = MemoryWorkspace::default();

    let report = app::export(&workspace, "Dune", extraction.records.as_deref().unwrap()).unwrap();

    assert_eq!(report.appended, 2);
    let appended = workspace.appended.borrow();
    assert_eq!(appended.len(), 1);
    assert_eq!(appended[0].0, "section");
    let texts: Vec<&str> = appended[0].1.iter().map(|b| b.text()).collect();
    assert_eq!(texts, vec!["Fear is the mind-killer.", "The spice must flow."]);
}

#[test]
fn test_export_unknown_document_leaves_workspace_untouched() {
    let dir = TempDir::new().unwrap();
    let db = create_kobo_db(&dir);
    let extraction = extract(&db, |_| {});
    let workspace = MemoryWorkspace::default();

    let result = app::export(&workspace, "Walden", extraction.records.as_deref().unwrap());

    assert!(result.is_err());
    assert!(workspace.appended.borrow().is_empty());
}
