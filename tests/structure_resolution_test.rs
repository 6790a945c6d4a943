use pagerat::archive::MemoryArchive;
use pagerat::structure::CONTAINER_PATH;
use pagerat::test_utils::test_helpers::sample_archive;
use pagerat::{resolve_toc, Book, BookError, ChapterEntry};

const CONTAINER: &str = r#"<?xml version="1.0"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles><rootfile full-path="OEBPS/book.opf" media-type="application/oebps-package+xml"/></rootfiles>
</container>"#;

const CHAPTER: &str = "<html><body><p>It begins.</p></body></html>";

fn pairs(entries: &[ChapterEntry]) -> Vec<(String, Option<String>)> {
    entries
        .iter()
        .map(|e| (e.title.clone(), e.content_path.clone()))
        .collect()
}

fn legacy_package() -> MemoryArchive {
    MemoryArchive::new()
        .with_entry(CONTAINER_PATH, CONTAINER)
        .with_entry(
            "OEBPS/book.opf",
            r#"<?xml version="1.0"?>
<package xmlns="http://www.idpf.org/2007/opf" version="2.0">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/"><dc:title>A Small Book</dc:title></metadata>
  <manifest>
    <item id="ch1" href="ch1.xhtml" media-type="application/xhtml+xml"/>
    <item id="ch2" href="ch2.xhtml" media-type="application/xhtml+xml"/>
    <item id="ncx" href="toc.ncx" media-type="application/x-dtbncx+xml"/>
  </manifest>
  <spine toc="ncx"><itemref idref="ch1"/><itemref idref="ch2"/></spine>
</package>"#,
        )
        .with_entry(
            "OEBPS/toc.ncx",
            r#"<?xml version="1.0"?>
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">
  <navMap>
    <navPoint id="n1" playOrder="1"><navLabel><text>Chapter One</text></navLabel><content src="ch1.xhtml"/></navPoint>
    <navPoint id="n2" playOrder="2"><navLabel><text>Chapter Two</text></navLabel><content src="ch2.xhtml#start"/></navPoint>
  </navMap>
</ncx>"#,
        )
        .with_entry("OEBPS/ch1.xhtml", CHAPTER)
        .with_entry("OEBPS/ch2.xhtml", CHAPTER)
}

fn modern_package() -> MemoryArchive {
    MemoryArchive::new()
        .with_entry(CONTAINER_PATH, CONTAINER)
        .with_entry(
            "OEBPS/book.opf",
            r#"<?xml version="1.0"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/"><dc:title>A Small Book</dc:title></metadata>
  <manifest>
    <item id="nav" href="nav/toc.xhtml" media-type="application/xhtml+xml" properties="nav"/>
    <item id="ch1" href="ch1.xhtml" media-type="application/xhtml+xml"/>
    <item id="ch2" href="ch2.xhtml" media-type="application/xhtml+xml"/>
  </manifest>
  <spine><itemref idref="ch1"/><itemref idref="ch2"/></spine>
</package>"#,
        )
        .with_entry(
            "OEBPS/nav/toc.xhtml",
            r#"<?xml version="1.0"?>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops">
<body>
  <nav epub:type="landmarks"><ol><li><a href="../ch2.xhtml">Start reading</a></li></ol></nav>
  <nav epub:type="toc"><ol>
    <li><a href="../ch1.xhtml">Chapter One</a></li>
    <li><a href="../ch2.xhtml#start">Chapter Two</a></li>
  </ol></nav>
</body></html>"#,
        )
        .with_entry("OEBPS/ch1.xhtml", CHAPTER)
        .with_entry("OEBPS/ch2.xhtml", CHAPTER)
}

#[test]
fn single_chapter_with_ncx_resolves_to_title_and_chapter() {
    let archive = MemoryArchive::new()
        .with_entry(CONTAINER_PATH, CONTAINER)
        .with_entry(
            "OEBPS/book.opf",
            r#"<package><metadata><dc:title>The Title</dc:title></metadata>
<manifest>
  <item id="c1" href="ch1.xhtml" media-type="application/xhtml+xml"/>
  <item id="ncx" href="toc.ncx" media-type="application/x-dtbncx+xml"/>
</manifest>
<spine toc="ncx"><itemref idref="c1"/></spine></package>"#,
        )
        .with_entry(
            "OEBPS/toc.ncx",
            r#"<ncx><navMap><navPoint><navLabel><text>Chapter One</text></navLabel><content src="ch1.xhtml"/></navPoint></navMap></ncx>"#,
        )
        .with_entry("OEBPS/ch1.xhtml", CHAPTER);

    let toc = resolve_toc(&archive).unwrap();
    assert_eq!(
        pairs(&toc),
        vec![
            ("The Title".to_string(), None),
            ("Chapter One".to_string(), Some("OEBPS/ch1.xhtml".to_string())),
        ]
    );
}

#[test]
fn legacy_and_modern_encodings_agree() {
    let legacy = resolve_toc(&legacy_package()).unwrap();
    let modern = resolve_toc(&modern_package()).unwrap();

    assert_eq!(pairs(&legacy), pairs(&modern));
    assert_eq!(
        pairs(&modern)[1..],
        [
            ("Chapter One".to_string(), Some("OEBPS/ch1.xhtml".to_string())),
            ("Chapter Two".to_string(), Some("OEBPS/ch2.xhtml".to_string())),
        ]
    );
}

#[test]
fn toc_has_one_entry_per_spine_item_plus_title() {
    for chapters in [1, 2, 7, 20] {
        let toc = resolve_toc(&sample_archive(chapters, 1)).unwrap();
        assert_eq!(toc.len(), chapters + 1);
        assert_eq!(toc[0].content_path, None);
        for (i, entry) in toc.iter().enumerate().skip(1) {
            assert_eq!(
                entry.content_path.as_deref(),
                Some(format!("OEBPS/text/ch{i}.xhtml").as_str())
            );
        }
    }
}

#[test]
fn spine_order_wins_over_navmap_order() {
    let mut archive = legacy_package();
    archive.insert(
        "OEBPS/book.opf",
        r#"<package><metadata><dc:title>A Small Book</dc:title></metadata>
<manifest>
  <item id="ch1" href="ch1.xhtml" media-type="application/xhtml+xml"/>
  <item id="ch2" href="ch2.xhtml" media-type="application/xhtml+xml"/>
  <item id="ncx" href="toc.ncx" media-type="application/x-dtbncx+xml"/>
</manifest>
<spine toc="ncx"><itemref idref="ch2"/><itemref idref="ch1"/></spine></package>"#,
    );

    let toc = resolve_toc(&archive).unwrap();
    assert_eq!(toc[1].title, "Chapter Two");
    assert_eq!(toc[2].title, "Chapter One");
}

#[test]
fn missing_container_is_package_invalid() {
    let archive = MemoryArchive::new().with_entry("OEBPS/book.opf", "<package/>");
    assert!(matches!(
        Book::from_archive(archive),
        Err(BookError::PackageInvalid(_))
    ));
}

#[test]
fn chapter_missing_from_archive_renders_empty() {
    let mut archive = legacy_package();
    archive.remove("OEBPS/ch2.xhtml");
    let book = Book::from_archive(archive).unwrap();

    assert_eq!(book.render_chapter(1, Some(40)).lines, vec!["It begins."]);
    assert!(book.render_chapter(2, Some(40)).is_empty());
}
