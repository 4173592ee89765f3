use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tocforge::toc::BookStatus;
use tocforge::{
    ChainState, Epub, EpubError, Resolver, ResolverConfig, StrategyKind, TocItem, process_batch, resolve_file,
};
use zip::ZipWriter;
use zip::write::FileOptions;

const CONTAINER_XML: &str = r#"<?xml version="1.0"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
    <rootfiles>
        <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
    </rootfiles>
</container>"#;

const NCX_OPF: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<package version="2.0" xmlns="http://www.idpf.org/2007/opf" unique-identifier="BookId">
    <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
        <dc:title>三体</dc:title>
        <dc:creator>刘慈欣</dc:creator>
        <dc:language>zh</dc:language>
        <dc:identifier id="BookId">urn:isbn:9787536692930</dc:identifier>
    </metadata>
    <manifest>
        <item id="ncx" href="toc.ncx" media-type="application/x-dtbncx+xml"/>
        <item id="ch1" href="text/ch1.xhtml" media-type="application/xhtml+xml"/>
        <item id="ch2" href="text/ch2.xhtml" media-type="application/xhtml+xml"/>
    </manifest>
    <spine toc="ncx">
        <itemref idref="ch1"/>
        <itemref idref="ch2"/>
    </spine>
</package>"#;

const NCX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">
    <head><meta name="dtb:uid" content="urn:isbn:9787536692930"/></head>
    <docTitle><text>三体</text></docTitle>
    <navMap>
        <navPoint id="np1" playOrder="1">
            <navLabel><text>第一章 疯狂年代</text></navLabel>
            <content src="text/ch1.xhtml"/>
            <navPoint id="np2" playOrder="2">
                <navLabel><text>第一节</text></navLabel>
                <content src="text/ch1.xhtml#s1"/>
            </navPoint>
        </navPoint>
        <navPoint id="np3" playOrder="3">
            <navLabel><text>第二章 寂静的春天</text></navLabel>
            <content src="text/ch2.xhtml"/>
        </navPoint>
    </navMap>
</ncx>"#;

const SPINE_ONLY_OPF: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<package version="3.0" xmlns="http://www.idpf.org/2007/opf">
    <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
        <dc:title>No Navigation</dc:title>
        <meta property="dcterms:modified">2024-03-01T08:00:00Z</meta>
    </metadata>
    <manifest>
        <item id="a" href="a.xhtml" media-type="application/xhtml+xml"/>
        <item id="b" href="b.xhtml" media-type="application/xhtml+xml"/>
    </manifest>
    <spine>
        <itemref idref="a"/>
        <itemref idref="b"/>
    </spine>
</package>"#;

/// 在目录中写出一个EPUB文件，条目按给定顺序写入
fn write_epub(dir: &Path, name: &str, entries: &[(&str, &str)]) -> PathBuf {
    let path = dir.join(name);
    let file = File::create(&path).unwrap();
    let mut zip = ZipWriter::new(file);

    zip.start_file("mimetype", FileOptions::<()>::default()).unwrap();
    zip.write_all(b"application/epub+zip").unwrap();
    zip.start_file("META-INF/container.xml", FileOptions::<()>::default()).unwrap();
    zip.write_all(CONTAINER_XML.as_bytes()).unwrap();

    for (entry, content) in entries {
        zip.start_file(*entry, FileOptions::<()>::default()).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }

    zip.finish().unwrap();
    path
}

fn ncx_book(dir: &Path, name: &str) -> PathBuf {
    write_epub(
        dir,
        name,
        &[
            ("OEBPS/content.opf", NCX_OPF),
            ("OEBPS/toc.ncx", NCX),
            ("OEBPS/text/ch1.xhtml", "<html><body><h1>第一章</h1><p id=\"s1\">…</p></body></html>"),
            ("OEBPS/text/ch2.xhtml", "<html><body><h1>第二章</h1></body></html>"),
        ],
    )
}

fn spine_book(dir: &Path, name: &str) -> PathBuf {
    write_epub(
        dir,
        name,
        &[
            ("OEBPS/content.opf", SPINE_ONLY_OPF),
            ("OEBPS/a.xhtml", "<html><body><h2>Opening</h2></body></html>"),
            ("OEBPS/b.xhtml", "<html><body><p>No heading here.</p></body></html>"),
        ],
    )
}

#[test]
fn test_resolve_ncx_book() {
    let dir = TempDir::new().unwrap();
    let path = ncx_book(dir.path(), "santi.epub");

    let resolution = resolve_file(&path, ResolverConfig::default()).unwrap();
    assert_eq!(resolution.state, ChainState::Accepted(StrategyKind::Ncx));
    assert_eq!(
        resolution.toc,
        vec![
            TocItem::new("第一章 疯狂年代", "OEBPS/text/ch1.xhtml", 0)
                .with_children(vec![TocItem::new("第一节", "OEBPS/text/ch1.xhtml#s1", 1)]),
            TocItem::new("第二章 寂静的春天", "OEBPS/text/ch2.xhtml", 0),
        ]
    );

    assert_eq!(resolution.metadata.title.as_deref(), Some("三体"));
    assert_eq!(resolution.metadata.authors, vec!["刘慈欣".to_string()]);
    assert_eq!(resolution.metadata.epub_version.as_deref(), Some("2.0"));
    assert!(resolution.metadata.file_size.is_some_and(|size| size > 0));
}

#[test]
fn test_resolve_spine_only_book() {
    let dir = TempDir::new().unwrap();
    let path = spine_book(dir.path(), "plain.epub");

    let mut epub = Epub::open(&path).unwrap();
    let resolution = Resolver::new(ResolverConfig::default()).unwrap().resolve(&mut epub).unwrap();

    assert_eq!(resolution.accepted_strategy(), Some(StrategyKind::Spine));
    let titles: Vec<&str> = resolution.toc.iter().map(|item| item.title.as_str()).collect();
    assert_eq!(titles, vec!["Opening", "Section 2"]);
    assert_eq!(resolution.outcomes.len(), 4);
    assert_eq!(resolution.metadata.modified.as_deref(), Some("2024-03-01T08:00:00Z"));
}

#[test]
fn test_saved_json_preserves_unicode_and_round_trips() {
    let dir = TempDir::new().unwrap();
    let path = ncx_book(dir.path(), "santi.epub");
    let resolution = resolve_file(&path, ResolverConfig::default()).unwrap();

    let output = dir.path().join("out").join("santi_toc.json");
    resolution.save_json(&output).unwrap();

    let content = fs::read_to_string(&output).unwrap();
    assert!(content.contains("第一章 疯狂年代"));

    let value: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert_eq!(value["metadata"]["language"], "zh");
    assert!(value["metadata"]["publisher"].is_null());

    let toc: Vec<TocItem> = serde_json::from_value(value["toc"].clone()).unwrap();
    assert_eq!(toc, resolution.toc);
}

#[test]
fn test_invalid_inputs() {
    let dir = TempDir::new().unwrap();

    let no_container = dir.path().join("broken.epub");
    {
        let mut zip = ZipWriter::new(File::create(&no_container).unwrap());
        zip.start_file("mimetype", FileOptions::<()>::default()).unwrap();
        zip.write_all(b"application/epub+zip").unwrap();
        zip.finish().unwrap();
    }
    assert!(matches!(Epub::open(&no_container), Err(EpubError::InvalidEpub(_))));

    let not_zip = dir.path().join("text.epub");
    fs::write(&not_zip, "not a zip archive").unwrap();
    assert!(matches!(Epub::open(&not_zip), Err(EpubError::Zip(_))));
}

#[test]
fn test_batch_writes_outputs_and_report() {
    let dir = TempDir::new().unwrap();
    let paths = vec![
        ncx_book(dir.path(), "santi.epub"),
        spine_book(dir.path(), "plain.epub"),
        dir.path().join("missing.epub"),
    ];
    let output_dir = dir.path().join("toc");

    let resolver = Resolver::new(ResolverConfig::default()).unwrap();
    let report = process_batch(&resolver, &paths, Some(&output_dir)).unwrap();

    assert_eq!(report.total_files, 3);
    assert_eq!(report.successful, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(report.results[0].strategy, Some(StrategyKind::Ncx));
    assert_eq!(report.results[1].strategy, Some(StrategyKind::Spine));
    assert_eq!(report.results[2].status, BookStatus::Failed);

    assert!(output_dir.join("santi_toc.json").exists());
    assert!(output_dir.join("plain_toc.json").exists());

    let tally = report.strategy_tally.get(StrategyKind::Ncx).unwrap();
    assert_eq!((tally.attempts, tally.accepted, tally.rejected), (2, 1, 1));

    let saved: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(output_dir.join("processing_report.json")).unwrap()).unwrap();
    assert_eq!(saved["total_files"], 3);
    assert_eq!(saved["results"][2]["status"], "failed");
    assert_eq!(saved["strategy_tally"]["spine"]["accepted"], 1);
}

#[test]
fn test_batch_same_file_names_in_different_folders() {
    let dir = TempDir::new().unwrap();
    let first_dir = dir.path().join("a");
    let second_dir = dir.path().join("b");
    fs::create_dir_all(&first_dir).unwrap();
    fs::create_dir_all(&second_dir).unwrap();
    let paths = vec![ncx_book(&first_dir, "book.epub"), spine_book(&second_dir, "book.epub")];
    let output_dir = dir.path().join("out");

    let resolver = Resolver::new(ResolverConfig::default()).unwrap();
    let report = process_batch(&resolver, &paths, Some(&output_dir)).unwrap();
    assert_eq!(report.successful, 2);

    let outputs: Vec<&str> = report.results.iter().filter_map(|result| result.output.as_deref()).collect();
    assert_eq!(outputs.len(), 2);
    assert_ne!(outputs[0], outputs[1]);

    let first: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(output_dir.join("book_toc.json")).unwrap()).unwrap();
    let second: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(output_dir.join("book_2_toc.json")).unwrap()).unwrap();
    assert_eq!(first["metadata"]["title"], "三体");
    assert_eq!(second["metadata"]["title"], "No Navigation");
}
