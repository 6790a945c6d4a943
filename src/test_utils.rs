pub mod test_helpers {
    use std::io::{Cursor, Write};

    use crate::archive::MemoryArchive;
    use crate::book::Book;
    use crate::event_source::{Event, KeyCode, KeyEvent, KeyModifiers, SimulatedEventSource};
    use crate::structure::CONTAINER_PATH;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use zip::write::FileOptions;

    /// Builder for creating test scenarios with simulated user input
    pub struct TestScenarioBuilder {
        events: Vec<Event>,
        idle_polls: usize,
    }

    impl Default for TestScenarioBuilder {
        fn default() -> Self {
            Self::new()
        }
    }

    impl TestScenarioBuilder {
        pub fn new() -> Self {
            Self {
                events: Vec::new(),
                idle_polls: 0,
            }
        }

        pub fn press_char(mut self, c: char) -> Self {
            self.events.push(SimulatedEventSource::char_key(c));
            self
        }

        pub fn press_key(mut self, code: KeyCode) -> Self {
            self.events
                .push(SimulatedEventSource::key_event(code, KeyModifiers::empty()));
            self
        }

        pub fn press_tab(self) -> Self {
            self.press_key(KeyCode::Tab)
        }

        /// Type a chapter number digit by digit
        pub fn type_number(mut self, number: &str) -> Self {
            for c in number.chars() {
                self.events.push(SimulatedEventSource::char_key(c));
            }
            self
        }

        /// Navigate down n times (press 'j' n times)
        pub fn navigate_down(mut self, times: usize) -> Self {
            for _ in 0..times {
                self.events.push(SimulatedEventSource::char_key('j'));
            }
            self
        }

        /// Navigate up n times (press 'k' n times)
        pub fn navigate_up(mut self, times: usize) -> Self {
            for _ in 0..times {
                self.events.push(SimulatedEventSource::char_key('k'));
            }
            self
        }

        pub fn page_down(self) -> Self {
            self.press_key(KeyCode::PageDown)
        }

        pub fn resize(mut self, width: u16, height: u16) -> Self {
            self.events.push(Event::Resize(width, height));
            self
        }

        /// Quit the application (press 'q')
        pub fn quit(self) -> Self {
            self.press_char('q')
        }

        /// Leave the keyboard alone for `polls` poll timeouts after the last
        /// event before the implicit quit.
        pub fn then_idle(mut self, polls: usize) -> Self {
            self.idle_polls = polls;
            self
        }

        pub fn build(self) -> SimulatedEventSource {
            SimulatedEventSource::new(self.events).with_idle_polls(self.idle_polls)
        }
    }

    /// Create a test terminal for snapshot testing
    pub fn create_test_terminal(width: u16, height: u16) -> Terminal<TestBackend> {
        let backend = TestBackend::new(width, height);
        Terminal::new(backend).unwrap()
    }

    /// Capture the current terminal buffer as a string
    pub fn capture_terminal_state(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let mut lines = Vec::new();

        for y in 0..buffer.area.height {
            let mut line = String::new();
            for x in 0..buffer.area.width {
                line.push_str(buffer[(x, y)].symbol());
            }
            lines.push(line.trim_end().to_string());
        }

        while lines.last().map(|l| l.is_empty()).unwrap_or(false) {
            lines.pop();
        }

        lines.join("\n")
    }

    pub fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    /// Entries of a package using an NCX table of contents with `chapters`
    /// chapters of `paragraphs` one-line paragraphs each. Chapter `i` lives at
    /// `OEBPS/text/ch{i}.xhtml` and is titled `Chapter {i}`.
    pub fn sample_entries(chapters: usize, paragraphs: usize) -> Vec<(String, String)> {
        let mut manifest = String::new();
        let mut spine = String::new();
        let mut nav_points = String::new();
        let mut entries = vec![(
            CONTAINER_PATH.to_string(),
            r#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
    <rootfiles>
        <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
    </rootfiles>
</container>"#
                .to_string(),
        )];

        for i in 1..=chapters {
            manifest.push_str(&format!(
                r#"<item id="ch{i}" href="text/ch{i}.xhtml" media-type="application/xhtml+xml"/>"#
            ));
            spine.push_str(&format!(r#"<itemref idref="ch{i}"/>"#));
            nav_points.push_str(&format!(
                r#"<navPoint id="np{i}" playOrder="{i}"><navLabel><text>Chapter {i}</text></navLabel><content src="text/ch{i}.xhtml"/></navPoint>"#
            ));

            let body: String = (1..=paragraphs)
                .map(|p| format!("<p>Chapter {i} paragraph {p}.</p>\n"))
                .collect();
            entries.push((
                format!("OEBPS/text/ch{i}.xhtml"),
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8"?>
<html xmlns="http://www.w3.org/1999/xhtml"><head><title>Chapter {i}</title></head>
<body>
{body}</body></html>"#
                ),
            ));
        }

        entries.push((
            "OEBPS/content.opf".to_string(),
            format!(
                r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" unique-identifier="bookid" version="2.0">
    <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
        <dc:title>Sample Book</dc:title>
        <dc:identifier id="bookid">sample-1</dc:identifier>
    </metadata>
    <manifest>
        {manifest}
        <item id="ncx" href="toc.ncx" media-type="application/x-dtbncx+xml"/>
    </manifest>
    <spine toc="ncx">{spine}</spine>
</package>"#
            ),
        ));
        entries.push((
            "OEBPS/toc.ncx".to_string(),
            format!(
                r#"<?xml version="1.0" encoding="UTF-8"?>
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">
    <docTitle><text>Sample Book</text></docTitle>
    <navMap>{nav_points}</navMap>
</ncx>"#
            ),
        ));
        entries
    }

    pub fn sample_archive(chapters: usize, paragraphs: usize) -> MemoryArchive {
        let mut archive = MemoryArchive::new();
        for (path, content) in sample_entries(chapters, paragraphs) {
            archive.insert(&path, content);
        }
        archive
    }

    pub fn sample_book(chapters: usize, paragraphs: usize) -> Book {
        Book::from_archive(sample_archive(chapters, paragraphs)).unwrap()
    }

    /// Zip `entries` into the bytes of a package file.
    pub fn zip_entries(entries: &[(String, String)]) -> Vec<u8> {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let stored = FileOptions::default().compression_method(zip::CompressionMethod::Stored);
        zip.start_file("mimetype", stored).unwrap();
        zip.write_all(b"application/epub+zip").unwrap();
        for (path, content) in entries {
            zip.start_file(path.as_str(), FileOptions::default()).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }
}
