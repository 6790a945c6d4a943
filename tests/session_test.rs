use std::fs;

use pagerat::event_source::KeyCode;
use pagerat::system_command::MockSystemCommandExecutor;
use pagerat::test_utils::test_helpers::*;
use pagerat::{run_app_with_event_source, App, Book, Mode, Navigator, Viewport};
use tempfile::TempDir;

fn app_for(book: Book, width: u16, height: u16, show_status: bool) -> App {
    let navigator = Navigator::new(book, Viewport { width, height }, None, show_status);
    App::new(navigator, Box::new(MockSystemCommandExecutor::new()))
}

#[test]
fn reading_a_zipped_book_from_disk() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sample.epub");
    fs::write(&path, zip_entries(&sample_entries(3, 10))).unwrap();
    let book = Book::open(&path).unwrap();

    let mut terminal = create_test_terminal(50, 10);
    let mut app = app_for(book, 50, 10, true);
    let mut events = TestScenarioBuilder::new()
        .navigate_down(2)
        .press_tab()
        .page_down()
        .build();

    run_app_with_event_source(&mut terminal, &mut app, &mut events).unwrap();

    let screen = capture_terminal_state(&terminal);
    let lines: Vec<&str> = screen.lines().collect();
    assert_eq!(lines[0], "Chapter 3 paragraph 5.");
    assert_eq!(
        lines.last().copied(),
        Some("Chapter 3 (  3/  3)          Page   2/  3 ( 42.1%)")
    );
}

#[test]
fn returning_to_contents_keeps_chapter_position() {
    let mut terminal = create_test_terminal(50, 10);
    let mut app = app_for(sample_book(3, 10), 50, 10, true);
    let mut events = TestScenarioBuilder::new()
        .press_tab()
        .navigate_down(3)
        .press_tab()
        .navigate_down(1)
        .press_tab()
        .press_key(KeyCode::Left)
        .navigate_up(1)
        .press_key(KeyCode::Right)
        .build();

    run_app_with_event_source(&mut terminal, &mut app, &mut events).unwrap();

    assert_eq!(app.navigator.mode(), Mode::Chapter);
    assert_eq!(app.navigator.current_chapter(), Some(1));
    assert_eq!(app.navigator.chapter_offset(1), 3);
    assert_eq!(app.navigator.chapter_offset(2), 0);
}

#[test]
fn hidden_status_leaves_bottom_row_for_text() {
    let mut terminal = create_test_terminal(50, 4);
    let mut app = app_for(sample_book(1, 10), 50, 4, false);
    let mut events = TestScenarioBuilder::new().press_tab().build();

    run_app_with_event_source(&mut terminal, &mut app, &mut events).unwrap();

    assert_eq!(
        capture_terminal_state(&terminal),
        "Chapter 1 paragraph 1.\n\nChapter 1 paragraph 2."
    );
}

#[test]
fn pending_chapter_number_is_shown_until_completed() {
    let mut terminal = create_test_terminal(50, 10);
    let mut app = app_for(sample_book(15, 1), 50, 10, true);
    let mut events = TestScenarioBuilder::new().type_number("1").build();

    // The exhausted event source quits, completing the pending "1" first.
    run_app_with_event_source(&mut terminal, &mut app, &mut events).unwrap();

    assert!(capture_terminal_state(&terminal).contains("Go to chapter: 1"));
    assert_eq!(app.navigator.current_chapter(), Some(1));
}

#[test]
fn lone_digit_opens_chapter_once_the_keyboard_goes_quiet() {
    let mut terminal = create_test_terminal(50, 10);
    let mut app = app_for(sample_book(15, 1), 50, 10, true);
    let mut events = TestScenarioBuilder::new()
        .type_number("7")
        .then_idle(1)
        .build();

    run_app_with_event_source(&mut terminal, &mut app, &mut events).unwrap();

    assert_eq!(app.navigator.mode(), Mode::Chapter);
    assert_eq!(app.navigator.current_chapter(), Some(7));
    // The last frame was drawn before the closing `q`, so the chapter was
    // opened by the idle deadline rather than by the next key.
    let screen = capture_terminal_state(&terminal);
    assert!(screen.starts_with("Chapter 7 paragraph 1."));
    assert!(!screen.contains("Go to chapter"));
}
