use pretty_assertions::assert_eq;
use std::time::Duration;
use voxedit_core::{
    Command, CommandOutcome, DiffRange, DiffRangeKind, Dispatcher, DispatcherConfig, EditorHost,
    EditorState, MemoryEditor, PasteDirection, Position,
};

fn dispatcher(text: &str) -> Dispatcher<MemoryEditor> {
    Dispatcher::new(MemoryEditor::new(text), DispatcherConfig::default())
}

fn diff_command(source: &str, cursor: usize) -> Command {
    Command::Diff {
        source: source.to_string(),
        cursor,
    }
}

#[tokio::test]
async fn test_diff_replaces_text_and_cursor_together() {
    let mut dispatcher = dispatcher("a\nb");

    let outcome = dispatcher.execute(&diff_command("a\nc", 3)).await.unwrap();
    assert_eq!(outcome, CommandOutcome::Done);

    let host = dispatcher.host();
    assert_eq!(host.text().as_deref(), Some("a\nc"));
    assert_eq!(host.cursor(), Some(Position::new(1, 1)));
    assert_eq!(
        host.highlights(),
        &[
            DiffRange {
                kind: DiffRangeKind::Delete,
                start: Position::new(1, 0),
                stop: Position::new(1, 1),
            },
            DiffRange {
                kind: DiffRangeKind::Add,
                start: Position::new(1, 0),
                stop: Position::new(1, 1),
            },
        ]
    );

    dispatcher.execute(&Command::Undo).await.unwrap();
    assert_eq!(dispatcher.host().text().as_deref(), Some("a\nb"));
    assert_eq!(dispatcher.host().cursor(), Some(Position::new(0, 0)));
}

#[tokio::test]
async fn test_diff_cursor_past_end_is_clamped() {
    let mut dispatcher = dispatcher("");
    dispatcher.execute(&diff_command("abc", 100)).await.unwrap();
    assert_eq!(dispatcher.host().cursor(), Some(Position::new(0, 3)));
}

#[tokio::test]
async fn test_whitespace_change_highlights_cursor_line() {
    let mut dispatcher = dispatcher("first\na b");
    dispatcher
        .execute(&diff_command("first\na  b", 8))
        .await
        .unwrap();

    assert_eq!(
        dispatcher.host().highlights(),
        &[DiffRange::line(DiffRangeKind::Add, "first\na  b", 1)]
    );
}

#[tokio::test]
async fn test_paste_above_uses_clipboard() {
    let mut dispatcher = dispatcher("line1\nline2");
    dispatcher.host_mut().set_clipboard("x\n");

    dispatcher
        .execute(&Command::Paste {
            cursor: Some(3),
            direction: Some(PasteDirection::Above),
        })
        .await
        .unwrap();

    assert_eq!(dispatcher.host().text().as_deref(), Some("x\nline1\nline2"));
    assert_eq!(dispatcher.host().cursor(), Some(Position::new(0, 1)));
}

#[tokio::test]
async fn test_copy_and_select() {
    let mut dispatcher = dispatcher("hello\nworld");

    dispatcher
        .execute(&Command::Copy {
            text: Some("hello".to_string()),
        })
        .await
        .unwrap();
    assert_eq!(dispatcher.host().clipboard(), "hello");

    dispatcher
        .execute(&Command::Copy { text: None })
        .await
        .unwrap();
    assert_eq!(dispatcher.host().clipboard(), "hello");

    dispatcher
        .execute(&Command::Select {
            cursor: 2,
            cursor_end: 8,
        })
        .await
        .unwrap();
    assert_eq!(
        dispatcher.host().selection(),
        Some((Position::new(0, 2), Position::new(1, 2)))
    );
}

#[tokio::test]
async fn test_no_active_editor_is_a_no_op() {
    let mut dispatcher = Dispatcher::new(MemoryEditor::empty(), DispatcherConfig::default());

    for command in [
        diff_command("text", 0),
        Command::Undo,
        Command::Select {
            cursor: 0,
            cursor_end: 1,
        },
        Command::Paste {
            cursor: None,
            direction: None,
        },
    ] {
        let outcome = dispatcher.execute(&command).await.unwrap();
        assert_eq!(outcome, CommandOutcome::Done);
    }

    let outcome = dispatcher.execute(&Command::GetEditorState).await.unwrap();
    assert_eq!(outcome, CommandOutcome::EditorState(EditorState::default()));
}

#[tokio::test]
async fn test_editor_state_reports_cursor_offset() {
    let mut dispatcher = dispatcher("ab\ncd");
    dispatcher.execute(&diff_command("ab\ncd", 4)).await.unwrap();

    let outcome = dispatcher.execute(&Command::GetEditorState).await.unwrap();
    assert_eq!(
        outcome,
        CommandOutcome::EditorState(EditorState {
            source: "ab\ncd".to_string(),
            cursor: 4,
            ..EditorState::default()
        })
    );
}

#[tokio::test(start_paused = true)]
async fn test_ui_commands_wait_for_settle_delay() {
    let mut dispatcher = dispatcher("one");

    let early = tokio::time::timeout(
        Duration::from_millis(299),
        dispatcher.execute(&Command::CreateTab),
    )
    .await;
    assert!(early.is_err());

    let start = tokio::time::Instant::now();
    dispatcher.execute(&Command::NextTab).await.unwrap();
    assert!(start.elapsed() >= Duration::from_millis(300));

    let start = tokio::time::Instant::now();
    dispatcher.execute(&Command::Undo).await.unwrap();
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_switch_tab_indexes() {
    let mut dispatcher = dispatcher("one");
    dispatcher.execute(&Command::CreateTab).await.unwrap();
    dispatcher.execute(&Command::CreateTab).await.unwrap();

    dispatcher
        .execute(&Command::SwitchTab { index: 1 })
        .await
        .unwrap();
    assert_eq!(dispatcher.host().active_tab(), 0);

    dispatcher
        .execute(&Command::SwitchTab { index: 0 })
        .await
        .unwrap();
    assert_eq!(dispatcher.host().active_tab(), 2);

    dispatcher
        .execute(&Command::SwitchTab { index: 9 })
        .await
        .unwrap();
    assert_eq!(dispatcher.host().active_tab(), 2);
}

#[tokio::test]
async fn test_save_untitled_prompts_for_location() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("draft.txt");

    let mut dispatcher = dispatcher("draft");
    dispatcher.execute(&Command::Save).await.unwrap();
    assert_eq!(dispatcher.host().path(), None);

    dispatcher.host_mut().set_save_prompt(Some(path.clone()));
    dispatcher.execute(&Command::Save).await.unwrap();
    assert_eq!(dispatcher.host().path(), Some(path.as_path()));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "draft");

    dispatcher.execute(&diff_command("final", 5)).await.unwrap();
    dispatcher.host_mut().set_save_prompt(None);
    dispatcher.execute(&Command::Save).await.unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "final");
}

#[tokio::test]
async fn test_session_commands() {
    let mut dispatcher = dispatcher("");

    dispatcher
        .execute(&Command::SetEditorStatus {
            text: "Listening".to_string(),
            volume: Some(0.5),
        })
        .await
        .unwrap();
    assert_eq!(dispatcher.session().state().status, "Listening");
    assert_eq!(dispatcher.session().state().volume, 50);

    dispatcher.session_mut().set_listening(true);
    dispatcher.execute(&Command::Pause).await.unwrap();
    assert!(!dispatcher.session().state().listening);
    assert_eq!(dispatcher.session().state().status, "Paused");

    dispatcher
        .execute(&Command::Use { index: Some(2) })
        .await
        .unwrap();
    assert_eq!(dispatcher.session().state().highlighted, Some(1));

    dispatcher.execute(&Command::Cancel).await.unwrap();
    assert_eq!(dispatcher.session().state().highlighted, None);
}

#[tokio::test]
async fn test_ignored_commands_leave_buffer_alone() {
    let mut dispatcher = dispatcher("keep");
    for command in [
        Command::Invalid,
        Command::GoToDefinition,
        Command::Unsupported,
    ] {
        dispatcher.execute(&command).await.unwrap();
    }
    assert_eq!(dispatcher.host().active_text().unwrap(), "keep");
}
