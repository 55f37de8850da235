use std::fs;
use std::path::Path;
use voxedit_core::{
    Command, CommandOutcome, Dispatcher, DispatcherConfig, EditorHost, EditorState, MemoryEditor,
    OPEN_FILE_CALLBACK, search_files,
};

fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn project() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "src/main.rs", "fn main() {}\n");
    write(dir.path(), "src/lib.rs", "pub mod app;\n");
    write(dir.path(), "src/app/main_window.rs", "// window\n");
    write(dir.path(), "build/main.rs", "// generated\n");
    write(dir.path(), "cache/main.pyc", "");
    write(dir.path(), ".gitignore", "build/\n");
    dir
}

#[test]
fn test_search_honors_gitignore_and_ignore_globs() {
    let dir = project();
    let roots = vec![dir.path().to_path_buf()];

    let found = search_files(&roots, "main", &DispatcherConfig::default().ignore).unwrap();
    assert_eq!(
        found,
        vec![
            dir.path().join("src/app/main_window.rs"),
            dir.path().join("src/main.rs"),
        ]
    );
}

#[test]
fn test_search_query_words_match_in_order() {
    let dir = project();
    let roots = vec![dir.path().to_path_buf()];

    let found = search_files(&roots, "main window", &[]).unwrap();
    assert_eq!(found, vec![dir.path().join("src/app/main_window.rs")]);

    let found = search_files(&roots, "window main", &[]).unwrap();
    assert!(found.is_empty());
}

#[tokio::test]
async fn test_open_file_list_then_open() {
    let dir = project();
    let host = MemoryEditor::empty().with_roots(vec![dir.path().to_path_buf()]);
    let mut dispatcher = Dispatcher::new(host, DispatcherConfig::default());

    let outcome = dispatcher
        .execute(&Command::OpenFileList {
            path: "main rs".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(outcome, CommandOutcome::SendText(OPEN_FILE_CALLBACK.to_string()));
    assert_eq!(dispatcher.file_list().len(), 2);

    let outcome = dispatcher.execute(&Command::GetEditorState).await.unwrap();
    let root = dir.path().to_string_lossy().into_owned();
    let CommandOutcome::EditorState(EditorState { files, roots, .. }) = outcome else {
        panic!("expected editor state");
    };
    assert_eq!(files.len(), 2);
    assert_eq!(roots, vec![root]);

    dispatcher
        .execute(&Command::OpenFile { index: Some(1) })
        .await
        .unwrap();
    assert_eq!(dispatcher.host().text().as_deref(), Some("fn main() {}\n"));
    assert_eq!(
        dispatcher.host().path(),
        Some(dir.path().join("src/main.rs").as_path())
    );

    dispatcher
        .execute(&Command::OpenFile { index: Some(7) })
        .await
        .unwrap();
    assert_eq!(dispatcher.host().tab_count(), 1);
}
