use anyhow::Result;
use calamine::{Data, Reader, open_workbook_auto};
use cellsweep::{
    CellDetailsRequest, Error, SearchRequest, Settings, cell_details, restore_backups,
    run_search_replace, search_keywords, write_summary_workbook,
};
use rust_xlsxwriter::Workbook;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn write_workbook(path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Sheet1")?;
    sheet.write_string(0, 0, "Item")?;
    sheet.write_string(0, 1, "Note")?;
    sheet.write_string(2, 1, "apple")?;
    sheet.write_string(3, 0, "foo bar")?;
    sheet.write_number(3, 1, 42)?;
    let second = workbook.add_worksheet();
    second.set_name("Other")?;
    second.write_string(0, 0, "foo")?;
    workbook.save(path)?;
    Ok(())
}

fn folder(path: &Path) -> String {
    path.display().to_string()
}

fn request(dir: &Path, pattern: &str, extensions: &[&str]) -> SearchRequest {
    SearchRequest {
        folder_path: folder(dir),
        search_pattern: pattern.to_string(),
        use_regex: false,
        replace_pattern: None,
        file_extensions: Some(extensions.iter().map(|e| e.to_string()).collect()),
        preview_only: true,
    }
}

#[test]
fn test_preview_then_execute_on_text() -> Result<()> {
    let dir = tempdir()?;
    let file = dir.path().join("a.txt");
    fs::write(&file, "foo bar\nbaz foo\n")?;
    let settings = Settings::default();

    let preview = run_search_replace(&request(dir.path(), "foo", &[".txt"]), &settings)?;
    assert_eq!(preview.results[0].total_matches, 2);
    assert_eq!(preview.total_replacements, 0);
    assert_eq!(fs::read_to_string(&file)?, "foo bar\nbaz foo\n");

    let mut execute = request(dir.path(), "foo", &[".txt"]);
    execute.replace_pattern = Some("qux".to_string());
    execute.preview_only = false;
    let report = run_search_replace(&execute, &settings)?;

    assert_eq!(report.total_replacements, 2);
    assert!(report.results[0].replaced);
    assert_eq!(fs::read_to_string(&file)?, "qux bar\nbaz qux\n");
    assert_eq!(fs::read_to_string(dir.path().join("a.txt.bak"))?, "foo bar\nbaz foo\n");
    Ok(())
}

#[test]
fn test_extensions_outside_the_allow_list_are_never_reported() -> Result<()> {
    let dir = tempdir()?;
    fs::write(dir.path().join("a.txt"), "foo\n")?;
    fs::write(dir.path().join("b.md"), "foo\n")?;
    fs::write(dir.path().join("C.TXT"), "foo\n")?;

    let report = run_search_replace(&request(dir.path(), "foo", &["txt"]), &Settings::default())?;

    let names: Vec<&str> = report.results.iter().map(|r| r.file_name.as_str()).collect();
    assert_eq!(names, vec!["C.TXT", "a.txt"]);
    Ok(())
}

#[test]
fn test_workbook_replace_keeps_other_cells() -> Result<()> {
    let dir = tempdir()?;
    let book = dir.path().join("book.xlsx");
    write_workbook(&book)?;

    let mut execute = request(dir.path(), "foo", &[".xlsx"]);
    execute.replace_pattern = Some("qux".to_string());
    execute.preview_only = false;
    let report = run_search_replace(&execute, &Settings::default())?;

    let result = &report.results[0];
    assert_eq!(result.total_matches, 2);
    assert!(result.replaced, "{:?}", result.error);

    let mut workbook = open_workbook_auto(&book)?;
    assert_eq!(workbook.sheet_names(), vec!["Sheet1".to_string(), "Other".to_string()]);
    let sheet1 = workbook.worksheet_range("Sheet1")?;
    assert_eq!(sheet1.get_value((3, 0)), Some(&Data::String("qux bar".to_string())));
    assert_eq!(sheet1.get_value((2, 1)), Some(&Data::String("apple".to_string())));
    assert_eq!(sheet1.get_value((3, 1)), Some(&Data::Float(42.0)));
    let other = workbook.worksheet_range("Other")?;
    assert_eq!(other.get_value((0, 0)), Some(&Data::String("qux".to_string())));

    // The backup keeps the workbook bytes; copy it to a name calamine recognises.
    let restored = dir.path().join("restored.xlsx");
    fs::copy(dir.path().join("book.xlsx.bak"), &restored)?;
    let mut backup = open_workbook_auto(&restored)?;
    let original = backup.worksheet_range("Sheet1")?;
    assert_eq!(original.get_value((3, 0)), Some(&Data::String("foo bar".to_string())));
    Ok(())
}

#[test]
fn test_undo_restores_replaced_files() -> Result<()> {
    let dir = tempdir()?;
    let file = dir.path().join("notes.txt");
    fs::write(&file, "price 10\r\nprice 20")?;

    let mut execute = request(dir.path(), r"price (\d+)", &[".txt"]);
    execute.use_regex = true;
    execute.replace_pattern = Some("cost=$1".to_string());
    execute.preview_only = false;
    run_search_replace(&execute, &Settings::default())?;
    assert_eq!(fs::read_to_string(&file)?, "cost=10\r\ncost=20");

    let stats = restore_backups(dir.path(), ".bak", false)?;
    assert_eq!(stats.restored, 1);
    assert_eq!(fs::read_to_string(&file)?, "price 10\r\nprice 20");
    assert!(!dir.path().join("notes.txt.bak").exists());
    Ok(())
}

#[test]
fn test_keyword_search_details_and_export() -> Result<()> {
    let dir = tempdir()?;
    let book = dir.path().join("fruit.xlsx");
    write_workbook(&book)?;

    let keywords = vec!["apple".to_string()];
    let report = search_keywords(&folder(dir.path()), &keywords, &[".xlsx".to_string()])?;
    assert_eq!(report.total_matches, 1);
    let hit = &report.results[0];
    assert_eq!((hit.sheet.as_str(), hit.row, hit.col), ("Sheet1", 3, 2));
    assert_eq!(hit.value, "apple");

    let details = cell_details(&CellDetailsRequest {
        file_path: hit.file_path.clone(),
        sheet_name: hit.sheet.clone(),
        row: hit.row,
        col: hit.col,
        keyword: hit.keyword.clone(),
        context_rows: Some(1),
    })?;
    assert_eq!(details.target_cell.value, "apple");
    let rows: Vec<u32> = details.context.iter().map(|r| r[0].row).collect();
    assert_eq!(rows, vec![2, 3, 4]);

    let export = dir.path().join("results.xlsx");
    write_summary_workbook(&report.results, &keywords, &export)?;
    assert!(export.is_file());
    Ok(())
}

#[test]
fn test_missing_folder_fails_the_request() {
    let err = run_search_replace(
        &request(Path::new("/no/such/folder/anywhere"), "foo", &[".txt"]),
        &Settings::default(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::InvalidPath { .. }));
}
