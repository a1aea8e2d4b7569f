#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use rust_xlsxwriter::Workbook;
use tempfile::{TempDir, tempdir};

/// A worksheet cell used when authoring test workbooks.
pub enum Cell<'a> {
    Text(&'a str),
    Number(f64),
    Blank,
}

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        self.write_bytes(name, contents.as_bytes())
    }

    pub fn write_bytes(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        fs::write(&path, contents).expect("write temp file");
        path
    }

    /// Writes a workbook with one worksheet per entry of `sheets`, in order.
    pub fn write_workbook(&self, name: &str, sheets: &[(&str, Vec<Vec<Cell>>)]) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut workbook = Workbook::new();
        for (sheet_name, rows) in sheets {
            let worksheet = workbook.add_worksheet();
            worksheet.set_name(*sheet_name).expect("sheet name");
            for (r, row) in rows.iter().enumerate() {
                for (c, cell) in row.iter().enumerate() {
                    let (r, c) = (r as u32, c as u16);
                    match cell {
                        Cell::Text(text) => {
                            worksheet.write_string(r, c, *text).expect("write string");
                        }
                        Cell::Number(number) => {
                            worksheet.write_number(r, c, *number).expect("write number");
                        }
                        Cell::Blank => {}
                    }
                }
            }
        }
        workbook.save(&path).expect("save workbook");
        path
    }
}

pub fn read(path: &Path) -> Vec<u8> {
    fs::read(path).expect("read fixture")
}
