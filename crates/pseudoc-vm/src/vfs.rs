//! In-memory virtual filesystem (`spec.md` §3 "Virtual file").

use crate::error::{RuntimeError, RuntimeResult};
use pseudoc_ir::FileMode;
use rustc_hash::FxHashMap;

#[derive(Clone, Debug, Default)]
pub struct VirtualFile {
    pub lines: Vec<String>,
    pub read_pos: usize,
    pub mode: Option<FileMode>,
    pub open: bool,
}

/// Owned by one VM instance; its lifetime equals the VM's (`spec.md` §5).
#[derive(Clone, Debug, Default)]
pub struct VirtualFileSystem {
    files: FxHashMap<String, VirtualFile>,
}

impl VirtualFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lets a host pre-populate files before a run (`spec.md` §1).
    pub fn seed(&mut self, name: impl Into<String>, lines: Vec<String>) {
        self.files.insert(name.into(), VirtualFile { lines, read_pos: 0, mode: None, open: false });
    }

    pub fn files(&self) -> &FxHashMap<String, VirtualFile> {
        &self.files
    }

    /// Unknown filenames auto-create an empty file (`spec.md` §4.6).
    pub fn open(&mut self, name: &str, mode: FileMode) {
        let file = self.files.entry(name.to_string()).or_default();
        match mode {
            FileMode::Write => file.lines.clear(),
            FileMode::Append => {}
            FileMode::Read => file.read_pos = 0,
        }
        file.mode = Some(mode);
        file.open = true;
    }

    pub fn close(&mut self, name: &str) {
        if let Some(file) = self.files.get_mut(name) {
            file.open = false;
            file.mode = None;
        }
    }

    pub fn read_line(&mut self, name: &str) -> RuntimeResult<String> {
        let file = self.files.get_mut(name).ok_or_else(|| RuntimeError::FileNotOpen(name.to_string()))?;
        if !file.open {
            return Err(RuntimeError::FileNotOpen(name.to_string()));
        }
        if file.mode != Some(FileMode::Read) {
            return Err(RuntimeError::WrongFileMode { name: name.to_string(), expected: "READ" });
        }
        if file.read_pos >= file.lines.len() {
            return Err(RuntimeError::EndOfFile(name.to_string()));
        }
        let line = file.lines[file.read_pos].clone();
        file.read_pos += 1;
        Ok(line)
    }

    pub fn write_line(&mut self, name: &str, data: String) -> RuntimeResult<()> {
        let file = self.files.get_mut(name).ok_or_else(|| RuntimeError::FileNotOpen(name.to_string()))?;
        if !file.open {
            return Err(RuntimeError::FileNotOpen(name.to_string()));
        }
        match file.mode {
            Some(FileMode::Write) | Some(FileMode::Append) => {
                file.lines.push(data);
                Ok(())
            }
            _ => Err(RuntimeError::WrongFileMode { name: name.to_string(), expected: "WRITE or APPEND" }),
        }
    }

    /// `EOF(name)` returns true when the file is unknown/closed or
    /// positioned at/past its end (`spec.md` §4.6).
    pub fn eof(&self, name: &str) -> bool {
        match self.files.get(name) {
            Some(file) if file.open => file.read_pos >= file.lines.len(),
            _ => true,
        }
    }
}
