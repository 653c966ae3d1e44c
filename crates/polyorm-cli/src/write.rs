use std::path::{Path, PathBuf};

/// Rendered DDL script and the path it belongs at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub path: PathBuf,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    #[default]
    Write,
    /// Report what would change without touching the disk.
    DryRun,
    /// Fail when any script differs from what is on disk.
    Check,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScriptState {
    Missing,
    Stale,
}

impl ScriptState {
    fn of(file: &GeneratedFile) -> Option<Self> {
        match std::fs::read_to_string(&file.path) {
            Ok(existing) if existing == file.content => None,
            Ok(_) => Some(ScriptState::Stale),
            Err(_) => Some(ScriptState::Missing),
        }
    }

    fn label(self) -> &'static str {
        match self {
            ScriptState::Missing => "create",
            ScriptState::Stale => "update",
        }
    }
}

#[derive(Debug, Default)]
pub struct WriteSummary {
    /// Scripts whose content differs from disk, by path.
    pub changed: Vec<PathBuf>,
    pub written: Vec<PathBuf>,
}

pub fn apply_generated_files(
    files: &[GeneratedFile],
    mode: WriteMode,
) -> anyhow::Result<WriteSummary> {
    let mut pending: Vec<(&GeneratedFile, ScriptState)> = files
        .iter()
        .filter_map(|f| ScriptState::of(f).map(|state| (f, state)))
        .collect();
    pending.sort_by(|a, b| a.0.path.cmp(&b.0.path));

    let mut summary = WriteSummary {
        changed: pending.iter().map(|(f, _)| f.path.clone()).collect(),
        written: Vec::new(),
    };

    match mode {
        WriteMode::DryRun => {
            for (f, state) in &pending {
                println!("would {} {}", state.label(), f.path.display());
            }
        }
        WriteMode::Check => {
            if !pending.is_empty() {
                let stale: Vec<String> = summary
                    .changed
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect();
                anyhow::bail!("DDL scripts are out of date: {}", stale.join(", "));
            }
        }
        WriteMode::Write => {
            for (f, state) in &pending {
                replace_file(&f.path, &f.content)?;
                println!("{}d {}", state.label(), f.path.display());
                summary.written.push(f.path.clone());
            }
        }
    }
    Ok(summary)
}

/// Write next to `path` and rename over it, so readers never see a partial script.
fn replace_file(path: &Path, content: &str) -> anyhow::Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    std::fs::create_dir_all(dir)
        .map_err(|e| anyhow::anyhow!("failed to create directory {}: {e}", dir.display()))?;

    let name = path
        .file_name()
        .ok_or_else(|| anyhow::anyhow!("{} is not a file path", path.display()))?;
    let mut staged = std::ffi::OsString::from(".");
    staged.push(name);
    staged.push(".partial");
    let staged = dir.join(staged);

    std::fs::write(&staged, content)
        .map_err(|e| anyhow::anyhow!("failed to write {}: {e}", staged.display()))?;
    std::fs::rename(&staged, path)
        .map_err(|e| anyhow::anyhow!("failed to replace {}: {e}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("polyorm-cli-{name}-{}", std::process::id()))
    }

    #[test]
    fn check_detects_stale_output_and_write_fixes_it() {
        let dir = scratch_dir("write");
        let file = GeneratedFile {
            path: dir.join("sql").join("sqlite.sql"),
            content: "CREATE TABLE t (a INTEGER);\n".to_string(),
        };
        let files = std::slice::from_ref(&file);

        let err = apply_generated_files(files, WriteMode::Check).unwrap_err();
        assert!(err.to_string().contains("sqlite.sql"));

        let summary = apply_generated_files(files, WriteMode::Write).unwrap();
        assert_eq!(summary.written, [file.path.clone()]);
        assert!(!dir.join("sql").join(".sqlite.sql.partial").exists());
        assert!(
            apply_generated_files(files, WriteMode::Check)
                .unwrap()
                .changed
                .is_empty()
        );

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn dry_run_reports_in_path_order_without_writing() {
        let dir = scratch_dir("dry-run");
        let files = [
            GeneratedFile {
                path: dir.join("sqlite.sql"),
                content: "-- sqlite\n".to_string(),
            },
            GeneratedFile {
                path: dir.join("firebird.sql"),
                content: "-- firebird\n".to_string(),
            },
        ];

        let summary = apply_generated_files(&files, WriteMode::DryRun).unwrap();
        assert_eq!(
            summary.changed,
            [dir.join("firebird.sql"), dir.join("sqlite.sql")]
        );
        assert!(summary.written.is_empty());
        assert!(!dir.exists());
    }
}
