use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("{} is not a file directly inside {}", member.display(), dir.display())]
    ForeignMember { member: PathBuf, dir: PathBuf },
    #[error("failed to write manifest: {0}")]
    Io(#[from] io::Error),
}

/// Quote a file name for the concat demuxer.
///
/// Inside single quotes the demuxer has no escapes, so a literal `'` closes
/// the quote, emits an escaped quote and reopens.
fn quote(name: &str) -> String {
    format!("'{}'", name.replace('\'', r"'\''"))
}

/// Render a concat-demuxer manifest: one `file '<name>'` line per member, in order.
pub fn render<S: AsRef<str>>(names: &[S]) -> String {
    let mut out = String::new();
    for name in names {
        out.push_str("file ");
        out.push_str(&quote(name.as_ref()));
        out.push('\n');
    }
    out
}

/// Reduce each member to its bare file name, requiring it to live directly in `dir`.
///
/// The demuxer resolves entries relative to the manifest, so anything outside
/// `dir` would silently point at the wrong file.
pub fn member_names(dir: &Path, members: &[PathBuf]) -> Result<Vec<String>, ManifestError> {
    members
        .iter()
        .map(|member| {
            let foreign = || ManifestError::ForeignMember {
                member: member.clone(),
                dir: dir.to_path_buf(),
            };
            let parent = member.parent().ok_or_else(foreign)?;
            if parent != dir {
                return Err(foreign());
            }
            member
                .file_name()
                .and_then(|n| n.to_str())
                .map(str::to_string)
                .ok_or_else(foreign)
        })
        .collect()
}

/// Write a manifest named `manifest_name` into `dir` listing `members`.
///
/// Returns the manifest's bare name, which is what ffmpeg must be given when
/// it runs with `dir` as its working directory.
pub fn write(
    dir: &Path,
    manifest_name: &str,
    members: &[PathBuf],
) -> Result<String, ManifestError> {
    let names = member_names(dir, members)?;
    fs::write(dir.join(manifest_name), render(&names))?;
    Ok(manifest_name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_three_members() {
        let text = render(&["a.ts", "b.ts", "c.ts"]);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec!["file 'a.ts'", "file 'b.ts'", "file 'c.ts'"]);
        assert!(!text.contains('/'));
    }

    #[test]
    fn test_render_escapes_quotes() {
        assert_eq!(render(&["it's.ts"]), "file 'it'\\''s.ts'\n");
    }

    #[test]
    fn test_write_uses_basenames() {
        let dir = tempfile::tempdir().unwrap();
        let members: Vec<PathBuf> = ["a.ts", "b.ts", "c.ts"]
            .iter()
            .map(|n| dir.path().join(n))
            .collect();

        let name = write(dir.path(), "part_000_list.txt", &members).unwrap();
        assert_eq!(name, "part_000_list.txt");

        let written = fs::read_to_string(dir.path().join(&name)).unwrap();
        assert_eq!(written, "file 'a.ts'\nfile 'b.ts'\nfile 'c.ts'\n");
        assert!(!written.contains(&*dir.path().to_string_lossy()));
    }

    #[test]
    fn test_rejects_member_outside_dir() {
        let dir = tempfile::tempdir().unwrap();
        let other = tempfile::tempdir().unwrap();
        let members = vec![dir.path().join("a.ts"), other.path().join("b.ts")];

        let err = write(dir.path(), "list.txt", &members).unwrap_err();
        assert!(matches!(err, ManifestError::ForeignMember { .. }));
        assert!(!dir.path().join("list.txt").exists());
    }

    #[test]
    fn test_rejects_nested_member() {
        let dir = Path::new("/ws");
        let members = vec![PathBuf::from("/ws/sub/a.ts")];
        assert!(member_names(dir, &members).is_err());
    }
}
