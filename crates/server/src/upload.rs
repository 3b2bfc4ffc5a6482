use std::path::{Path, PathBuf};

const FALLBACK_NAME: &str = "upload.csv";

/// Temporary storage for uploaded files.
#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub directory: PathBuf,
}

impl UploadConfig {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// `{16 hex chars}-{original name}`, so two uploads of the same file
    /// never collide.
    pub fn generate_filename(original: &str) -> String {
        let token: [u8; 8] = rand::random();
        format!("{}-{}", hex::encode(token), sanitize(original))
    }

    pub async fn store(&self, original: &str, data: &[u8]) -> std::io::Result<PathBuf> {
        tokio::fs::create_dir_all(&self.directory).await?;
        let path = self.directory.join(Self::generate_filename(original));
        tokio::fs::write(&path, data).await?;
        tracing::debug!(path = %path.display(), bytes = data.len(), "Stored upload");
        Ok(path)
    }
}

/// Keeps only the final path component of a client-supplied name.
fn sanitize(original: &str) -> String {
    Path::new(original.trim())
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .unwrap_or(FALLBACK_NAME)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(name: &str) -> (&str, &str) {
        name.split_once('-').unwrap()
    }

    #[test]
    fn filename_has_hex_prefix() {
        let name = UploadConfig::generate_filename("bank.csv");
        let (token, rest) = split(&name);
        assert_eq!(token.len(), 16);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_eq!(rest, "bank.csv");
    }

    #[test]
    fn filenames_do_not_collide() {
        assert_ne!(
            UploadConfig::generate_filename("a.csv"),
            UploadConfig::generate_filename("a.csv")
        );
    }

    #[test]
    fn path_components_are_stripped() {
        let name = UploadConfig::generate_filename("../../etc/passwd");
        assert_eq!(split(&name).1, "passwd");
        let name = UploadConfig::generate_filename("");
        assert_eq!(split(&name).1, FALLBACK_NAME);
        let name = UploadConfig::generate_filename("..");
        assert_eq!(split(&name).1, FALLBACK_NAME);
    }

    #[tokio::test]
    async fn store_writes_into_directory() {
        let dir = tempfile::TempDir::new().unwrap();
        let upload = UploadConfig::new(dir.path().join("tmp"));

        let path = upload.store("data.csv", b"title,type,value,category\n").await.unwrap();

        assert_eq!(path.parent().unwrap(), upload.directory);
        assert!(path.file_name().unwrap().to_str().unwrap().ends_with("-data.csv"));
        assert_eq!(std::fs::read(&path).unwrap(), b"title,type,value,category\n");
    }
}
