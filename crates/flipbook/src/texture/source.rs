//! Page image sources
//!
//! A [`PageSource`] hands back encoded page images with their natural size.
//! Pages outside the document resolve to `Ok(None)` rather than an error.

use std::cmp::Ordering;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures_util::future::BoxFuture;
use tracing::info;

use super::key::TextureTier;
use super::TextureError;

/// What the pipeline asks a source for
#[derive(Debug, Clone, PartialEq)]
pub struct PageRequest {
    pub document_id: Arc<str>,
    pub page: usize,
    pub scale: f32,
    pub target_width: Option<u32>,
    pub target_height: Option<u32>,
    pub tier: TextureTier,
}

/// Encoded page image
#[derive(Debug, Clone)]
pub struct PagePayload {
    pub bytes: Vec<u8>,
    pub natural_width: u32,
    pub natural_height: u32,
}

/// Backend collaborator producing page images
pub trait PageSource: Send + Sync + 'static {
    /// Fetch one page; `Ok(None)` when the page does not exist
    fn fetch(&self, request: PageRequest) -> BoxFuture<'static, Result<Option<PagePayload>, TextureError>>;
}

/// Serves pre-rasterized page images from a directory
#[derive(Debug, Clone)]
pub struct DirectoryPageSource {
    root: PathBuf,
    pages: Arc<Vec<PathBuf>>,
}

const PAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

impl DirectoryPageSource {
    /// Scan `root` for page images, ordered by natural file name order
    pub async fn open(root: impl AsRef<Path>) -> Result<Self, TextureError> {
        let root = root.as_ref().to_path_buf();
        let mut dir = tokio::fs::read_dir(&root).await?;
        let mut pages = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            let is_page = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| PAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()));
            if is_page {
                pages.push(path);
            }
        }
        if pages.is_empty() {
            return Err(TextureError::EmptyDirectory(root));
        }
        pages.sort_by(|a, b| natural_cmp(&file_name(a), &file_name(b)));
        info!("Opened {} pages from {}", pages.len(), root.display());
        Ok(Self {
            root,
            pages: Arc::new(pages),
        })
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Document id derived from the directory name
    pub fn document_id(&self) -> String {
        self.root
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string())
    }
}

impl PageSource for DirectoryPageSource {
    fn fetch(&self, request: PageRequest) -> BoxFuture<'static, Result<Option<PagePayload>, TextureError>> {
        let path = self.pages.get(request.page).cloned();
        Box::pin(async move {
            let Some(path) = path else {
                return Ok(None);
            };
            let bytes = tokio::fs::read(&path).await?;
            let (natural_width, natural_height) = image::ImageReader::new(Cursor::new(&bytes))
                .with_guessed_format()?
                .into_dimensions()?;
            Ok(Some(PagePayload {
                bytes,
                natural_width,
                natural_height,
            }))
        })
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

/// Compare strings treating digit runs as numbers, so `page2` < `page10`
fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut a = a.chars().peekable();
    let mut b = b.chars().peekable();
    loop {
        match (a.peek().copied(), b.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let take_number = |chars: &mut std::iter::Peekable<std::str::Chars<'_>>| {
                    let mut digits = String::new();
                    while let Some(c) = chars.peek().copied().filter(char::is_ascii_digit) {
                        digits.push(c);
                        chars.next();
                    }
                    digits
                };
                let da = take_number(&mut a);
                let db = take_number(&mut b);
                let ta = da.trim_start_matches('0');
                let tb = db.trim_start_matches('0');
                let ordering = ta.len().cmp(&tb.len()).then_with(|| ta.cmp(tb));
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            (Some(x), Some(y)) => {
                if x != y {
                    return x.cmp(&y);
                }
                a.next();
                b.next();
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory page source for pipeline and controller tests

    use std::collections::HashSet;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use image::{ImageFormat, Rgba, RgbaImage};

    use super::*;

    pub struct MemoryPageSource {
        pages: Vec<Vec<u8>>,
        width: u32,
        height: u32,
        failing: Mutex<HashSet<usize>>,
        fetches: AtomicUsize,
    }

    impl MemoryPageSource {
        pub fn new(page_count: usize, width: u32, height: u32) -> Self {
            let pages = (0..page_count)
                .map(|page| {
                    let shade = (page * 20 % 255) as u8;
                    let image = RgbaImage::from_pixel(width, height, Rgba([shade, 0, 255 - shade, 255]));
                    let mut bytes = Vec::new();
                    image
                        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
                        .unwrap();
                    bytes
                })
                .collect();
            Self {
                pages,
                width,
                height,
                failing: Mutex::new(HashSet::new()),
                fetches: AtomicUsize::new(0),
            }
        }

        pub fn fail_page(&self, page: usize) {
            self.failing.lock().unwrap().insert(page);
        }

        pub fn fetch_count(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    impl PageSource for MemoryPageSource {
        fn fetch(&self, request: PageRequest) -> BoxFuture<'static, Result<Option<PagePayload>, TextureError>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            let failing = self.failing.lock().unwrap().contains(&request.page);
            let payload = self.pages.get(request.page).map(|bytes| PagePayload {
                bytes: bytes.clone(),
                natural_width: self.width,
                natural_height: self.height,
            });
            Box::pin(async move {
                tokio::task::yield_now().await;
                if failing {
                    return Err(TextureError::Source(format!("page {} unavailable", request.page)));
                }
                Ok(payload)
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_natural_order() {
        let mut names = vec!["page10.png", "page2.png", "page1.png", "cover.png"];
        names.sort_by(|a, b| natural_cmp(a, b));
        assert_eq!(names, vec!["cover.png", "page1.png", "page2.png", "page10.png"]);
        assert_eq!(natural_cmp("p007", "p7"), Ordering::Equal);
    }

    #[tokio::test]
    async fn test_directory_source_reads_pages() {
        let dir = std::env::temp_dir().join(format!("folio-pages-{}", std::process::id()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        for (name, width) in [("2.png", 30), ("10.png", 40), ("1.png", 20)] {
            image::RgbaImage::new(width, 10).save(dir.join(name)).unwrap();
        }
        tokio::fs::write(dir.join("notes.txt"), b"ignored").await.unwrap();

        let source = DirectoryPageSource::open(&dir).await.unwrap();
        assert_eq!(source.page_count(), 3);

        let request = |page| PageRequest {
            document_id: Arc::from("doc"),
            page,
            scale: 1.0,
            target_width: None,
            target_height: None,
            tier: TextureTier::Quality,
        };
        let first = source.fetch(request(0)).await.unwrap().unwrap();
        assert_eq!(first.natural_width, 20);
        let last = source.fetch(request(2)).await.unwrap().unwrap();
        assert_eq!(last.natural_width, 40);
        assert!(source.fetch(request(3)).await.unwrap().is_none());

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn test_empty_directory_is_an_error() {
        let dir = std::env::temp_dir().join(format!("folio-empty-{}", std::process::id()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let err = DirectoryPageSource::open(&dir).await.unwrap_err();
        assert!(matches!(err, TextureError::EmptyDirectory(_)));
        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }
}
