use anyhow::{anyhow, Result as AnyResult};
use colored::*;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::args::CliOptions;
use crate::config::SiteConfig;
use crate::document::MangaDocument;
use crate::error::{Error, Result};
use crate::fetcher::{HttpGet, ImageFetcher};
use crate::models::Chapter;
use crate::normalize::{ImageNormalizer, NormalizedImage};
use crate::progress::Progress;
use crate::renderer::PageRenderer;
use crate::scrape::{needs_alternate_server, parse_chapter_list};

/// Drives one run: chapter discovery, then every selected chapter in
/// order, then a single PDF write.
pub struct Downloader<R, H, P> {
    renderer: R,
    fetcher: ImageFetcher<H>,
    normalizer: ImageNormalizer,
    progress: P,
    config: SiteConfig,
    out_dir: PathBuf,
}

impl<R, H, P> Downloader<R, H, P>
where
    R: PageRenderer,
    H: HttpGet,
    P: Progress,
{
    pub fn new(renderer: R, transport: H, progress: P, config: SiteConfig, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            renderer,
            fetcher: ImageFetcher::new(transport, config.max_fetch_retries),
            normalizer: ImageNormalizer::new(&config),
            progress,
            config,
            out_dir: out_dir.into(),
        }
    }

    pub fn into_renderer(self) -> R {
        self.renderer
    }

    /// Returns the path of the written PDF.
    pub async fn run(&self, options: &CliOptions) -> Result<PathBuf> {
        let manga = options
            .manga_id
            .clone()
            .unwrap_or_else(|| self.config.default_manga.clone());

        let chapters = self.discover_chapters(&manga).await?;
        let selected = slice_chapters(&chapters, options.chapter_limit);
        self.progress.chapters_found(chapters.len(), selected.len());

        let output = self
            .out_dir
            .join(output_file_name(Some(&manga), options.chapter_limit, chapters.len()));
        let file = File::create(&output).map_err(|source| output_error(&output, source))?;
        let mut writer = BufWriter::new(file);

        let mut document = MangaDocument::new(self.config.margin);

        for chapter in selected {
            match self.download_chapter(chapter).await {
                Ok(pages) => {
                    let count = pages.len();
                    for page in pages {
                        document.add_image_page(page);
                    }
                    self.progress.chapter_added(&chapter.title, count);
                }
                Err(e) => self.progress.chapter_failed(&chapter.title, &e),
            }
        }

        let path = output.clone();
        tokio::task::spawn_blocking(move || -> Result<()> {
            document.write_to(&mut writer)?;
            writer.flush().map_err(|source| output_error(&path, source))?;
            writer
                .get_ref()
                .sync_all()
                .map_err(|source| output_error(&path, source))
        })
        .await
        .map_err(|e| anyhow!("PDF writer task failed: {}", e))??;

        self.progress.done(&output);
        Ok(output)
    }

    /// Chapters oldest-first. Any failure here ends the run.
    async fn discover_chapters(&self, manga: &str) -> Result<Vec<Chapter>> {
        let url = self.config.manga_url(manga);

        let mut chapters = self
            .list_chapters(&url)
            .await
            .map_err(Error::ChapterDiscovery)?;

        if chapters.is_empty() {
            return Err(Error::NoChapters {
                manga: manga.to_string(),
            });
        }

        // the site lists newest first
        chapters.reverse();
        Ok(chapters)
    }

    async fn list_chapters(&self, url: &str) -> AnyResult<Vec<Chapter>> {
        self.renderer.navigate(url).await?;
        let html = self.renderer.content().await?;
        parse_chapter_list(&html, &self.config.chapter_link_selector, url)
    }

    /// Downloads and resizes every page of a chapter. Pages are only
    /// handed back once all of them succeeded.
    async fn download_chapter(&self, chapter: &Chapter) -> Result<Vec<NormalizedImage>> {
        info!("Downloading chapter '{}'", chapter.title.green());

        let urls = self.image_urls(&chapter.url).await?;
        debug!("Chapter '{}' has {} images", chapter.title, urls.len());

        let mut pages = Vec::with_capacity(urls.len());
        for url in &urls {
            let bytes = self.fetcher.fetch(url).await?;
            pages.push(self.normalizer.normalize(url, bytes).await?);
        }

        Ok(pages)
    }

    async fn image_urls(&self, chapter_url: &str) -> AnyResult<Vec<String>> {
        let selector = &self.config.page_image_selector;

        self.renderer.navigate(chapter_url).await?;
        let mut images = self.renderer.images(selector).await?;

        if needs_alternate_server(&images) {
            warn!("Broken images on {}, switching image server", chapter_url.yellow());
            self.renderer
                .click_and_wait(&self.config.alternate_server_selector)
                .await?;
            images = self.renderer.images(selector).await?;
        }

        Ok(images.into_iter().map(|image| image.src).collect())
    }
}

fn output_error(path: &Path, source: std::io::Error) -> Error {
    Error::Output {
        path: path.to_path_buf(),
        source,
    }
}

/// Zero or no limit keeps everything, `n > 0` the first `n` chapters,
/// `n < 0` the last `|n|`.
pub fn slice_chapters(chapters: &[Chapter], limit: Option<i64>) -> &[Chapter] {
    let len = chapters.len();
    match limit {
        None | Some(0) => chapters,
        Some(n) if n > 0 => &chapters[..n.unsigned_abs().min(len as u64) as usize],
        Some(n) => &chapters[len - n.unsigned_abs().min(len as u64) as usize..],
    }
}

pub fn output_file_name(manga: Option<&str>, limit: Option<i64>, total: usize) -> String {
    let Some(manga) = manga else {
        return "output.pdf".to_string();
    };

    match limit {
        None | Some(0) | Some(1) => format!("{}.pdf", manga),
        Some(n) if n > 1 => format!("{} (1 - {}).pdf", manga, n),
        Some(n) => format!("{} ({} - {}).pdf", manga, total as i64 + n, total),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chapters(count: usize) -> Vec<Chapter> {
        (1..=count)
            .map(|i| Chapter::new(format!("Chapter {}", i), format!("https://site/c{}", i)))
            .collect()
    }

    #[test]
    fn test_slice_all() {
        let list = chapters(10);
        assert_eq!(slice_chapters(&list, None), &list[..]);
        assert_eq!(slice_chapters(&list, Some(0)), &list[..]);
    }

    #[test]
    fn test_slice_first_n() {
        let list = chapters(10);
        assert_eq!(slice_chapters(&list, Some(3)), &list[0..3]);
        assert_eq!(slice_chapters(&list, Some(50)), &list[..]);
    }

    #[test]
    fn test_slice_last_n() {
        let list = chapters(10);
        assert_eq!(slice_chapters(&list, Some(-3)), &list[7..10]);
        assert_eq!(slice_chapters(&list, Some(-50)), &list[..]);
    }

    #[test]
    fn test_slice_empty() {
        assert!(slice_chapters(&[], Some(-2)).is_empty());
        assert!(slice_chapters(&[], Some(2)).is_empty());
    }

    #[test]
    fn test_output_file_name() {
        assert_eq!(output_file_name(Some("foo"), None, 10), "foo.pdf");
        assert_eq!(output_file_name(Some("foo"), Some(1), 10), "foo.pdf");
        assert_eq!(output_file_name(Some("foo"), Some(0), 10), "foo.pdf");
        assert_eq!(output_file_name(Some("foo"), Some(5), 10), "foo (1 - 5).pdf");
        assert_eq!(output_file_name(Some("foo"), Some(-2), 10), "foo (8 - 10).pdf");
    }

    #[test]
    fn test_output_file_name_without_manga() {
        assert_eq!(output_file_name(None, None, 0), "output.pdf");
        assert_eq!(output_file_name(None, Some(5), 10), "output.pdf");
        assert_eq!(output_file_name(None, Some(-2), 10), "output.pdf");
    }

    #[test]
    fn test_output_file_name_negative_start_past_total() {
        assert_eq!(output_file_name(Some("foo"), Some(-20), 10), "foo (-10 - 10).pdf");
    }
}
