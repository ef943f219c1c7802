//! # manga2pdf
//!
//! A CLI utility to save a manga from manganelo.com into a single PDF file.
//!
//! ## Current Features
//!
//! - Chapter discovery through a headless Chrome session
//! - Sequential page download with retry on transport errors
//! - Fit-outside resize of every page to a fixed box
//! - One PDF page per image, chapters oldest-first
//!
//! ## Usage
//!
//! ```bash
//! manga2pdf --manga=tales_of_demons_and_gods --chapters=-3
//! ```

mod args;
mod config;
mod document;
mod downloader;
mod error;
mod fetcher;
mod models;
mod normalize;
mod progress;
mod renderer;
mod scrape;

pub use args::{parse_args, CliOptions, USAGE};
pub use config::SiteConfig;
pub use document::MangaDocument;
pub use downloader::{output_file_name, slice_chapters, Downloader};
pub use error::{Error, Result};
pub use fetcher::{HttpGet, ImageFetcher, ReqwestTransport, TransportError};
pub use models::{Chapter, ImageRecord};
pub use normalize::{fit_outside, ImageNormalizer, NormalizedImage};
pub use progress::{Progress, TracingProgress};
pub use renderer::{ChromeRenderer, PageRenderer};
pub use scrape::{needs_alternate_server, parse_chapter_list};
