mod client;

pub use client::{Downloader, DownloadTarget};
