// Console rendering for command results

use crate::downloader::info::VideoInfo;
use crate::downloader::tools::ToolInfo;
use crate::downloader::{BatchReport, DownloadError, DownloadSuccess, UrlList};

/// Longest URL shown in listings before it is shortened
const URL_DISPLAY_LEN: usize = 70;

pub fn shorten(url: &str) -> String {
    if url.chars().count() > URL_DISPLAY_LEN {
        let head: String = url.chars().take(URL_DISPLAY_LEN).collect();
        format!("{}...", head)
    } else {
        url.to_string()
    }
}

pub fn print_error(err: &DownloadError) {
    eprintln!("error: {}", err);
    let suggestions = err.suggestions();
    if !suggestions.is_empty() {
        eprintln!("What to try:");
        for (i, hint) in suggestions.iter().enumerate() {
            eprintln!("  {}) {}", i + 1, hint);
        }
    }
}

pub fn print_success(success: &DownloadSuccess) {
    println!(
        "Downloaded [{}] {} (method {}/{}: {})",
        success.platform,
        shorten(success.url.as_str()),
        success.winner.index + 1,
        success.winner.chain_len,
        success.winner.label
    );
    if let Some(output) = &success.winner.output {
        println!("{}", output.trim());
    }
}

pub fn print_skipped(list: &UrlList) {
    for skipped in &list.skipped {
        eprintln!(
            "warning: line {} skipped ({}): {}",
            skipped.line, skipped.reason, skipped.content
        );
    }
}

pub fn print_report(report: &BatchReport) {
    println!();
    if report.interrupted {
        println!(
            "Interrupted after {} of {} URLs",
            report.processed(),
            report.total
        );
    }
    println!("Succeeded: {}", report.summary_line());
    println!("Failed: {}/{}", report.failed.len(), report.total);
    if !report.failed.is_empty() {
        println!("Failed URLs:");
        for (position, url) in &report.failed {
            println!("  {}. {}", position, shorten(url.as_str()));
        }
    }
}

pub fn print_info(info: &VideoInfo) {
    println!("Title:    {}", info.title.as_deref().unwrap_or("N/A"));
    match info.duration {
        Some(secs) => println!("Duration: {}s", secs.round() as u64),
        None => println!("Duration: N/A"),
    }
    match info.view_count {
        Some(views) => println!("Views:    {}", views),
        None => println!("Views:    N/A"),
    }
    println!("Uploader: {}", info.uploader.as_deref().unwrap_or("N/A"));
    println!("Formats:  {}", info.format_count);
    for format in &info.formats {
        println!(
            "  - {}: {}",
            format.format_id,
            format.format_note.as_deref().unwrap_or("N/A")
        );
    }
}

pub fn print_tool(info: &ToolInfo) {
    let location = info
        .path
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "not found".to_string());
    println!(
        "{} {} ({})",
        info.name,
        info.version.as_deref().unwrap_or("?"),
        location
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shorten() {
        assert_eq!(shorten("https://youtu.be/x"), "https://youtu.be/x");
        let long = format!("https://www.facebook.com/watch/?v={}", "9".repeat(80));
        let short = shorten(&long);
        assert!(short.ends_with("..."));
        assert_eq!(short.chars().count(), URL_DISPLAY_LEN + 3);
    }
}
