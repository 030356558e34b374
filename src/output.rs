//! CLI output formatting.
//!
//! Every command shows what it found as an indented tree. Each entity leads
//! with its positional index and title; the uri follows the arrow.
//!
//! ```text
//! Pages
//! 001 Home → home
//! 002 Blog (2 pages) → blog
//!     001 First → blog/first
//!         Files: photo.jpg, notes.pdf
//!     --- Draft → blog/draft
//! --- About → about
//!
//! 5 pages, 2 files
//! ```
//!
//! Invisible pages show `---` instead of an index.
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout.

use crate::content::ContentBearing;
use crate::error::Result;
use crate::field::Field;
use crate::page::Page;
use crate::pages::Pages;
use crate::site::Site;

// ============================================================================
// Shared entity display helpers
// ============================================================================

/// Format a sort number as 3-digit zero-padded, `---` when there is none.
fn format_index(num: Option<u32>) -> String {
    match num {
        Some(n) => format!("{:0>3}", n),
        None => "---".to_string(),
    }
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `001 Blog (2 pages) → blog`
fn entity_header(page: &Page<'_>, children: usize) -> String {
    let count = match children {
        0 => String::new(),
        1 => " (1 page)".to_string(),
        n => format!(" ({n} pages)"),
    };
    format!(
        "{} {}{} → {}",
        format_index(page.num()),
        page.title(),
        count,
        page.id()
    )
}

/// Truncate text to `max` characters, appending `...` if truncated.
fn truncate(text: &str, max: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max {
        flat
    } else {
        let cut: String = flat.chars().take(max).collect();
        format!("{cut}...")
    }
}

// ============================================================================
// Tree
// ============================================================================

/// Format the whole content tree below the site root.
pub fn format_tree(site: &Site) -> Result<Vec<String>> {
    let mut lines = vec!["Pages".to_string()];
    let mut totals = (0usize, 0usize);
    walk(&site.children()?, 0, &mut lines, &mut totals)?;
    lines.push(String::new());
    lines.push(format!("{} pages, {} files", totals.0, totals.1));
    Ok(lines)
}

fn walk(
    pages: &Pages<'_>,
    depth: usize,
    lines: &mut Vec<String>,
    totals: &mut (usize, usize),
) -> Result<()> {
    for page in pages.iter() {
        let children = page.children()?;
        let files = page.files()?;
        totals.0 += 1;
        totals.1 += files.len();

        lines.push(format!("{}{}", indent(depth), entity_header(&page, children.len())));
        if !files.is_empty() {
            let names: Vec<&str> = files.keys().collect();
            lines.push(format!("{}    Files: {}", indent(depth), names.join(", ")));
        }
        walk(&children, depth + 1, lines, totals)?;
    }
    Ok(())
}

pub fn print_tree(site: &Site) -> Result<()> {
    for line in format_tree(site)? {
        println!("{}", line);
    }
    Ok(())
}

// ============================================================================
// Single page
// ============================================================================

/// Format one page: identity, template and every content field.
pub fn format_page(page: &Page<'_>) -> Result<Vec<String>> {
    let mut lines = vec![entity_header(page, page.children()?.len())];
    lines.push(format!("    Url: {}", page.url()));
    lines.push(format!("    Source: {}/", page.diruri()));
    lines.push(format!(
        "    Template: {} (intended {})",
        page.template()?,
        page.intended_template()?
    ));

    let content = page.content()?;
    if !content.is_empty() {
        lines.push("    Fields".to_string());
        for field in content.fields() {
            lines.push(format!("        {}: {}", field.key(), truncate(field.value(), 60)));
        }
    }

    let files = page.files()?;
    if !files.is_empty() {
        lines.push("    Files".to_string());
        for file in files.values() {
            let caption = file
                .field("caption")
                .filter(Field::is_not_empty)
                .map(|f| format!(" ({})", truncate(f.value(), 40)))
                .unwrap_or_default();
            lines.push(format!(
                "        {} {}{}",
                file.filename(),
                file.nice_size(),
                caption
            ));
        }
    }
    Ok(lines)
}

pub fn print_page(page: &Page<'_>) -> Result<()> {
    for line in format_page(page)? {
        println!("{}", line);
    }
    Ok(())
}

// ============================================================================
// Search
// ============================================================================

/// `001 Rust tips → blog/rust (score 4, 2 hits)`
pub fn format_search(query: &str, results: &Pages<'_>) -> Vec<String> {
    let mut lines = vec![format!("Search \"{}\": {} results", query, results.len())];
    for (i, page) in results.iter().enumerate() {
        lines.push(format!(
            "{:0>3} {} → {} (score {}, {} hits)",
            i + 1,
            page.title(),
            page.id(),
            page.search_score(),
            page.search_hits()
        ));
    }
    lines
}

pub fn print_search(query: &str, results: &Pages<'_>) {
    for line in format_search(query, results) {
        println!("{}", line);
    }
}

// ============================================================================
// Check
// ============================================================================

/// Problems worth fixing before serving the content: missing home or error
/// page, and pages whose template isn't registered.
pub fn format_check(site: &Site) -> Result<Vec<String>> {
    let mut problems = Vec::new();
    let pages = &site.options().pages;
    if !site.find(&pages.home).is_found() {
        problems.push(format!("Missing home page '{}'", pages.home));
    }
    if !site.find(&pages.error).is_found() {
        problems.push(format!("Missing error page '{}'", pages.error));
    }

    let check_templates = site.registry().names().next().is_some();
    for page in site.index()?.iter() {
        let intended = page.intended_template()?;
        if check_templates && !site.registry().has(&intended) {
            problems.push(format!(
                "{} uses template '{}' which is not registered, falling back to '{}'",
                page.id(),
                intended,
                page.template()?
            ));
        }
    }
    Ok(problems)
}
