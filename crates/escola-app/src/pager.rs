// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::fmt;

pub const DEFAULT_ITEMS_PER_PAGE: usize = 10;
pub const DEFAULT_MAX_PAGES_TO_SHOW: usize = 5;

/// Never less than one, even for an empty set.
pub fn total_pages(total_items: usize, page_size: usize) -> usize {
    total_items.div_ceil(page_size.max(1)).max(1)
}

pub fn clamp_page(page: usize, total_pages: usize) -> usize {
    page.clamp(1, total_pages.max(1))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub start_index: usize,
    pub end_index: usize,
}

/// Slices one page out of `records`. Out-of-range pages are corrected to
/// the nearest valid page instead of yielding an empty slice.
pub fn paginate<T: Clone>(records: &[T], page: usize, page_size: usize) -> Page<T> {
    let page_size = page_size.max(1);
    let total_pages = total_pages(records.len(), page_size);
    let page = clamp_page(page, total_pages);
    let start_index = ((page - 1) * page_size).min(records.len());
    let end_index = (start_index + page_size).min(records.len());

    Page {
        items: records[start_index..end_index].to_vec(),
        page,
        total_pages,
        total_items: records.len(),
        start_index,
        end_index,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLink {
    Page(usize),
    Ellipsis,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageWindow {
    pub links: Vec<PageLink>,
    pub start_page: usize,
    pub end_page: usize,
}

impl PageWindow {
    pub fn pages(&self) -> Vec<usize> {
        self.links
            .iter()
            .filter_map(|link| match link {
                PageLink::Page(page) => Some(*page),
                PageLink::Ellipsis => None,
            })
            .collect()
    }
}

impl fmt::Display for PageWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, link) in self.links.iter().enumerate() {
            if index > 0 {
                f.write_str(" ")?;
            }
            match link {
                PageLink::Page(page) => write!(f, "{page}")?,
                PageLink::Ellipsis => f.write_str("…")?,
            }
        }
        Ok(())
    }
}

/// Page-number buttons centred on `current_page`, with the first and last
/// page pinned and ellipses over skipped ranges.
pub fn page_window(current_page: usize, total_pages: usize, max_pages_to_show: usize) -> PageWindow {
    let max_pages = max_pages_to_show.max(1);
    let total_pages = total_pages.max(1);

    let start_page = current_page.saturating_sub(max_pages / 2).max(1);
    let end_page = (start_page + max_pages - 1).min(total_pages);
    let adjusted_start = (end_page + 1).saturating_sub(max_pages).max(1);

    let mut links = Vec::with_capacity(max_pages + 4);
    if adjusted_start > 1 {
        links.push(PageLink::Page(1));
        if adjusted_start > 2 {
            links.push(PageLink::Ellipsis);
        }
    }
    links.extend((adjusted_start..=end_page).map(PageLink::Page));
    if end_page < total_pages {
        if end_page < total_pages - 1 {
            links.push(PageLink::Ellipsis);
        }
        links.push(PageLink::Page(total_pages));
    }

    PageWindow {
        links,
        start_page: adjusted_start,
        end_page,
    }
}
