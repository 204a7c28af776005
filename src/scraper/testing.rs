//! Scripted in-memory browser for engine tests.
//!
//! Elements match selectors by exact string; a `FakeSite` describes what the
//! session renders for each page and how pagination controls behave.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::browser::{BrowserDriver, BrowserSession, PageElement};
use super::error::{ScrapeError, ScrapeResult};
use super::normalizer::NormalizeContext;
use super::record::{JobRecord, RawListing};
use super::sites::{PaginationStyle, SiteAdapter};

pub const SWIGGY_FRAME: &str = "#mnhembedded";
pub const SWIGGY_ROW: &str = "tr.mnh-jobs-table-row";
pub const WIPRO_ROW: &str = "li[data-testid=\"jobCard\"]";
pub const WIPRO_NEXT: &str = "button[data-testid=\"goToNextPageBtn\"]";
const FRAME_SRC: &str = "https://widget.example/jobs";

type ClickHook = Arc<dyn Fn() + Send + Sync>;

#[derive(Clone, Default)]
pub struct FakeElement {
    selectors: Vec<String>,
    text: String,
    attrs: BTreeMap<String, String>,
    children: Vec<FakeElement>,
    broken: bool,
    on_click: Option<ClickHook>,
}

impl FakeElement {
    pub fn new(selector: &str) -> Self {
        Self {
            selectors: vec![selector.to_string()],
            ..Self::default()
        }
    }

    /// Also match `selector`.
    pub fn also(mut self, selector: &str) -> Self {
        self.selectors.push(selector.to_string());
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn child(mut self, child: FakeElement) -> Self {
        self.children.push(child);
        self
    }

    /// Reads and lookups on this element fail, as with a detached node.
    pub fn broken(mut self) -> Self {
        self.broken = true;
        self
    }

    pub fn on_click(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_click = Some(Arc::new(hook));
        self
    }

    fn matches(&self, css: &str) -> bool {
        self.selectors.iter().any(|s| s == css)
    }

    fn collect(&self, css: &str, out: &mut Vec<FakeElement>) {
        for child in &self.children {
            if child.matches(css) {
                out.push(child.clone());
            }
            child.collect(css, out);
        }
    }

    fn check(&self) -> ScrapeResult<()> {
        if self.broken {
            return Err(ScrapeError::browser("stale element reference"));
        }
        Ok(())
    }
}

fn boxed(elements: Vec<FakeElement>) -> Vec<Box<dyn PageElement>> {
    elements
        .into_iter()
        .map(|e| Box::new(e) as Box<dyn PageElement>)
        .collect()
}

#[async_trait]
impl PageElement for FakeElement {
    async fn text(&self) -> ScrapeResult<String> {
        self.check()?;
        Ok(self.text.clone())
    }

    async fn attribute(&self, name: &str) -> ScrapeResult<Option<String>> {
        Ok(self.attrs.get(name).cloned())
    }

    async fn find(&self, css: &str) -> ScrapeResult<Option<Box<dyn PageElement>>> {
        Ok(self.find_all(css).await?.into_iter().next())
    }

    async fn find_all(&self, css: &str) -> ScrapeResult<Vec<Box<dyn PageElement>>> {
        self.check()?;
        let mut found = Vec::new();
        self.collect(css, &mut found);
        Ok(boxed(found))
    }

    async fn is_displayed(&self) -> ScrapeResult<bool> {
        Ok(true)
    }

    async fn click(&self) -> ScrapeResult<()> {
        if let Some(hook) = &self.on_click {
            hook();
        }
        Ok(())
    }
}

pub fn swiggy_row(title: &str, location: Option<&str>) -> FakeElement {
    let row = FakeElement::new(SWIGGY_ROW).child(FakeElement::new("span.mnh_req_title").text(title));
    match location {
        Some(location) => row.child(FakeElement::new("span.mnh_location").text(location)),
        None => row,
    }
}

pub fn swiggy_page(titles: &[&str]) -> Vec<FakeElement> {
    titles
        .iter()
        .map(|title| swiggy_row(title, Some("Bangalore")))
        .collect()
}

pub fn wipro_card(id: &str, title: &str, city: &str, state: &str) -> FakeElement {
    let footer = |text: &str| FakeElement::new("span.JobsList_jobCardFooterValue__Lc--j").text(text);
    FakeElement::new(WIPRO_ROW)
        .child(
            FakeElement::new("a.jobCardTitle")
                .also("a")
                .also("a[href]")
                .text(title)
                .attr("href", &format!("https://careers.wipro.com/job/{id}")),
        )
        .child(footer(id))
        .child(footer(city))
        .child(footer(state))
        .child(footer("India"))
        .child(footer("Engineering"))
}

#[derive(Clone)]
enum FakePagination {
    Numbered,
    NextButton(String),
}

/// What the fake browser renders.
#[derive(Clone)]
pub struct FakeSite {
    frame: Option<String>,
    frame_loads: bool,
    row_selector: String,
    pages: Vec<Vec<FakeElement>>,
    pagination: FakePagination,
    stalled: bool,
}

impl FakeSite {
    /// Numbered `a` links, one per page, rendered at the top level.
    pub fn numbered(pages: Vec<Vec<FakeElement>>) -> Self {
        Self {
            frame: None,
            frame_loads: true,
            row_selector: SWIGGY_ROW.to_string(),
            pages,
            pagination: FakePagination::Numbered,
            stalled: false,
        }
    }

    /// A single next control, disabled on the last page.
    pub fn next_button(selector: &str, pages: Vec<Vec<FakeElement>>) -> Self {
        Self {
            pagination: FakePagination::NextButton(selector.to_string()),
            ..Self::numbered(pages)
        }
    }

    pub fn swiggy(pages: Vec<Vec<FakeElement>>) -> Self {
        Self::numbered(pages).framed(SWIGGY_FRAME)
    }

    pub fn wipro(pages: Vec<Vec<FakeElement>>) -> Self {
        Self::next_button(WIPRO_NEXT, pages).rows(WIPRO_ROW)
    }

    pub fn rows(mut self, selector: &str) -> Self {
        self.row_selector = selector.to_string();
        self
    }

    /// Listings live inside an iframe matching `selector`.
    pub fn framed(mut self, selector: &str) -> Self {
        self.frame = Some(selector.to_string());
        self
    }

    pub fn frame_never_loads(mut self) -> Self {
        self.frame_loads = false;
        self
    }

    /// Clicking pagination controls leaves the same page on screen.
    pub fn stalled(mut self) -> Self {
        self.stalled = true;
        self
    }
}

/// Launches [`FakeSession`]s and counts how many were closed.
pub struct FakeDriver {
    site: Arc<FakeSite>,
    fail_launch: bool,
    launched: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
}

impl FakeDriver {
    pub fn new(site: FakeSite) -> Self {
        Self {
            site: Arc::new(site),
            fail_launch: false,
            launched: Arc::new(AtomicUsize::new(0)),
            closed: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_launch: true,
            ..Self::new(FakeSite::numbered(Vec::new()))
        }
    }

    pub fn launched_sessions(&self) -> usize {
        self.launched.load(Ordering::SeqCst)
    }

    pub fn closed_sessions(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BrowserDriver for FakeDriver {
    async fn launch(&self) -> ScrapeResult<Box<dyn BrowserSession>> {
        if self.fail_launch {
            return Err(ScrapeError::browser("chrome binary not found"));
        }
        self.launched.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeSession {
            site: Arc::clone(&self.site),
            page: Arc::new(AtomicUsize::new(0)),
            url: Mutex::new(String::new()),
            in_frame: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            close_count: Arc::clone(&self.closed),
        }))
    }
}

pub struct FakeSession {
    site: Arc<FakeSite>,
    page: Arc<AtomicUsize>,
    url: Mutex<String>,
    in_frame: AtomicBool,
    closed: AtomicBool,
    close_count: Arc<AtomicUsize>,
}

impl FakeSession {
    fn pagination_controls(&self, css: &str) -> Vec<FakeElement> {
        let current = self.page.load(Ordering::SeqCst);
        let total = self.site.pages.len();
        let stalled = self.site.stalled;
        match &self.site.pagination {
            FakePagination::Numbered if css == "a" => (0..total)
                .map(|index| {
                    let page = Arc::clone(&self.page);
                    let class = if index == current { "active" } else { "" };
                    FakeElement::new("a")
                        .text(&(index + 1).to_string())
                        .attr("class", class)
                        .on_click(move || {
                            if !stalled {
                                page.store(index, Ordering::SeqCst);
                            }
                        })
                })
                .collect(),
            FakePagination::NextButton(selector) if css == selector => {
                let page = Arc::clone(&self.page);
                let mut button = FakeElement::new(selector).on_click(move || {
                    if !stalled && page.load(Ordering::SeqCst) + 1 < total {
                        page.fetch_add(1, Ordering::SeqCst);
                    }
                });
                if current + 1 >= total {
                    button = button.attr("disabled", "true");
                }
                vec![button]
            }
            _ => Vec::new(),
        }
    }
}

#[async_trait]
impl BrowserSession for FakeSession {
    async fn open(&self, url: &str) -> ScrapeResult<()> {
        *self.url.lock().unwrap() = url.to_string();
        self.in_frame.store(false, Ordering::SeqCst);
        self.page.store(0, Ordering::SeqCst);
        Ok(())
    }

    async fn find_all(&self, css: &str) -> ScrapeResult<Vec<Box<dyn PageElement>>> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(ScrapeError::browser("session closed"));
        }
        if self.url.lock().unwrap().is_empty() {
            return Ok(Vec::new());
        }

        if let Some(frame) = &self.site.frame {
            if !self.in_frame.load(Ordering::SeqCst) {
                let visible = css == frame && self.site.frame_loads;
                return Ok(if visible {
                    boxed(vec![FakeElement::new(frame).attr("src", FRAME_SRC)])
                } else {
                    Vec::new()
                });
            }
        }

        if css == self.site.row_selector {
            let current = self.page.load(Ordering::SeqCst);
            let rows = self.site.pages.get(current).cloned().unwrap_or_default();
            return Ok(boxed(rows));
        }
        Ok(boxed(self.pagination_controls(css)))
    }

    async fn switch_into(&self, frame: &dyn PageElement) -> ScrapeResult<()> {
        let src = frame
            .attribute("src")
            .await?
            .ok_or_else(|| ScrapeError::browser("frame has no src"))?;
        *self.url.lock().unwrap() = src;
        self.in_frame.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn current_url(&self) -> ScrapeResult<String> {
        Ok(self.url.lock().unwrap().clone())
    }

    async fn close(&self) -> ScrapeResult<()> {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.close_count.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

/// Adapter whose row reader panics with "adapter bug".
pub struct PanickingSite;

#[async_trait]
impl SiteAdapter for PanickingSite {
    fn id(&self) -> &'static str {
        "panicking"
    }

    fn company(&self) -> &'static str {
        "Panicking"
    }

    fn entry_url(&self) -> &'static str {
        "https://panicking.example"
    }

    fn row_selector(&self) -> &'static str {
        SWIGGY_ROW
    }

    fn pagination(&self) -> PaginationStyle {
        PaginationStyle::Numbered { link_selector: "a" }
    }

    async fn read_row(&self, _index: usize, _row: &dyn PageElement) -> ScrapeResult<RawListing> {
        panic!("adapter bug");
    }

    fn normalize(&self, _raw: &RawListing, _ctx: &NormalizeContext) -> Vec<JobRecord> {
        Vec::new()
    }
}
