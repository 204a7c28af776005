//! Pagination driver.
//!
//! Two states: `HasMore` until an advance fails to find a usable next-page
//! affordance, or a freshly loaded page brings no unseen listings. The seen
//! sets live for the whole run, because a re-rendered page may repeat rows.

use std::collections::HashSet;
use std::time::Duration;

use super::browser::{BrowserSession, PageElement, wait_for_elements};
use super::error::{ScrapeError, ScrapeResult};
use super::sites::PaginationStyle;

/// Timing and bounds for page advances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationPolicy {
    /// Pause after clicking before looking for the new page's rows.
    pub settle_delay: Duration,
    /// How long the new page's rows may take to appear.
    pub row_timeout: Duration,
    pub poll_interval: Duration,
    /// Hard ceiling on pages visited in one run.
    pub max_pages: usize,
}

impl Default for PaginationPolicy {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_millis(2000),
            row_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_millis(250),
            max_pages: 200,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    NoAffordance,
    AffordanceDisabled,
    Stalled,
    PageLimit,
    AdvanceFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaginationState {
    HasMore,
    Done(StopReason),
}

enum Affordance {
    Ready(Box<dyn PageElement>),
    Disabled,
    Missing,
}

pub struct PaginationDriver {
    style: PaginationStyle,
    policy: PaginationPolicy,
    page: usize,
    seen_ids: HashSet<String>,
    seen_listings: HashSet<String>,
    state: PaginationState,
}

impl PaginationDriver {
    pub fn new(style: PaginationStyle, policy: PaginationPolicy) -> Self {
        Self {
            style,
            policy,
            page: 1,
            seen_ids: HashSet::new(),
            seen_listings: HashSet::new(),
            state: PaginationState::HasMore,
        }
    }

    /// One-based index of the page currently loaded.
    pub fn page(&self) -> usize {
        self.page
    }

    pub fn state(&self) -> &PaginationState {
        &self.state
    }

    /// Record the listing fingerprints found on the current page and return
    /// how many were new. A page after the first whose listings were all seen
    /// before is a stall; the driver moves to `Done` and the stall is
    /// returned. A page that yielded no readable listings is not a stall.
    pub fn observe<'s>(
        &mut self,
        fingerprints: impl IntoIterator<Item = &'s str>,
    ) -> ScrapeResult<usize> {
        let mut read = 0;
        let mut fresh = 0;
        for fp in fingerprints {
            read += 1;
            if self.seen_listings.insert(fp.to_string()) {
                fresh += 1;
            }
        }
        if read > 0 && fresh == 0 && self.page > 1 {
            self.state = PaginationState::Done(StopReason::Stalled);
            return Err(ScrapeError::PaginationStall { page: self.page });
        }
        Ok(fresh)
    }

    /// Claim a site-native id for this run. Returns `false` when the id was
    /// already emitted; listings without an id are always admitted.
    pub fn admit(&mut self, native_id: Option<&str>) -> bool {
        match native_id {
            Some(id) => self.seen_ids.insert(id.to_string()),
            None => true,
        }
    }

    /// Move to the next page if one exists. Failures while clicking or
    /// settling end pagination; they never fail the run.
    pub async fn advance(
        &mut self,
        session: &dyn BrowserSession,
        row_selector: &str,
    ) -> PaginationState {
        if self.state != PaginationState::HasMore {
            return self.state.clone();
        }
        self.state = self.try_advance(session, row_selector).await;
        self.state.clone()
    }

    async fn try_advance(&mut self, session: &dyn BrowserSession, row_selector: &str) -> PaginationState {
        if self.page >= self.policy.max_pages {
            tracing::warn!(page = self.page, "Page limit reached");
            return PaginationState::Done(StopReason::PageLimit);
        }

        let control = match self.find_affordance(session).await {
            Ok(Affordance::Ready(el)) => el,
            Ok(Affordance::Disabled) => return PaginationState::Done(StopReason::AffordanceDisabled),
            Ok(Affordance::Missing) => return PaginationState::Done(StopReason::NoAffordance),
            Err(e) => return self.failed("locate next page", e),
        };

        tracing::debug!(from = self.page, "Advancing to next page");
        if let Err(e) = control.click().await {
            return self.failed("click next page", e);
        }
        tokio::time::sleep(self.policy.settle_delay).await;
        if let Err(e) = wait_for_elements(
            session,
            row_selector,
            self.policy.row_timeout,
            self.policy.poll_interval,
        )
        .await
        {
            return self.failed("wait for next page", e);
        }

        self.page += 1;
        PaginationState::HasMore
    }

    fn failed(&self, step: &str, error: ScrapeError) -> PaginationState {
        tracing::warn!(page = self.page, step, error = %error, "Pagination ended early");
        PaginationState::Done(StopReason::AdvanceFailed(error.to_string()))
    }

    async fn find_affordance(&self, session: &dyn BrowserSession) -> ScrapeResult<Affordance> {
        match self.style {
            PaginationStyle::Numbered { link_selector } => {
                self.numbered_link(session, link_selector).await
            }
            PaginationStyle::NextButton { selector } => next_button(session, selector).await,
        }
    }

    /// Prefer a link reading exactly `page + 1`; accept a numerically equal
    /// label (e.g. "03") only when no exact match exists.
    async fn numbered_link(
        &self,
        session: &dyn BrowserSession,
        link_selector: &str,
    ) -> ScrapeResult<Affordance> {
        let wanted = self.page + 1;
        let label = wanted.to_string();
        let mut numeric_match = None;

        for link in session.find_all(link_selector).await? {
            let class = link.attribute("class").await?.unwrap_or_default();
            if class.contains("disabled") || class.contains("active") {
                continue;
            }
            let text = link.text().await?;
            let text = text.trim();
            if text == label {
                if link.is_displayed().await? {
                    return Ok(Affordance::Ready(link));
                }
            } else if numeric_match.is_none() && text.parse::<usize>().ok() == Some(wanted) {
                numeric_match = Some(link);
            }
        }

        match numeric_match {
            Some(link) if link.is_displayed().await? => Ok(Affordance::Ready(link)),
            _ => Ok(Affordance::Missing),
        }
    }
}

async fn next_button(session: &dyn BrowserSession, selector: &str) -> ScrapeResult<Affordance> {
    let Some(button) = session.find_all(selector).await?.into_iter().next() else {
        return Ok(Affordance::Missing);
    };
    let disabled = button.attribute("disabled").await?.is_some()
        || button.attribute("aria-disabled").await?.as_deref() == Some("true")
        || button
            .attribute("class")
            .await?
            .is_some_and(|class| class.contains("disabled"));
    if disabled || !button.is_displayed().await? {
        return Ok(Affordance::Disabled);
    }
    Ok(Affordance::Ready(button))
}
