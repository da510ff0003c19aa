//! The pagination loop: fetch pages in strict sequence, wait out rate
//! limits, retry transient failures with exponential backoff, classify each
//! tweet and resolve references from the page's expansion payload.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::api::{ApiTweet, IncludedTweet, TweetReference};
use crate::client::{PageStatus, RateLimit, TimelineSource};
use crate::clock::Clock;
use crate::tweet::{Tweet, TweetKind};

/// The API serves roughly this many of an account's most recent tweets;
/// reaching it means older history is simply not available.
pub const HISTORICAL_CAP: usize = 3200;

#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Tweets requested per page (`max_results`).
    pub page_size: u32,
    /// Consecutive transient failures tolerated before giving up.
    pub max_retries: u32,
    /// First backoff delay; doubles on each further failure.
    pub base_delay: Duration,
    /// Politeness delay between pages while quota is plentiful.
    pub pacing_delay: Duration,
    /// Below this many remaining calls, spread requests until the reset.
    pub low_quota_threshold: i64,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            page_size: 100,
            max_retries: 5,
            base_delay: Duration::from_secs(60),
            pacing_delay: Duration::from_secs(2),
            low_quota_threshold: 10,
        }
    }
}

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// The API signalled the end: no `data` field, or no `next_token`.
    EndOfTimeline,
    /// Too many consecutive transient failures; partial results kept.
    RetryBudgetExhausted,
    /// Success response without a `meta` object; partial results kept.
    MissingMeta,
    /// Stopped by the cancel flag; partial results kept.
    Cancelled,
}

/// Everything a run produced. `tweets` is in API delivery order across
/// pages and is valid for every `end` value.
#[derive(Debug)]
pub struct Collection {
    pub tweets: Vec<Tweet>,
    pub end: EndReason,
}

/// Cooperative cancellation, checked at the top of every loop iteration
/// (i.e. before each request and after each wait).
#[derive(Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct Collector<'a, S, C> {
    source: &'a S,
    clock: &'a C,
    config: CollectorConfig,
    cancel: CancelFlag,
}

impl<'a, S: TimelineSource, C: Clock> Collector<'a, S, C> {
    pub fn new(source: &'a S, clock: &'a C, config: CollectorConfig) -> Self {
        Self {
            source,
            clock,
            config,
            cancel: CancelFlag::new(),
        }
    }

    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Fetch the user's whole available timeline, one page at a time.
    ///
    /// Never fails outright: rate limits are waited out, transient failures
    /// are retried against the budget, and every exit path returns whatever
    /// was accumulated up to that point.
    pub async fn collect(&self, user_id: &str) -> Collection {
        let mut tweets: Vec<Tweet> = Vec::new();
        let mut totals = KindCounts::default();
        let mut cursor: Option<String> = None;
        let mut retries: u32 = 0;
        let mut page_number: u32 = 0;

        let end = loop {
            if self.cancel.is_cancelled() {
                eprintln!("Cancelled, keeping the {} tweets collected so far", tweets.len());
                break EndReason::Cancelled;
            }

            let outcome = self
                .source
                .fetch_page(user_id, self.config.page_size, cursor.as_deref())
                .await;

            match outcome {
                Ok(PageStatus::RateLimited { reset_epoch }) => {
                    // Same request again afterwards; rate-limit waits are
                    // bounded by the clock, not by the retry budget.
                    let wait = reset_epoch.saturating_sub(self.clock.now_epoch());
                    if wait > 0 {
                        println!("Rate limited, waiting {}s for the window to reset", wait + 1);
                        self.clock.sleep(Duration::from_secs(wait + 1)).await;
                    }
                }
                Err(err) => {
                    retries += 1;
                    if retries >= self.config.max_retries {
                        log::warn!("giving up after {} failed attempts: {}", retries, err);
                        eprintln!("Request failed {} times in a row, stopping here", retries);
                        break EndReason::RetryBudgetExhausted;
                    }
                    let delay = self.config.base_delay * 2u32.pow(retries - 1);
                    log::warn!("page request failed (attempt {}): {}", retries, err);
                    println!(
                        "Request failed, retrying in {}s (attempt {} of {})",
                        delay.as_secs(),
                        retries,
                        self.config.max_retries
                    );
                    self.clock.sleep(delay).await;
                }
                Ok(PageStatus::Page { body, rate }) => {
                    retries = 0;
                    page_number += 1;

                    let Some(data) = body.data else {
                        println!("No tweets in the response, done");
                        break EndReason::EndOfTimeline;
                    };

                    let includes = body.includes.map(|i| i.tweets).unwrap_or_default();

                    let mut batch = KindCounts::default();
                    for raw in data {
                        let tweet = build_tweet(raw, &includes);
                        batch.tally(tweet.kind);
                        totals.tally(tweet.kind);
                        tweets.push(tweet);
                    }
                    println!(
                        "Page {}: {} tweets ({} posts, {} retweets, {} quote tweets), {} total",
                        page_number,
                        batch.total(),
                        batch.posts,
                        batch.retweets,
                        batch.quote_tweets,
                        tweets.len()
                    );

                    let Some(meta) = body.meta else {
                        log::warn!("success response without a meta object");
                        eprintln!("Response is missing pagination metadata, stopping here");
                        break EndReason::MissingMeta;
                    };
                    match meta.next_token {
                        None => {
                            println!("Reached the last page");
                            break EndReason::EndOfTimeline;
                        }
                        Some(token) => cursor = Some(token),
                    }

                    self.pace(&rate).await;
                }
            }
        };

        println!(
            "Collected {} tweets: {} posts, {} retweets, {} quote tweets",
            tweets.len(),
            totals.posts,
            totals.retweets,
            totals.quote_tweets
        );
        if tweets.len() >= HISTORICAL_CAP {
            println!("The API's ~{} tweet history limit was likely reached", HISTORICAL_CAP);
        }

        Collection { tweets, end }
    }

    /// Wait between successful pages. Near quota exhaustion the remaining
    /// window is spread evenly over the remaining calls; `remaining <= 0`
    /// must not divide and waits for the reset instead.
    async fn pace(&self, rate: &RateLimit) {
        match (rate.remaining, rate.reset_epoch) {
            // Low quota is only actionable with a reset time; a response
            // missing the reset header falls through to the fixed delay.
            (Some(remaining), Some(reset_epoch))
                if remaining < self.config.low_quota_threshold =>
            {
                let now = self.clock.now_epoch();
                let until_reset = reset_epoch.saturating_sub(now);
                let wait = if remaining <= 0 {
                    until_reset
                } else {
                    until_reset / remaining as u64
                };
                if wait > 0 {
                    println!(
                        "{} calls left in this rate window, pacing with a {}s wait",
                        remaining.max(0),
                        wait
                    );
                    self.clock.sleep(Duration::from_secs(wait)).await;
                }
            }
            _ => self.clock.sleep(self.config.pacing_delay).await,
        }
    }
}

/// Classify from the first reference entry only; later entries are ignored
/// even when present.
fn classify(references: &[TweetReference]) -> TweetKind {
    match references.first().map(|r| r.kind.as_str()) {
        Some("retweeted") => TweetKind::Retweet,
        Some("quoted") => TweetKind::QuoteTweet,
        _ => TweetKind::Post,
    }
}

/// Turn a raw API tweet into an output item, pulling the referenced tweet's
/// body and date out of the page's expansion list when it is there. A miss
/// leaves the fields absent rather than failing the item.
fn build_tweet(raw: ApiTweet, includes: &[IncludedTweet]) -> Tweet {
    let kind = classify(&raw.referenced_tweets);

    let mut referenced_content = None;
    let mut referenced_date = None;
    if kind != TweetKind::Post {
        if let Some(reference) = raw.referenced_tweets.first() {
            if let Some(full) = includes.iter().find(|t| t.id == reference.id) {
                referenced_content = Some(full.text.clone());
                referenced_date = Some(full.created_at.clone());
            }
        }
    }

    Tweet {
        kind,
        date: raw.created_at,
        content: raw.text,
        id: raw.id,
        referenced_content,
        referenced_date,
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct KindCounts {
    posts: usize,
    retweets: usize,
    quote_tweets: usize,
}

impl KindCounts {
    fn tally(&mut self, kind: TweetKind) {
        match kind {
            TweetKind::Post => self.posts += 1,
            TweetKind::Retweet => self.retweets += 1,
            TweetKind::QuoteTweet => self.quote_tweets += 1,
        }
    }

    fn total(&self) -> usize {
        self.posts + self.retweets + self.quote_tweets
    }
}
