//! Activity source backed by Reddit's public JSON endpoints.
//!
//! Reads `/user/<name>/about.json`, `/user/<name>/submitted.json` and
//! `/user/<name>/comments.json`. Listings are paged with the `after` cursor
//! until the requested number of items is reached.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use redpersona_core::error::{PersonaError, Result};
use redpersona_core::evidence::{RawComment, RawPost};
use redpersona_core::source::{ActivitySource, FetchLimits, RawActivity};

const BASE_URL: &str = "https://www.reddit.com";
const PERMALINK_HOST: &str = "https://www.reddit.com";
/// Reddit caps listing pages at 100 items.
const MAX_PAGE_SIZE: usize = 100;

/// Fetches public activity without authentication.
pub struct RedditJsonSource {
    client: Client,
    base_url: String,
    user_agent: String,
}

impl RedditJsonSource {
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: BASE_URL.to_string(),
            user_agent: user_agent.into(),
        }
    }

    /// Points the source at another host serving the same endpoints.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        username: &str,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = format!("{}/user/{}/{}", self.base_url, username, path);
        let response = self
            .client
            .get(&url)
            .header("User-Agent", &self.user_agent)
            .query(query)
            .send()
            .await
            .map_err(|e| PersonaError::data_source(format!("Request to {url} failed: {e}")))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(PersonaError::not_found("reddit user", username));
        }
        if !status.is_success() {
            return Err(PersonaError::data_source(format!(
                "{url} answered {}",
                status.as_u16()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| PersonaError::data_source(format!("Unexpected response from {url}: {e}")))
    }

    /// Collects up to `limit` items of one listing, newest first.
    async fn listing<T: DeserializeOwned>(
        &self,
        username: &str,
        path: &str,
        limit: usize,
    ) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut after: Option<String> = None;

        while items.len() < limit {
            let page_size = (limit - items.len()).min(MAX_PAGE_SIZE);
            let mut query = vec![
                ("limit", page_size.to_string()),
                ("sort", "new".to_string()),
                ("raw_json", "1".to_string()),
            ];
            if let Some(cursor) = &after {
                query.push(("after", cursor.clone()));
            }

            let page: Listing<T> = self.get_json(username, path, &query).await?;
            let received = page.data.children.len();
            items.extend(page.data.children.into_iter().map(|child| child.data));

            tracing::debug!(path, received, total = items.len(), "Fetched listing page");

            match page.data.after {
                Some(cursor) if received > 0 => after = Some(cursor),
                _ => break,
            }
        }

        items.truncate(limit);
        Ok(items)
    }
}

#[async_trait]
impl ActivitySource for RedditJsonSource {
    async fn fetch(&self, username: &str, limits: FetchLimits) -> Result<RawActivity> {
        tracing::info!(
            username,
            max_posts = limits.max_posts,
            max_comments = limits.max_comments,
            "Fetching public activity"
        );

        let about: Thing<AboutData> = self.get_json(username, "about.json", &[]).await?;
        let posts: Vec<PostData> = self
            .listing(username, "submitted.json", limits.max_posts)
            .await?;
        let comments: Vec<CommentData> = self
            .listing(username, "comments.json", limits.max_comments)
            .await?;

        tracing::info!(
            username,
            posts = posts.len(),
            comments = comments.len(),
            "Fetched public activity"
        );

        Ok(RawActivity {
            username: about.data.name.unwrap_or_else(|| username.to_string()),
            created_utc: about.data.created_utc,
            link_karma: about.data.link_karma.unwrap_or_default(),
            comment_karma: about.data.comment_karma.unwrap_or_default(),
            posts: posts.into_iter().map(RawPost::from).collect(),
            comments: comments.into_iter().map(RawComment::from).collect(),
        })
    }
}

#[derive(Deserialize)]
struct Thing<T> {
    data: T,
}

#[derive(Deserialize)]
struct Listing<T> {
    data: ListingData<T>,
}

#[derive(Deserialize)]
struct ListingData<T> {
    #[serde(default = "Vec::new")]
    children: Vec<Thing<T>>,
    after: Option<String>,
}

#[derive(Deserialize)]
struct AboutData {
    name: Option<String>,
    created_utc: Option<f64>,
    link_karma: Option<i64>,
    comment_karma: Option<i64>,
}

#[derive(Deserialize)]
struct PostData {
    id: Option<String>,
    title: Option<String>,
    selftext: Option<String>,
    subreddit: Option<String>,
    created_utc: Option<f64>,
    score: Option<i64>,
    permalink: Option<String>,
    num_comments: Option<i64>,
}

#[derive(Deserialize)]
struct CommentData {
    id: Option<String>,
    body: Option<String>,
    subreddit: Option<String>,
    created_utc: Option<f64>,
    score: Option<i64>,
    permalink: Option<String>,
    link_title: Option<String>,
}

fn absolute_permalink(permalink: Option<String>) -> Option<String> {
    permalink
        .filter(|p| !p.is_empty())
        .map(|p| {
            if p.starts_with("http") {
                p
            } else {
                format!("{PERMALINK_HOST}{p}")
            }
        })
}

impl From<PostData> for RawPost {
    fn from(post: PostData) -> Self {
        RawPost {
            id: post.id,
            title: post.title,
            content: post.selftext,
            subreddit: post.subreddit,
            created_utc: post.created_utc,
            score: post.score,
            url: absolute_permalink(post.permalink),
            num_comments: post.num_comments,
        }
    }
}

impl From<CommentData> for RawComment {
    fn from(comment: CommentData) -> Self {
        RawComment {
            id: comment.id,
            content: comment.body,
            subreddit: comment.subreddit,
            created_utc: comment.created_utc,
            score: comment.score,
            url: absolute_permalink(comment.permalink),
            parent_post_title: comment.link_title,
        }
    }
}
