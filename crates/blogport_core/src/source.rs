use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use postgres::{Client, NoTls};

use crate::config::DatabaseParams;

// The contents table is shared with comments; the type discriminator
// selects articles. Publication filtering happens later in the run, not
// here.
const LOAD_ARTICLES_SQL: &str = "SELECT id, title, body, excerpt, published_at, permalink, filter \
     FROM contents WHERE type = 'Article' ORDER BY id";

const TAGS_FOR_ARTICLE_SQL: &str = "SELECT tags.name FROM tags \
     INNER JOIN taggings ON taggings.tag_id = tags.id \
     WHERE taggings.taggable_id = $1 ORDER BY taggings.id";

/// Markup format recorded on a stored article. Parsed once at row-read
/// time; everything downstream matches on the closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkupKind {
    Textile,
    Markdown,
    SmartyPants,
    Other,
}

impl MarkupKind {
    pub fn parse(value: Option<&str>) -> Self {
        match value.unwrap_or("") {
            "textile_filter" => Self::Textile,
            "markdown_filter" => Self::Markdown,
            "smartypants_filter" => Self::SmartyPants,
            _ => Self::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Article {
    pub id: i32,
    pub title: String,
    pub body: String,
    pub excerpt: String,
    pub published_at: Option<NaiveDateTime>,
    pub permalink: String,
    pub filter: MarkupKind,
}

pub trait ArticleSource {
    fn load_articles(&mut self) -> Result<Vec<Article>>;
    fn tags_for(&mut self, article_id: i32) -> Result<Vec<String>>;
}

pub struct PgArticleSource {
    client: Client,
}

impl PgArticleSource {
    pub fn connect(params: &DatabaseParams) -> Result<Self> {
        let mut config = postgres::Config::new();
        config
            .host(&params.host)
            .port(params.port)
            .dbname(&params.dbname)
            .user(&params.user);
        if let Some(password) = &params.password {
            config.password(password);
        }
        let client = config.connect(NoTls).with_context(|| {
            format!(
                "failed to connect to database {} on {}:{}",
                params.dbname, params.host, params.port
            )
        })?;
        Ok(Self { client })
    }
}

impl ArticleSource for PgArticleSource {
    fn load_articles(&mut self) -> Result<Vec<Article>> {
        let rows = self
            .client
            .query(LOAD_ARTICLES_SQL, &[])
            .context("failed to load articles from contents table")?;

        let mut articles = Vec::with_capacity(rows.len());
        for row in rows {
            let id: i32 = row.try_get("id").context("failed to read article id")?;
            articles.push(Article {
                id,
                title: optional_text(&row, "title")?,
                body: optional_text(&row, "body")?,
                excerpt: optional_text(&row, "excerpt")?,
                published_at: row
                    .try_get("published_at")
                    .with_context(|| format!("failed to read published_at for article {id}"))?,
                permalink: optional_text(&row, "permalink")?,
                filter: MarkupKind::parse(
                    row.try_get::<_, Option<String>>("filter")
                        .with_context(|| format!("failed to read filter for article {id}"))?
                        .as_deref(),
                ),
            });
        }
        Ok(articles)
    }

    fn tags_for(&mut self, article_id: i32) -> Result<Vec<String>> {
        let rows = self
            .client
            .query(TAGS_FOR_ARTICLE_SQL, &[&article_id])
            .with_context(|| format!("failed to load tags for article {article_id}"))?;
        let mut names = Vec::with_capacity(rows.len());
        for row in rows {
            names.push(row.try_get("name").context("failed to read tag name")?);
        }
        Ok(names)
    }
}

fn optional_text(row: &postgres::Row, column: &str) -> Result<String> {
    Ok(row
        .try_get::<_, Option<String>>(column)
        .with_context(|| format!("failed to read {column} column"))?
        .unwrap_or_default())
}
