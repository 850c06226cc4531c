use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use serde::Serialize;

use crate::publish::{PublishApi, PublishResult, Sleeper};
use crate::rewrite::write_rewrite_rules;
use crate::source::ArticleSource;
use crate::transform::{MarkupConverter, transform};

#[derive(Debug, Clone)]
pub struct MigrateOptions {
    pub delay: Duration,
    pub new_base_url: String,
    pub output_path: PathBuf,
    pub match_trailing_path: bool,
    pub dry_run: bool,
}

/// Progress events surfaced while the run is in flight. The core never
/// prints; callers decide how to present these.
#[derive(Debug, Clone)]
pub enum MigrationEvent {
    Published {
        index: usize,
        title: String,
        tags: String,
        response: String,
    },
    Planned {
        index: usize,
        title: String,
        tags: String,
    },
    WritingRules {
        path: PathBuf,
    },
}

pub type ProgressCallback<'a> = &'a mut dyn FnMut(&MigrationEvent);

#[derive(Debug, Clone, Serialize)]
pub struct MigrationReport {
    pub dry_run: bool,
    pub eligible: usize,
    pub published: usize,
    pub skipped: usize,
    pub output_path: Option<String>,
    pub results: Vec<PublishResult>,
}

/// Run the whole migration: load every article once, walk them in
/// source order (skipping the unpublished, resolving tags, transforming
/// the body, submitting, pausing), then write the rewrite-rule file
/// from the accumulated results.
///
/// A transport failure mid-loop propagates immediately: articles
/// already submitted stay submitted and no rewrite file is written for
/// the aborted run.
pub fn run_migration(
    source: &mut dyn ArticleSource,
    publisher: &mut dyn PublishApi,
    converter: Option<&dyn MarkupConverter>,
    sleeper: &dyn Sleeper,
    options: &MigrateOptions,
    mut progress: Option<ProgressCallback>,
) -> Result<MigrationReport> {
    let articles = source.load_articles()?;

    let mut results: Vec<PublishResult> = Vec::new();
    let mut eligible = 0usize;
    let mut skipped = 0usize;

    for (position, article) in articles.iter().enumerate() {
        let Some(published_at) = article.published_at else {
            skipped += 1;
            continue;
        };
        eligible += 1;

        let tags = source.tags_for(article.id)?;
        let body = transform(article, converter);

        if options.dry_run {
            notify(
                &mut progress,
                MigrationEvent::Planned {
                    index: position + 1,
                    title: article.title.clone(),
                    tags: tags.join(","),
                },
            );
            continue;
        }

        let result = publisher.publish(article, published_at, &tags, &body)?;
        notify(
            &mut progress,
            MigrationEvent::Published {
                index: position + 1,
                title: article.title.clone(),
                tags: tags.join(","),
                response: result.remote_id.clone(),
            },
        );
        results.push(result);
        sleeper.pause(options.delay);
    }

    let output_path = if options.dry_run {
        None
    } else {
        notify(
            &mut progress,
            MigrationEvent::WritingRules {
                path: options.output_path.clone(),
            },
        );
        write_rewrite_rules(
            &results,
            &options.new_base_url,
            options.match_trailing_path,
            &options.output_path,
        )?;
        Some(options.output_path.to_string_lossy().into_owned())
    };

    Ok(MigrationReport {
        dry_run: options.dry_run,
        eligible,
        published: results.len(),
        skipped,
        output_path,
        results,
    })
}

fn notify(progress: &mut Option<ProgressCallback>, event: MigrationEvent) {
    if let Some(callback) = progress {
        callback(&event);
    }
}
