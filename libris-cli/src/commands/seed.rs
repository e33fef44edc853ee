//! Load the sample catalog and print the relationship query report
//!
//! Two authors with two books each, two libraries with a librarian each.
//! Existing catalog rows are removed first so the command can be rerun.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;

use libris_server::db::{CatalogRepo, SqlitePool};
use libris_server::models::{Name, Title};

use super::{load_config, open_database};

#[derive(Parser, Debug)]
pub struct SeedArgs {
    /// Database URL (overrides config/environment)
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,
}

/// (author, books)
const AUTHORS: &[(&str, &[&str])] = &[
    ("Jane Austen", &["Pride and Prejudice", "Emma"]),
    ("George Orwell", &["1984", "Animal Farm"]),
];

/// (library, librarian, authors whose books it holds)
const LIBRARIES: &[(&str, &str, &[&str])] = &[
    ("Central City Library", "Alice Smith", &["Jane Austen", "George Orwell"]),
    ("West End Branch", "Bob Johnson", &["George Orwell"]),
];

const REPORT_AUTHOR: &str = "Jane Austen";
const REPORT_LIBRARY: &str = "Central City Library";

pub async fn run_seed(args: SeedArgs, config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let url = args.database_url.unwrap_or(config.database.url);
    let pool = open_database(&url, config.database.max_connections).await?;

    let ids = seed_catalog(&pool).await?;
    tracing::info!(
        authors = AUTHORS.len(),
        libraries = LIBRARIES.len(),
        "sample catalog loaded"
    );

    print_report(&pool, ids).await?;
    pool.close().await;
    Ok(())
}

/// Ids the report looks up
struct ReportIds {
    author_id: i64,
    library_id: i64,
}

async fn seed_catalog(pool: &SqlitePool) -> Result<ReportIds> {
    let repo = CatalogRepo::new(pool);
    repo.clear().await.context("Failed to clear catalog")?;

    let mut books_by_author: Vec<(&str, i64, Vec<i64>)> = Vec::new();
    for (author_name, titles) in AUTHORS {
        let author = repo.create_author(&Name::new(author_name)?).await?;
        let mut book_ids = Vec::with_capacity(titles.len());
        for title in *titles {
            let book = repo.create_book(&Title::new(title)?, author.id).await?;
            book_ids.push(book.id);
        }
        books_by_author.push((*author_name, author.id, book_ids));
    }

    let mut library_ids = Vec::new();
    for (library_name, librarian, holdings) in LIBRARIES {
        let library = repo.create_library(&Name::new(library_name)?).await?;
        let book_ids: Vec<i64> = books_by_author
            .iter()
            .filter(|(name, _, _)| holdings.contains(name))
            .flat_map(|(_, _, ids)| ids.iter().copied())
            .collect();
        repo.add_books(library.id, &book_ids).await?;
        repo.create_librarian(&Name::new(librarian)?, library.id).await?;
        library_ids.push((*library_name, library.id));
    }

    let author_id = books_by_author
        .iter()
        .find(|(name, _, _)| *name == REPORT_AUTHOR)
        .map(|(_, id, _)| *id)
        .context("report author missing from sample data")?;
    let library_id = library_ids
        .iter()
        .find(|(name, _)| *name == REPORT_LIBRARY)
        .map(|(_, id)| *id)
        .context("report library missing from sample data")?;

    Ok(ReportIds {
        author_id,
        library_id,
    })
}

async fn print_report(pool: &SqlitePool, ids: ReportIds) -> Result<()> {
    let repo = CatalogRepo::new(pool);

    println!("Books by {}:", REPORT_AUTHOR);
    for book in repo.books_by_author(ids.author_id).await? {
        println!("  - {}", book.title);
    }

    println!("\nBooks in {}:", REPORT_LIBRARY);
    for book in repo.books_in_library(ids.library_id).await? {
        println!("  - {} by {}", book.title, book.author_name);
    }

    match repo.librarian_for(ids.library_id).await? {
        Some(librarian) => println!("\nLibrarian of {}: {}", REPORT_LIBRARY, librarian.name),
        None => println!("\n{} has no librarian", REPORT_LIBRARY),
    }

    Ok(())
}
