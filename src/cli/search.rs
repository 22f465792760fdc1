use crate::{
    cli::{describe, print_table, spinner},
    error,
    management::Session,
    types::SearchTableRow,
};

pub async fn search(session: &Session, query: &str, limit: u32) {
    if query.trim().is_empty() {
        error!("Search query must not be empty.");
    }

    let pb = spinner(&format!("Searching for \"{query}\"..."));
    let results = session.gateway.search(query, limit).await;
    pb.finish_and_clear();

    let results = match results {
        Ok(results) => results,
        Err(e) => error!("Search failed: {}", describe(&e)),
    };

    print_table(
        results
            .iter()
            .map(|r| SearchTableRow {
                kind: r.kind().to_string(),
                name: r.title().to_string(),
                id: r.id().to_string(),
            })
            .collect(),
    );
}
