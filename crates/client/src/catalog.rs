//! Catalog loading
//!
//! The catalogs are shared by every plan the admin looks at, so they are
//! loaded once and handed to the editor rather than re-fetched per plan.

use std::collections::HashSet;

use plandesk_entitlements::Catalog;
use plandesk_shared::types::{Character, CharacterQuery};
use tracing::{debug, info};

use crate::api::AdminApi;
use crate::error::ClientResult;

/// Load all four catalogs. Features and tools are fetched concurrently;
/// characters are paged with `page_size` until a short page comes back.
pub async fn load_catalog(api: &dyn AdminApi, page_size: u32) -> ClientResult<Catalog> {
    let (display_features, system_features, tools) = tokio::try_join!(
        api.get_display_features(),
        api.get_system_features(),
        api.get_tools(),
    )?;
    let characters = load_characters(api, page_size).await?;

    info!(
        display_features = display_features.len(),
        system_features = system_features.len(),
        characters = characters.len(),
        tools = tools.len(),
        "Catalogs loaded"
    );

    Ok(Catalog {
        display_features,
        system_features,
        characters,
        tools,
    })
}

async fn load_characters(api: &dyn AdminApi, page_size: u32) -> ClientResult<Vec<Character>> {
    let page_size = page_size.max(1);
    let mut seen = HashSet::new();
    let mut characters = Vec::new();
    let mut offset = 0u32;

    loop {
        let query = CharacterQuery {
            limit: Some(page_size),
            offset: Some(offset),
            search: None,
        };
        let page = api.get_public_characters(&query).await?;
        let page_len = page.len();

        let mut added = 0usize;
        for character in page {
            if seen.insert(character.id.clone()) {
                characters.push(character);
                added += 1;
            }
        }
        debug!(offset, page_len, added, "Fetched character page");

        // A server that ignores paging keeps returning the same page
        if page_len < page_size as usize || added == 0 {
            break;
        }
        offset = offset.saturating_add(page_size);
    }

    Ok(characters)
}
